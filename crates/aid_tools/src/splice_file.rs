use std::{
    fs::OpenOptions,
    io::{self, Read as _, Write as _},
};

use aid_tool::{ParamType, Parameters, Runner, Tool, ToolParams, ToolResult, func};
use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Builder;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::util::{expand_path, plural_lines, quote};

#[derive(Debug, Deserialize)]
struct Params {
    path: String,
    start: i64,
    #[serde(rename = "deleteCount")]
    delete_count: Option<i64>,
    #[serde(rename = "insertLines")]
    insert_lines: Option<Vec<String>>,
}

impl ToolParams for Params {
    fn parameters() -> Parameters {
        Parameters::new()
            .required("path", ParamType::String, "The path to the file to update.")
            .required(
                "start",
                ParamType::Integer,
                "The start index of the slice to delete and optionally replace.",
            )
            .optional(
                "deleteCount",
                ParamType::Integer,
                "The number of lines to delete from the slice.",
            )
            .optional(
                "insertLines",
                ParamType::array_of(ParamType::String),
                "The lines to insert at the start of the slice.",
            )
    }
}

pub fn splice_file() -> impl Tool {
    func(
        "Update file",
        "Delete and/or replace a slice of the lines in the specified file, if we imagine the \
         file as a zero-indexed array of lines.",
        "splice_file",
        |_: Runner, params: Params| async move {
            let path = expand_path(&params.path);
            let delete = usize::try_from(params.delete_count.unwrap_or(0)).unwrap_or(0);
            let insert = params.insert_lines.unwrap_or_default();

            let Ok(start) = usize::try_from(params.start) else {
                let message = format!("invalid start index {}", params.start);
                return ToolResult::error(path, message);
            };

            let label = describe(&path, delete, insert.len());
            let target = Utf8PathBuf::from(path.clone());
            let spliced =
                tokio::task::spawn_blocking(move || splice(&target, start, delete, &insert)).await;

            match spliced {
                Ok(Ok(())) => ToolResult::success(label, Value::from("File updated.")),
                Ok(Err(message)) => ToolResult::error(path, message),
                Err(error) => ToolResult::error(path, error),
            }
        },
    )
}

/// Replace `delete` lines at `start` with `insert`, creating the file if it
/// does not exist. A non-empty file is backed up first.
fn splice(path: &Utf8Path, start: usize, delete: usize, insert: &[String]) -> Result<(), String> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|error| format!("failed to open {}: {error}", quote(path.as_str())))?;

    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(|error| format!("failed to read file: {error}"))?;
    drop(file);

    let lines = text.lines().collect::<Vec<_>>();
    if start > lines.len() {
        return Err(format!("file has less than {} lines", start + 1));
    }

    let end = start.saturating_add(delete).min(lines.len());
    debug!(%path, start, end, inserted = insert.len(), total = lines.len(), "Splicing file.");

    let mut spliced = String::new();
    for line in lines[..start]
        .iter()
        .copied()
        .chain(insert.iter().map(String::as_str))
        .chain(lines[end..].iter().copied())
    {
        spliced.push_str(line);
        spliced.push('\n');
    }

    if !lines.is_empty() {
        let backup = Utf8PathBuf::from(format!("{path}.{}.bak", Utc::now().timestamp()));
        write_atomically(&backup, text.as_bytes())
            .map_err(|error| format!("failed to create backup: {error}"))?;
    }

    write_atomically(path, spliced.as_bytes())
        .map_err(|error| format!("failed to write updated content: {error}"))
}

fn write_atomically(path: &Utf8Path, content: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));

    let mut tmp = Builder::new().prefix("tmp-").tempfile_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|error| error.error)?;

    Ok(())
}

fn describe(path: &str, deleted: usize, inserted: usize) -> String {
    let path = quote(path);

    match (deleted, inserted) {
        (0, 0) => format!("Updated {path}"),
        (d, 0) => format!("Deleted {} from {path}", plural_lines(d)),
        (0, i) => format!("Added {} to {path}", plural_lines(i)),
        (d, i) if d == i => format!("Replaced {} in {path}", plural_lines(d)),
        (d, i) => format!(
            "Replaced {} with {} in {path}",
            plural_lines(d),
            plural_lines(i)
        ),
    }
}

#[cfg(test)]
#[path = "splice_file_tests.rs"]
mod tests;
