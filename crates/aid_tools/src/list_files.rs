use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, BufRead as _, BufReader},
    path::Path,
};

use aid_tool::{ParamType, Parameters, Runner, Tool, ToolParams, ToolResult, func};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::util::expand_path;

const MAX_ENTRIES: usize = 1000;

/// Directories that are listed but never descended into.
const OPAQUE_DIRS: &[&str] = &[".git", "node_modules"];

#[derive(Debug, Deserialize)]
struct Params {
    path: String,
    depth: Option<usize>,
}

impl ToolParams for Params {
    fn parameters() -> Parameters {
        Parameters::new()
            .required("path", ParamType::String, "The directory to list.")
            .optional(
                "depth",
                ParamType::Integer,
                "How many levels to descend. Defaults to 1, the directory's own entries.",
            )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Entry {
    File { lines: usize },
    Directory { count: usize },
}

#[derive(Debug, Default)]
struct Listing {
    items: BTreeMap<String, Entry>,
    total: usize,
}

impl Listing {
    fn render(&self) -> serde_json::Result<String> {
        let mut out = serde_json::to_string(&self.items)?;
        if self.total > MAX_ENTRIES {
            out.push_str(&format!(
                "\n// There were {} entries, but we could only include {MAX_ENTRIES}.",
                self.total
            ));
        }

        Ok(out)
    }
}

pub fn list_files() -> impl Tool {
    func(
        "List files",
        "Lists some of the contents in the specified directory. Don't use this on files. Don't \
         use a depth higher than 2 unless you're really sure.",
        "list_files",
        |_: Runner, params: Params| async move {
            let label = format!("List files in `{}`", params.path);
            let root = expand_path(&params.path);
            let depth = params.depth.unwrap_or(1).max(1);

            let listing = tokio::task::spawn_blocking(move || walk(Path::new(&root), depth)).await;

            match listing {
                Ok(Ok(listing)) => match listing.render() {
                    Ok(text) => ToolResult::success(label, text.into()),
                    Err(error) => ToolResult::error(label, error),
                },
                Ok(Err(error)) => ToolResult::error(label, error),
                Err(error) => ToolResult::error(label, error),
            }
        },
    )
}

fn walk(root: &Path, depth: usize) -> io::Result<Listing> {
    debug!(root = %root.display(), depth, "Listing files.");

    if !fs::metadata(root)?.is_dir() {
        return Err(io::Error::other(format!("{} is not a directory", root.display())));
    }

    let mut listing = Listing::default();
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry?;
        let is_dir = entry.file_type().is_dir();

        listing.total += 1;
        if listing.total > MAX_ENTRIES {
            if is_dir {
                walker.skip_current_dir();
            }
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();

        let item = if is_dir {
            if OPAQUE_DIRS.contains(&entry.file_name().to_string_lossy().as_ref()) {
                trace!(path = %relative, "Not descending.");
                walker.skip_current_dir();
            }

            Entry::Directory {
                count: fs::read_dir(entry.path()).map_or(0, Iterator::count),
            }
        } else {
            Entry::File {
                lines: count_lines(entry.path()),
            }
        };

        listing.items.insert(relative, item);
    }

    Ok(listing)
}

/// Number of lines, counting a final line without newline. Unreadable files
/// have none.
fn count_lines(path: &Path) -> usize {
    File::open(path).map_or(0, |file| BufReader::new(file).split(b'\n').count())
}

#[cfg(test)]
#[path = "list_files_tests.rs"]
mod tests;
