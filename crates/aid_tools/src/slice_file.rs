use aid_tool::{ParamType, Parameters, Runner, Tool, ToolParams, ToolResult, func};
use serde::Deserialize;
use tracing::debug;

use crate::util::{expand_path, plural_lines, quote};

#[derive(Debug, Deserialize)]
struct Params {
    path: String,
    start: i64,
    end: Option<i64>,
}

impl ToolParams for Params {
    fn parameters() -> Parameters {
        Parameters::new()
            .required(
                "path",
                ParamType::String,
                "The path to the file to read (don't use this on directories).",
            )
            .required(
                "start",
                ParamType::Integer,
                "The start index of the slice to get. Can be negative to start from the end.",
            )
            .optional(
                "end",
                ParamType::Integer,
                "The end index of the slice to get (non-inclusive). If not provided, the entire \
                 file from the start index to the end is returned.",
            )
    }
}

pub fn slice_file() -> impl Tool {
    func(
        "Read file",
        "Read a slice of the lines in the specified file, if we imagine the file as a \
         zero-indexed array of lines. Returns a JavaScript array value where each line is \
         prefixed with its index in this imaginary array as a comment.",
        "slice_file",
        |_: Runner, params: Params| async move {
            let path = expand_path(&params.path);

            let text = match tokio::fs::read(&path).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(error) => {
                    return ToolResult::error(path, format!("failed to open file: {error}"));
                }
            };

            let lines = text.lines().collect::<Vec<_>>();
            let (start, end) = match bounds(lines.len(), params.start, params.end) {
                Ok(bounds) => bounds,
                Err(start) => {
                    let message = format!("failed to read line {} from {}", start + 1, quote(&path));
                    return ToolResult::error(path, message);
                }
            };

            debug!(path = %path, start, end, total = lines.len(), "Slicing file.");

            let label = if end - start == 1 {
                format!("Read line {} from {}", start + 1, quote(&path))
            } else {
                format!("Read lines {}-{end} from {}", start + 1, quote(&path))
            };

            ToolResult::success(label, render(&path, &lines, start, end).into())
        },
    )
}

/// Resolve the requested slice to a non-empty `start..end` range, or return
/// the resolved start index if the range is empty.
fn bounds(len: usize, start: i64, end: Option<i64>) -> Result<(usize, usize), i64> {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);

    let start = if start < 0 { len_i.saturating_add(start) } else { start }.max(0);
    let end = end.unwrap_or(len_i).min(len_i);

    match (usize::try_from(start), usize::try_from(end)) {
        (Ok(s), Ok(e)) if s < e => Ok((s, e)),
        _ => Err(start),
    }
}

fn render(path: &str, lines: &[&str], start: usize, end: usize) -> String {
    let mut out = format!(
        "// Below are the sliced lines of {} as an array. The number in each comment is the \
         zero-based index of the string after it.\n[\n",
        quote(path)
    );

    for (i, line) in lines.iter().enumerate().take(end).skip(start) {
        out.push_str(&format!("  /*{i}:*/{},\n", quote(line)));
    }

    let remaining = lines.len() - end;
    if remaining > 0 {
        out.push_str(&format!("  // There's {} more after this.\n", plural_lines(remaining)));
    }

    out.push(']');
    out
}

#[cfg(test)]
#[path = "slice_file_tests.rs"]
mod tests;
