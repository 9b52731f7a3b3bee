use std::{borrow::Cow, env, path::Path};

const FIRST_LINE_MAX_CHARS: usize = 50;

/// Expand a leading `~/` and environment variables.
///
/// Absolute paths inside the working directory become relative to it.
#[must_use]
pub fn expand_path(path: &str) -> String {
    let expanded = shellexpand::full(path).unwrap_or(Cow::Borrowed(path));

    let Ok(cwd) = env::current_dir() else {
        return expanded.into_owned();
    };

    match Path::new(expanded.as_ref()).strip_prefix(&cwd) {
        Ok(relative) if relative.as_os_str().is_empty() => ".".to_owned(),
        Ok(relative) => relative.to_string_lossy().into_owned(),
        Err(_) => expanded.into_owned(),
    }
}

/// A short, single-line preview of `text`, e.g. "`make all` (+2 lines)".
#[must_use]
pub fn first_line(text: &str) -> String {
    let mut lines = text.trim().split('\n');
    let first = lines.next().unwrap_or_default();
    let rest = lines.count();

    let mut preview = first.split_whitespace().collect::<Vec<_>>().join(" ");
    if preview.chars().count() > FIRST_LINE_MAX_CHARS {
        preview = preview.chars().take(FIRST_LINE_MAX_CHARS - 1).collect();
        preview.push('…');
    }

    match rest {
        0 => format!("`{preview}`"),
        n => format!("`{preview}` (+{})", plural_lines(n)),
    }
}

pub(crate) fn plural_lines(n: usize) -> String {
    if n == 1 {
        "1 line".to_owned()
    } else {
        format!("{n} lines")
    }
}

/// Quote `text` as a double-quoted string literal.
pub(crate) fn quote(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}

#[cfg(test)]
#[path = "util_tests.rs"]
mod tests;
