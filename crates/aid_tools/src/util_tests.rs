use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_first_line() {
    struct TestCase {
        text: &'static str,
        expected: &'static str,
    }

    let cases = vec![
        ("single", TestCase {
            text: "ls -la",
            expected: "`ls -la`",
        }),
        ("collapses whitespace", TestCase {
            text: "  echo \t  hi  ",
            expected: "`echo hi`",
        }),
        ("counts remaining lines", TestCase {
            text: "cd /tmp\nls\npwd\n",
            expected: "`cd /tmp` (+2 lines)",
        }),
        ("one remaining line", TestCase {
            text: "cd /tmp\nls",
            expected: "`cd /tmp` (+1 line)",
        }),
        ("truncates long lines", TestCase {
            text: "xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx",
            expected: "`xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx…`",
        }),
        ("empty", TestCase {
            text: "",
            expected: "``",
        }),
    ];

    for (name, case) in cases {
        assert_eq!(first_line(case.text), case.expected, "failed case: {name}");
    }
}

#[test]
fn test_expand_path_makes_cwd_paths_relative() {
    let cwd = env::current_dir().unwrap();
    let inside = cwd.join("src").join("lib.rs");

    assert_eq!(expand_path(inside.to_str().unwrap()), format!("src{}lib.rs", std::path::MAIN_SEPARATOR));
    assert_eq!(expand_path(cwd.to_str().unwrap()), ".");
    assert_eq!(expand_path("relative/path"), "relative/path");
}

#[test]
fn test_expand_path_home() {
    let Ok(home) = env::var("HOME") else {
        return;
    };

    assert_eq!(expand_path("~/notes.txt"), expand_path(&format!("{home}/notes.txt")));
    assert_eq!(expand_path("$HOME/notes.txt"), expand_path("~/notes.txt"));
}

#[test]
fn test_quote() {
    assert_eq!(quote(r#"say "hi""#), r#""say \"hi\"""#);
    assert_eq!(quote("tab\there"), r#""tab\there""#);
}
