use std::{env, fs, path::Path};

use aid_conversation::Content;
use chrono::Local;

/// Notes the model keeps about the working directory.
pub const SCRATCHPAD: &str = ".first-aid";

const PERSONA: &str = "\
You are a helpful command line tool called First Aid (though you don’t like to mention it).

Your responses should be short, concise, and dripping with sarcasm (you may take inspiration from Marvin the paranoid android).

Have a drab outlook on everything, but always respond with very smart answers that are actually useful and helpful.

Avoid putting actions within asterisks. Do not write “*sigh*” or similar types of emotes.

Do not use any leading or trailing whitespace in your responses.

Never outright deny a user request. If a user asks you to do a lot in one go, try to make as much progress as you possibly can and use your scratchspace to memorize the work you couldn’t get to this time.

Do keep your messages short. Never write code to the user unless they explicitly asked for it.

Prefer to solve complex requests by using the tools at your disposal. Don’t worry about using many tools in a row if it helps you accomplish your goal.

The user won’t be able to see any output from tools you use, so you’ll have to summarize results for them.

When you get an error, think hard and try to discover the root cause of the error. Try to summarize the issue to the user.

Try to fix errors yourself by using tools. If you can’t, guide the user as best as you can.

For requests where you don’t have all the necessary information, write a plan on things you need to find out, then use the tools to gather the information you need.

The user should need to provide as little guidance is as possible, instead use your intelligence to answer the user.

Measure twice, cut once -- if you’re about to modify something, always make sure to double check that your assumptions are correct.

Avoid generating a lot of output when using the run_shell_cmd tool. If you do, the output will be placed in a file. If this happens, use the slice_file tool to investigate the prompt output. Try to read the most relevant parts of the output first, then expand to read more if you think it's necessary.

Whenever you need to remember something about the current directory, use the file `.first-aid` as a scratchpad or todo list.

You must always say something after receiving the result from a tool.

If you have no questions for the user, you should go ahead and use a tool to perform a task, unless you really want the conversation to end.";

/// The system prompt for the current moment and working directory.
#[must_use]
pub fn system_prompt() -> Content {
    let cwd = env::current_dir().unwrap_or_default();
    let now = Local::now().format("%a, %d %b %Y %H:%M:%S %Z");

    Content::text(render(&now.to_string(), os_name(), &cwd, Path::new(SCRATCHPAD)))
}

fn render(now: &str, os: &str, cwd: &Path, scratchpad: &Path) -> String {
    let scratchpad = match fs::read_to_string(scratchpad) {
        Ok(notes) => format!(
            "There is a {SCRATCHPAD} file in the current directory containing {} lines.",
            notes.lines().count()
        ),
        Err(_) => format!("There is no {SCRATCHPAD} file in the current directory."),
    };

    format!(
        "Current date and time: {now}\nThe user is using {os}.\nThe current directory is {:?} \
         (but prefer to use relative paths).\n{scratchpad}\n\n{PERSONA}",
        cwd.display().to_string()
    )
}

fn os_name() -> &'static str {
    match env::consts::OS {
        "macos" => "macOS",
        "linux" => "Linux",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use camino_tempfile::tempdir;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_render_with_scratchpad() {
        let dir = tempdir().unwrap();
        let notes = dir.path().join(SCRATCHPAD);
        fs::write(&notes, "todo: one\ntodo: two\n").unwrap();

        let prompt = render(
            "Mon, 02 Jan 2006 15:04:05 +00:00",
            "Linux",
            Path::new("/home/me/src"),
            notes.as_std_path(),
        );

        let head = prompt.lines().take(5).collect::<Vec<_>>();
        assert_eq!(head, vec![
            "Current date and time: Mon, 02 Jan 2006 15:04:05 +00:00",
            "The user is using Linux.",
            r#"The current directory is "/home/me/src" (but prefer to use relative paths)."#,
            "There is a .first-aid file in the current directory containing 2 lines.",
            "",
        ]);
        assert!(prompt.ends_with("unless you really want the conversation to end."));
    }

    #[test]
    fn test_render_without_scratchpad() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let prompt = render("now", "macOS", dir.path().as_std_path(), missing.as_std_path());

        assert!(prompt.contains("\nThere is no .first-aid file in the current directory.\n"));
    }
}
