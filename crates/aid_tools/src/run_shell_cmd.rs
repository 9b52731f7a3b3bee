use std::{io::Write as _, process::Stdio, time::Duration};

use aid_tool::{ParamType, Parameters, Runner, Tool, ToolParams, ToolResult, func};
use serde::Deserialize;
use serde_json::json;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::util::first_line;

/// Deadline for commands when neither the model nor the configuration picks
/// one.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Larger outputs are written to a temporary file instead.
const MAX_INLINE_OUTPUT: usize = 1000;

const FILE_NOTE: &str = "The output was too long to fit here. It's been saved to a file. Prefer \
                         to immediately read the most relevant parts of this file instead of \
                         telling the user about it.";

#[derive(Debug, Deserialize)]
struct Params {
    command: String,
    #[serde(rename = "deadlineSeconds")]
    deadline_seconds: Option<i64>,
}

impl ToolParams for Params {
    fn parameters() -> Parameters {
        Parameters::new()
            .required("command", ParamType::String, "The command to run with `sh -c`.")
            .optional(
                "deadlineSeconds",
                ParamType::Integer,
                "The maximum number of seconds to wait for the command to finish. If the command \
                 doesn't finish within this time, it will be killed and the output will be \
                 returned as an error.",
            )
    }
}

/// Run commands with `sh -c`. Commands are killed once `default_deadline`
/// passes, unless the model asks for another deadline.
pub fn run_shell_cmd(default_deadline: Duration) -> impl Tool {
    func(
        "Run shell command",
        "Run a shell command on the user's computer and return the output",
        "run_shell_cmd",
        move |runner: Runner, params: Params| async move {
            runner.report(&format!("Running shell command {}", first_line(&params.command)));

            // Zero or less means the default.
            let deadline = params
                .deadline_seconds
                .and_then(|secs| u64::try_from(secs).ok())
                .filter(|&secs| secs > 0)
                .map_or(default_deadline, Duration::from_secs);

            match execute(&runner, &params.command, deadline).await {
                Ok(output) => present(params.command, &output),
                Err(error) => ToolResult::error(params.command, error),
            }
        },
    )
}

/// Run the command, returning its combined stdout and stderr.
async fn execute(runner: &Runner, command: &str, deadline: Duration) -> Result<Vec<u8>, String> {
    info!(command, deadline_secs = deadline.as_secs(), "Running shell command.");

    // Both streams share one pipe so their output stays interleaved.
    let child = Command::new("sh")
        .arg("-c")
        .arg(format!("exec 2>&1\n{command}"))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|error| format!("failed to start shell: {error}"))?;

    let output = tokio::select! {
        output = tokio::time::timeout(deadline, child.wait_with_output()) => match output {
            Ok(output) => output.map_err(|error| error.to_string())?,
            Err(_) => {
                warn!(command, "Shell command hit its deadline, killed.");
                return Err(format!("killed after the {}s deadline", deadline.as_secs()));
            }
        },
        () = runner.cancelled() => {
            debug!(command, "Shell command cancelled, killed.");
            return Err("cancelled".to_owned());
        }
    };

    if !output.status.success() {
        let text = String::from_utf8_lossy(&output.stdout);
        return Err(format!("{}: {text}", output.status));
    }

    Ok(output.stdout)
}

fn present(command: String, output: &[u8]) -> ToolResult {
    if output.len() <= MAX_INLINE_OUTPUT {
        let output = String::from_utf8_lossy(output);
        return ToolResult::success(command, json!({ "outputType": "text", "output": output }));
    }

    let file = camino_tempfile::Builder::new()
        .prefix("aid-output-")
        .tempfile()
        .and_then(|mut file| file.write_all(output).map(|()| file))
        .and_then(|file| file.keep().map_err(|error| error.error));

    match file {
        Ok((_, path)) => {
            debug!(path = %path, size = output.len(), "Wrote long command output to file.");

            ToolResult::success(
                command,
                json!({
                    "outputType": "file",
                    "filePath": path.as_str(),
                    "fileSize": output.len(),
                    "firstLine": first_line(&String::from_utf8_lossy(output)),
                    "note": FILE_NOTE,
                }),
            )
        }
        Err(error) => ToolResult::error(command, error),
    }
}

#[cfg(test)]
#[path = "run_shell_cmd_tests.rs"]
mod tests;
