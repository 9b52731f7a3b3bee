//! The tools `aid` hands to the model.

mod list_files;
mod run_shell_cmd;
mod slice_file;
mod splice_file;
mod util;

use std::time::Duration;

use aid_tool::Toolbox;

pub use self::{
    list_files::list_files,
    run_shell_cmd::{DEFAULT_DEADLINE, run_shell_cmd},
    slice_file::slice_file,
    splice_file::splice_file,
    util::{expand_path, first_line},
};

/// All built-in tools. Shell commands without an explicit deadline are
/// killed after `shell_deadline`.
#[must_use]
pub fn toolbox(shell_deadline: Duration) -> Toolbox {
    Toolbox::new()
        .with(list_files())
        .with(slice_file())
        .with(splice_file())
        .with(run_shell_cmd(shell_deadline))
}
