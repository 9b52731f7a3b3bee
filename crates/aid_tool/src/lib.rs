//! Tools the model may call.
//!
//! Each tool declares its parameters as explicit [`Parameters`], from which the
//! JSON schema sent to the provider is derived once and memoized. Incoming
//! arguments are validated against the same declaration before the handler
//! runs. Validation and handler failures never escape as Rust errors: they
//! become error [`ToolResult`]s that are handed back to the model.

mod error;
mod parameters;
mod result;
mod runner;
mod tool;
mod toolbox;
mod validate;

pub use error::{ToolError, ValidationError};
pub use parameters::{FunctionSchema, NoParams, ParamType, Parameter, Parameters, ToolParams};
pub use result::{EMPTY_RESULT_TEXT, Image, ResultBuilder, ToolResult};
pub use runner::Runner;
pub use tool::{FuncTool, MISBEHAVED_LABEL, Tool, func};
pub use toolbox::Toolbox;
pub use validate::validate;
