//! Language model providers.
//!
//! A [`Provider`] turns the conversation history into a streaming request
//! against one vendor's API. The response body is decoded by a
//! provider-specific [`Decoder`] into [`Delta`]s, which the shared
//! [`Parser`] folds into canonical [`StreamEvent`]s and the assembled
//! assistant message.

mod error;
mod event;
pub mod provider;
pub mod stream;

pub use error::Error;
pub use event::{StreamEvent, Usage};
pub use provider::{Pricing, Provider, ProviderStream, Sampling};
pub use stream::{Decoded, Decoder, Delta, EventStream, Parser};
