//! Language model interface used for answering and drafting.

pub mod provider;
pub mod types;

pub use provider::ChatModel;
pub use types::{Completion, Message, Role, Usage};
