//! The chat model seam.
//!
//! Backends (hosted APIs, local models) implement [`ChatModel`]; the
//! answering code only ever sees this trait.

use super::types::{Completion, Message};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logs
    fn name(&self) -> &str;

    /// Complete a conversation.
    async fn complete(&self, messages: &[Message]) -> Result<Completion>;
}
