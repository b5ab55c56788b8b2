//! Execution seam
//!
//! The risk core only emits [`OrderIntent`]s. Venue connectivity lives behind
//! [`ExecutionEngine`]; the paper engine fills intents in-process.

mod paper;
mod types;

pub use paper::PaperEngine;
pub use types::{Fill, OrderId, OrderIntent};

use async_trait::async_trait;

/// Trait for execution engine implementations
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Submit an approved order intent
    async fn submit(&self, intent: &OrderIntent) -> anyhow::Result<Fill>;
    /// Cancel an order
    async fn cancel(&self, id: OrderId) -> anyhow::Result<()>;
    /// Get all fills
    async fn fills(&self) -> anyhow::Result<Vec<Fill>>;
}
