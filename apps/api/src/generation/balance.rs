//! Balance gate — reports remaining upstream credit so the orchestrator can skip
//! an expensive primary call it knows would fail.
//!
//! Fails open: any transport, status or parse problem yields `None` ("unknown,
//! proceed"), never an error. No caching; each call is a fresh lookup.

use async_trait::async_trait;
use tracing::warn;

use crate::llm_client::LlmClient;

#[async_trait]
pub trait BalanceGate: Send + Sync {
    /// Remaining credit (may be negative), or `None` when unknown.
    async fn check_balance(&self) -> Option<f64>;
}

/// Production gate backed by the provider's credits endpoint.
pub struct CreditsBalanceGate {
    client: LlmClient,
}

impl CreditsBalanceGate {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BalanceGate for CreditsBalanceGate {
    async fn check_balance(&self) -> Option<f64> {
        match self.client.fetch_credits().await {
            Ok(credits) => Some(credits.remaining()),
            Err(e) => {
                warn!("Failed to check upstream balance: {e}");
                None
            }
        }
    }
}

/// A fixed answer. `StaticBalance(None)` disables the gate.
pub struct StaticBalance(pub Option<f64>);

#[async_trait]
impl BalanceGate for StaticBalance {
    async fn check_balance(&self) -> Option<f64> {
        self.0
    }
}
