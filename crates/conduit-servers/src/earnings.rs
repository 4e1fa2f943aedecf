//! The stock-earnings server: one resource backed by Alpha Vantage.

use std::sync::Arc;

use async_trait::async_trait;

use conduit_config::schema::AlphaVantageConfig;
use conduit_registry::{CapabilityHandler, CapabilityRegistry, HandlerFault, HandlerOutput, Invocation};
use conduit_types::CapabilityDescriptor;

use crate::error::ServerError;
use crate::http::AlphaVantage;

pub const SERVER_NAME: &str = "stock-earnings-server";

struct Earnings(AlphaVantage);

#[async_trait]
impl CapabilityHandler for Earnings {
    async fn invoke(&self, inv: Invocation) -> Result<HandlerOutput, HandlerFault> {
        let symbol = inv.binding("symbol")?.to_ascii_uppercase();
        let body = self.0.query("EARNINGS", &[("symbol", symbol.as_str())]).await?;
        Ok(HandlerOutput::Text(body))
    }
}

/// Registers `stock://{symbol}/earnings`.
pub fn registry(config: &AlphaVantageConfig) -> Result<CapabilityRegistry, ServerError> {
    let client = AlphaVantage::new(config)?;
    let mut builder = CapabilityRegistry::builder();
    builder.register(
        CapabilityDescriptor::resource(
            "Stock Earnings",
            "Quarterly and annual earnings for a given stock symbol",
            "stock://{symbol}/earnings",
            Some("application/json"),
        ),
        Arc::new(Earnings(client)),
    )?;
    Ok(builder.build())
}
