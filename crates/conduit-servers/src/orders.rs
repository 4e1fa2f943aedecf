//! The order server: places stock orders through the Alpaca API.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use std::sync::Arc;

use conduit_config::schema::AlpacaConfig;
use conduit_registry::{
    Arguments, CapabilityHandler, CapabilityRegistry, HandlerFault, HandlerOutput, Invocation,
};
use conduit_types::{ArgumentSpec, CapabilityDescriptor};

use crate::error::ServerError;
use crate::http::ApiClient;

pub const SERVER_NAME: &str = "alpaca-order-server";

/// The JSON body posted to `/orders`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub qty: i64,
    pub side: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub time_in_force: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<f64>,
}

impl OrderRequest {
    /// Normalises call arguments: symbol upper-case, enums lower-case,
    /// and `limit_price` kept only for limit orders.
    pub fn from_arguments(args: &Arguments) -> Result<Self, ServerError> {
        let text = |name: &str| {
            args.get(name)
                .and_then(Value::as_str)
                .ok_or_else(|| ServerError::invalid_argument(name, "expected a string"))
        };
        let symbol = text("symbol")?.to_ascii_uppercase();
        let side = text("side")?.to_ascii_lowercase();
        let order_type = text("order_type")?.to_ascii_lowercase();
        let time_in_force = text("time_in_force")?.to_ascii_lowercase();
        let qty = args
            .get("qty")
            .and_then(whole_number)
            .ok_or_else(|| ServerError::invalid_argument("qty", "expected an integer"))?;
        let limit_price = args
            .get("limit_price")
            .and_then(Value::as_f64)
            .filter(|p| order_type == "limit" && *p != 0.0);

        Ok(Self {
            symbol,
            qty,
            side,
            order_type,
            time_in_force,
            limit_price,
        })
    }

    /// One-line confirmation, e.g. `Order placed: BUY 5 AAPL @ MARKET`.
    pub fn summary(&self) -> String {
        format!(
            "Order placed: {} {} {} @ {}",
            self.side.to_ascii_uppercase(),
            self.qty,
            self.symbol,
            self.order_type.to_ascii_uppercase()
        )
    }
}

/// `5` and `5.0` are both five shares; `5.5` is not a share count.
fn whole_number(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

struct PlaceOrder {
    api: ApiClient,
    key_id: String,
    secret_key: String,
}

#[async_trait]
impl CapabilityHandler for PlaceOrder {
    async fn invoke(&self, inv: Invocation) -> Result<HandlerOutput, HandlerFault> {
        let order = OrderRequest::from_arguments(&inv.arguments)?;
        let headers = [
            ("APCA-API-KEY-ID", self.key_id.as_str()),
            ("APCA-API-SECRET-KEY", self.secret_key.as_str()),
        ];
        self.api
            .post_json("/orders", &headers, &order)
            .await
            .map_err(|e| {
                HandlerFault::failed(format!("Failed to place order for {}: {e}", order.symbol))
            })?;
        info!(symbol = %order.symbol, side = %order.side, qty = order.qty, "order placed");
        Ok(HandlerOutput::Text(order.summary()))
    }
}

/// Registers `place_stock_order`.
pub fn registry(config: &AlpacaConfig) -> Result<CapabilityRegistry, ServerError> {
    let handler = PlaceOrder {
        api: ApiClient::new(&config.base_url)?,
        key_id: config.key_id.clone(),
        secret_key: config.secret_key.clone(),
    };
    let mut builder = CapabilityRegistry::builder();
    builder.register(
        CapabilityDescriptor::tool(
            "place_stock_order",
            "Place a stock trade via the Alpaca paper trading API",
            &[
                ArgumentSpec::required("symbol", "string", ""),
                ArgumentSpec::required("qty", "integer", ""),
                ArgumentSpec::required("side", "string", "").one_of(&["buy", "sell"]),
                ArgumentSpec::required("order_type", "string", "").one_of(&["market", "limit"]),
                ArgumentSpec::required("time_in_force", "string", "").one_of(&["day", "gtc"]),
                ArgumentSpec::optional("limit_price", "number", ""),
            ],
        ),
        Arc::new(handler),
    )?;
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(v: Value) -> Arguments {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn arguments_are_normalised() {
        let order = OrderRequest::from_arguments(&args(json!({
            "symbol": "aapl", "qty": 5, "side": "BUY",
            "order_type": "MARKET", "time_in_force": "day"
        })))
        .expect("order");
        assert_eq!(order.symbol, "AAPL");
        assert_eq!(order.side, "buy");
        assert_eq!(order.order_type, "market");
        assert_eq!(order.time_in_force, "day");
        assert_eq!(order.summary(), "Order placed: BUY 5 AAPL @ MARKET");
    }

    #[test]
    fn limit_price_only_for_limit_orders() {
        let market = OrderRequest::from_arguments(&args(json!({
            "symbol": "msft", "qty": 1, "side": "sell",
            "order_type": "market", "time_in_force": "gtc", "limit_price": 400.5
        })))
        .expect("market");
        assert_eq!(market.limit_price, None);
        let body = serde_json::to_value(&market).expect("ser");
        assert!(body.get("limit_price").is_none());
        assert_eq!(body["type"], "market");

        let limit = OrderRequest::from_arguments(&args(json!({
            "symbol": "msft", "qty": 1, "side": "sell",
            "order_type": "Limit", "time_in_force": "GTC", "limit_price": 400.5
        })))
        .expect("limit");
        assert_eq!(limit.limit_price, Some(400.5));
        assert_eq!(serde_json::to_value(&limit).expect("ser")["limit_price"], 400.5);
    }

    #[test]
    fn whole_float_qty_is_accepted() {
        let order = OrderRequest::from_arguments(&args(json!({
            "symbol": "aapl", "qty": 5.0, "side": "buy",
            "order_type": "market", "time_in_force": "day"
        })))
        .expect("order");
        assert_eq!(order.qty, 5);
    }

    #[test]
    fn fractional_qty_is_rejected() {
        let err = OrderRequest::from_arguments(&args(json!({
            "symbol": "aapl", "qty": 1.5, "side": "buy",
            "order_type": "market", "time_in_force": "day"
        })))
        .expect_err("qty");
        assert_eq!(err.to_string(), "invalid argument 'qty': expected an integer");
    }
}
