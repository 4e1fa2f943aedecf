//! The forex server: exchange-rate resource, a simulated order tool,
//! a summary prompt, a sampling-backed advice tool and a roots-aware
//! pair listing.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use conduit_config::schema::AlphaVantageConfig;
use conduit_registry::{
    from_fn, CapabilityHandler, CapabilityRegistry, HandlerFault, HandlerOutput, Invocation,
    SamplingRequest,
};
use conduit_types::{ArgumentSpec, CapabilityDescriptor, PromptArgument};

use crate::error::ServerError;
use crate::http::AlphaVantage;

pub const SERVER_NAME: &str = "alphavantage-forex-server";

/// Pairs offered once the session is scoped to a root.
pub const ALLOWED_PAIRS: [&str; 3] = ["USDJPY", "EURUSD", "GBPUSD"];

/// Splits `USDJPY` into `("USD", "JPY")`, uppercasing both halves.
pub fn split_pair(pair: &str) -> Result<(String, String), ServerError> {
    if pair.len() != 6 || !pair.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(ServerError::InvalidPair(pair.to_string()));
    }
    let (base, quote) = pair.split_at(3);
    Ok((base.to_ascii_uppercase(), quote.to_ascii_uppercase()))
}

/// The acknowledgement for a simulated order. No broker is contacted.
pub fn simulate_order(pair: &str, side: &str, quantity: f64, price: Option<f64>) -> Value {
    let price = price.filter(|p| *p != 0.0);
    json!({
        "status": "accepted",
        "symbol": pair.to_uppercase(),
        "side": side.to_uppercase(),
        "qty": quantity,
        "type": if price.is_some() { "LIMIT" } else { "MARKET" },
        "price": price.map_or_else(|| json!("market"), |p| json!(p)),
    })
}

pub fn summarize_text(data: &str) -> String {
    format!(
        "You are a financial assistant. Summarize the current exchange rate data:\n\n{data}\n\n\
         Explain the base and quote currency, rate, and any interesting trends."
    )
}

pub fn should_buy_text(pair: &str) -> String {
    format!(
        "You are a financial analyst. Should we buy the currency pair {pair}?\n\
         Consider macroeconomic trends and market sentiment. \
         Respond with a clear yes/no and a short justification."
    )
}

struct ExchangeRate(AlphaVantage);

#[async_trait]
impl CapabilityHandler for ExchangeRate {
    async fn invoke(&self, inv: Invocation) -> Result<HandlerOutput, HandlerFault> {
        let (from, to) = split_pair(inv.binding("pair")?)?;
        let body = self
            .0
            .query(
                "CURRENCY_EXCHANGE_RATE",
                &[("from_currency", from.as_str()), ("to_currency", to.as_str())],
            )
            .await?;
        let value: Value = serde_json::from_str(&body).map_err(HandlerFault::other)?;
        Ok(HandlerOutput::Json(value))
    }
}

fn place_order(inv: Invocation) -> Result<HandlerOutput, HandlerFault> {
    let pair = inv.required_str("pair")?;
    let side = inv.required_str("side")?;
    let quantity = inv
        .arguments
        .get("quantity")
        .and_then(Value::as_f64)
        .ok_or_else(|| ServerError::invalid_argument("quantity", "expected a number"))?;
    let price = inv.arguments.get("price").and_then(Value::as_f64);
    Ok(HandlerOutput::Json(simulate_order(pair, side, quantity, price)))
}

fn should_buy(inv: Invocation) -> Result<HandlerOutput, HandlerFault> {
    let prompt = should_buy_text(inv.required_str("pair")?);
    Ok(HandlerOutput::needs_input(SamplingRequest::new(prompt), |reply| {
        Ok(HandlerOutput::Text(reply))
    }))
}

fn list_allowed_pairs(inv: Invocation) -> Result<HandlerOutput, HandlerFault> {
    let scoped = inv.str_arg("root").is_some_and(|r| !r.is_empty())
        || !inv.session.client_roots.is_empty();
    let pairs = if scoped {
        ALLOWED_PAIRS.iter().map(|p| (*p).to_string()).collect()
    } else {
        vec!["ROOT NOT SET".to_string()]
    };
    Ok(HandlerOutput::TextList(pairs))
}

/// Registers the forex capabilities.
pub fn registry(config: &AlphaVantageConfig) -> Result<CapabilityRegistry, ServerError> {
    let client = AlphaVantage::new(config)?;
    let mut builder = CapabilityRegistry::builder();
    builder
        .register(
            CapabilityDescriptor::tool(
                "place_order",
                "Simulate placing a forex order. No live broker is contacted.",
                &[
                    ArgumentSpec::required("pair", "string", "Currency pair, e.g. USDJPY"),
                    ArgumentSpec::required("side", "string", "buy or sell").one_of(&["buy", "sell"]),
                    ArgumentSpec::required("quantity", "number", "Units to trade"),
                    ArgumentSpec::optional("price", "number", "Limit price; omit for a market order"),
                ],
            ),
            from_fn(place_order),
        )?
        .register(
            CapabilityDescriptor::tool(
                "should_buy",
                "Ask the client's model whether it is a good time to buy the given currency pair.",
                &[ArgumentSpec::required("pair", "string", "Currency pair, e.g. EURUSD")],
            ),
            from_fn(should_buy),
        )?
        .register(
            CapabilityDescriptor::tool(
                "list_allowed_pairs",
                "Show the forex pairs allowed in this session.",
                &[ArgumentSpec::optional("root", "string", "Root the session is scoped to")],
            ),
            from_fn(list_allowed_pairs),
        )?
        .register(
            CapabilityDescriptor::resource(
                "get_forex_price",
                "Real-time exchange rate for a forex pair such as USDJPY or EURUSD.",
                "forex://{pair}",
                Some("application/json"),
            ),
            Arc::new(ExchangeRate(client)),
        )?
        .register(
            CapabilityDescriptor::prompt(
                "summarize_forex_price",
                "Summarize exchange rate data for a reader.",
                vec![PromptArgument::new("data", "Exchange rate data to summarize", true)],
            ),
            from_fn(|inv| Ok(HandlerOutput::Text(summarize_text(inv.required_str("data")?)))),
        )?;
    Ok(builder.build())
}
