use crate::error::BrokerError;
use async_trait::async_trait;
use configuration::Gateway;
use core_types::{MinuteBar, OrderRequest, Quote};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub mod error;
pub mod responses;

// --- Public API ---
pub use responses::{ApiErrorResponse, OrderResponse, PositionResponse};

/// The generic, abstract interface for the brokerage gateway.
/// This trait is the contract the reconciliation engine uses, allowing the
/// underlying implementation (live or mock) to be swapped out.
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    /// Fetches the most recent quote for a symbol.
    async fn latest_quote(&self, symbol: &str) -> Result<Quote, BrokerError>;

    /// Fetches the most recent one-minute bar for a symbol.
    async fn latest_minute_bar(&self, symbol: &str) -> Result<MinuteBar, BrokerError>;

    /// Fetches the current position for a symbol. An instrument that has
    /// never been held comes back as `BrokerError::NotFound`.
    async fn position(&self, symbol: &str) -> Result<PositionResponse, BrokerError>;

    /// Lists the most recent open orders, newest first, up to `limit`.
    async fn recent_orders(&self, limit: usize) -> Result<Vec<OrderResponse>, BrokerError>;

    /// Fetches a single order by its brokerage id.
    async fn order(&self, order_id: &str) -> Result<OrderResponse, BrokerError>;

    /// Cancels an order by its brokerage id.
    async fn cancel_order(&self, order_id: &str) -> Result<(), BrokerError>;

    /// Submits a new order and returns the brokerage's acknowledgement.
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResponse, BrokerError>;
}

/// A concrete implementation of the `BrokerGateway` for the Alpaca REST API.
///
/// Alpaca splits trading (orders, positions) and market data (quotes, bars)
/// across two hosts; both are configured explicitly so the paper endpoint is
/// a config value rather than ambient environment state.
#[derive(Clone)]
pub struct AlpacaClient {
    client: reqwest::Client,
    trading_url: String,
    data_url: String,
}

/// The wire shape of `POST /v2/orders`. Quantities and prices go out as
/// strings, matching what the trading API expects.
#[derive(Serialize)]
struct NewOrderBody {
    symbol: String,
    qty: String,
    side: String,
    #[serde(rename = "type")]
    order_type: String,
    time_in_force: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit_price: Option<String>,
    client_order_id: String,
}

impl AlpacaClient {
    pub fn new(gateway: &Gateway) -> Result<Self, BrokerError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "APCA-API-KEY-ID",
            HeaderValue::from_str(&gateway.key_id)
                .map_err(|_| BrokerError::InvalidData("API key is not a valid header".into()))?,
        );
        headers.insert(
            "APCA-API-SECRET-KEY",
            HeaderValue::from_str(&gateway.secret_key)
                .map_err(|_| BrokerError::InvalidData("API secret is not a valid header".into()))?,
        );

        Ok(Self {
            client: reqwest::Client::builder()
                .default_headers(headers)
                .build()?,
            trading_url: gateway.trading_url.trim_end_matches('/').to_string(),
            data_url: gateway.data_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, BrokerError> {
        let response = self.client.get(url).query(query).send().await?;
        Self::handle_response(response).await
    }

    /// Maps a raw HTTP response into either the deserialized body or a
    /// structured `BrokerError` built from Alpaca's error payload.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BrokerError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| BrokerError::Deserialization(e.to_string()))
        } else {
            Err(Self::map_error(status, &text))
        }
    }

    fn map_error(status: StatusCode, body: &str) -> BrokerError {
        let (code, message) = match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(err) => (err.code, err.message),
            Err(_) => (i64::from(status.as_u16()), body.to_string()),
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BrokerError::Unauthorized(message),
            StatusCode::NOT_FOUND => BrokerError::NotFound(message),
            _ => BrokerError::Rejected { code, message },
        }
    }
}

#[async_trait]
impl BrokerGateway for AlpacaClient {
    async fn latest_quote(&self, symbol: &str) -> Result<Quote, BrokerError> {
        let url = format!("{}/v2/stocks/{}/quotes/latest", self.data_url, symbol);
        let response: responses::LatestQuoteResponse = self.get_json(&url, &[]).await?;
        Ok(response.quote.into())
    }

    async fn latest_minute_bar(&self, symbol: &str) -> Result<MinuteBar, BrokerError> {
        let url = format!("{}/v2/stocks/{}/bars/latest", self.data_url, symbol);
        let query = [("timeframe", "1Min".to_string())];
        let response: responses::LatestBarResponse = self.get_json(&url, &query).await?;
        Ok(response.bar.into())
    }

    async fn position(&self, symbol: &str) -> Result<PositionResponse, BrokerError> {
        let url = format!("{}/v2/positions/{}", self.trading_url, symbol);
        self.get_json(&url, &[]).await
    }

    async fn recent_orders(&self, limit: usize) -> Result<Vec<OrderResponse>, BrokerError> {
        let url = format!("{}/v2/orders", self.trading_url);
        let query = [
            ("status", "open".to_string()),
            ("direction", "desc".to_string()),
            ("limit", limit.to_string()),
        ];
        self.get_json(&url, &query).await
    }

    async fn order(&self, order_id: &str) -> Result<OrderResponse, BrokerError> {
        let url = format!("{}/v2/orders/{}", self.trading_url, order_id);
        self.get_json(&url, &[]).await
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), BrokerError> {
        let url = format!("{}/v2/orders/{}", self.trading_url, order_id);
        let response = self.client.delete(&url).send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await?;
            Err(Self::map_error(status, &text))
        }
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResponse, BrokerError> {
        let body = NewOrderBody {
            symbol: order.symbol.clone(),
            qty: order.quantity.to_string(),
            side: match order.side {
                core_types::OrderSide::Buy => "buy".to_string(),
                core_types::OrderSide::Sell => "sell".to_string(),
            },
            order_type: match order.order_type {
                core_types::OrderType::Market => "market".to_string(),
                core_types::OrderType::Limit => "limit".to_string(),
            },
            time_in_force: match order.time_in_force {
                core_types::TimeInForce::Day => "day".to_string(),
                core_types::TimeInForce::Gtc => "gtc".to_string(),
            },
            limit_price: order.limit_price.map(|p| p.to_string()),
            client_order_id: order.client_order_id.to_string(),
        };

        let url = format!("{}/v2/orders", self.trading_url);
        let response = self.client.post(&url).json(&body).send().await?;
        Self::handle_response(response).await
    }
}
