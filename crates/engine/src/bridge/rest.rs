use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use tracing::debug;
use url::Url;

use common::{
    Bar, Error, MarketData, NewsEvent, OrderReceipt, OrderTicket, Result, Symbol, TradeTerminal,
};

/// Date format the bridge expects for range parameters.
const DATE_FORMAT: &str = "%d/%m/%Y";

/// REST client for the trading terminal bridge. Places orders and serves
/// the economic calendar and candle history.
///
/// Every request carries `X-BRIDGE-APIKEY` and an HMAC-SHA256 signature of
/// the query string (GET) or JSON body (POST) in `X-BRIDGE-SIGNATURE`.
pub struct BridgeClient {
    base_url: Url,
    api_key: String,
    secret: String,
    http: Client,
}

impl BridgeClient {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid bridge URL '{base_url}': {e}")))?;
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            secret: secret.into(),
            http,
        })
    }

    fn timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }

    fn sign(&self, payload: &str) -> Result<String> {
        sign(&self.secret, payload)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("invalid bridge path '{path}': {e}")))
    }

    async fn signed_get(&self, path: &str, params: &[(&str, String)]) -> Result<String> {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .append_pair("timestamp", &Self::timestamp_ms().to_string());
        let signature = self.sign(url.query().unwrap_or_default())?;

        let resp = self
            .http
            .get(url)
            .header("X-BRIDGE-APIKEY", &self.api_key)
            .header("X-BRIDGE-SIGNATURE", signature)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Bridge(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }

    async fn signed_post(&self, path: &str, mut payload: serde_json::Value) -> Result<String> {
        payload["timestamp"] = json!(Self::timestamp_ms());
        let body = payload.to_string();
        let signature = self.sign(&body)?;

        let resp = self
            .http
            .post(self.endpoint(path)?)
            .header("X-BRIDGE-APIKEY", &self.api_key)
            .header("X-BRIDGE-SIGNATURE", signature)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Bridge(format!("HTTP {status}: {text}")));
        }
        Ok(text)
    }
}

/// Hex-encoded HMAC-SHA256 of `payload` under `secret`.
pub fn sign(secret: &str, payload: &str) -> Result<String> {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Config(format!("bad signing key: {e}")))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[async_trait]
impl TradeTerminal for BridgeClient {
    async fn submit_order(&self, ticket: &OrderTicket) -> Result<OrderReceipt> {
        let payload = json!({
            "id": ticket.id,
            "symbol": ticket.symbol,
            "side": ticket.direction,
            "volume": ticket.volume,
            "sl": ticket.stop_loss,
            "tp": ticket.take_profit,
            "deviation": ticket.deviation,
            "magic": ticket.magic,
        });

        debug!(symbol = %ticket.symbol, side = %ticket.direction, "Submitting order to bridge");
        let body = self.signed_post("/orders", payload).await?;

        let resp: OrderResponse =
            serde_json::from_str(&body).map_err(|e| Error::Bridge(e.to_string()))?;

        Ok(OrderReceipt {
            order_id: ticket.id.clone(),
            ticket: resp.ticket,
            symbol: ticket.symbol,
            direction: ticket.direction,
            volume: ticket.volume,
            price: resp.price,
            timestamp: Utc::now(),
        })
    }
}

#[async_trait]
impl MarketData for BridgeClient {
    async fn calendar(&self, symbol: Symbol, from: NaiveDate, to: NaiveDate) -> Result<Vec<NewsEvent>> {
        let params = [
            ("symbol", symbol.code().to_string()),
            ("from", from.format(DATE_FORMAT).to_string()),
            ("to", to.format(DATE_FORMAT).to_string()),
        ];
        let body = self.signed_get("/calendar", &params).await?;
        parse_calendar(symbol, &body)
    }

    async fn history(
        &self,
        symbol: Symbol,
        timeframe: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>> {
        let params = [
            ("symbol", symbol.code().to_string()),
            ("timeframe", timeframe.to_string()),
            ("from", from.format(DATE_FORMAT).to_string()),
            ("to", to.format(DATE_FORMAT).to_string()),
        ];
        let body = self.signed_get("/history", &params).await?;
        parse_history(&body)
    }
}

/// Decode a `/calendar` response. Impact may arrive as a number or a
/// numeric string; anything else is a data error.
pub fn parse_calendar(symbol: Symbol, body: &str) -> Result<Vec<NewsEvent>> {
    let entries: Vec<CalendarEntry> = serde_json::from_str(body)?;
    entries
        .into_iter()
        .map(|entry| {
            let impact = match entry.impact {
                ImpactField::Level(level) => level,
                ImpactField::Text(text) => text.trim().parse().map_err(|_| {
                    Error::Data(format!("{symbol}: impact '{text}' of '{}' is not a level", entry.event))
                })?,
            };
            Ok(NewsEvent {
                symbol,
                name: entry.event,
                scheduled_at: entry.time,
                impact,
            })
        })
        .collect()
}

/// Decode a `/history` response, oldest bar first.
pub fn parse_history(body: &str) -> Result<Vec<Bar>> {
    let mut bars: Vec<Bar> = serde_json::from_str(body)?;
    bars.sort_by_key(|b| b.time);
    Ok(bars)
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct OrderResponse {
    ticket: u64,
    #[serde(default)]
    price: Option<f64>,
}

#[derive(Deserialize)]
struct CalendarEntry {
    event: String,
    time: NaiveDateTime,
    impact: ImpactField,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImpactField {
    Level(u8),
    Text(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_matches_reference_vector() {
        let sig = sign("key", "The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(
            sig,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn calendar_accepts_numeric_and_string_impact() {
        let body = r#"[
            {"event": "Non-Farm Payrolls", "time": "2024-03-08T15:30:00", "impact": 3},
            {"event": "Retail Sales", "time": "2024-03-08T17:00:00", "impact": "2"}
        ]"#;
        let events = parse_calendar(Symbol::Eurusd, body).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "Non-Farm Payrolls");
        assert_eq!(events[0].impact, 3);
        assert_eq!(events[1].impact, 2);
        assert!(events.iter().all(|e| e.symbol == Symbol::Eurusd));
        assert_eq!(
            events[0].scheduled_at,
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap().and_hms_opt(15, 30, 0).unwrap()
        );
    }

    #[test]
    fn calendar_rejects_unreadable_impact() {
        let body = r#"[{"event": "Speech", "time": "2024-03-08T15:30:00", "impact": "high"}]"#;
        assert!(matches!(parse_calendar(Symbol::Xauusd, body), Err(Error::Data(_))));
    }

    #[test]
    fn history_is_sorted_oldest_first_and_volume_optional() {
        let body = r#"[
            {"time": "2024-03-08T01:00:00", "open": 1.1, "high": 1.2, "low": 1.0, "close": 1.15},
            {"time": "2024-03-08T00:30:00", "open": 1.0, "high": 1.1, "low": 0.9, "close": 1.05, "volume": 42}
        ]"#;
        let bars = parse_history(body).unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].time < bars[1].time);
        assert_eq!(bars[0].volume, 42.0);
        assert_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn malformed_history_is_an_error() {
        assert!(parse_history("{\"error\": \"no data\"}").is_err());
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        assert!(matches!(
            BridgeClient::new("not a url", "k", "s"),
            Err(Error::Config(_))
        ));
    }
}
