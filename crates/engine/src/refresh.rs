use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use common::clock::{calendar_range, history_range};
use common::{CacheUpdate, Error, MarketData, NewsEvent, Result, ServerClock, Symbol};
use gate::trend_from_bars;

/// Candle granularity used for the trend estimate.
pub const TREND_TIMEFRAME: &str = "M30";

/// Background jobs keeping the relay's market context fresh.
///
/// Each job walks the tracked symbols one by one and posts a
/// [`CacheUpdate`] per symbol. A symbol that keeps failing is skipped for
/// the cycle; no update is posted for it, so its previous entry survives.
pub struct Refresher {
    market: Arc<dyn MarketData>,
    symbols: Vec<Symbol>,
    clock: ServerClock,
    policy: crate::RetryPolicy,
    update_tx: mpsc::Sender<CacheUpdate>,
}

impl Refresher {
    pub fn new(
        market: Arc<dyn MarketData>,
        symbols: Vec<Symbol>,
        clock: ServerClock,
        policy: crate::RetryPolicy,
        update_tx: mpsc::Sender<CacheUpdate>,
    ) -> Self {
        Self {
            market,
            symbols,
            clock,
            policy,
            update_tx,
        }
    }

    /// Refresh news every `period`, starting immediately. Call from `tokio::spawn`.
    pub async fn run_news(self: Arc<Self>, period: Duration) {
        info!(period = ?period, symbols = self.symbols.len(), "News refresh job running");
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.refresh_news().await.is_err() {
                warn!("Cache update channel closed, stopping news refresh");
                return;
            }
        }
    }

    /// Refresh trends every `period`, starting immediately. Call from `tokio::spawn`.
    pub async fn run_trends(self: Arc<Self>, period: Duration) {
        info!(period = ?period, symbols = self.symbols.len(), "Trend refresh job running");
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.refresh_trends().await.is_err() {
                warn!("Cache update channel closed, stopping trend refresh");
                return;
            }
        }
    }

    /// One news cycle over every symbol. Returns how many symbols were
    /// refreshed; errors only if the relay is gone.
    pub async fn refresh_news(&self) -> Result<usize> {
        let (from, to) = calendar_range(self.clock.now().date());
        let mut refreshed = 0;
        for &symbol in &self.symbols {
            let fetched = self
                .policy
                .run("news", || self.fetch_news(symbol, from, to))
                .await;
            match fetched {
                Ok(events) => {
                    self.post(CacheUpdate::News { symbol, events }).await?;
                    refreshed += 1;
                }
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "News refresh abandoned for this cycle");
                }
            }
        }
        info!(refreshed, total = self.symbols.len(), "News refresh cycle done");
        Ok(refreshed)
    }

    /// One trend cycle over every symbol. Same contract as [`Self::refresh_news`].
    pub async fn refresh_trends(&self) -> Result<usize> {
        let (from, to) = history_range(self.clock.now().date());
        let mut refreshed = 0;
        for &symbol in &self.symbols {
            let fetched = self
                .policy
                .run("trend", || self.fetch_trend(symbol, from, to))
                .await;
            match fetched {
                Ok(value) => {
                    info!(symbol = %symbol, trend = value, "Trend refreshed");
                    self.post(CacheUpdate::Trend { symbol, value }).await?;
                    refreshed += 1;
                }
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Trend refresh abandoned for this cycle");
                }
            }
        }
        Ok(refreshed)
    }

    async fn fetch_news(&self, symbol: Symbol, from: NaiveDate, to: NaiveDate) -> Result<Vec<NewsEvent>> {
        let events = self.market.calendar(symbol, from, to).await?;
        Ok(events.into_iter().filter(NewsEvent::is_high_impact).collect())
    }

    async fn fetch_trend(&self, symbol: Symbol, from: NaiveDate, to: NaiveDate) -> Result<f64> {
        let bars = self.market.history(symbol, TREND_TIMEFRAME, from, to).await?;
        trend_from_bars(&bars).ok_or_else(|| {
            Error::Data(format!("{symbol}: {} bars is not enough for a trend", bars.len()))
        })
    }

    async fn post(&self, update: CacheUpdate) -> Result<()> {
        self.update_tx
            .send(update)
            .await
            .map_err(|_| Error::Other("cache update channel closed".into()))
    }
}
