use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use common::{Error, OrderReceipt, OrderTicket, Result, TradeTerminal};

/// Dry-run terminal for paper trading.
///
/// Every accepted leg is recorded and confirmed with a synthetic ticket.
/// Nothing ever reaches the bridge.
pub struct PaperTerminal {
    /// Accepted order legs, oldest first.
    orders: Arc<RwLock<Vec<OrderTicket>>>,
    next_ticket: AtomicU64,
}

impl Default for PaperTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl PaperTerminal {
    pub fn new() -> Self {
        info!("PaperTerminal initialized");
        Self {
            orders: Arc::new(RwLock::new(Vec::new())),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Snapshot of every leg accepted so far.
    pub async fn orders(&self) -> Vec<OrderTicket> {
        self.orders.read().await.clone()
    }
}

#[async_trait]
impl TradeTerminal for PaperTerminal {
    async fn submit_order(&self, ticket: &OrderTicket) -> Result<OrderReceipt> {
        if ticket.volume.is_nan() || ticket.volume <= 0.0 {
            return Err(Error::Bridge(format!(
                "PaperTerminal rejects volume {} for {}",
                ticket.volume, ticket.symbol
            )));
        }

        let number = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        info!(
            ticket = number,
            symbol = %ticket.symbol,
            direction = %ticket.direction,
            volume = ticket.volume,
            sl = ?ticket.stop_loss,
            tp = ?ticket.take_profit,
            "Paper order recorded"
        );
        self.orders.write().await.push(ticket.clone());

        Ok(OrderReceipt {
            order_id: ticket.id.clone(),
            ticket: number,
            symbol: ticket.symbol,
            direction: ticket.direction,
            volume: ticket.volume,
            price: None,
            timestamp: Utc::now(),
        })
    }
}
