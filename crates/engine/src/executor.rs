use std::sync::Arc;

use tracing::{error, info};

use common::{OrderReceipt, OrderTicket, RelayConfig, Result, Signal, TradeTerminal};

/// Turns an approved signal into order legs and submits them.
///
/// This is the ONLY component that calls `TradeTerminal::submit_order`.
pub struct OrderExecutor {
    terminal: Arc<dyn TradeTerminal>,
    lot_size: f64,
    deviation: u32,
    magic: u64,
}

/// Result of submitting every leg of one signal.
#[derive(Debug)]
pub struct Execution {
    pub legs: Vec<Result<OrderReceipt>>,
}

impl Execution {
    pub fn failed(&self) -> usize {
        self.legs.iter().filter(|l| l.is_err()).count()
    }
}

impl OrderExecutor {
    pub fn new(terminal: Arc<dyn TradeTerminal>, lot_size: f64, deviation: u32, magic: u64) -> Self {
        Self {
            terminal,
            lot_size,
            deviation,
            magic,
        }
    }

    pub fn from_config(terminal: Arc<dyn TradeTerminal>, cfg: &RelayConfig) -> Self {
        Self::new(terminal, cfg.lot_size, cfg.deviation, cfg.magic)
    }

    /// One ticket per take-profit leg, all sharing direction, stop and size.
    pub fn tickets(&self, signal: &Signal) -> Vec<OrderTicket> {
        signal
            .take_profits
            .iter()
            .map(|&tp| {
                OrderTicket::market(signal.symbol, signal.direction, self.lot_size, signal.stop_loss, tp)
                    .with_deviation(self.deviation)
                    .with_magic(self.magic)
            })
            .collect()
    }

    /// Submit every leg in order. A failed leg does not stop the rest.
    pub async fn execute(&self, signal: &Signal) -> Execution {
        let mut legs = Vec::with_capacity(signal.take_profits.len());
        for ticket in self.tickets(signal) {
            info!(
                symbol = %ticket.symbol,
                direction = %ticket.direction,
                volume = ticket.volume,
                sl = ?ticket.stop_loss,
                tp = ?ticket.take_profit,
                "Submitting order leg"
            );
            let result = self.terminal.submit_order(&ticket).await;
            match &result {
                Ok(receipt) => {
                    info!(symbol = %receipt.symbol, ticket = receipt.ticket, price = ?receipt.price, "Order leg placed");
                }
                Err(e) => {
                    error!(symbol = %ticket.symbol, tp = ?ticket.take_profit, error = %e, "Order leg failed");
                }
            }
            legs.push(result);
        }
        Execution { legs }
    }
}
