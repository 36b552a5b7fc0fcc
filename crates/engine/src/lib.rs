pub mod alert;
pub mod bridge;
pub mod executor;
pub mod lifecycle;
pub mod refresh;
pub mod retry;

pub use bridge::BridgeClient;
pub use executor::{Execution, OrderExecutor};
pub use lifecycle::{Relay, RelayHandle};
pub use refresh::Refresher;
pub use retry::RetryPolicy;
