pub mod rest;

pub use rest::BridgeClient;
