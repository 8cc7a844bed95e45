pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod ipset;
pub mod logging;
pub mod reconcile;
pub mod store;
pub mod waf;

pub use config::Config;
pub use error::{Result, WafError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
