mod churn;
mod config;
mod hub;
mod signaling;

pub use churn::*;
pub use config::*;
pub use hub::*;
pub use signaling::*;
