mod connection_handle;
mod hub;
mod hub_command;
mod matchmaker;
mod registry;
mod relay;

pub use connection_handle::*;
pub use hub::*;
pub use hub_command::*;
pub use matchmaker::*;
pub use registry::*;
pub use relay::*;
