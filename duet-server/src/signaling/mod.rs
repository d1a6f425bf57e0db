mod router;
mod server;
mod signaling_service;
mod ws_handler;

pub use router::*;
pub use server::*;
pub use signaling_service::*;
pub use ws_handler::*;
