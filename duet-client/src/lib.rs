mod call;
mod controller;
mod engine;
mod error;
mod media;
mod signaling;

pub use call::*;
pub use controller::*;
pub use engine::*;
pub use error::*;
pub use media::*;
pub use signaling::*;
