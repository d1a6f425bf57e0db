mod local_stream;
mod speaking;
mod synthetic_capture;

pub use local_stream::*;
pub use speaking::*;
pub use synthetic_capture::*;

use crate::MediaError;
use async_trait::async_trait;

/// Source of the local audio/video tracks offered to the remote side.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn create_local_capture(&self) -> Result<LocalStream, MediaError>;
}
