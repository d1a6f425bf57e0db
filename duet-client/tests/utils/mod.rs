
pub use controller_harness::*;
pub use mock_engine::*;
