pub mod cache;
pub mod config;
pub mod replay;
pub mod service;

pub use cache::{Lookup, SingleFlightCache};
pub use config::InspectorConfig;
pub use replay::ReplayFixture;
pub use service::{router, ApiError, AppState};
