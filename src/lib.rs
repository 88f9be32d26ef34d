// Library surface for the binary, headless hosts and integration tests.
pub mod achievements;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod loader;
pub mod notify;
pub mod persistence;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod store;
pub mod telemetry;
pub mod time_series;
pub mod typing_policy;
pub mod util;

pub use engine::TypingTest;
pub use error::{Result, TyperushError};
pub use session::LifecycleState;
