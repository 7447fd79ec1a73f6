pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod logging;
pub mod output;
pub mod pins;
pub mod pulse;
pub mod timeline;
pub mod transport;
pub mod ui;

pub use cli::{validate_device, Args};
pub use config::Settings;
pub use engine::Engine;
pub use error::{GateError, Result};
pub use timeline::{Timeline, TimelineSnapshot};
pub use transport::{SharedTransport, TransportState};
