//! Leveled console and file logging for small tools.
//!
//! Writes `[SEVERITY] message` lines to the console (optionally colorized and
//! timestamped) and to a per-day log file, and renders `Serialize` values as
//! text or JSON for inclusion in messages.

pub mod config;
pub mod error;
pub mod layer;
pub mod logger;
pub mod render;
pub mod severity;

pub use config::{LoggerConfig, load_config};
pub use error::LogError;
pub use layer::LoggerLayer;
pub use logger::{Logger, Record, logger};
pub use render::{MAX_DEPTH, render_value, render_value_as_json};
pub use severity::{Palette, RESET, Severity, colorize};
