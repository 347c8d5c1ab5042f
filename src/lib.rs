pub mod config;
pub mod core;
pub mod wisdom;

pub use config::Config;
pub use self::core::{EnvironmentalSnapshot, GenerationError, WisdomError};
pub use wisdom::{DebugReport, Mode, WisdomEngine, WisdomStats};
