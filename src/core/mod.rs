pub mod clock;
pub mod error;
pub mod snapshot;
pub mod store;

pub use clock::{day_tag, Clock, ManualClock, SystemClock};
pub use error::{GenerationError, Result, WisdomError};
pub use snapshot::EnvironmentalSnapshot;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
