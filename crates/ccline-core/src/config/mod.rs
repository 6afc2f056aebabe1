mod settings;

pub use settings::{CacheSettings, SessionLogSettings, Settings, Symbols, Thresholds};
