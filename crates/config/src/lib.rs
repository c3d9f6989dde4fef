// Configuration loading

pub mod credentials;
pub mod settings;

pub use credentials::{get_token, open_source, TokenLookup, TokenSource};
pub use settings::{ConfigError, ServerSettings, Settings, SourceSettings};
