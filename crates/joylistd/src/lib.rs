pub mod config;
pub mod inventory;
pub mod logging;
pub mod script;
pub mod session;

pub use config::{load_config, parse_config, Config, ConfigError, CONFIG_FILE_NAME};
pub use session::Session;
