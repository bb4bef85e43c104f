pub mod config;
pub mod error;
pub mod layout;
pub mod path;
pub mod routes;
pub mod types;

pub use config::{BuildConfig, load_config, parse_config_str};
pub use error::{Error, Result};
pub use routes::RouteService;
pub use types::*;
