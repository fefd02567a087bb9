pub mod category;
pub mod config;
pub mod types;

pub use category::classify_caption;
pub use config::Config;
pub use types::*;
