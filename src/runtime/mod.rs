mod commands;
mod error;
mod log;

pub use commands::Commands;
pub use error::Error;
pub use self::log::*;
