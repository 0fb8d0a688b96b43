mod atomic;
mod config;
mod interface;

pub use atomic::*;
pub use config::*;
pub use interface::*;
