pub mod address;
pub mod config;
pub mod harvest;
pub mod resolve;

pub use address::*;
pub use config::*;
pub use harvest::*;
pub use resolve::*;
