//! Command implementations.

pub mod config;
pub mod run;
pub mod schema;
pub mod stats;

pub use self::config::execute_config;
pub use self::run::{execute_run, RunExit};
pub use self::schema::execute_schema;
pub use self::stats::execute_stats;
