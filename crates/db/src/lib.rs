pub mod connection;
pub mod migrations;
pub mod thread_log;

pub use connection::{connect, connect_with_settings, DbPool};
pub use thread_log::{
    from_config, AirtableThreadLog, InMemoryThreadLog, SqlThreadLog, ThreadLog, ThreadLogError,
};
