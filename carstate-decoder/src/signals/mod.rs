//! Signal definitions and signal sources
//!
//! DBC parsing into a signal database, the [`SignalSource`] interface the
//! decoder reads through, and the two sources shipped with the crate.

pub mod can_source;
pub mod catalog;
pub mod database;
pub mod dbc;
pub mod source;

// Re-export key types for convenience
pub use can_source::CanSignalSource;
pub use catalog::DbcCatalog;
pub use database::{
    ByteOrder, DatabaseStats, MessageDefinition, SignalDatabase, SignalDefinition, ValueType,
};
pub use source::{SignalSnapshot, SignalSource, DEFAULT_SIGNAL_VALUE};
