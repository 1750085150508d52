//! Report module - terminal tables, run summary, and JSON export

pub mod export;
pub mod summary;
pub mod tables;

pub use export::*;
pub use summary::*;
pub use tables::*;
