//! Pipeline module - the modeling stages in execution order

pub mod columns;
pub mod config;
pub mod evaluate;
pub mod explorer;
pub mod loader;
pub mod missing;
pub mod model;
pub mod preprocess;
pub mod split;
pub mod target;

pub use config::*;
pub use evaluate::*;
pub use explorer::*;
pub use loader::*;
pub use missing::*;
pub use model::*;
pub use preprocess::*;
pub use split::*;
pub use target::*;
