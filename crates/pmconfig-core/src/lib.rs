pub mod cache;
pub mod entities;
pub mod error;
pub mod filter;
pub mod io;
pub mod merge;
pub mod paths;
pub mod schema;
pub mod settings;
pub mod store;
pub mod sync;
pub mod validate;

pub use error::{ConfigError, Result};
pub use filter::ProjectFilter;
pub use store::{ConfigStore, UpdateOutcome};
