pub mod aggregate;
pub mod config;
pub mod error;
pub mod locator;
pub mod matcher;
pub mod navigate;
pub mod probe;
pub mod report;
pub mod select;
pub mod table;

pub use error::{Error, Result};
