pub mod api;
pub mod database;
pub mod error;
pub mod models;
pub mod tools;

pub use error::{ImportError, Result};
