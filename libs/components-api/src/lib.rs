//! Wire models for the Toolforge components API

pub mod models;

pub use models::*;
