//! Batch driver

pub mod options;
pub mod run;
