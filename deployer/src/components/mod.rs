//! Tool component configuration

pub mod config;
