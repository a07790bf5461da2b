//! Toolforge tool deployer
//!
//! Provisions component configs for tool accounts and rolls out deployments
//! through the components API.

pub mod app;
pub mod authn;
pub mod components;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod remote;
pub mod storage;
pub mod utils;
