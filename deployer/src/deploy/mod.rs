//! Deployment lifecycle

pub mod clock;
pub mod controller;
pub mod fsm;
