//! Remote command execution on the bastion host

pub mod ssh;
