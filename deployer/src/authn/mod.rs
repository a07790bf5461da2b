//! Deploy token handling

pub mod deploy_token;
pub mod token_mngr;
