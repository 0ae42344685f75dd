//! Credential verification and the session gate

pub mod credentials;
pub mod gate;
