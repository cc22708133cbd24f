//! Runtime configuration and logging for the e-signature sample binary.

pub mod config;
pub mod logging;
