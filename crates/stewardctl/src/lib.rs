//! stewardctl - terminal front end for Node Steward

pub mod cli;
pub mod commands;
pub mod dashboard;
pub mod errors;
pub mod logging;
pub mod prompt;
