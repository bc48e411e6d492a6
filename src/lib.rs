pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod genesis;
pub mod keys;
pub mod permission;
pub mod spec;

pub use error::{GenesisError, Result};
