pub mod audio;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod inference;
pub mod model;
pub mod serve;
pub mod tracking;
pub mod training;
pub mod types;

pub use error::{KwsError, Result};
