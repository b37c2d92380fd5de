//! Command-line interface for Trialgate

pub mod error;
pub mod process;
pub mod sample;
