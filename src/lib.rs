//! Flowmap - process mining core
//!
//! Validates tabular event logs against a canonical schema, narrows them with
//! an ordered filter pipeline, and turns the result into a directly-follows
//! process map or a case-duration distribution.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod filters;
pub mod log;
pub mod process_map;
pub mod service;
pub mod statistics;

pub use error::{FlowmapError, Result};
