//! CLI command implementations.

pub mod build;
pub mod common;
pub mod composite;
pub mod config;
pub mod ingest;
