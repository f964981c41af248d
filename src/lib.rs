// ABOUTME: Library root for liftoff - exposes the deployment pipeline for testing.
// ABOUTME: The main binary is in main.rs.

pub mod aws;
pub mod build;
pub mod config;
pub mod deploy;
pub mod descriptor;
pub mod diagnostics;
pub mod docker;
pub mod error;
pub mod output;
pub mod registry;
pub mod source;
pub mod stack;
pub mod types;
pub mod upload;
