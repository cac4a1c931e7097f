// ABOUTME: Library root for appdeploy - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod cloud;
pub mod commands;
pub mod config;
pub mod deploy;
pub mod error;
pub mod fileset;
pub mod ftp;
pub mod output;
pub mod pipeline;
