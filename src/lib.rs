//! Task board library
//!
//! This module exports the core components for testing and integration.

pub mod auth;
pub mod board;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod hierarchy;
pub mod logging;
pub mod policy;
pub mod server;
pub mod topics;
pub mod types;
pub mod visibility;
