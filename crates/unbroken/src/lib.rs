//! unbroken library
//!
//! This module exports the server, push client and ingestion pipeline for
//! use in integration tests and as a library.

pub mod commands;
pub mod config;
pub mod handlers;
pub mod ingest;
pub mod push;
pub mod server;
