//! Scan coordinator library.
//!
//! Session lifecycle for security-scan runs and the composite report tree
//! each session produces, persisted through SeaORM.

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod migration;
pub mod models;
pub mod services;
