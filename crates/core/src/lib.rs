//! Core library: file store, AI annotation client and the analysis coordinator.

pub mod annotator;
pub mod config;
pub mod coordinator;
pub mod format;
pub mod models;
pub mod store;
