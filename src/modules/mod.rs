//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the staging area and the cloud storage adapters.

pub mod storage;
