//! Shared test utilities for patch-warden
//!
//! This module provides temporary workspaces with isolated state directories,
//! payload builders and output predicates for the integration tests.

pub mod assertions;
pub mod fixtures;
pub mod workspace;
