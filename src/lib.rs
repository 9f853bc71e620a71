//! chub - Package a Python wheel and its dependencies into a single archive
//!
//! This library provides the core functionality for building .chub archives:
//! - Wheel tag parsing and the tag-combination engine
//! - Policy-driven compatibility evaluation with a layered spec
//! - Wheel resolution (local paths and package index) with dependency traversal
//! - Archive assembly with an embedded manifest

pub mod bundle;
pub mod cli;
pub mod compat;
pub mod error;
pub mod output;
pub mod packager;
pub mod progress;
pub mod project;
pub mod resolve;
pub mod tags;
pub mod wheel;
