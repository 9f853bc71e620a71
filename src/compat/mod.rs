//! Compatibility analysis
//!
//! This module provides:
//! - The tag-combination engine over per-dependency wheel sets
//! - The policy-driven compatibility evaluator
//! - The layered spec model and loader (embedded default + file + inline)
//! - Python version-bound arithmetic shared by the evaluator

pub mod combos;
pub mod evaluator;
pub mod loader;
pub mod pyversion;
pub mod spec;

pub use combos::{
    aggregate_tag_components, collect_tags_for_deps, compute_per_combo_wheel_map,
    enumerate_valid_combos, resolve_compatibility_targets, WheelFiles,
};
pub use evaluator::{CompatibilityEvaluator, DEFAULT_RUNTIME_MAJOR};
pub use loader::{load_effective_spec, DEFAULT_SPEC_PATH};
pub use spec::{CompatibilitySpec, CompatibilitySpecLayer, MergeStrategy};
