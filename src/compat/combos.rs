//! Tag-combination engine
//!
//! Given the wheel filenames each dependency offers, computes which
//! (interpreter, abi, platform) triples every dependency can satisfy, and
//! selects one concrete wheel per dependency for each valid triple. A
//! universal wheel (`py3-none-any`) is compatible with anything any other
//! dependency supports, and is always preferred over a platform-specific
//! wheel of the same dependency.

use crate::error::WheelError;
use crate::tags::{has_universal_tag, parse_wheel_tags, Tag};
use std::collections::{BTreeMap, BTreeSet};

/// Wheel filenames offered per dependency, in offer order
pub type WheelFiles = BTreeMap<String, Vec<String>>;

/// Union the tag sets of every wheel a dependency offers.
pub fn collect_tags_for_deps(
    wheel_files: &WheelFiles,
) -> Result<BTreeMap<String, BTreeSet<Tag>>, WheelError> {
    let mut tags_by_dep = BTreeMap::new();
    for (dep, wheels) in wheel_files {
        let mut dep_tags = BTreeSet::new();
        for filename in wheels {
            dep_tags.extend(parse_wheel_tags(filename)?);
        }
        tags_by_dep.insert(dep.clone(), dep_tags);
    }
    Ok(tags_by_dep)
}

/// Collect the distinct interpreters, ABIs, and platforms seen across all
/// dependencies, each sorted.
pub fn aggregate_tag_components(
    wheel_files: &WheelFiles,
) -> Result<(Vec<String>, Vec<String>, Vec<String>), WheelError> {
    let mut interpreters = BTreeSet::new();
    let mut abis = BTreeSet::new();
    let mut platforms = BTreeSet::new();
    for wheels in wheel_files.values() {
        for filename in wheels {
            for tag in parse_wheel_tags(filename)? {
                interpreters.insert(tag.interpreter);
                abis.insert(tag.abi);
                platforms.insert(tag.platform);
            }
        }
    }
    Ok((
        interpreters.into_iter().collect(),
        abis.into_iter().collect(),
        platforms.into_iter().collect(),
    ))
}

/// Compute the set of (interpreter, abi, platform) triples that every
/// dependency supports.
///
/// When every dependency offers a universal wheel the answer collapses to
/// exactly `{py3-none-any}`. Otherwise each universal dependency is treated
/// as supporting every observed combo before the intersection is taken.
pub fn enumerate_valid_combos(wheel_files: &WheelFiles) -> Result<BTreeSet<Tag>, WheelError> {
    let mut tags_by_dep: BTreeMap<&str, BTreeSet<Tag>> = BTreeMap::new();
    let mut deps_with_universal: BTreeSet<&str> = BTreeSet::new();
    let mut all_combos: BTreeSet<Tag> = BTreeSet::new();

    // First pass: collect tag sets and detect universal wheels
    for (dep, wheels) in wheel_files {
        let mut tag_set = BTreeSet::new();
        for filename in wheels {
            let tags = parse_wheel_tags(filename)?;
            if tags.iter().any(Tag::is_universal) {
                deps_with_universal.insert(dep.as_str());
            }
            tag_set.extend(tags);
        }
        all_combos.extend(tag_set.iter().cloned());
        tags_by_dep.insert(dep.as_str(), tag_set);
    }

    // Universal short-circuit: every dependency ships py3-none-any
    if !tags_by_dep.is_empty()
        && !deps_with_universal.is_empty()
        && tags_by_dep.keys().all(|dep| deps_with_universal.contains(dep))
    {
        return Ok(BTreeSet::from([Tag::universal()]));
    }

    // Second pass: a universal dependency supports every observed combo
    for dep in &deps_with_universal {
        tags_by_dep.insert(*dep, all_combos.clone());
    }

    // Third pass: keep combos every dependency supports
    Ok(all_combos
        .iter()
        .filter(|combo| tags_by_dep.values().all(|tags| tags.contains(*combo)))
        .cloned()
        .collect())
}

/// For each valid combo, select one wheel per dependency.
///
/// A dependency's first universal wheel wins over any combo-specific match;
/// otherwise the first offered wheel whose tag set contains the combo is
/// taken. Combos for which any dependency has no selection are dropped.
/// Keys are formatted `{interpreter}-{abi}-{platform}`.
pub fn compute_per_combo_wheel_map(
    wheel_files: &WheelFiles,
) -> Result<BTreeMap<String, BTreeMap<String, String>>, WheelError> {
    let combos = enumerate_valid_combos(wheel_files)?;
    if combos.is_empty() {
        return Ok(BTreeMap::new());
    }

    let mut combo_map = BTreeMap::new();

    for combo in &combos {
        let mut wheel_map: BTreeMap<String, String> = BTreeMap::new();

        for (dep, wheels) in wheel_files {
            let mut universal = None;
            for filename in wheels {
                if has_universal_tag(filename)? {
                    universal = Some(filename);
                    break;
                }
            }

            if let Some(filename) = universal {
                wheel_map.insert(dep.clone(), filename.clone());
            } else {
                for filename in wheels {
                    if parse_wheel_tags(filename)?.contains(combo) {
                        wheel_map.insert(dep.clone(), filename.clone());
                        break;
                    }
                }
            }
        }

        if wheel_map.len() == wheel_files.len() {
            combo_map.insert(combo.to_string(), wheel_map);
        }
    }

    Ok(combo_map)
}

/// Resolve the compatibility targets to record for a bundle.
///
/// An explicit `"universal"` target wins outright; a user-provided target
/// list passes through untouched; otherwise the defaults are the sorted
/// combo strings computed from the wheels.
pub fn resolve_compatibility_targets(
    wheel_files: &WheelFiles,
    configured_target: Option<&str>,
    configured_targets: &[String],
) -> Result<Vec<String>, WheelError> {
    if configured_target == Some("universal") {
        return Ok(vec!["universal".to_string()]);
    }

    if !configured_targets.is_empty() {
        return Ok(configured_targets.to_vec());
    }

    Ok(enumerate_valid_combos(wheel_files)?
        .iter()
        .map(Tag::to_string)
        .collect())
}
