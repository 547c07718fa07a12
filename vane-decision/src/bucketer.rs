//! Traffic bucketing
//!
//! Maps a bucketing key onto the `[0, 10000)` traffic range with
//! MurmurHash3 (x86, 32-bit) and walks allocation tables to find a slot.
//! Bucket values must match other implementations of the same scheme bit
//! for bit, so the hash key layout (`bucketing id` immediately followed by
//! the parent id, no delimiter) and the constants below are fixed.

use crate::reasons::DecisionReasons;
use std::io::Cursor;
use vane_config::{Experiment, ProjectConfig, TrafficAllocation, Variation};

pub use vane_config::MAX_TRAFFIC_VALUE;

/// MurmurHash3 seed
pub const HASH_SEED: u32 = 1;

/// Size of the 32-bit hash space
pub const MAX_HASH_VALUE: u64 = 1 << 32;

/// Map a key to a bucket value in `[0, MAX_TRAFFIC_VALUE)`.
pub fn generate_bucket_value(key: &str) -> u32 {
    let ratio = hash(key) as f64 / MAX_HASH_VALUE as f64;
    let value = (ratio * f64::from(MAX_TRAFFIC_VALUE)).floor() as i64;

    // Platforms without native unsigned 32-bit hashes can produce a negative
    // value here; fold it back into range the same way they do.
    let value = if value < 0 {
        value + i64::from(MAX_TRAFFIC_VALUE)
    } else {
        value
    };
    value as u32
}

fn hash(key: &str) -> u32 {
    // Reading from an in-memory slice cannot fail.
    murmur3::murmur3_32(&mut Cursor::new(key.as_bytes()), HASH_SEED).unwrap_or_default()
}

/// Find the slot a bucketing id falls into within `allocations`.
///
/// The hash key is `bucketing_id + parent_id`. Returns the entity id of the
/// first slot whose range end exceeds the bucket value; an empty entity id
/// counts as no slot.
pub fn find_bucket<'a>(
    bucketing_id: &str,
    user_id: &str,
    parent_id: &str,
    allocations: &'a [TrafficAllocation],
    reasons: &mut DecisionReasons,
) -> Option<&'a str> {
    let key = format!("{bucketing_id}{parent_id}");
    let bucket_value = generate_bucket_value(&key);
    reasons.info(format!(
        "Assigned bucket {bucket_value} to user \"{user_id}\" with bucketing ID \"{bucketing_id}\"."
    ));

    allocations
        .iter()
        .find(|slot| bucket_value < slot.end_of_range)
        .map(|slot| slot.entity_id.as_str())
        .filter(|entity_id| !entity_id.is_empty())
}

/// Bucket a user into one of an experiment's variations.
///
/// Members of a mutually exclusive group first pass through the group's own
/// allocation; landing on a sibling experiment means no variation here.
pub fn bucket<'a>(
    config: &ProjectConfig,
    experiment: &'a Experiment,
    bucketing_id: &str,
    user_id: &str,
    reasons: &mut DecisionReasons,
) -> Option<&'a Variation> {
    if experiment.key.is_empty() {
        return None;
    }

    if let Some(group_id) = experiment.group_id.as_deref() {
        let Some(group) = config.group(group_id) else {
            reasons.error(format!(
                "Group \"{group_id}\" of experiment \"{}\" is not in the datafile.",
                experiment.key
            ));
            return None;
        };

        if group.is_mutually_exclusive() {
            let slot = find_bucket(
                bucketing_id,
                user_id,
                &group.id,
                &group.traffic_allocation,
                reasons,
            );
            if slot != Some(experiment.id.as_str()) {
                reasons.info(format!(
                    "User \"{user_id}\" is not in experiment \"{}\" of group {}.",
                    experiment.key, group.id
                ));
                return None;
            }
            reasons.info(format!(
                "User \"{user_id}\" is in experiment \"{}\" of group {}.",
                experiment.key, group.id
            ));
        }
    }

    let Some(variation_id) = find_bucket(
        bucketing_id,
        user_id,
        &experiment.id,
        &experiment.traffic_allocation,
        reasons,
    ) else {
        reasons.info(format!(
            "User \"{user_id}\" is in no variation of experiment \"{}\".",
            experiment.key
        ));
        return None;
    };

    match experiment.variation_by_id(variation_id) {
        Some(variation) => {
            reasons.info(format!(
                "User \"{user_id}\" is in variation \"{}\" of experiment \"{}\".",
                variation.key, experiment.key
            ));
            Some(variation)
        }
        None => {
            reasons.error(format!(
                "Bucketed into variation id \"{variation_id}\" which is not in experiment \"{}\".",
                experiment.key
            ));
            None
        }
    }
}
