// Structural validation of loaded configuration

use crate::entities::{MAX_TRAFFIC_VALUE, TrafficAllocation};
use crate::{ConfigError, ProjectConfig, Result};

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Allocation table rules
pub struct AllocationValidator;

impl AllocationValidator {
    /// Range ends must never decrease and must stay within the traffic cap.
    /// Repeated ends are zero-width slots.
    ///
    /// Referential integrity is not checked here; dangling ids are resolved
    /// as "not found" at decision time.
    pub fn check(table: &[TrafficAllocation], owner: &str) -> Result<()> {
        let mut previous: Option<u32> = None;

        for slot in table {
            if slot.end_of_range > MAX_TRAFFIC_VALUE {
                return Err(ConfigError::validation(format!(
                    "{} allocation end {} exceeds {}",
                    owner, slot.end_of_range, MAX_TRAFFIC_VALUE
                )));
            }
            if previous.is_some_and(|end| slot.end_of_range < end) {
                return Err(ConfigError::validation(format!(
                    "{} allocation ranges must not decrease",
                    owner
                )));
            }
            previous = Some(slot.end_of_range);
        }
        Ok(())
    }
}

impl Validate for ProjectConfig {
    fn validate(&self) -> Result<()> {
        for experiment in self.experiments() {
            AllocationValidator::check(
                &experiment.traffic_allocation,
                &format!("experiment {}", experiment.id),
            )?;
        }
        for group in self.groups() {
            AllocationValidator::check(&group.traffic_allocation, &format!("group {}", group.id))?;
        }
        for rollout in self.rollouts() {
            for rule in &rollout.rules {
                AllocationValidator::check(
                    &rule.traffic_allocation,
                    &format!("rollout rule {}", rule.id),
                )?;
            }
        }
        Ok(())
    }
}
