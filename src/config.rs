//! Allocator configuration.
//!
//! Every knob affects model construction or the backend run only; none of
//! them changes the domain data.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::error::ConfigurationError;
use crate::models::{SessionStream, SessionType};

/// How staff type preferences are enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PreferenceMode {
    /// Minimise hours worked on non-preferred types (lexicographic objective).
    Objective,
    /// Hard constraint: preferred-type hours ≥ threshold × all assigned hours.
    Ratio {
        /// Threshold for types without an explicit entry.
        default_threshold: f64,
        /// Per-type thresholds.
        #[serde(default)]
        thresholds: BTreeMap<SessionType, f64>,
    },
}

impl PreferenceMode {
    /// Ratio mode with one threshold for every type.
    pub fn ratio(threshold: f64) -> Self {
        Self::Ratio {
            default_threshold: threshold,
            thresholds: BTreeMap::new(),
        }
    }

    /// Threshold for `session_type`, or `None` in objective mode.
    pub fn threshold(&self, session_type: SessionType) -> Option<f64> {
        match self {
            Self::Objective => None,
            Self::Ratio {
                default_threshold,
                thresholds,
            } => Some(
                thresholds
                    .get(&session_type)
                    .copied()
                    .unwrap_or(*default_threshold),
            ),
        }
    }
}

impl Default for PreferenceMode {
    fn default() -> Self {
        Self::Objective
    }
}

/// Configuration for [`Allocator`](crate::Allocator).
///
/// # Example
/// ```
/// use u_roster::{AllocatorConfig, PreferenceMode};
///
/// let config = AllocatorConfig::default()
///     .with_new_staff_weight(0.5)
///     .with_preference(PreferenceMode::ratio(0.6))
///     .with_time_budget_secs(120);
/// assert_eq!(config.time_budget().as_secs(), 120);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Hours of new staff are divided by this factor when balancing
    /// workload, so new staff settle at fewer real hours. Domain `(0, 1]`.
    pub new_staff_weight: f64,
    /// Preference enforcement.
    pub preference: PreferenceMode,
    /// Wall-clock budget for the whole search (seconds).
    pub time_budget_secs: u64,
    /// Backend worker threads (`None` = backend default).
    pub threads: Option<u32>,
    /// Relative MIP gap at which the backend may stop a stage.
    pub mip_gap: f64,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            new_staff_weight: 1.0,
            preference: PreferenceMode::Objective,
            time_budget_secs: 3600,
            threads: None,
            mip_gap: 0.0,
        }
    }
}

impl AllocatorConfig {
    /// Sets the seniority weighting factor.
    pub fn with_new_staff_weight(mut self, weight: f64) -> Self {
        self.new_staff_weight = weight;
        self
    }

    /// Sets the preference enforcement mode.
    pub fn with_preference(mut self, preference: PreferenceMode) -> Self {
        self.preference = preference;
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_time_budget_secs(mut self, seconds: u64) -> Self {
        self.time_budget_secs = seconds;
        self
    }

    /// Sets the backend thread count.
    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Sets the relative MIP gap.
    pub fn with_mip_gap(mut self, gap: f64) -> Self {
        self.mip_gap = gap;
        self
    }

    /// Wall-clock budget as a `Duration`.
    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }

    /// Checks the knobs against the streams being solved.
    ///
    /// Ratio thresholds must lie in `[1/k, 1]`, `k` being the number of
    /// distinct session types in `streams`. `1/k` itself is accepted.
    pub fn validate(&self, streams: &[SessionStream]) -> Result<(), ConfigurationError> {
        let weight = self.new_staff_weight;
        if !(weight > 0.0 && weight <= 1.0) {
            return Err(ConfigurationError::SeniorityWeight(weight));
        }

        if let PreferenceMode::Ratio { .. } = self.preference {
            let types: BTreeSet<SessionType> = streams.iter().map(|s| s.session_type).collect();
            let minimum = 1.0 / types.len().max(1) as f64;
            for session_type in types {
                let Some(threshold) = self.preference.threshold(session_type) else {
                    continue;
                };
                if !(threshold >= minimum - 1e-9 && threshold <= 1.0) {
                    return Err(ConfigurationError::PreferenceThreshold {
                        session_type,
                        threshold,
                        minimum,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IsoDay, Timeslot};

    fn streams(types: &[SessionType]) -> Vec<SessionStream> {
        types
            .iter()
            .enumerate()
            .map(|(i, t)| {
                SessionStream::new(i.to_string(), *t, IsoDay::Mon, Timeslot::new(8.0, 9.0))
            })
            .collect()
    }

    #[test]
    fn test_defaults() {
        let c = AllocatorConfig::default();
        assert!((c.new_staff_weight - 1.0).abs() < 1e-10);
        assert_eq!(c.preference, PreferenceMode::Objective);
        assert_eq!(c.time_budget(), Duration::from_secs(3600));
        assert!(c.validate(&[]).is_ok());
    }

    #[test]
    fn test_new_staff_weight_domain() {
        let s = streams(&[SessionType::Practical]);
        assert!(AllocatorConfig::default().with_new_staff_weight(0.5).validate(&s).is_ok());
        assert_eq!(
            AllocatorConfig::default().with_new_staff_weight(0.0).validate(&s),
            Err(ConfigurationError::SeniorityWeight(0.0))
        );
        assert!(AllocatorConfig::default()
            .with_new_staff_weight(1.5)
            .validate(&s)
            .is_err());
        assert!(AllocatorConfig::default()
            .with_new_staff_weight(f64::NAN)
            .validate(&s)
            .is_err());
    }

    #[test]
    fn test_ratio_threshold_lower_bound() {
        let s = streams(&[SessionType::Practical, SessionType::Tutorial]);
        let ok = AllocatorConfig::default().with_preference(PreferenceMode::ratio(0.5));
        assert!(ok.validate(&s).is_ok());

        let low = AllocatorConfig::default().with_preference(PreferenceMode::ratio(0.4));
        match low.validate(&s) {
            Err(ConfigurationError::PreferenceThreshold { minimum, .. }) => {
                assert!((minimum - 0.5).abs() < 1e-10);
            }
            other => panic!("expected threshold error, got {other:?}"),
        }

        let high = AllocatorConfig::default().with_preference(PreferenceMode::ratio(1.1));
        assert!(high.validate(&s).is_err());
    }

    #[test]
    fn test_ratio_threshold_accepts_exact_minimum() {
        let s = streams(&[SessionType::Practical, SessionType::Tutorial, SessionType::Seminar]);
        let exact = AllocatorConfig::default().with_preference(PreferenceMode::ratio(1.0 / 3.0));
        assert!(exact.validate(&s).is_ok());

        let below = AllocatorConfig::default().with_preference(PreferenceMode::ratio(0.33));
        assert!(below.validate(&s).is_err());
    }

    #[test]
    fn test_per_type_threshold_override() {
        let mut thresholds = BTreeMap::new();
        thresholds.insert(SessionType::Tutorial, 0.9);
        let mode = PreferenceMode::Ratio {
            default_threshold: 0.6,
            thresholds,
        };
        assert_eq!(mode.threshold(SessionType::Tutorial), Some(0.9));
        assert_eq!(mode.threshold(SessionType::Practical), Some(0.6));
        assert_eq!(PreferenceMode::Objective.threshold(SessionType::Practical), None);
    }

    #[test]
    fn test_deserialize_partial() {
        let c: AllocatorConfig = serde_json::from_str(
            r#"{
                "new_staff_weight": 0.5,
                "preference": {"mode": "ratio", "default_threshold": 0.7}
            }"#,
        )
        .unwrap();
        assert!((c.new_staff_weight - 0.5).abs() < 1e-10);
        assert_eq!(c.preference.threshold(SessionType::Studio), Some(0.7));
        assert_eq!(c.time_budget_secs, 3600);
    }
}
