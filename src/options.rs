//! Monitor configuration and override merging.
//!
//! A [`ViewOptions`] is always complete. Callers supply [`PartialViewOptions`]
//! overrides which are folded over [`DEFAULT_OPTIONS`] with [`build_options`].

use serde::{Deserialize, Serialize};

use crate::error::{ViewError, ViewResult};

/// Complete monitor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewOptions {
    /// Fire at most once per element, then stop observing it.
    pub once: bool,
    /// Minimum visible fraction of the element, in `[0.0, 1.0]`.
    pub threshold: f64,
}

/// Configuration used when no override is given.
pub const DEFAULT_OPTIONS: ViewOptions = ViewOptions {
    once: false,
    threshold: 0.0,
};

impl Default for ViewOptions {
    fn default() -> Self {
        DEFAULT_OPTIONS
    }
}

impl ViewOptions {
    /// Apply one override: present fields replace ours, absent fields are kept.
    #[must_use]
    pub fn merge(self, partial: &PartialViewOptions) -> Self {
        Self {
            once: partial.once.unwrap_or(self.once),
            threshold: partial.threshold.unwrap_or(self.threshold),
        }
    }
}

/// Override for [`ViewOptions`]; every field is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialViewOptions {
    /// Replacement for [`ViewOptions::once`], if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub once: Option<bool>,
    /// Replacement for [`ViewOptions::threshold`], if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl PartialViewOptions {
    /// Override only the once flag.
    #[must_use]
    pub const fn once(once: bool) -> Self {
        Self {
            once: Some(once),
            threshold: None,
        }
    }

    /// Override only the threshold.
    #[must_use]
    pub const fn threshold(threshold: f64) -> Self {
        Self {
            once: None,
            threshold: Some(threshold),
        }
    }

    /// Parse an override from JSON, e.g. `{"once": true}`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidOptions`] for malformed JSON, unknown
    /// fields or mistyped values.
    pub fn from_json(s: &str) -> ViewResult<Self> {
        serde_json::from_str(s).map_err(|e| ViewError::InvalidOptions {
            reason: e.to_string(),
        })
    }
}

/// Fold `overrides` left to right over `base`.
///
/// For each field the last override that sets it wins; with no overrides the
/// base is returned unchanged.
#[must_use]
pub fn build_options(base: ViewOptions, overrides: &[PartialViewOptions]) -> ViewOptions {
    overrides
        .iter()
        .fold(base, |acc, partial| acc.merge(partial))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_overrides_win_per_field() {
        let merged = build_options(
            DEFAULT_OPTIONS,
            &[
                PartialViewOptions::threshold(0.5),
                PartialViewOptions::once(true),
            ],
        );
        assert_eq!(
            merged,
            ViewOptions {
                once: true,
                threshold: 0.5
            }
        );
    }

    #[test]
    fn last_override_of_same_field_wins() {
        let merged = build_options(
            DEFAULT_OPTIONS,
            &[
                PartialViewOptions::threshold(0.25),
                PartialViewOptions::default(),
                PartialViewOptions::threshold(0.75),
            ],
        );
        assert_eq!(merged.threshold, 0.75);
        assert!(!merged.once);
    }

    #[test]
    fn empty_overrides_return_base() {
        let base = ViewOptions {
            once: true,
            threshold: 0.3,
        };
        assert_eq!(build_options(base, &[]), base);
    }

    #[test]
    fn empty_partial_is_identity() {
        let base = ViewOptions {
            once: true,
            threshold: 1.0,
        };
        assert_eq!(build_options(base, &[PartialViewOptions::default()]), base);
    }

    #[test]
    fn default_is_the_constant() {
        assert_eq!(ViewOptions::default(), DEFAULT_OPTIONS);
        assert!(!DEFAULT_OPTIONS.once);
        assert_eq!(DEFAULT_OPTIONS.threshold, 0.0);
    }

    #[test]
    fn partial_from_json_leaves_missing_fields_unset() {
        let partial = PartialViewOptions::from_json(r#"{"once": true}"#).unwrap();
        assert_eq!(partial, PartialViewOptions::once(true));

        let merged = build_options(DEFAULT_OPTIONS, &[partial]);
        assert!(merged.once);
        assert_eq!(merged.threshold, 0.0);
    }

    #[test]
    fn partial_from_json_rejects_unknown_fields() {
        let err = PartialViewOptions::from_json(r#"{"rootMargin": "10px"}"#).unwrap_err();
        assert!(matches!(err, ViewError::InvalidOptions { .. }));
    }

    #[test]
    fn partial_serializes_only_present_fields() {
        let json = serde_json::to_string(&PartialViewOptions::threshold(0.5)).unwrap();
        assert_eq!(json, r#"{"threshold":0.5}"#);
    }
}
