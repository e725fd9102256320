//! The pool record.

use crate::labels::{self, Affinity, Labels};
use crate::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Pool names are DNS-label shaped: at most 63 characters of lower case
/// letters, numbers, and dashes, starting with a letter.
const POOL_NAME_REGEX: &str = "^[a-z][a-z0-9-]{0,62}$";

static POOL_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(POOL_NAME_REGEX).expect("should_compile"));

/// A named grouping of compute resources deployments are placed into.
///
/// Deleting a pool leaves its constraints behind; they go dormant until a
/// pool with a matching name exists again.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub name: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioner: Option<String>,
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
}

/// Whether `name` satisfies the pool-name shape.
pub fn valid_name(name: &str) -> bool {
    POOL_NAME.is_match(name)
}

// === impl Pool ===

impl Pool {
    /// Parses the `affinity` label if present. Stored documents may be
    /// YAML or JSON; ingress validation is stricter.
    pub fn affinity(&self) -> Result<Option<Affinity>, ValidationError> {
        match self.labels.get(labels::AFFINITY_LABEL) {
            Some(doc) => labels::parse_affinity(doc).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    #[test]
    fn name_shape() {
        assert!(valid_name("pool1"));
        assert!(valid_name("p"));
        assert!(valid_name("pool-dev-2"));
        assert!(!valid_name(""));
        assert!(!valid_name("Pool1"));
        assert!(!valid_name("1pool"));
        assert!(!valid_name("-pool"));
        assert!(!valid_name("pool_dev"));
    }

    #[test]
    fn name_length_is_capped_at_63() {
        let max = format!("a{}", "b".repeat(62));
        assert_eq!(max.len(), 63);
        assert!(valid_name(&max));
        assert!(!valid_name(&format!("a{}", "b".repeat(63))));
    }

    #[test]
    fn affinity_absent_when_unlabeled() {
        let pool = Pool {
            name: "pool1".to_string(),
            ..Default::default()
        };
        assert_eq!(pool.affinity().unwrap(), None);
    }

    #[test]
    fn affinity_parses_from_labels() {
        let pool = Pool {
            name: "pool1".to_string(),
            labels: btreemap! {
                "affinity".to_string() =>
                    r#"{"podAffinity": {"requiredDuringSchedulingIgnoredDuringExecution":
                        [{"topologyKey": "zone"}]}}"#.to_string(),
            },
            ..Default::default()
        };
        let affinity = pool.affinity().unwrap().unwrap();
        let terms = affinity
            .pod_affinity
            .unwrap()
            .required_during_scheduling_ignored_during_execution
            .unwrap();
        assert_eq!(terms[0].topology_key, "zone");
    }

    #[test]
    fn affinity_surfaces_parse_failures() {
        let pool = Pool {
            name: "pool1".to_string(),
            labels: btreemap! { "affinity".to_string() => ":".to_string() },
            ..Default::default()
        };
        assert!(pool.affinity().is_err());
    }
}
