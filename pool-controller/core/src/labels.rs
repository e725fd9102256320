//! Pool labels and the typed affinity document.
//!
//! Labels are free-form string pairs except for the `affinity` key, which
//! carries a scheduling affinity document. Ingress validation parses the
//! document strictly as JSON; the read path also tolerates YAML, since
//! operators paste both.

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type Labels = BTreeMap<String, String>;

/// Label key carrying the scheduling affinity document.
pub const AFFINITY_LABEL: &str = "affinity";

/// Validates a label map at ingress. Only the `affinity` key has a
/// recognized schema; unknown keys pass through unchanged.
pub fn validate_labels(labels: &Labels) -> Result<(), ValidationError> {
    if let Some(doc) = labels.get(AFFINITY_LABEL) {
        serde_json::from_str::<Affinity>(doc)
            .map_err(|e| ValidationError::new(format!("invalid affinity label: {}", e)))?;
    }
    Ok(())
}

/// Parses an affinity document. Accepts YAML as well as JSON.
pub fn parse_affinity(doc: &str) -> Result<Affinity, ValidationError> {
    serde_yaml::from_str(doc)
        .map_err(|e| ValidationError::new(format!("invalid affinity label: {}", e)))
}

/// Scheduling affinity for the workloads a pool hosts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Affinity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_affinity: Option<NodeAffinity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_affinity: Option<PodAffinity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_anti_affinity: Option<PodAffinity>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NodeAffinity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_during_scheduling_ignored_during_execution: Option<NodeSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_during_scheduling_ignored_during_execution: Option<Vec<PreferredSchedulingTerm>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NodeSelector {
    pub node_selector_terms: Vec<NodeSelectorTerm>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NodeSelectorTerm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_expressions: Option<Vec<SelectorRequirement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_fields: Option<Vec<SelectorRequirement>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PreferredSchedulingTerm {
    pub weight: i32,
    pub preference: NodeSelectorTerm,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PodAffinity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_during_scheduling_ignored_during_execution: Option<Vec<PodAffinityTerm>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_during_scheduling_ignored_during_execution: Option<Vec<WeightedPodAffinityTerm>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PodAffinityTerm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<LabelSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Vec<String>>,
    pub topology_key: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WeightedPodAffinityTerm {
    pub weight: i32,
    pub pod_affinity_term: PodAffinityTerm,
}

/// Selects pods by label, mirroring the scheduler's selector shape.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LabelSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_expressions: Option<Vec<SelectorRequirement>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SelectorRequirement {
    pub key: String,
    pub operator: SelectorOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
    Gt,
    Lt,
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    #[test]
    fn accepts_labels_without_affinity() {
        let labels = btreemap! {
            "region".to_string() => "us-east".to_string(),
            "tier".to_string() => "backend".to_string(),
        };
        assert!(validate_labels(&labels).is_ok());
    }

    #[test]
    fn parses_affinity_json() {
        let doc = r#"{
            "nodeAffinity": {
                "requiredDuringSchedulingIgnoredDuringExecution": {
                    "nodeSelectorTerms": [{
                        "matchExpressions": [{
                            "key": "kubernetes.io/arch",
                            "operator": "In",
                            "values": ["amd64"]
                        }]
                    }]
                }
            }
        }"#;
        let labels = btreemap! { AFFINITY_LABEL.to_string() => doc.to_string() };
        assert!(validate_labels(&labels).is_ok());

        let affinity = parse_affinity(doc).unwrap();
        let node = affinity.node_affinity.unwrap();
        let terms = node
            .required_during_scheduling_ignored_during_execution
            .unwrap()
            .node_selector_terms;
        assert_eq!(terms.len(), 1);
        let exprs = terms[0].match_expressions.as_ref().unwrap();
        assert_eq!(exprs[0].key, "kubernetes.io/arch");
        assert_eq!(exprs[0].operator, SelectorOperator::In);
    }

    #[test]
    fn parses_affinity_yaml_on_read() {
        let doc = r#"
podAntiAffinity:
  requiredDuringSchedulingIgnoredDuringExecution:
    - topologyKey: kubernetes.io/hostname
      labelSelector:
        matchLabels:
          app: web
"#;
        let affinity = parse_affinity(doc).unwrap();
        let anti = affinity.pod_anti_affinity.unwrap();
        let terms = anti
            .required_during_scheduling_ignored_during_execution
            .unwrap();
        assert_eq!(terms[0].topology_key, "kubernetes.io/hostname");
        let selector = terms[0].label_selector.as_ref().unwrap();
        assert_eq!(
            selector.match_labels.as_ref().unwrap().get("app"),
            Some(&"web".to_string())
        );
    }

    #[test]
    fn rejects_malformed_affinity() {
        let labels = btreemap! { AFFINITY_LABEL.to_string() => "{not json".to_string() };
        assert!(validate_labels(&labels).is_err());
    }

    #[test]
    fn rejects_unknown_affinity_fields() {
        let labels = btreemap! {
            AFFINITY_LABEL.to_string() => r#"{"nodeAfinity": {}}"#.to_string()
        };
        assert!(validate_labels(&labels).is_err());
    }
}
