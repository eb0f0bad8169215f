//! Mutation rules.
//!
//! Rules are pure: they read a view and return the fields to replace. A rule
//! that cannot find what it looks for returns nothing.

use super::config::MutationConfig;
use crate::fieldpath::Path;
use crate::materialize::{ResourceView, ANNOTATIONS_PATH, CONTAINERS_PATH};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Mutation is a field a rule wants replaced, and its new value.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub path: Path,
    pub value: Value,
}

impl Mutation {
    pub fn new(path: Path, value: impl Into<Value>) -> Self {
        Mutation {
            path,
            value: value.into(),
        }
    }
}

/// Rule names one semantic change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Overlay the configured annotations onto `metadata.annotations`.
    AnnotationMerge,
    /// Append the configured entry to each container's existing `env` list.
    ContainerEnvAppend,
}

impl Rule {
    /// Runs the rule against a view.
    pub fn evaluate<V: ResourceView + ?Sized>(
        &self,
        view: &V,
        config: &MutationConfig,
    ) -> Vec<Mutation> {
        match self {
            Rule::AnnotationMerge => vec![merge_annotations(view, &config.annotations)],
            Rule::ContainerEnvAppend => append_container_env(view, &config.env.to_value()),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::AnnotationMerge => write!(f, "annotation-merge"),
            Rule::ContainerEnvAppend => write!(f, "container-env-append"),
        }
    }
}

/// Merges `defaults` over the existing annotations and replaces the whole map.
///
/// Absent annotations count as empty. Defaults overwrite existing keys.
pub fn merge_annotations<V: ResourceView + ?Sized>(
    view: &V,
    defaults: &BTreeMap<String, String>,
) -> Mutation {
    let mut merged = view.annotations().unwrap_or_default();
    for (key, value) in defaults {
        merged.set(key.clone(), value.as_str());
    }
    Mutation::new(Path::clone(&ANNOTATIONS_PATH), merged)
}

/// Appends `entry` to the `env` list of every container that has one, and
/// replaces each list at `spec.template.spec.containers[i].env`.
///
/// Containers are addressed by position. A container without a list is
/// skipped rather than given a new one.
pub fn append_container_env<V: ResourceView + ?Sized>(view: &V, entry: &Value) -> Vec<Mutation> {
    view.container_envs()
        .into_iter()
        .enumerate()
        .filter_map(|(i, env)| {
            let mut env = env?;
            env.push(entry.clone());
            Some(Mutation::new(CONTAINERS_PATH.index(i).field("env"), env))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{from_json, Map};

    fn defaults() -> BTreeMap<String, String> {
        BTreeMap::from([("sidecar.istio.io/inject".to_string(), "true".to_string())])
    }

    fn new_env() -> Value {
        from_json(r#"{"name": "NEW_ENV", "value": "new-value"}"#).unwrap()
    }

    #[test]
    fn test_merge_keeps_unrelated_keys() {
        let v = from_json(r#"{"metadata": {"annotations": {"foo": "bar"}}}"#).unwrap();
        let m = merge_annotations(&v, &defaults());
        assert_eq!(m.path.to_string(), ".metadata.annotations");
        assert_eq!(
            m.value,
            from_json(r#"{"foo": "bar", "sidecar.istio.io/inject": "true"}"#).unwrap()
        );
    }

    #[test]
    fn test_merge_defaults_win() {
        let v = from_json(r#"{"metadata": {"annotations": {"sidecar.istio.io/inject": "false"}}}"#)
            .unwrap();
        let m = merge_annotations(&v, &defaults());
        assert_eq!(m.value, from_json(r#"{"sidecar.istio.io/inject": "true"}"#).unwrap());
    }

    #[test]
    fn test_merge_without_annotations() {
        let v = from_json(r#"{"metadata": {"name": "web"}}"#).unwrap();
        let m = merge_annotations(&v, &defaults());
        assert_eq!(m.value, from_json(r#"{"sidecar.istio.io/inject": "true"}"#).unwrap());

        let m = merge_annotations(&v, &BTreeMap::new());
        assert_eq!(m.value, Value::Map(Map::new()));
    }

    #[test]
    fn test_env_append_per_container() {
        let v = from_json(
            r#"{"spec": {"template": {"spec": {"containers": [
                {"name": "a", "env": [{"name": "X", "value": "1"}, {"name": "Y", "value": "2"}]},
                {"name": "b"},
                {"name": "c", "env": []}
            ]}}}}"#,
        )
        .unwrap();

        let mutations = append_container_env(&v, &new_env());
        assert_eq!(mutations.len(), 2);

        assert_eq!(mutations[0].path.to_string(), ".spec.template.spec.containers[0].env");
        let env = mutations[0].value.as_list().unwrap();
        assert_eq!(env.len(), 3);
        assert_eq!(env[0], from_json(r#"{"name": "X", "value": "1"}"#).unwrap());
        assert_eq!(env[1], from_json(r#"{"name": "Y", "value": "2"}"#).unwrap());
        assert_eq!(env[2], new_env());

        assert_eq!(mutations[1].path.to_string(), ".spec.template.spec.containers[2].env");
        assert_eq!(mutations[1].value, Value::List(vec![new_env()]));
    }

    #[test]
    fn test_env_append_without_containers() {
        let v = from_json(r#"{"kind": "Deployment", "metadata": {"name": "web"}}"#).unwrap();
        assert!(append_container_env(&v, &new_env()).is_empty());
    }

    #[test]
    fn test_rule_dispatch() {
        let v = from_json(r#"{"metadata": {}}"#).unwrap();
        let config = MutationConfig::default();
        assert_eq!(Rule::AnnotationMerge.evaluate(&v, &config).len(), 1);
        assert!(Rule::ContainerEnvAppend.evaluate(&v, &config).is_empty());
        assert_eq!(Rule::ContainerEnvAppend.to_string(), "container-env-append");
    }
}
