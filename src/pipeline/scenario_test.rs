//! End-to-end scenarios, run against both materialization strategies.

#[cfg(test)]
mod tests {
    use crate::fieldpath::Path;
    use crate::materialize::{Materializer, TypeRegistry, TypedMaterializer, UntypedMaterializer};
    use crate::mutation::{EnvEntry, MutationConfig};
    use crate::object::{ObjectIdentity, RenderedObject};
    use crate::patch::{apply_patches, PatchOperation};
    use crate::pipeline::{MutateError, Pipeline, Report};
    use crate::value::{from_json, Value};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Shared in-memory sink for formatted log lines.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Runs a batch with a subscriber installed and returns the skip lines.
    fn skip_log_lines<M: Materializer>(materializer: M, objects: &[RenderedObject]) -> Vec<String> {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            Pipeline::new(materializer, &MutationConfig::default())
                .run(objects)
                .unwrap();
        });

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        output
            .lines()
            .filter(|line| line.contains("Skipping object"))
            .map(str::to_string)
            .collect()
    }

    /// Runs a batch through both strategies and checks they agree.
    fn run_both(objects: &[RenderedObject], config: &MutationConfig) -> Report {
        let registry = TypeRegistry::kubernetes();
        let untyped = Pipeline::new(UntypedMaterializer, config).run(objects).unwrap();
        let typed = Pipeline::new(TypedMaterializer::new(&registry), config)
            .run(objects)
            .unwrap();

        let untyped_regs: Vec<_> = untyped.registrations.iter().collect();
        let typed_regs: Vec<_> = typed.registrations.iter().collect();
        assert_eq!(untyped_regs, typed_regs, "strategies disagree on patches");
        assert_eq!(untyped.skipped, typed.skipped, "strategies disagree on skips");
        untyped
    }

    fn workload(kind: &str, name: &str, containers: serde_json::Value) -> RenderedObject {
        let mut doc = json!({
            "apiVersion": "apps/v1",
            "kind": kind,
            "metadata": {"name": name, "namespace": "podinfo"},
            "spec": {
                "selector": {"matchLabels": {"app": name}},
                "template": {
                    "metadata": {"labels": {"app": name}},
                    "spec": {"containers": containers}
                }
            }
        });
        if kind == "StatefulSet" {
            doc["spec"]["serviceName"] = json!(name);
        }
        RenderedObject::new(doc)
    }

    fn annotated(mut object: serde_json::Value, annotations: serde_json::Value) -> RenderedObject {
        object["metadata"]["annotations"] = annotations;
        RenderedObject::new(object)
    }

    fn service(name: &str) -> RenderedObject {
        RenderedObject::new(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {"name": name, "namespace": "podinfo"},
            "spec": {"ports": [{"port": 9898}]}
        }))
    }

    fn path(s: &str) -> Path {
        s.parse().unwrap()
    }

    fn v(json: &str) -> Value {
        from_json(json).unwrap()
    }

    #[test]
    fn test_deployment_scenario_untyped() {
        let object = RenderedObject::new(json!({
            "kind": "Deployment",
            "metadata": {"annotations": {"foo": "bar"}},
            "spec": {"template": {"spec": {"containers": [
                {"name": "a", "env": [{"name": "X", "value": "1"}]}
            ]}}}
        }));

        let report = Pipeline::new(UntypedMaterializer, &MutationConfig::default())
            .run(std::slice::from_ref(&object))
            .unwrap();

        assert_eq!(
            report.registrations.patches_for(&object.identity()),
            &[
                PatchOperation::replace(
                    path("metadata.annotations"),
                    v(r#"{"foo": "bar", "sidecar.istio.io/inject": "true"}"#),
                ),
                PatchOperation::replace(
                    path("spec.template.spec.containers[0].env"),
                    v(r#"[{"name": "X", "value": "1"}, {"name": "NEW_ENV", "value": "new-value"}]"#),
                ),
            ]
        );
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_deployment_scenario_both_strategies() {
        let object = annotated(
            workload(
                "Deployment",
                "podinfo",
                json!([{"name": "a", "image": "podinfo", "env": [{"name": "X", "value": "1"}]}]),
            )
            .document()
            .clone(),
            json!({"foo": "bar"}),
        );

        let report = run_both(std::slice::from_ref(&object), &MutationConfig::default());
        let patches = report.registrations.patches_for(&object.identity());
        assert_eq!(patches.len(), 2);
        assert_eq!(
            serde_json::to_value(patches).unwrap(),
            json!([
                {
                    "op": "replace",
                    "path": "/metadata/annotations",
                    "value": {"foo": "bar", "sidecar.istio.io/inject": "true"}
                },
                {
                    "op": "replace",
                    "path": "/spec/template/spec/containers/0/env",
                    "value": [
                        {"name": "X", "value": "1"},
                        {"name": "NEW_ENV", "value": "new-value"}
                    ]
                }
            ])
        );
    }

    #[test]
    fn test_service_is_skipped() {
        let svc = RenderedObject::new(json!({"kind": "Service"}));
        let report = Pipeline::new(UntypedMaterializer, &MutationConfig::default())
            .run(std::slice::from_ref(&svc))
            .unwrap();

        assert_eq!(report.registrations.patch_count(), 0);
        assert_eq!(report.registrations.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].kind, "Service");
    }

    #[test]
    fn test_one_skip_per_unrecognized_object() {
        let objects = vec![
            service("a"),
            RenderedObject::new(json!({
                "apiVersion": "v1",
                "kind": "ConfigMap",
                "metadata": {"name": "cfg", "namespace": "podinfo"},
                "data": {"k": "v"}
            })),
            workload("Deployment", "web", json!([{"name": "web", "image": "nginx"}])),
            service("b"),
        ];

        let report = run_both(&objects, &MutationConfig::default());
        let skipped: Vec<_> = report.skipped.iter().map(|s| s.kind.as_str()).collect();
        assert_eq!(skipped, ["Service", "ConfigMap", "Service"]);
        for object in [&objects[0], &objects[1], &objects[3]] {
            assert!(report.registrations.patches_for(&object.identity()).is_empty());
        }
    }

    #[test]
    fn test_env_append_per_container_list() {
        let containers = json!([
            {"name": "empty", "image": "busybox", "env": []},
            {"name": "two", "image": "busybox", "env": [
                {"name": "A", "value": "1"},
                {"name": "B", "valueFrom": {"fieldRef": {"fieldPath": "metadata.name"}}}
            ]},
            {"name": "none", "image": "busybox"},
            {"name": "one", "image": "busybox", "env": [{"name": "C", "value": "3"}]}
        ]);
        let object = workload("Deployment", "web", containers.clone());
        let report = run_both(std::slice::from_ref(&object), &MutationConfig::default());

        let env_patches: Vec<_> = report
            .registrations
            .patches_for(&object.identity())
            .iter()
            .filter(|p| p.path != path("metadata.annotations"))
            .collect();
        let targets: Vec<_> = env_patches.iter().map(|p| p.path.to_string()).collect();
        assert_eq!(
            targets,
            [
                ".spec.template.spec.containers[0].env",
                ".spec.template.spec.containers[1].env",
                ".spec.template.spec.containers[3].env",
            ]
        );

        let new_entry = EnvEntry::default().to_value();
        for (patch, index) in env_patches.iter().zip([0usize, 1, 3]) {
            let before = Value::from_serializable(&containers[index]["env"]).unwrap();
            let before = before.as_list().unwrap();
            let after = patch.value.as_list().unwrap();
            assert_eq!(after.len(), before.len() + 1);
            assert_eq!(&after[..before.len()], before.as_slice());
            assert_eq!(after.last(), Some(&new_entry));
        }
    }

    #[test]
    fn test_all_workload_kinds() {
        let objects: Vec<_> = ["Deployment", "StatefulSet", "DaemonSet"]
            .into_iter()
            .map(|kind| {
                workload(
                    kind,
                    &kind.to_lowercase(),
                    json!([{"name": "app", "image": "nginx", "env": []}]),
                )
            })
            .collect();

        let report = run_both(&objects, &MutationConfig::default());
        assert!(report.skipped.is_empty());
        for object in &objects {
            assert_eq!(report.registrations.patches_for(&object.identity()).len(), 2);
        }
    }

    #[test]
    fn test_custom_config() {
        let config = MutationConfig::from_yaml(
            r#"
annotations:
  foo: overridden
  team: payments
env:
  name: REGION
  value: eu-west-1
"#,
        )
        .unwrap();
        let object = annotated(
            workload("Deployment", "web", json!([{"name": "web", "image": "nginx", "env": []}]))
                .document()
                .clone(),
            json!({"foo": "bar", "keep": "me"}),
        );

        let report = run_both(std::slice::from_ref(&object), &config);
        let patches = report.registrations.patches_for(&object.identity());
        assert_eq!(
            patches[0].value,
            v(r#"{"foo": "overridden", "keep": "me", "team": "payments"}"#)
        );
        assert_eq!(patches[1].value, v(r#"[{"name": "REGION", "value": "eu-west-1"}]"#));
    }

    #[test]
    fn test_reapplying_patches_is_stable() {
        let objects = vec![
            annotated(
                workload(
                    "Deployment",
                    "web",
                    json!([
                        {"name": "a", "image": "nginx", "env": [{"name": "X", "value": "1"}]},
                        {"name": "b", "image": "nginx"}
                    ]),
                )
                .document()
                .clone(),
                json!({"foo": "bar"}),
            ),
            workload("DaemonSet", "agent", json!([{"name": "agent", "image": "agent", "env": []}])),
            service("web"),
        ];
        let report = run_both(&objects, &MutationConfig::default());

        for object in &objects {
            let once = report.registrations.apply(object).unwrap();
            let mut twice = once.clone();
            apply_patches(&mut twice, report.registrations.patches_for(&object.identity())).unwrap();
            assert_eq!(once, twice, "{} changed on second application", object.identity());
        }
    }

    #[test]
    fn test_annotation_merge_is_idempotent() {
        let object = annotated(
            workload("Deployment", "web", json!([{"name": "web", "image": "nginx"}]))
                .document()
                .clone(),
            json!({"foo": "bar", "sidecar.istio.io/inject": "false"}),
        );
        let config = MutationConfig::default();
        let first = run_both(std::slice::from_ref(&object), &config);
        let patched = first.registrations.apply(&object).unwrap();

        let again = RenderedObject::new(serde_json::to_value(&patched).unwrap());
        let second = run_both(std::slice::from_ref(&again), &config);

        let annotations = |report: &Report, object: &RenderedObject| {
            report.registrations.patches_for(&object.identity())[0].value.clone()
        };
        assert_eq!(annotations(&first, &object), annotations(&second, &again));
        assert_eq!(
            patched.lookup(&path("metadata.annotations")),
            Some(&annotations(&first, &object))
        );
    }

    #[test]
    fn test_annotations_created_when_absent() {
        let object = workload("Deployment", "web", json!([{"name": "web", "image": "nginx"}]));
        let report = run_both(std::slice::from_ref(&object), &MutationConfig::default());

        let patched = report.registrations.apply(&object).unwrap();
        assert_eq!(
            patched
                .nested_map(&path("metadata.annotations"))
                .and_then(|m| m.get("sidecar.istio.io/inject")),
            Some(&Value::from("true"))
        );
    }

    #[test]
    fn test_typed_decode_error_aborts_run() {
        let registry = TypeRegistry::kubernetes();
        let objects = vec![
            service("before"),
            workload("Deployment", "broken", json!({"not": "a list"})),
            workload("Deployment", "after", json!([{"name": "a", "image": "nginx"}])),
        ];

        let err = Pipeline::new(TypedMaterializer::new(&registry), &MutationConfig::default())
            .run(&objects)
            .unwrap_err();
        assert!(matches!(err, MutateError::Decode { .. }));
        assert_eq!(
            err.identity(),
            &ObjectIdentity::new("Deployment", "broken", Some("podinfo".into()))
        );
        assert!(err.to_string().contains("Deployment podinfo/broken"));
    }

    #[test]
    fn test_untyped_tolerates_malformed_containers() {
        let object = workload("Deployment", "broken", json!({"not": "a list"}));
        let report = Pipeline::new(UntypedMaterializer, &MutationConfig::default())
            .run(std::slice::from_ref(&object))
            .unwrap();

        let patches = report.registrations.patches_for(&object.identity());
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].path, path("metadata.annotations"));
    }

    #[test]
    fn test_typed_skips_unregistered_group_version() {
        let registry = TypeRegistry::kubernetes();
        let object = RenderedObject::new(json!({
            "apiVersion": "extensions/v1beta1",
            "kind": "Deployment",
            "metadata": {"name": "legacy"}
        }));

        let report = Pipeline::new(TypedMaterializer::new(&registry), &MutationConfig::default())
            .run(std::slice::from_ref(&object))
            .unwrap();
        assert_eq!(report.registrations.patch_count(), 0);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].kind, "Deployment");
    }

    #[test]
    fn test_env_entries_kept_verbatim() {
        let containers = json!([
            {"name": "a", "image": "nginx", "env": [
                {"name": "X", "value": "1", "futureField": "keep"},
                {"name": "Y", "value": null},
                {"name": "Z", "valueFrom": {"secretKeyRef": {"name": "s", "key": "k", "extra": 1}}}
            ]}
        ]);
        let object = workload("Deployment", "web", containers.clone());
        let report = run_both(std::slice::from_ref(&object), &MutationConfig::default());

        let patches = report.registrations.patches_for(&object.identity());
        assert_eq!(patches[1].path, path("spec.template.spec.containers[0].env"));
        let mut expected = Value::from_serializable(&containers[0]["env"]).unwrap();
        if let Value::List(entries) = &mut expected {
            entries.push(EnvEntry::default().to_value());
        }
        assert_eq!(patches[1].value, expected);
    }

    #[test]
    fn test_skip_logged_once_per_object() {
        let objects = vec![
            service("a"),
            workload("Deployment", "web", json!([{"name": "web", "image": "nginx"}])),
            service("b"),
        ];
        let registry = TypeRegistry::kubernetes();

        for lines in [
            skip_log_lines(UntypedMaterializer, &objects),
            skip_log_lines(TypedMaterializer::new(&registry), &objects),
        ] {
            assert_eq!(lines.len(), 2, "{lines:?}");
            assert!(lines.iter().all(|l| l.contains("kind=Service")), "{lines:?}");
        }

        let deployments = [workload("Deployment", "web", json!([{"name": "web", "image": "nginx"}]))];
        assert!(skip_log_lines(UntypedMaterializer, &deployments).is_empty());
    }

    #[test]
    fn test_duplicate_identity_aborts_run() {
        let nameless = || {
            RenderedObject::new(json!({
                "kind": "Deployment",
                "spec": {"template": {"spec": {"containers": [
                    {"name": "a", "env": [{"name": "X", "value": "1"}]}
                ]}}}
            }))
        };
        let objects = vec![nameless(), nameless()];

        let err = Pipeline::new(UntypedMaterializer, &MutationConfig::default())
            .run(&objects)
            .unwrap_err();
        assert!(matches!(err, MutateError::DuplicateIdentity { .. }));
        assert_eq!(err.identity(), &objects[0].identity());

        let services = vec![service("web"), service("web")];
        let err = Pipeline::new(UntypedMaterializer, &MutationConfig::default())
            .run(&services)
            .unwrap_err();
        assert!(err.to_string().contains("Service podinfo/web"));
    }
}
