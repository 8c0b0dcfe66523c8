use std::{collections::BTreeMap, io::Write, path::PathBuf};

use chartest::{
	k8s_openapi::{
		api::{
			apps::v1::{Deployment, DeploymentSpec},
			core::v1::{
				Container, ContainerPort, HTTPGetAction, HostPathVolumeSource, PodSpec,
				PodTemplateSpec, Probe, Service, ServiceAccount, ServicePort, ServiceSpec, Volume,
			},
		},
		apimachinery::pkg::{
			apis::meta::v1::{LabelSelector, ObjectMeta},
			util::intstr::IntOrString,
		},
	},
	Manifests, RenderOptions, Renderer,
};
use chartest_assert::{check_contains, contains, AssertError, Options};
use rstest::rstest;

const RELEASE: &str = "foo";
const CHART: &str = "test-chart";

fn chart_path() -> PathBuf {
	PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../testdata/test-chart")
}

fn render(options: &RenderOptions) -> Option<Manifests> {
	if which::which("helm").is_err() {
		eprintln!("helm not found in PATH, skipping");
		return None;
	}
	Some(
		Renderer::new()
			.render_templates(RELEASE, chart_path(), options)
			.expect("render test chart"),
	)
}

fn fullname() -> String {
	format!("{RELEASE}-{CHART}")
}

fn selector_labels() -> BTreeMap<String, String> {
	BTreeMap::from([
		("app.kubernetes.io/name".to_owned(), CHART.to_owned()),
		("app.kubernetes.io/instance".to_owned(), RELEASE.to_owned()),
	])
}

fn meta() -> ObjectMeta {
	ObjectMeta {
		name: Some(fullname()),
		..Default::default()
	}
}

fn http_probe() -> Probe {
	Probe {
		http_get: Some(HTTPGetAction {
			path: Some("/".into()),
			port: IntOrString::String("http".into()),
			..Default::default()
		}),
		..Default::default()
	}
}

fn service_account() -> ServiceAccount {
	ServiceAccount {
		metadata: meta(),
		..Default::default()
	}
}

fn service() -> Service {
	Service {
		metadata: ObjectMeta {
			labels: Some(selector_labels()),
			..meta()
		},
		spec: Some(ServiceSpec {
			type_: Some("ClusterIP".into()),
			ports: Some(vec![ServicePort {
				name: Some("http".into()),
				port: 80,
				protocol: Some("TCP".into()),
				target_port: Some(IntOrString::String("http".into())),
				..Default::default()
			}]),
			selector: Some(selector_labels()),
			..Default::default()
		}),
		..Default::default()
	}
}

fn deployment(replicas: i32, volumes: Option<Vec<Volume>>) -> Deployment {
	Deployment {
		metadata: meta(),
		spec: Some(DeploymentSpec {
			replicas: Some(replicas),
			selector: LabelSelector {
				match_labels: Some(selector_labels()),
				..Default::default()
			},
			template: PodTemplateSpec {
				metadata: Some(ObjectMeta {
					labels: Some(selector_labels()),
					..Default::default()
				}),
				spec: Some(PodSpec {
					service_account_name: Some(fullname()),
					containers: vec![Container {
						name: CHART.into(),
						image: Some("nginx:1.16.0".into()),
						image_pull_policy: Some("IfNotPresent".into()),
						ports: Some(vec![ContainerPort {
							name: Some("http".into()),
							container_port: 80,
							protocol: Some("TCP".into()),
							..Default::default()
						}]),
						liveness_probe: Some(http_probe()),
						readiness_probe: Some(http_probe()),
						..Default::default()
					}],
					volumes,
					..Default::default()
				}),
			},
			..Default::default()
		}),
		..Default::default()
	}
}

fn host_path_volume(name: &str) -> Volume {
	Volume {
		name: name.into(),
		host_path: Some(HostPathVolumeSource {
			path: format!("/{name}"),
			type_: Some("Directory".into()),
		}),
		..Default::default()
	}
}

#[test]
fn test_contains_service_account() {
	let Some(manifests) = render(&RenderOptions::default()) else {
		return;
	};
	assert!(contains(
		&manifests,
		&service_account(),
		&Options::new().ignore_helm_managed_labels(),
	));
}

#[test]
fn test_contains_service_ignoring_some_labels() {
	let Some(manifests) = render(&RenderOptions::default()) else {
		return;
	};
	contains(
		&manifests,
		&service(),
		&Options::new().ignore_label_keys([
			"app.kubernetes.io/managed-by",
			"app.kubernetes.io/version",
			"helm.sh/chart",
		]),
	);
}

#[test]
fn test_service_labels_differ_without_options() {
	let Some(manifests) = render(&RenderOptions::default()) else {
		return;
	};
	let err = check_contains(&manifests, &service(), &Options::new()).unwrap_err();
	assert!(matches!(err, AssertError::Mismatch { .. }), "{err}");
	assert!(err.to_string().contains("test-chart-0.1.0"), "{err}");
}

#[rstest]
#[case::defaults(RenderOptions::default(), 1)]
#[case::set(RenderOptions::builder().set(vec!["replicaCount=2".into()]).build(), 2)]
#[case::inline_values(
	RenderOptions::builder().values(serde_json::json!({ "replicaCount": 4 })).build(),
	4
)]
fn test_contains_deployment(#[case] options: RenderOptions, #[case] replicas: i32) {
	let Some(manifests) = render(&options) else {
		return;
	};
	contains(
		&manifests,
		&deployment(replicas, None),
		&Options::new().ignore_helm_managed_labels(),
	);
}

#[test]
fn test_sort_volumes_from_values_file() {
	let mut values = tempfile::NamedTempFile::new().unwrap();
	write!(
		values,
		"volumes:\n  - name: aaa\n    hostPath:\n      path: /aaa\n      type: Directory\n  - name: bbb\n    hostPath:\n      path: /bbb\n      type: Directory\n"
	)
	.unwrap();

	let options = RenderOptions::builder()
		.value_files(vec![values.path().to_owned()])
		.build();
	let Some(manifests) = render(&options) else {
		return;
	};

	// Reverse of the rendered order
	let expected = deployment(
		1,
		Some(vec![host_path_volume("bbb"), host_path_volume("aaa")]),
	);

	let err = check_contains(
		&manifests,
		&expected,
		&Options::new().ignore_helm_managed_labels(),
	)
	.unwrap_err();
	assert!(matches!(err, AssertError::Mismatch { .. }), "{err}");

	contains(
		&manifests,
		&expected,
		&Options::new()
			.ignore_helm_managed_labels()
			.sort_lists_by_name(),
	);
}

#[test]
fn test_release_name_removed_by_additional_key() {
	let Some(manifests) = render(&RenderOptions::default()) else {
		return;
	};
	let expected = ServiceAccount {
		metadata: ObjectMeta {
			name: Some(CHART.into()),
			..Default::default()
		},
		..Default::default()
	};
	contains(
		&manifests,
		&expected,
		&Options::new()
			.ignore_helm_managed_labels()
			.additional_key(|key| key.clone().with_name(format!("{RELEASE}-{}", key.name()))),
	);
}

#[test]
fn test_typed_transformer() {
	let Some(manifests) = render(&RenderOptions::default()) else {
		return;
	};
	contains(
		&manifests,
		&deployment(5, None),
		&Options::new()
			.ignore_helm_managed_labels()
			.transform_as(|deploy: &mut Deployment| {
				if let Some(spec) = &mut deploy.spec {
					spec.replicas = None;
				}
			}),
	);
}

#[test]
fn test_namespace_flag() {
	let options = RenderOptions::builder().namespace("prod").build();
	let Some(manifests) = render(&options) else {
		return;
	};
	// The chart does not template namespaces, so keys stay cluster-wide.
	assert_eq!(manifests.len(), 3);
	assert!(manifests.keys().iter().all(|key| key.namespace().is_empty()));
}
