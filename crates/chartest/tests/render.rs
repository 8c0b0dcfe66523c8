use std::path::PathBuf;

use chartest::{
	k8s_openapi::api::{apps::v1::Deployment, core::v1::Service},
	gvk_of, ObjectKey, RenderError, RenderOptions, Renderer,
};

fn chart_path() -> PathBuf {
	PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../testdata/test-chart")
}

fn helm_installed() -> bool {
	let found = which::which("helm").is_ok();
	if !found {
		eprintln!("helm not found in PATH, skipping");
	}
	found
}

#[test]
fn test_render_default_values() {
	if !helm_installed() {
		return;
	}
	let manifests = Renderer::new()
		.render_templates("foo", chart_path(), &RenderOptions::default())
		.unwrap();

	let mut keys: Vec<String> = manifests.keys().iter().map(ToString::to_string).collect();
	keys.sort();
	assert_eq!(
		keys,
		[
			"deployment.apps/foo-test-chart",
			"service/foo-test-chart",
			"serviceaccount/foo-test-chart",
		]
	);
}

#[test]
fn test_render_typed_access() {
	if !helm_installed() {
		return;
	}
	let options = RenderOptions::builder()
		.set(vec!["replicaCount=3".into()])
		.set_string(vec!["image.tag=1.25".into()])
		.build();
	let manifests = Renderer::new()
		.render_templates("foo", chart_path(), &options)
		.unwrap();

	let key = ObjectKey::new("", "foo-test-chart", &gvk_of::<Deployment>());
	let deployment: Deployment = manifests.load(&key).unwrap().to_resource().unwrap();
	let spec = deployment.spec.unwrap();
	assert_eq!(spec.replicas, Some(3));
	assert_eq!(
		spec.template.spec.unwrap().containers[0].image.as_deref(),
		Some("nginx:1.25")
	);
}

#[test]
fn test_render_value_file_and_stdin_values() {
	if !helm_installed() {
		return;
	}
	let dir = tempfile::tempdir().unwrap();
	let values = dir.path().join("values.yaml");
	std::fs::write(&values, "serviceAccount:\n  create: false\nservice:\n  port: 8080\n").unwrap();

	// stdin values come after value files and win
	let options = RenderOptions::builder()
		.value_files(vec![values])
		.values(serde_json::json!({ "service": { "port": 9090 } }))
		.build();
	let manifests = Renderer::new()
		.render_templates("bar", chart_path(), &options)
		.unwrap();

	assert_eq!(manifests.len(), 2);
	let key = ObjectKey::new("", "bar-test-chart", &gvk_of::<Service>());
	let service: Service = manifests.load(&key).unwrap().to_resource().unwrap();
	assert_eq!(service.spec.unwrap().ports.unwrap()[0].port, 9090);
}

#[test]
fn test_render_missing_chart() {
	if !helm_installed() {
		return;
	}
	let err = Renderer::new()
		.render_templates("foo", chart_path().join("nope"), &RenderOptions::default())
		.unwrap_err();
	match err {
		RenderError::Helm { stderr, .. } => assert!(!stderr.is_empty()),
		other => panic!("unexpected error: {other}"),
	}
}
