//! Rendering charts with `helm template`.

use std::{
	env,
	ffi::{OsStr, OsString},
	io::{Read, Write},
	path::PathBuf,
	process::{Command, Stdio},
	sync::Arc,
	thread,
};

use bon::Builder;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
	error::{RenderError, Result},
	key::ObjectKey,
	manifests::Manifests,
	scheme::{default_scheme, Scheme},
	split::split_manifests,
};

/// Environment variable naming the helm executable, as set for helm plugins.
pub const HELM_BIN_ENV: &str = "HELM_BIN";

/// Flags passed to `helm template`.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderOptions {
	/// `--namespace`
	#[builder(into)]
	pub namespace: Option<String>,
	/// `--api-versions`, once per entry
	#[builder(default)]
	pub api_versions: Vec<String>,
	/// `--include-crds`
	#[builder(default)]
	pub include_crds: bool,
	/// `--kube-version`
	#[builder(into)]
	pub kube_version: Option<String>,
	/// `--values`, once per file
	#[builder(default)]
	pub value_files: Vec<PathBuf>,
	/// `--set`
	#[builder(default)]
	pub set: Vec<String>,
	/// `--set-string`
	#[builder(default)]
	pub set_string: Vec<String>,
	/// `--set-file`
	#[builder(default)]
	pub set_file: Vec<String>,
	/// `--set-json`
	#[builder(default)]
	pub set_json: Vec<String>,
	/// Inline values, piped to helm on stdin. Applied after `value_files`.
	pub values: Option<serde_json::Value>,
}

impl RenderOptions {
	fn template_args(&self, release: &str, chart: &OsStr) -> Vec<OsString> {
		let mut args: Vec<OsString> = vec!["template".into(), release.into(), chart.into()];

		if let Some(namespace) = &self.namespace {
			args.push("--namespace".into());
			args.push(namespace.into());
		}
		for api_version in &self.api_versions {
			args.push("--api-versions".into());
			args.push(api_version.into());
		}
		if self.include_crds {
			args.push("--include-crds".into());
		}
		if let Some(kube_version) = &self.kube_version {
			args.push("--kube-version".into());
			args.push(kube_version.into());
		}
		for file in &self.value_files {
			args.push("--values".into());
			args.push(file.into());
		}
		if self.values.is_some() {
			args.push("--values=-".into());
		}
		for (flag, values) in [
			("--set", &self.set),
			("--set-string", &self.set_string),
			("--set-file", &self.set_file),
			("--set-json", &self.set_json),
		] {
			for value in values {
				args.push(flag.into());
				args.push(value.into());
			}
		}

		args
	}
}

/// Renders charts and splits the output into [`Manifests`].
#[derive(Debug, Clone)]
pub struct Renderer {
	scheme: Arc<Scheme>,
	helm: Option<PathBuf>,
}

impl Default for Renderer {
	fn default() -> Self {
		Self::new()
	}
}

impl Renderer {
	/// A renderer using the default scheme.
	pub fn new() -> Self {
		Self {
			scheme: default_scheme(),
			helm: None,
		}
	}

	/// Decode with `scheme`, e.g. one with custom resources registered.
	pub fn with_scheme(mut self, scheme: Arc<Scheme>) -> Self {
		self.scheme = scheme;
		self
	}

	/// Run this helm executable instead of resolving one.
	pub fn with_helm_binary(mut self, helm: impl Into<PathBuf>) -> Self {
		self.helm = Some(helm.into());
		self
	}

	pub fn scheme(&self) -> &Arc<Scheme> {
		&self.scheme
	}

	/// Explicit binary, then `$HELM_BIN`, then `helm` from `PATH`.
	pub fn helm_binary(&self) -> PathBuf {
		if let Some(helm) = &self.helm {
			return helm.clone();
		}
		env::var_os(HELM_BIN_ENV)
			.filter(|v| !v.is_empty())
			.map_or_else(|| PathBuf::from("helm"), PathBuf::from)
	}

	/// Equivalent of `helm template <release> <chart>` with `options`.
	#[instrument(skip(self, chart, options), fields(chart = %chart.as_ref().to_string_lossy()))]
	pub fn render_templates(
		&self,
		release: &str,
		chart: impl AsRef<OsStr>,
		options: &RenderOptions,
	) -> Result<Manifests, RenderError> {
		let args = options.template_args(release, chart.as_ref());
		let values = options
			.values
			.as_ref()
			.map(serde_json::to_vec)
			.transpose()
			.map_err(RenderError::SerializeValues)?;

		let output = self.run_helm(&args, values.as_deref())?;
		Ok(self.split_manifests(&output)?)
	}

	/// Split one rendered YAML stream into individual objects.
	#[instrument(skip_all)]
	pub fn split_manifests(&self, data: &str) -> Result<Manifests> {
		let manifests = Manifests::with_scheme(Arc::clone(&self.scheme));

		for document in split_manifests(data)? {
			let object = self.scheme.decode(document)?;
			let key = ObjectKey::from_object(&object)?;
			debug!(%key, "decoded manifest");
			manifests.store(key, object);
		}

		Ok(manifests)
	}

	fn run_helm(&self, args: &[OsString], values: Option<&[u8]>) -> Result<String, RenderError> {
		let helm = self.helm_binary();
		debug!(helm = %helm.display(), ?args, "running helm");

		let mut cmd = Command::new(&helm);
		cmd.args(args)
			.stdin(if values.is_some() {
				Stdio::piped()
			} else {
				Stdio::null()
			})
			.stdout(Stdio::piped())
			.stderr(Stdio::piped());

		let mut child = cmd.spawn().map_err(|source| RenderError::Spawn {
			helm: helm.display().to_string(),
			source,
		})?;

		let mut stdout = child
			.stdout
			.take()
			.ok_or(RenderError::Capture("stdout"))?;
		let mut stderr = child
			.stderr
			.take()
			.ok_or(RenderError::Capture("stderr"))?;

		// Drain both pipes while stdin is being written, helm may block on
		// either of them.
		let stdout_handle = thread::spawn(move || {
			let mut buf = Vec::new();
			stdout.read_to_end(&mut buf).map(|_| buf)
		});
		let stderr_handle = thread::spawn(move || {
			let mut buf = Vec::new();
			stderr.read_to_end(&mut buf).map(|_| buf)
		});

		// A helm that fails early closes stdin, so a write error is only
		// reported once its exit status and stderr are known.
		let write_result = match (values, child.stdin.take()) {
			(Some(values), Some(mut stdin)) => stdin.write_all(values),
			_ => Ok(()),
		};

		let status = child.wait().map_err(RenderError::Wait)?;
		let stdout_buf = stdout_handle
			.join()
			.map_err(|_| RenderError::ReaderPanicked)?
			.map_err(RenderError::Wait)?;
		let stderr_buf = stderr_handle
			.join()
			.map_err(|_| RenderError::ReaderPanicked)?
			.map_err(RenderError::Wait)?;

		if !status.success() {
			return Err(RenderError::Helm {
				status,
				stderr: String::from_utf8_lossy(&stderr_buf).trim().to_owned(),
			});
		}
		write_result.map_err(RenderError::WriteValues)?;

		let output = String::from_utf8(stdout_buf).map_err(RenderError::Utf8)?;
		debug!(bytes = output.len(), "helm template finished");
		Ok(output)
	}
}

#[cfg(test)]
mod tests {
	use indoc::indoc;
	use serde_json::json;

	use super::*;
	use crate::error::Error;

	fn args(options: &RenderOptions) -> Vec<String> {
		options
			.template_args("foo", OsStr::new("charts/app"))
			.into_iter()
			.map(|a| a.to_string_lossy().into_owned())
			.collect()
	}

	#[test]
	fn test_template_args_default() {
		assert_eq!(
			args(&RenderOptions::default()),
			["template", "foo", "charts/app"]
		);
	}

	#[test]
	fn test_template_args_all_flags() {
		let options = RenderOptions::builder()
			.namespace("prod")
			.api_versions(vec!["monitoring.coreos.com/v1".into()])
			.include_crds(true)
			.kube_version("1.31.0")
			.value_files(vec!["values-prod.yaml".into()])
			.set(vec!["replicaCount=2".into(), "image.tag=1.0".into()])
			.set_string(vec!["podAnnotations.rev=1".into()])
			.set_file(vec!["config=app.conf".into()])
			.set_json(vec![r#"extra={"a":1}"#.into()])
			.values(json!({ "replicaCount": 3 }))
			.build();

		assert_eq!(
			args(&options),
			[
				"template",
				"foo",
				"charts/app",
				"--namespace",
				"prod",
				"--api-versions",
				"monitoring.coreos.com/v1",
				"--include-crds",
				"--kube-version",
				"1.31.0",
				"--values",
				"values-prod.yaml",
				"--values=-",
				"--set",
				"replicaCount=2",
				"--set",
				"image.tag=1.0",
				"--set-string",
				"podAnnotations.rev=1",
				"--set-file",
				"config=app.conf",
				"--set-json",
				r#"extra={"a":1}"#,
			]
		);
	}

	#[test]
	fn test_explicit_helm_binary_wins() {
		let renderer = Renderer::new().with_helm_binary("/opt/helm/bin/helm");
		assert_eq!(renderer.helm_binary(), PathBuf::from("/opt/helm/bin/helm"));
	}

	#[test]
	fn test_missing_helm_binary() {
		let renderer = Renderer::new().with_helm_binary("/nonexistent/helm");
		let err = renderer
			.render_templates("foo", "chart", &RenderOptions::default())
			.unwrap_err();
		assert!(matches!(err, RenderError::Spawn { .. }), "{err}");
	}

	#[test]
	fn test_split_manifests_keys() {
		let manifests = Renderer::new()
			.split_manifests(indoc! {"
				apiVersion: v1
				kind: Service
				metadata:
				  name: web
				  namespace: default
				---
				apiVersion: example.com/v1
				kind: Widget
				metadata:
				  name: w
			"})
			.unwrap();

		let mut keys: Vec<String> = manifests.keys().iter().map(ToString::to_string).collect();
		keys.sort();
		assert_eq!(keys, ["service/default/web", "widget.example.com/w"]);
	}

	#[test]
	fn test_split_manifests_missing_kind() {
		let err = Renderer::new()
			.split_manifests("apiVersion: v1\nmetadata:\n  name: x\n")
			.unwrap_err();
		assert!(matches!(err, Error::MissingTypeMeta));
	}

	#[cfg(unix)]
	#[test]
	fn test_helm_failure_with_unread_values() {
		use std::os::unix::fs::PermissionsExt;

		let dir = tempfile::tempdir().unwrap();
		let helm = dir.path().join("helm");
		std::fs::write(
			&helm,
			"#!/bin/sh\necho 'Error: chart not found' >&2\nexit 1\n",
		)
		.unwrap();
		std::fs::set_permissions(&helm, std::fs::Permissions::from_mode(0o755)).unwrap();

		// Larger than a pipe buffer, so writing it fails once helm has exited.
		let options = RenderOptions::builder()
			.values(json!({ "blob": "x".repeat(1 << 20) }))
			.build();
		let err = Renderer::new()
			.with_helm_binary(&helm)
			.render_templates("foo", "chart", &options)
			.unwrap_err();

		match err {
			RenderError::Helm { status, stderr } => {
				assert_eq!(status.code(), Some(1));
				assert_eq!(stderr, "Error: chart not found");
			}
			other => panic!("unexpected error: {other}"),
		}
	}
}
