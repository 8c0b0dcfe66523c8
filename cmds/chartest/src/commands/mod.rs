use std::path::PathBuf;

use chartest::{RenderOptions, Renderer};
use chartest_assert::OptionsConfig;
use clap::Args;

pub mod check;
pub mod render;
pub mod run;
pub mod util;

/// Flags forwarded to `helm template`.
#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
	/// Helm executable (default: $HELM_BIN, then helm from PATH)
	#[arg(long)]
	pub helm: Option<PathBuf>,

	/// Namespace scope for the release
	#[arg(short = 'n', long)]
	pub namespace: Option<String>,

	/// Kubernetes api versions used for Capabilities.APIVersions
	#[arg(short = 'a', long)]
	pub api_versions: Vec<String>,

	/// Include CRDs in the templated output
	#[arg(long)]
	pub include_crds: bool,

	/// Kubernetes version used for Capabilities.KubeVersion
	#[arg(long)]
	pub kube_version: Option<String>,

	/// Values files, in order
	#[arg(short = 'f', long = "values")]
	pub value_files: Vec<PathBuf>,

	/// Set values (Format: key1=val1,key2=val2)
	#[arg(long)]
	pub set: Vec<String>,

	/// Set STRING values (Format: key1=val1,key2=val2)
	#[arg(long)]
	pub set_string: Vec<String>,

	/// Set values from files (Format: key1=path1,key2=path2)
	#[arg(long)]
	pub set_file: Vec<String>,

	/// Set JSON values (Format: key1=jsonval1,key2=jsonval2)
	#[arg(long)]
	pub set_json: Vec<String>,
}

impl RenderArgs {
	pub fn renderer(&self) -> Renderer {
		match &self.helm {
			Some(helm) => Renderer::new().with_helm_binary(helm),
			None => Renderer::new(),
		}
	}

	pub fn options(&self) -> RenderOptions {
		RenderOptions {
			namespace: self.namespace.clone(),
			api_versions: self.api_versions.clone(),
			include_crds: self.include_crds,
			kube_version: self.kube_version.clone(),
			value_files: self.value_files.clone(),
			set: self.set.clone(),
			set_string: self.set_string.clone(),
			set_file: self.set_file.clone(),
			set_json: self.set_json.clone(),
			values: None,
		}
	}
}

/// How rendered objects are compared against expected ones.
#[derive(Args, Debug, Clone, Default)]
pub struct AssertArgs {
	/// Ignore the app.kubernetes.io/* and helm.sh/chart labels
	#[arg(long)]
	pub ignore_helm_managed_labels: bool,

	/// Ignore a label key, whatever its value
	#[arg(long = "ignore-label")]
	pub ignore_labels: Vec<String>,

	/// Ignore an annotation key, whatever its value
	#[arg(long = "ignore-annotation")]
	pub ignore_annotations: Vec<String>,

	/// Sort lists of named objects by name before comparing
	#[arg(long)]
	pub sort_lists_by_name: bool,

	/// Treat null, empty maps and empty lists as absent
	#[arg(long)]
	pub equate_empty: bool,

	/// Ignore a field, as a JSON pointer (e.g. /spec/replicas)
	#[arg(long = "ignore-field")]
	pub ignore_fields: Vec<String>,
}

impl From<&AssertArgs> for OptionsConfig {
	fn from(args: &AssertArgs) -> Self {
		Self {
			ignore_helm_managed_labels: args.ignore_helm_managed_labels,
			ignore_labels: args.ignore_labels.clone(),
			ignore_annotations: args.ignore_annotations.clone(),
			sort_lists_by_name: args.sort_lists_by_name,
			equate_empty: args.equate_empty,
			ignore_fields: args.ignore_fields.clone(),
		}
	}
}
