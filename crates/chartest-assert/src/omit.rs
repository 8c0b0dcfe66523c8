use chartest::Object;

use crate::Options;

/// Labels set by charts following <https://helm.sh/docs/chart_best_practices/labels/>.
pub const HELM_MANAGED_LABELS: [&str; 7] = [
	"app.kubernetes.io/name",
	"app.kubernetes.io/managed-by",
	"app.kubernetes.io/instance",
	"app.kubernetes.io/version",
	"app.kubernetes.io/component",
	"app.kubernetes.io/part-of",
	"helm.sh/chart",
];

/// Remove ignored labels and annotations. Maps left empty are removed.
pub(crate) fn omit_metadata(object: &mut Object, options: &Options) {
	if options.ignore_helm_managed_labels {
		object.remove_labels(HELM_MANAGED_LABELS);
	}
	if !options.ignore_labels.is_empty() {
		object.remove_labels(options.ignore_labels.iter().map(String::as_str));
	}
	if !options.ignore_annotations.is_empty() {
		object.remove_annotations(options.ignore_annotations.iter().map(String::as_str));
	}
}
