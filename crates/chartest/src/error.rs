use std::{io, process::ExitStatus, string::FromUtf8Error};

use thiserror::Error;

/// Errors produced while building, decoding and addressing objects.
#[derive(Debug, Error)]
pub enum Error {
	#[error("manifest is not an object")]
	NotAnObject,

	#[error("object has no apiVersion or kind")]
	MissingTypeMeta,

	#[error("serializing object")]
	Serialize(#[source] serde_json::Error),

	#[error("{type_name} is not registered in the scheme")]
	NotRegistered { type_name: &'static str },

	#[error("{type_name} is registered under multiple kinds: {kinds}")]
	MultipleKinds {
		type_name: &'static str,
		kinds: String,
	},

	#[error("decoding {kind} as {type_name}")]
	Decode {
		kind: String,
		type_name: &'static str,
		#[source]
		source: serde_json::Error,
	},

	#[error("parsing YAML manifests: {0}")]
	ParseYaml(String),

	#[error("parsing JSON manifests")]
	ParseJson(#[source] serde_json::Error),

	#[error("expected a single manifest, found {0}")]
	DocumentCount(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced while running `helm template`.
#[derive(Debug, Error)]
pub enum RenderError {
	#[error("failed to execute {helm}")]
	Spawn {
		helm: String,
		#[source]
		source: io::Error,
	},

	#[error("serializing values for helm")]
	SerializeValues(#[source] serde_json::Error),

	#[error("failed to write values to helm stdin")]
	WriteValues(#[source] io::Error),

	#[error("failed to capture helm {0}")]
	Capture(&'static str),

	#[error("failed to wait for helm")]
	Wait(#[source] io::Error),

	#[error("helm output reader panicked")]
	ReaderPanicked,

	#[error("helm template failed ({status}): {stderr}")]
	Helm { status: ExitStatus, stderr: String },

	#[error("invalid UTF-8 in helm output")]
	Utf8(#[source] FromUtf8Error),

	#[error("splitting rendered manifests")]
	Manifests(#[from] Error),
}
