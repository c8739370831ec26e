//! Error types for the fallible edges of the core.
//!
//! Graph derivation itself never fails: malformed numbers default to zero and
//! dangling references are skipped. Errors only come from parsing input
//! documents and from talking to the preference store.

use thiserror::Error;

/// Failure to read the supply chain input records.
#[derive(Error, Debug)]
pub enum InputError {
	/// The input document is not valid JSON for [`RiskInputs`](super::RiskInputs).
	#[error("failed to parse supply chain data: {0}")]
	Parse(#[from] serde_json::Error),
}

/// Failure to read or write persisted view preferences.
#[derive(Error, Debug)]
pub enum PreferenceError {
	/// No backing store is available (e.g. storage disabled by the browser).
	#[error("preference storage is unavailable")]
	Unavailable,

	/// The store refused a read.
	#[error("failed to read preference '{key}': {message}")]
	Read {
		/// Preference key
		key: String,
		/// Store-provided description
		message: String,
	},

	/// The store refused a write.
	#[error("failed to write preference '{key}': {message}")]
	Write {
		/// Preference key
		key: String,
		/// Store-provided description
		message: String,
	},

	/// A stored value does not have the expected shape.
	#[error("invalid value stored for preference '{key}'")]
	Decode {
		/// Preference key
		key: String,
		/// Underlying decode error
		#[source]
		source: serde_json::Error,
	},
}
