//! Browser `localStorage` backing for persisted view preferences.

use serde_json::Value;
use web_sys::Storage;

use crate::supply_chain::{PreferenceError, PreferenceStore};

/// Preferences stored as JSON text under their key in `window.localStorage`.
pub struct LocalStoragePreferences {
	storage: Storage,
}

fn describe(err: wasm_bindgen::JsValue) -> String {
	err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

impl LocalStoragePreferences {
	pub fn open() -> Result<Self, PreferenceError> {
		let storage = web_sys::window()
			.and_then(|window| window.local_storage().ok().flatten())
			.ok_or(PreferenceError::Unavailable)?;
		Ok(Self { storage })
	}
}

impl PreferenceStore for LocalStoragePreferences {
	fn read(&self, key: &str) -> Result<Option<Value>, PreferenceError> {
		let raw = self.storage.get_item(key).map_err(|err| PreferenceError::Read {
			key: key.to_string(),
			message: describe(err),
		})?;
		raw.map(|text| {
			serde_json::from_str(&text).map_err(|source| PreferenceError::Decode {
				key: key.to_string(),
				source,
			})
		})
		.transpose()
	}

	fn write(&mut self, key: &str, value: Value) -> Result<(), PreferenceError> {
		self.storage
			.set_item(key, &value.to_string())
			.map_err(|err| PreferenceError::Write {
				key: key.to_string(),
				message: describe(err),
			})
	}
}
