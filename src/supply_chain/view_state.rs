//! Persisted layout state: saved on teardown, restored on first stabilization.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::PreferenceError;
use super::model::Point;

/// Preference key holding the zoom scale.
pub const SCALE_KEY: &str = "viz.hierarchical.scale";
/// Preference key holding the viewport center.
pub const POSITION_KEY: &str = "viz.hierarchical.position";
/// Preference key holding the node id → position map.
pub const NODES_KEY: &str = "viz.hierarchical.nodes";

/// Key-value settings store.
pub trait PreferenceStore {
	/// Stored value of `key`, or `None` when never written.
	fn read(&self, key: &str) -> Result<Option<Value>, PreferenceError>;
	/// Replace the value of `key`.
	fn write(&mut self, key: &str, value: Value) -> Result<(), PreferenceError>;
}

/// Store backed by an in-process map, for hosts without browser storage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryPreferences {
	values: HashMap<String, Value>,
}

impl MemoryPreferences {
	/// Empty store.
	pub fn new() -> Self {
		Self::default()
	}
}

impl PreferenceStore for MemoryPreferences {
	fn read(&self, key: &str) -> Result<Option<Value>, PreferenceError> {
		Ok(self.values.get(key).cloned())
	}

	fn write(&mut self, key: &str, value: Value) -> Result<(), PreferenceError> {
		self.values.insert(key.to_string(), value);
		Ok(())
	}
}

/// Anything that can report the live layout.
pub trait LayoutSource {
	/// Node id → position in graph space.
	fn positions(&self) -> BTreeMap<String, Point>;
	/// Zoom factor.
	fn scale(&self) -> f64;
	/// Graph-space point at the center of the viewport.
	fn view_position(&self) -> Point;
}

/// A snapshot of the live layout.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewState {
	/// Node id → position.
	pub positions: BTreeMap<String, Point>,
	/// Zoom factor.
	pub scale: f64,
	/// Graph-space center of the viewport.
	pub viewport: Point,
}

impl ViewState {
	/// Snapshot `layout` as it is now.
	pub fn capture(layout: &impl LayoutSource) -> Self {
		Self {
			positions: layout.positions(),
			scale: layout.scale(),
			viewport: layout.view_position(),
		}
	}
}

impl LayoutSource for ViewState {
	fn positions(&self) -> BTreeMap<String, Point> {
		self.positions.clone()
	}

	fn scale(&self) -> f64 {
		self.scale
	}

	fn view_position(&self) -> Point {
		self.viewport
	}
}

/// The persisted view state as read back; every part is optional.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewPreferences {
	/// Saved zoom factor.
	pub scale: Option<f64>,
	/// Saved viewport center.
	pub position: Option<Point>,
	/// Saved node positions.
	pub nodes: HashMap<String, Point>,
}

impl ViewPreferences {
	/// Read all three keys. Anything unreadable is treated as absent.
	pub fn load(store: &impl PreferenceStore) -> Self {
		Self {
			scale: read_key::<f64>(store, SCALE_KEY).filter(|s| s.is_finite() && *s > 0.0),
			position: read_key(store, POSITION_KEY),
			nodes: read_key(store, NODES_KEY).unwrap_or_default(),
		}
	}
}

fn read_key<T: DeserializeOwned>(store: &impl PreferenceStore, key: &str) -> Option<T> {
	let decoded = store.read(key).and_then(|value| {
		value
			.map(|v| {
				serde_json::from_value(v).map_err(|source| PreferenceError::Decode {
					key: key.to_string(),
					source,
				})
			})
			.transpose()
	});
	match decoded {
		Ok(value) => value,
		Err(err) => {
			warn!("ignoring stored view preference: {err}");
			None
		}
	}
}

/// Write the layout snapshot to the store.
///
/// Nothing is written unless the project, product and supplier lists are all
/// populated (`inputs_ready`); returns whether a write happened.
pub fn persist_view_state(
	inputs_ready: bool,
	layout: &impl LayoutSource,
	store: &mut impl PreferenceStore,
) -> Result<bool, PreferenceError> {
	if !inputs_ready {
		debug!("skipping view state sync: inputs incomplete");
		return Ok(false);
	}
	let state = ViewState::capture(layout);
	store.write(SCALE_KEY, Value::from(state.scale))?;
	store.write(POSITION_KEY, point_value(state.viewport))?;
	let nodes = state
		.positions
		.into_iter()
		.map(|(id, p)| (id, point_value(p)))
		.collect::<serde_json::Map<_, _>>();
	store.write(NODES_KEY, Value::Object(nodes))?;
	debug!("view state synced");
	Ok(true)
}

fn point_value(point: Point) -> Value {
	serde_json::json!({ "x": point.x, "y": point.y })
}

/// Viewport to apply once the first layout has settled.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewRestore {
	/// Zoom to apply.
	pub scale: Option<f64>,
	/// Viewport center to apply.
	pub position: Option<Point>,
}

/// One-shot restore bookkeeping for a mounted graph.
#[derive(Clone, Debug)]
pub struct ViewStateSync {
	first_draw: bool,
}

impl Default for ViewStateSync {
	fn default() -> Self {
		Self { first_draw: true }
	}
}

impl ViewStateSync {
	/// Bookkeeping for a graph that has not settled yet.
	pub fn new() -> Self {
		Self::default()
	}

	/// The persisted viewport on the first stabilization, `None` afterwards.
	pub fn on_stabilized(&mut self, preferences: &ViewPreferences) -> Option<ViewRestore> {
		if !self.first_draw {
			return None;
		}
		self.first_draw = false;
		Some(ViewRestore {
			scale: preferences.scale,
			position: preferences.position,
		})
	}

	/// Whether a newly started stabilization must be stopped right away.
	pub fn on_start_stabilizing(&self) -> bool {
		!self.first_draw
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn snapshot() -> ViewState {
		ViewState {
			positions: BTreeMap::from([
				("P_org".to_string(), Point::new(0.0, 0.0)),
				("PR_x".to_string(), Point::new(150.0, 1200.0)),
			]),
			scale: 0.4,
			viewport: Point::new(75.0, 600.0),
		}
	}

	#[test]
	fn round_trip_restores_on_first_stabilization_only() {
		let mut store = MemoryPreferences::new();
		assert!(persist_view_state(true, &snapshot(), &mut store).unwrap());

		let preferences = ViewPreferences::load(&store);
		assert_eq!(preferences.nodes["PR_x"], Point::new(150.0, 1200.0));
		assert_eq!(preferences.nodes.len(), 2);

		let mut sync = ViewStateSync::new();
		assert!(!sync.on_start_stabilizing());
		assert_eq!(
			sync.on_stabilized(&preferences),
			Some(ViewRestore {
				scale: Some(0.4),
				position: Some(Point::new(75.0, 600.0)),
			})
		);
		assert_eq!(sync.on_stabilized(&preferences), None);
		assert!(sync.on_start_stabilizing());
	}

	#[test]
	fn incomplete_inputs_skip_the_write() {
		let mut store = MemoryPreferences::new();
		assert!(!persist_view_state(false, &snapshot(), &mut store).unwrap());
		assert_eq!(store, MemoryPreferences::new());
	}

	#[test]
	fn missing_preferences_restore_nothing() {
		let preferences = ViewPreferences::load(&MemoryPreferences::new());
		assert_eq!(preferences, ViewPreferences::default());
		let mut sync = ViewStateSync::new();
		assert_eq!(sync.on_stabilized(&preferences), Some(ViewRestore::default()));
	}

	#[test]
	fn malformed_values_are_ignored() {
		let mut store = MemoryPreferences::new();
		store.write(SCALE_KEY, json!("big")).unwrap();
		store.write(POSITION_KEY, json!({ "x": 1.0 })).unwrap();
		store.write(NODES_KEY, json!({ "P_a": { "x": 1.0, "y": 2.0 } })).unwrap();
		let preferences = ViewPreferences::load(&store);
		assert_eq!(preferences.scale, None);
		assert_eq!(preferences.position, None);
		assert_eq!(preferences.nodes["P_a"], Point::new(1.0, 2.0));
	}

	struct BrokenStore;

	impl PreferenceStore for BrokenStore {
		fn read(&self, _key: &str) -> Result<Option<Value>, PreferenceError> {
			Err(PreferenceError::Unavailable)
		}

		fn write(&mut self, key: &str, _value: Value) -> Result<(), PreferenceError> {
			Err(PreferenceError::Write {
				key: key.to_string(),
				message: "quota exceeded".to_string(),
			})
		}
	}

	#[test]
	fn store_failures_surface_on_write_and_default_on_read() {
		assert_eq!(ViewPreferences::load(&BrokenStore), ViewPreferences::default());
		let err = persist_view_state(true, &snapshot(), &mut BrokenStore).unwrap_err();
		assert_eq!(
			err.to_string(),
			"failed to write preference 'viz.hierarchical.scale': quota exceeded"
		);
	}
}
