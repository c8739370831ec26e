//! Mapping of normalized node sizes and edge weights to drawing units.

use super::options::Scaling;

/// Normalized values outside `[0, 1]` (or `NaN`) are clamped first.
pub fn scaled(value: f64, scaling: Scaling) -> f64 {
	let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
	scaling.min + (scaling.max - scaling.min) * value
}

/// Node radius in graph units; the scaled value is a diameter.
pub fn node_radius(size: f64, scaling: Scaling) -> f64 {
	scaled(size, scaling) / 2.0
}

pub fn edge_width(weight: f64, scaling: Scaling) -> f64 {
	scaled(weight, scaling)
}

/// Label font size in graph units.
pub fn label_font_size(is_organization: bool) -> f64 {
	if is_organization { 48.0 } else { 32.0 }
}
