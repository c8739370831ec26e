//! Static network configuration handed to the canvas.

use force_graph::SimulationParameters;
use serde::{Deserialize, Serialize};

use super::types::NodeShape;
use crate::supply_chain::Tier;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkOptions {
	pub layout: HierarchicalLayout,
	pub physics: PhysicsOptions,
	pub groups: GroupShapes,
	pub interaction: InteractionOptions,
	pub node_scaling: Scaling,
	pub edge_scaling: Scaling,
	/// Quiet period before a burst of resizes is acted on.
	pub resize_debounce_ms: u64,
}

impl Default for NetworkOptions {
	fn default() -> Self {
		Self {
			layout: HierarchicalLayout::default(),
			physics: PhysicsOptions::default(),
			groups: GroupShapes::default(),
			interaction: InteractionOptions::default(),
			node_scaling: Scaling {
				min: 16.0,
				max: 120.0,
			},
			edge_scaling: Scaling { min: 1.0, max: 15.0 },
			resize_debounce_ms: 500,
		}
	}
}

/// Top-down rows, one per level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchicalLayout {
	pub level_separation: f64,
	pub node_spacing: f64,
}

impl Default for HierarchicalLayout {
	fn default() -> Self {
		Self {
			level_separation: 600.0,
			node_spacing: 150.0,
		}
	}
}

impl HierarchicalLayout {
	pub fn row_y(&self, level: u32) -> f64 {
		level as f64 * self.level_separation
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsOptions {
	pub enabled: bool,
	pub force_charge: f32,
	pub force_spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping_factor: f32,
	/// Largest per-tick movement (graph units) still counted as settled.
	pub settle_threshold: f64,
	pub max_stabilization_iterations: u32,
}

impl Default for PhysicsOptions {
	fn default() -> Self {
		Self {
			enabled: true,
			force_charge: 2400.0,
			force_spring: 0.05,
			force_max: 280.0,
			node_speed: 7000.0,
			damping_factor: 0.9,
			settle_threshold: 0.05,
			max_stabilization_iterations: 1000,
		}
	}
}

impl PhysicsOptions {
	pub fn simulation_parameters(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.force_charge,
			force_spring: self.force_spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping_factor,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupShapes {
	pub organizations: NodeShape,
	pub projects: NodeShape,
	pub products: NodeShape,
	pub suppliers: NodeShape,
}

impl Default for GroupShapes {
	fn default() -> Self {
		Self {
			organizations: NodeShape::Hexagon,
			projects: NodeShape::Hexagon,
			products: NodeShape::Square,
			suppliers: NodeShape::Triangle,
		}
	}
}

impl GroupShapes {
	pub fn shape(&self, tier: Tier) -> NodeShape {
		match tier {
			Tier::Organization => self.organizations,
			Tier::Project => self.projects,
			Tier::Product => self.products,
			Tier::Supplier => self.suppliers,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionOptions {
	pub hover: bool,
	pub multiselect: bool,
	pub tooltip_delay_ms: u64,
}

impl Default for InteractionOptions {
	fn default() -> Self {
		Self {
			hover: true,
			multiselect: true,
			tooltip_delay_ms: 100,
		}
	}
}

/// Output range for a normalized `[0, 1]` value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scaling {
	pub min: f64,
	pub max: f64,
}
