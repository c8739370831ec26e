use force_graph::DefaultNodeIdx;
use serde::{Deserialize, Serialize};

use crate::supply_chain::{RiskSummary, Tier};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
	#[default]
	Dot,
	Hexagon,
	Square,
	Triangle,
}

/// Per-node data carried through the physics graph.
#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: String,
	pub label: String,
	pub color: String,
	pub group: Option<Tier>,
	pub shape: NodeShape,
	pub radius: f64,
	pub level: u32,
	pub risk: RiskSummary,
}

#[derive(Clone, Debug)]
pub struct EdgeInfo {
	pub source: DefaultNodeIdx,
	pub target: DefaultNodeIdx,
	pub color: String,
	pub width: f64,
	pub weight: f64,
	pub from_label: String,
	pub to_label: String,
	pub risk: RiskSummary,
}
