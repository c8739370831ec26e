//! Interaction events from the renderer and the commands they produce.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::graph::{SupplyChainGraph, Tier};
use super::model::Point;
use super::selection::SelectionTracker;
use super::view_state::{ViewPreferences, ViewStateSync};

/// Events emitted by the rendering collaborator, one at a time.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphEvent {
	/// A double-click on the canvas.
	DoubleClick {
		/// The node under the pointer, if any.
		nodes: Vec<String>,
	},
	/// The user picked nodes.
	SelectNode {
		/// Newly picked node ids.
		nodes: Vec<String>,
	},
	/// The user dropped nodes from the selection.
	DeselectNode {
		/// Ids that remain selected.
		nodes: Vec<String>,
	},
	/// The physics simulation settled.
	Stabilized,
	/// The physics simulation started again.
	StartStabilizing,
}

/// Resource collections the application can navigate to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
	/// Projects, organizations included.
	Projects,
	/// Products.
	Products,
	/// Suppliers.
	Suppliers,
}

impl ResourceType {
	/// Collection name used in routes.
	pub fn as_str(self) -> &'static str {
		match self {
			ResourceType::Projects => "projects",
			ResourceType::Products => "products",
			ResourceType::Suppliers => "suppliers",
		}
	}

	fn from_prefix(prefix: &str) -> Option<Self> {
		match prefix {
			"P" => Some(ResourceType::Projects),
			"PR" => Some(ResourceType::Products),
			"S" => Some(ResourceType::Suppliers),
			_ => None,
		}
	}
}

/// Request to open the detail view of a resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationRequest {
	/// Collection of the resource.
	pub resource_type: ResourceType,
	/// Store ID of the resource.
	pub resource_id: String,
}

impl NavigationRequest {
	/// Application route of the resource's detail view.
	pub fn path(&self) -> String {
		format!("/{}/{}", self.resource_type.as_str(), self.resource_id)
	}
}

/// What the caller must do in response to an event.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphCommand {
	/// Open the resource's detail view.
	Navigate(NavigationRequest),
	/// Highlight exactly these node ids.
	ApplySelection(Vec<String>),
	/// Move the viewport; absent parts are left to the renderer (fit).
	RestoreView {
		/// Zoom factor.
		scale: Option<f64>,
		/// Graph-space point to center on.
		position: Option<Point>,
	},
	/// Stop the physics simulation and release the level rows.
	FreezeLayout,
}

/// Per-mount interaction state: the selection and the one-shot restore flag.
#[derive(Clone, Debug, Default)]
pub struct GraphSession {
	selection: SelectionTracker,
	view_sync: ViewStateSync,
}

impl GraphSession {
	/// Session with nothing selected and the restore still pending.
	pub fn new() -> Self {
		Self::default()
	}

	/// Current selection.
	pub fn selection(&self) -> &SelectionTracker {
		&self.selection
	}

	/// Forget the selection; called whenever the graph is rebuilt.
	pub fn reset_selection(&mut self) {
		self.selection.clear();
	}

	/// Apply one renderer event and return the commands it produces.
	pub fn handle(
		&mut self,
		graph: &SupplyChainGraph,
		preferences: &ViewPreferences,
		event: GraphEvent,
	) -> Vec<GraphCommand> {
		match event {
			GraphEvent::DoubleClick { nodes } => nodes
				.first()
				.and_then(|id| navigation_target(graph, id))
				.map(GraphCommand::Navigate)
				.into_iter()
				.collect(),
			GraphEvent::SelectNode { nodes } => {
				self.selection.select(graph, nodes.iter().map(String::as_str));
				vec![self.apply_selection()]
			}
			GraphEvent::DeselectNode { nodes } => {
				self.selection.deselect(graph, nodes.iter().map(String::as_str));
				vec![self.apply_selection()]
			}
			GraphEvent::Stabilized => match self.view_sync.on_stabilized(preferences) {
				Some(restore) => {
					info!("initial layout stabilized");
					vec![
						GraphCommand::RestoreView {
							scale: restore.scale,
							position: restore.position,
						},
						GraphCommand::FreezeLayout,
					]
				}
				None => Vec::new(),
			},
			GraphEvent::StartStabilizing => {
				if self.view_sync.on_start_stabilizing() {
					vec![GraphCommand::FreezeLayout]
				} else {
					Vec::new()
				}
			}
		}
	}

	fn apply_selection(&self) -> GraphCommand {
		GraphCommand::ApplySelection(self.selection.selected().map(str::to_string).collect())
	}
}

/// Where double-clicking `node_id` leads, if anywhere.
///
/// The id is split at its first `_`; organizations are never navigable.
pub fn navigation_target(graph: &SupplyChainGraph, node_id: &str) -> Option<NavigationRequest> {
	let (prefix, resource_id) = node_id.split_once('_')?;
	let resource_type = ResourceType::from_prefix(prefix)?;
	if resource_id.is_empty() {
		return None;
	}
	if graph
		.node(node_id)
		.is_some_and(|n| n.group == Tier::Organization)
	{
		debug!("organization {resource_id} has no detail view");
		return None;
	}
	Some(NavigationRequest {
		resource_type,
		resource_id: resource_id.to_string(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::supply_chain::graph::{DerivationOptions, derive_graph};
	use crate::supply_chain::impact::CombinedImpact;
	use crate::supply_chain::model::RiskInputs;
	use serde_json::json;
	use std::collections::HashMap;

	fn graph() -> SupplyChainGraph {
		let inputs: RiskInputs = serde_json::from_value(json!({
			"projects": [
				{ "ID": "org" },
				{ "ID": "p_1", "Parent ID": "org" }
			],
			"products": [{ "ID": "x", "Project ID": "p_1", "Supplier ID": "s" }],
			"suppliers": [{ "ID": "s" }],
			"productsRisk": { "x": { "Criticality": { "project|p_1": 1 } } }
		}))
		.unwrap();
		derive_graph(&inputs, &HashMap::new(), &DerivationOptions::default(), &CombinedImpact)
	}

	fn ids(list: &[&str]) -> Vec<String> {
		list.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn double_click_navigates_to_the_resource() {
		let graph = graph();
		let mut session = GraphSession::new();
		let commands = session.handle(
			&graph,
			&ViewPreferences::default(),
			GraphEvent::DoubleClick {
				nodes: ids(&["P_p_1"]),
			},
		);
		assert_eq!(
			commands,
			vec![GraphCommand::Navigate(NavigationRequest {
				resource_type: ResourceType::Projects,
				resource_id: "p_1".into(),
			})]
		);
	}

	#[test]
	fn navigation_paths_use_the_collection_name() {
		let request = navigation_target(&graph(), "PR_x").unwrap();
		assert_eq!(request.path(), "/products/x");
	}

	#[test]
	fn organizations_and_unknown_prefixes_do_not_navigate() {
		let graph = graph();
		assert_eq!(navigation_target(&graph, "P_org"), None);
		assert_eq!(navigation_target(&graph, "X_1"), None);
		assert_eq!(navigation_target(&graph, "PR_"), None);
		assert_eq!(
			navigation_target(&graph, "S_s").map(|r| r.resource_type),
			Some(ResourceType::Suppliers)
		);
	}

	#[test]
	fn selection_events_report_the_full_selection() {
		let graph = graph();
		let preferences = ViewPreferences::default();
		let mut session = GraphSession::new();
		let commands = session.handle(
			&graph,
			&preferences,
			GraphEvent::SelectNode {
				nodes: ids(&["PR_x"]),
			},
		);
		assert_eq!(commands, vec![GraphCommand::ApplySelection(ids(&["PR_x", "S_s"]))]);

		let commands =
			session.handle(&graph, &preferences, GraphEvent::DeselectNode { nodes: vec![] });
		assert_eq!(commands, vec![GraphCommand::ApplySelection(vec![])]);
	}

	#[test]
	fn first_stabilization_restores_then_freezes() {
		let graph = graph();
		let preferences = ViewPreferences {
			scale: Some(2.0),
			..Default::default()
		};
		let mut session = GraphSession::new();
		assert!(
			session
				.handle(&graph, &preferences, GraphEvent::StartStabilizing)
				.is_empty()
		);
		assert_eq!(
			session.handle(&graph, &preferences, GraphEvent::Stabilized),
			vec![
				GraphCommand::RestoreView {
					scale: Some(2.0),
					position: None,
				},
				GraphCommand::FreezeLayout,
			]
		);
		assert!(
			session
				.handle(&graph, &preferences, GraphEvent::Stabilized)
				.is_empty()
		);
		assert_eq!(
			session.handle(&graph, &preferences, GraphEvent::StartStabilizing),
			vec![GraphCommand::FreezeLayout]
		);
	}

	#[test]
	fn rebuild_forgets_the_selection() {
		let graph = graph();
		let mut session = GraphSession::new();
		session.handle(
			&graph,
			&ViewPreferences::default(),
			GraphEvent::SelectNode {
				nodes: ids(&["P_p_1"]),
			},
		);
		assert!(!session.selection().is_empty());
		session.reset_selection();
		assert!(session.selection().is_empty());
	}
}
