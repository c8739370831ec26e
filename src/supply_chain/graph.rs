//! The derived hierarchy graph and its assembly.

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use super::edges::{self, SeenSets};
use super::impact::ImpactAggregator;
use super::index::ResourceIndex;
use super::model::{Point, RiskInputs};
use super::nodes;

/// A tier of the supply chain, in containment order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
	/// Organization root project.
	#[serde(rename = "organizations")]
	Organization,
	/// Project below an organization or another project.
	#[serde(rename = "projects")]
	Project,
	/// Product used by projects.
	#[serde(rename = "products")]
	Product,
	/// Supplier of products.
	#[serde(rename = "suppliers")]
	Supplier,
}

impl Tier {
	/// Node id prefix. Organizations share the project prefix.
	pub fn prefix(self) -> &'static str {
		match self {
			Tier::Organization | Tier::Project => "P_",
			Tier::Product => "PR_",
			Tier::Supplier => "S_",
		}
	}

	/// Graph node id of a resource of this tier.
	pub fn node_id(self, resource_id: &str) -> String {
		format!("{}{}", self.prefix(), resource_id)
	}

	/// Human label used in tooltips.
	pub fn display_name(self) -> &'static str {
		match self {
			Tier::Organization => "Organization",
			Tier::Project => "Project",
			Tier::Product => "Product",
			Tier::Supplier => "Supplier",
		}
	}
}

/// The adjacent-tier pair an edge belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeClass {
	/// Parent project to child project.
	ProjectToProject,
	/// Project to a product it uses.
	ProjectToProduct,
	/// Product to one of its suppliers.
	ProductToSupplier,
}

/// Normalized scores shown alongside a node or edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
	/// Impact on a 0..=100 scale.
	pub impact: f64,
	/// Raw interdependence.
	pub interdependence: f64,
	/// Denominator the interdependence was normalized against.
	pub max_interdependence: f64,
	/// Assurance on a 0..=100 scale.
	pub assurance: f64,
}

/// One resource in the derived graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
	/// Tier-prefixed id such as `PR_12`.
	pub id: String,
	/// Store ID without the prefix.
	pub resource_id: String,
	/// Display name.
	pub label: String,
	/// Fill color from the impact ramp.
	pub color: String,
	/// Tier, which picks the shape.
	pub group: Tier,
	/// Interdependence normalized against the tier maximum.
	pub size: f64,
	/// Hierarchy row, 0 for organizations.
	pub level: u32,
	/// Persisted position, if any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub position: Option<Point>,
	/// Scores shown in the tooltip.
	pub risk: RiskSummary,
}

/// A directed link from a parent resource to a child resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
	/// Parent node id.
	pub from: String,
	/// Child node id.
	pub to: String,
	/// Aggregated interdependence normalized against the class maximum.
	pub weight: f64,
	/// Stroke color from the aggregated impact.
	pub color: String,
	/// Which tier pair the edge joins.
	pub class: EdgeClass,
	/// Name of the parent resource.
	pub from_label: String,
	/// Name of the child resource.
	pub to_label: String,
	/// Scores shown in the supply-line tooltip.
	pub risk: RiskSummary,
}

/// Per-tier normalization denominators.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TierStats {
	/// Largest interdependence in the tier.
	pub max_interdependence: f64,
	/// Largest assurance in the tier.
	pub max_assurance: f64,
}

/// Switches that change which resources make it into the graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivationOptions {
	/// Drop resources that take part in no edge.
	#[serde(default)]
	pub hide_unconnected: bool,
}

/// The derived graph: level-ordered nodes and edges plus the adjacency used
/// for descendant traversal.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SupplyChainGraph {
	/// Nodes ordered organizations, projects, products, suppliers.
	pub nodes: Vec<GraphNode>,
	/// Edges ordered by class.
	pub edges: Vec<GraphEdge>,
	#[serde(skip)]
	node_index: HashMap<String, usize>,
	#[serde(skip)]
	children: HashMap<String, Vec<String>>,
	#[serde(skip)]
	tier_stats: HashMap<Tier, TierStats>,
	#[serde(skip)]
	edge_maxima: HashMap<EdgeClass, f64>,
}

impl SupplyChainGraph {
	/// Node by id.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.node_index.get(id).map(|&i| &self.nodes[i])
	}

	/// Whether a node with this id exists.
	pub fn contains(&self, id: &str) -> bool {
		self.node_index.contains_key(id)
	}

	/// Targets of the outgoing edges of `id`.
	pub fn children(&self, id: &str) -> &[String] {
		self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Every node reachable from `id` through outgoing edges, depth first.
	///
	/// `id` itself is never part of the result, and each node is visited at
	/// most once, so malformed cycles terminate.
	pub fn descendants<'a>(&'a self, id: &'a str) -> Vec<&'a str> {
		self.descendants_avoiding(id, |_| false)
	}

	/// Like [`descendants`](Self::descendants), but never enters a node for
	/// which `blocked` returns true, nor anything only reachable through it.
	pub fn descendants_avoiding<'a>(
		&'a self,
		id: &'a str,
		blocked: impl Fn(&str) -> bool,
	) -> Vec<&'a str> {
		let mut visited: HashSet<&str> = HashSet::from([id]);
		let mut stack: Vec<&str> = self.children(id).iter().rev().map(String::as_str).collect();
		let mut found = Vec::new();
		while let Some(next) = stack.pop() {
			if blocked(next) || !visited.insert(next) {
				continue;
			}
			found.push(next);
			stack.extend(self.children(next).iter().rev().map(String::as_str));
		}
		found
	}

	/// Normalization denominators of a tier.
	pub fn stats(&self, tier: Tier) -> TierStats {
		self.tier_stats.get(&tier).copied().unwrap_or_default()
	}

	/// Max interdependence of an edge class (0 when the class is empty).
	pub fn edge_class_max(&self, class: EdgeClass) -> f64 {
		self.edge_maxima.get(&class).copied().unwrap_or(0.0)
	}

	fn assemble(tiers: Vec<nodes::TierNodes>, classes: Vec<edges::TierEdges>) -> Self {
		let mut graph = SupplyChainGraph::default();
		for tier in tiers {
			graph.tier_stats.insert(tier.tier, tier.stats);
			for node in tier.nodes {
				graph.node_index.insert(node.id.clone(), graph.nodes.len());
				graph.nodes.push(node);
			}
		}
		for class in classes {
			graph.edge_maxima.insert(class.class, class.max_interdependence);
			for edge in class.edges {
				debug_assert!(graph.contains(&edge.from) && graph.contains(&edge.to));
				graph
					.children
					.entry(edge.from.clone())
					.or_default()
					.push(edge.to.clone());
				graph.edges.push(edge);
			}
		}
		graph
	}
}

/// Derive the full hierarchy graph from the flat input records.
///
/// `positions` holds persisted node coordinates keyed by node id; they are
/// merged onto the matching nodes.
pub fn derive_graph(
	inputs: &RiskInputs,
	positions: &HashMap<String, Point>,
	options: &DerivationOptions,
	aggregator: &dyn ImpactAggregator,
) -> SupplyChainGraph {
	let index = ResourceIndex::build(&inputs.projects, &inputs.assets, &inputs.suppliers);
	let mut seen = SeenSets::default();

	let project_edges = edges::project_to_project(inputs, &index, &mut seen);
	let product_edges = edges::project_to_product(inputs, &index, aggregator, &mut seen);
	let supplier_edges = edges::product_to_supplier(inputs, &index, aggregator, &mut seen);

	let active = nodes::ActiveFilter::new(options, &seen);
	let organizations = nodes::organization_nodes(inputs, positions);
	let projects = nodes::project_nodes(inputs, &active, positions);
	let product_level = projects.max_level.max(1) + 1;
	let products = nodes::product_nodes(inputs, &active, product_level, positions);
	let suppliers = nodes::supplier_nodes(inputs, &active, product_level + 1, positions);

	let graph = SupplyChainGraph::assemble(
		vec![organizations, projects.nodes, products, suppliers],
		vec![project_edges, product_edges, supplier_edges],
	);
	debug!(
		"derived supply chain graph: {} nodes, {} edges",
		graph.nodes.len(),
		graph.edges.len()
	);
	graph
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::supply_chain::impact::CombinedImpact;
	use serde_json::json;

	fn inputs(value: serde_json::Value) -> RiskInputs {
		serde_json::from_value(value).unwrap()
	}

	fn derive(inputs: &RiskInputs) -> SupplyChainGraph {
		derive_graph(inputs, &HashMap::new(), &DerivationOptions::default(), &CombinedImpact)
	}

	fn level_of(graph: &SupplyChainGraph, id: &str) -> u32 {
		graph.node(id).unwrap().level
	}

	#[test]
	fn three_project_chain() {
		let graph = derive(&inputs(json!({
			"projects": [
				{ "ID": "A", "Name": "Org" },
				{ "ID": "B", "Name": "B", "Parent ID": "A" },
				{ "ID": "C", "Name": "C", "Parent ID": "B" }
			],
			"scores": { "project": {
				"B": { "interdependence": 5 },
				"C": { "interdependence": 10 }
			} }
		})));

		let weights: Vec<_> = graph
			.edges
			.iter()
			.map(|e| (e.from.as_str(), e.to.as_str(), e.weight))
			.collect();
		assert_eq!(weights, vec![("P_A", "P_B", 0.5), ("P_B", "P_C", 1.0)]);
		assert_eq!(level_of(&graph, "P_A"), 0);
		assert_eq!(level_of(&graph, "P_B"), 1);
		assert_eq!(level_of(&graph, "P_C"), 2);
		for edge in &graph.edges {
			assert_eq!(level_of(&graph, &edge.to), level_of(&graph, &edge.from) + 1);
		}
	}

	#[test]
	fn nodes_and_edges_are_level_ordered() {
		let graph = derive(&inputs(json!({
			"projects": [
				{ "ID": "p1", "Parent ID": "org" },
				{ "ID": "org" }
			],
			"products": [{ "ID": "x", "Project ID": "p1", "Supplier ID": "s1" }],
			"suppliers": [{ "ID": "s1" }],
			"productsRisk": { "x": { "Criticality": { "project|p1": 1 } } }
		})));
		let groups: Vec<_> = graph.nodes.iter().map(|n| n.group).collect();
		assert_eq!(
			groups,
			vec![Tier::Organization, Tier::Project, Tier::Product, Tier::Supplier]
		);
		let classes: Vec<_> = graph.edges.iter().map(|e| e.class).collect();
		assert_eq!(
			classes,
			vec![
				EdgeClass::ProjectToProject,
				EdgeClass::ProjectToProduct,
				EdgeClass::ProductToSupplier
			]
		);
		for edge in &graph.edges {
			assert!(level_of(&graph, &edge.to) > level_of(&graph, &edge.from));
		}
	}

	#[test]
	fn adjacency_follows_edges() {
		let graph = derive(&inputs(json!({
			"projects": [
				{ "ID": "org" },
				{ "ID": "p1", "Parent ID": "org" }
			],
			"products": [{ "ID": "x", "Project ID": "p1", "Supplier ID": "s1, s2" }],
			"suppliers": [{ "ID": "s1" }, { "ID": "s2" }],
			"productsRisk": { "x": { "Criticality": { "project|p1": 3 } } }
		})));
		assert_eq!(graph.children("P_org"), ["P_p1"]);
		assert_eq!(graph.children("PR_x"), ["S_s1", "S_s2"]);
		assert_eq!(
			graph.descendants("P_org"),
			vec!["P_p1", "PR_x", "S_s1", "S_s2"]
		);
		assert!(graph.children("S_s1").is_empty());
		assert_eq!(
			graph.descendants_avoiding("P_org", |id| id == "PR_x"),
			vec!["P_p1"]
		);
	}

	#[test]
	fn persisted_positions_are_merged() {
		let inputs = inputs(json!({ "projects": [{ "ID": "org" }] }));
		let positions = HashMap::from([("P_org".to_string(), Point::new(4.0, -2.0))]);
		let graph =
			derive_graph(&inputs, &positions, &DerivationOptions::default(), &CombinedImpact);
		assert_eq!(graph.node("P_org").unwrap().position, Some(Point::new(4.0, -2.0)));
	}

	#[test]
	fn empty_inputs_give_an_empty_graph() {
		let graph = derive(&RiskInputs::default());
		assert!(graph.nodes.is_empty());
		assert!(graph.edges.is_empty());
		assert_eq!(graph.edge_class_max(EdgeClass::ProjectToProduct), 0.0);
	}

	#[test]
	fn serializes_nodes_and_edges_only() {
		let graph = derive(&inputs(json!({
			"projects": [{ "ID": "org" }, { "ID": "p", "Parent ID": "org" }]
		})));
		let value = serde_json::to_value(&graph).unwrap();
		let object = value.as_object().unwrap();
		assert_eq!(object.len(), 2);
		assert_eq!(value["nodes"][0]["group"], "organizations");
		assert_eq!(value["edges"][0]["class"], "project_to_project");
	}
}
