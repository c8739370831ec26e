//! Node construction per tier.

use std::collections::{HashMap, HashSet};

use super::color::ImpactRamp;
use super::edges::{SeenSets, ratio};
use super::graph::{DerivationOptions, GraphNode, RiskSummary, Tier, TierStats};
use super::impact::MAX_IMPACT_SCORE;
use super::model::{NormalizedScore, Point, Project, RiskInputs};

/// Organizations are always drawn at full scale.
const ORGANIZATION_SIZE: f64 = 1.0;

/// Decides which resources of a tier become nodes.
pub(crate) struct ActiveFilter<'a> {
	seen: Option<&'a SeenSets>,
}

impl<'a> ActiveFilter<'a> {
	pub fn new(options: &DerivationOptions, seen: &'a SeenSets) -> Self {
		Self {
			seen: options.hide_unconnected.then_some(seen),
		}
	}

	fn project(&self, id: &str) -> bool {
		self.seen.is_none_or(|s| s.projects.contains(id))
	}

	fn product(&self, id: &str) -> bool {
		self.seen.is_none_or(|s| s.products.contains(id))
	}

	fn supplier(&self, id: &str) -> bool {
		self.seen.is_none_or(|s| s.suppliers.contains(id))
	}
}

pub(crate) struct TierNodes {
	pub tier: Tier,
	pub nodes: Vec<GraphNode>,
	pub stats: TierStats,
}

pub(crate) struct ProjectNodes {
	pub nodes: TierNodes,
	/// Deepest level among the emitted projects (0 when there are none).
	pub max_level: u32,
}

struct NodeSpec<'a> {
	resource_id: &'a str,
	name: &'a str,
	score: NormalizedScore,
	level: u32,
}

fn build_tier(tier: Tier, specs: Vec<NodeSpec<'_>>, positions: &HashMap<String, Point>) -> TierNodes {
	let stats = TierStats {
		max_interdependence: specs
			.iter()
			.map(|s| s.score.interdependence)
			.fold(0.0, f64::max),
		max_assurance: specs.iter().map(|s| s.score.assurance).fold(0.0, f64::max),
	};
	let nodes = specs
		.into_iter()
		.map(|spec| {
			let size = match tier {
				Tier::Organization => ORGANIZATION_SIZE,
				_ => ratio(spec.score.interdependence, stats.max_interdependence),
			};
			let max_interdependence = match tier {
				Tier::Organization => spec.score.interdependence,
				_ => stats.max_interdependence,
			};
			make_node(tier, spec, size, max_interdependence, positions)
		})
		.collect();
	TierNodes { tier, nodes, stats }
}

fn make_node(
	tier: Tier,
	spec: NodeSpec<'_>,
	size: f64,
	max_interdependence: f64,
	positions: &HashMap<String, Point>,
) -> GraphNode {
	let id = tier.node_id(spec.resource_id);
	let color = ImpactRamp::shared()
		.color_for_impact_fraction(spec.score.impact / MAX_IMPACT_SCORE)
		.to_string();
	GraphNode {
		position: positions.get(&id).copied(),
		id,
		resource_id: spec.resource_id.to_string(),
		label: spec.name.to_string(),
		color,
		group: tier,
		size,
		level: spec.level,
		risk: RiskSummary {
			impact: spec.score.impact,
			interdependence: spec.score.interdependence,
			max_interdependence,
			assurance: spec.score.assurance,
		},
	}
}

pub(crate) fn organization_nodes(
	inputs: &RiskInputs,
	positions: &HashMap<String, Point>,
) -> TierNodes {
	let specs = inputs
		.organizations()
		.map(|org| NodeSpec {
			resource_id: &org.id,
			name: &org.name,
			score: inputs.scores.project(&org.id),
			level: 0,
		})
		.collect();
	build_tier(Tier::Organization, specs, positions)
}

/// Level of each non-organization project.
///
/// A `Level` path wins when present. Otherwise the project sits one row
/// below its parent, so a parent link always points down the hierarchy.
/// Parents outside the project list count as organizations.
fn project_levels(projects: &[Project]) -> HashMap<&str, u32> {
	let by_id: HashMap<&str, &Project> = projects.iter().map(|p| (p.id.as_str(), p)).collect();
	let mut levels: HashMap<&str, u32> = HashMap::new();
	for project in projects {
		let mut chain: Vec<&Project> = Vec::new();
		let mut visited: HashSet<&str> = HashSet::new();
		let mut current = Some(project);
		// walk up to the first ancestor with a known level; roots and loops stop at 0
		let mut base = 0;
		while let Some(p) = current {
			if let Some(&level) = levels.get(p.id.as_str()) {
				base = level;
				break;
			}
			if p.is_organization() || !visited.insert(p.id.as_str()) {
				break;
			}
			if let Some(level) = p.path_level() {
				levels.insert(p.id.as_str(), level);
				base = level;
				break;
			}
			chain.push(p);
			current = p.parent().and_then(|id| by_id.get(id).copied());
		}
		for p in chain.into_iter().rev() {
			base += 1;
			levels.insert(p.id.as_str(), base);
		}
	}
	levels
}

pub(crate) fn project_nodes(
	inputs: &RiskInputs,
	active: &ActiveFilter<'_>,
	positions: &HashMap<String, Point>,
) -> ProjectNodes {
	let levels = project_levels(&inputs.projects);
	let specs: Vec<NodeSpec<'_>> = inputs
		.projects
		.iter()
		.filter(|p| !p.is_organization() && active.project(&p.id))
		.map(|p| NodeSpec {
			resource_id: &p.id,
			name: &p.name,
			score: inputs.scores.project(&p.id),
			level: levels.get(p.id.as_str()).copied().unwrap_or(1),
		})
		.collect();
	let max_level = specs.iter().map(|s| s.level).max().unwrap_or(0);
	ProjectNodes {
		nodes: build_tier(Tier::Project, specs, positions),
		max_level,
	}
}

pub(crate) fn product_nodes(
	inputs: &RiskInputs,
	active: &ActiveFilter<'_>,
	level: u32,
	positions: &HashMap<String, Point>,
) -> TierNodes {
	let specs = inputs
		.products
		.iter()
		.filter(|p| active.product(&p.id))
		.map(|p| NodeSpec {
			resource_id: &p.id,
			name: &p.name,
			score: inputs.scores.product(&p.id),
			level,
		})
		.collect();
	build_tier(Tier::Product, specs, positions)
}

pub(crate) fn supplier_nodes(
	inputs: &RiskInputs,
	active: &ActiveFilter<'_>,
	level: u32,
	positions: &HashMap<String, Point>,
) -> TierNodes {
	let specs = inputs
		.suppliers
		.iter()
		.filter(|s| active.supplier(&s.id))
		.map(|s| NodeSpec {
			resource_id: &s.id,
			name: &s.name,
			score: inputs.scores.supplier(&s.id),
			level,
		})
		.collect();
	build_tier(Tier::Supplier, specs, positions)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::supply_chain::graph::{SupplyChainGraph, derive_graph};
	use crate::supply_chain::impact::CombinedImpact;
	use serde_json::json;

	fn inputs() -> RiskInputs {
		serde_json::from_value(json!({
			"projects": [
				{ "ID": "org", "Name": "Org", "Level": "1.2.3.4" },
				{ "ID": "p1", "Name": "Bridge", "Parent ID": "org", "Level": "1.1" },
				{ "ID": "p2", "Name": "Deck", "Parent ID": "p1", "Level": "1.1.1" },
				{ "ID": "p3", "Name": "Idle", "Parent ID": "org" }
			],
			"products": [
				{ "ID": "x", "Name": "Steel", "Project ID": "p2", "Supplier ID": "s1" },
				{ "ID": "y", "Name": "Unused" }
			],
			"suppliers": [{ "ID": "s1", "Name": "Acme" }, { "ID": "s2", "Name": "Lonely" }],
			"scores": {
				"project": {
					"org": { "impact": 100 },
					"p1": { "impact": 50, "interdependence": 2, "assurance": 40 },
					"p2": { "impact": 10, "interdependence": 8, "assurance": 90 }
				},
				"product": {
					"x": { "interdependence": 3 },
					"y": { "interdependence": null }
				},
				"supplier": { "s1": { "impact": null, "interdependence": 0 } }
			},
			"productsRisk": { "x": { "Criticality": { "project|p2": 1 } } }
		}))
		.unwrap()
	}

	fn derive(options: DerivationOptions) -> SupplyChainGraph {
		derive_graph(&inputs(), &HashMap::new(), &options, &CombinedImpact)
	}

	#[test]
	fn levels_follow_the_tier_order() {
		let graph = derive(DerivationOptions::default());
		let level = |id: &str| graph.node(id).unwrap().level;
		assert_eq!(level("P_org"), 0);
		assert_eq!(level("P_p1"), 1);
		assert_eq!(level("P_p2"), 2);
		assert_eq!(level("P_p3"), 1);
		assert_eq!(level("PR_x"), 3);
		assert_eq!(level("S_s1"), 4);
		for edge in &graph.edges {
			assert!(level(&edge.to) > level(&edge.from));
		}
	}

	#[test]
	fn products_sit_at_level_two_without_projects() {
		let inputs: RiskInputs = serde_json::from_value(json!({
			"products": [{ "ID": "x" }],
			"suppliers": [{ "ID": "s" }]
		}))
		.unwrap();
		let graph =
			derive_graph(&inputs, &HashMap::new(), &DerivationOptions::default(), &CombinedImpact);
		assert_eq!(graph.node("PR_x").unwrap().level, 2);
		assert_eq!(graph.node("S_s").unwrap().level, 3);
	}

	#[test]
	fn sizes_are_normalized_per_tier() {
		let graph = derive(DerivationOptions::default());
		assert_eq!(graph.node("P_p1").unwrap().size, 0.25);
		assert_eq!(graph.node("P_p2").unwrap().size, 1.0);
		assert_eq!(graph.node("P_p3").unwrap().size, 0.0);
		assert_eq!(graph.node("PR_x").unwrap().size, 1.0);
		assert_eq!(graph.node("PR_y").unwrap().size, 0.0);
		// an all-zero tier never divides by zero
		assert_eq!(graph.node("S_s1").unwrap().size, 0.0);
		assert_eq!(graph.node("P_org").unwrap().size, ORGANIZATION_SIZE);
		assert_eq!(graph.stats(Tier::Project).max_assurance, 90.0);
		assert_eq!(graph.stats(Tier::Supplier).max_interdependence, 0.0);
	}

	#[test]
	fn colors_come_from_normalized_impact() {
		let graph = derive(DerivationOptions::default());
		let ramp = ImpactRamp::shared();
		assert_eq!(graph.node("P_org").unwrap().color, "#dc143c");
		assert_eq!(
			graph.node("P_p1").unwrap().color,
			ramp.color_for_impact_fraction(0.5)
		);
		assert_eq!(graph.node("S_s1").unwrap().color, "#228b22");
		assert!(graph.nodes.iter().all(|n| ramp.colors().contains(&n.color)));
	}

	#[test]
	fn hide_unconnected_drops_resources_without_edges() {
		let graph = derive(DerivationOptions {
			hide_unconnected: true,
		});
		assert!(graph.node("PR_y").is_none());
		assert!(graph.node("S_s2").is_none());
		assert!(graph.node("P_p3").is_some());
		assert!(graph.node("PR_x").is_some());
		assert!(graph.node("P_org").is_some());

		let all = derive(DerivationOptions::default());
		assert!(all.node("PR_y").is_some());
		assert!(all.node("S_s2").is_some());
	}

	#[test]
	fn levels_follow_the_parent_chain_without_level_paths() {
		let inputs: RiskInputs = serde_json::from_value(json!({
			"projects": [
				{ "ID": "C", "Parent ID": "B" },
				{ "ID": "A" },
				{ "ID": "B", "Parent ID": "A" },
				{ "ID": "D", "Parent ID": "missing" }
			]
		}))
		.unwrap();
		let graph =
			derive_graph(&inputs, &HashMap::new(), &DerivationOptions::default(), &CombinedImpact);
		let level = |id: &str| graph.node(id).unwrap().level;
		assert_eq!(level("P_A"), 0);
		assert_eq!(level("P_B"), 1);
		assert_eq!(level("P_C"), 2);
		assert_eq!(level("P_D"), 1);
		for edge in &graph.edges {
			assert_eq!(level(&edge.to), level(&edge.from) + 1);
		}
	}

	#[test]
	fn level_paths_and_parent_depth_mix() {
		let inputs: RiskInputs = serde_json::from_value(json!({
			"projects": [
				{ "ID": "org" },
				{ "ID": "p1", "Parent ID": "org", "Level": "1.1.1" },
				{ "ID": "p2", "Parent ID": "p1" }
			]
		}))
		.unwrap();
		let levels = project_levels(&inputs.projects);
		assert_eq!(levels.get("p1"), Some(&2));
		assert_eq!(levels.get("p2"), Some(&3));
	}

	#[test]
	fn parent_cycles_get_a_finite_level() {
		let inputs: RiskInputs = serde_json::from_value(json!({
			"projects": [
				{ "ID": "a", "Parent ID": "b" },
				{ "ID": "b", "Parent ID": "a" }
			]
		}))
		.unwrap();
		let levels = project_levels(&inputs.projects);
		assert!(levels.values().all(|&l| (1..=2).contains(&l)));
		assert_eq!(levels.len(), 2);
	}

	#[test]
	fn organizations_ignore_their_level_path() {
		let graph = derive(DerivationOptions::default());
		assert_eq!(graph.node("P_org").unwrap().group, Tier::Organization);
		assert_eq!(graph.node("P_org").unwrap().level, 0);
	}
}
