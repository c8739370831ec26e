//! Edge aggregation per adjacent-tier pair.
//!
//! Each class keeps its own normalization denominator, taken over the edges
//! that class actually emits. Edges whose endpoint is not a known resource are
//! skipped here so the assembled graph never references a missing node.

use std::collections::HashSet;

use log::debug;

use super::color::ImpactRamp;
use super::graph::{EdgeClass, GraphEdge, RiskSummary, Tier};
use super::impact::{ImpactAggregator, MAX_IMPACT_SCORE};
use super::index::ResourceIndex;
use super::model::{RiskInputs, SupplyLineMatch};

/// Resource ids that took part in at least one emitted edge, per tier.
#[derive(Clone, Debug, Default)]
pub struct SeenSets {
	/// Project ids, organizations included.
	pub projects: HashSet<String>,
	/// Product ids.
	pub products: HashSet<String>,
	/// Supplier ids.
	pub suppliers: HashSet<String>,
}

/// The emitted edges of one class and their normalization denominator.
#[derive(Clone, Debug)]
pub(crate) struct TierEdges {
	pub class: EdgeClass,
	pub edges: Vec<GraphEdge>,
	pub max_interdependence: f64,
}

struct Candidate {
	from: String,
	to: String,
	from_label: String,
	to_label: String,
	impact: f64,
	interdependence: f64,
}

/// `numerator / denominator`, or 0 when that is not a finite number.
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
	let value = numerator / denominator;
	if value.is_finite() { value } else { 0.0 }
}

fn finish(class: EdgeClass, candidates: Vec<Candidate>) -> TierEdges {
	let ramp = ImpactRamp::shared();
	let max_interdependence = candidates
		.iter()
		.map(|c| c.interdependence)
		.fold(0.0, f64::max);
	let edges = candidates
		.into_iter()
		.map(|c| GraphEdge {
			weight: ratio(c.interdependence, max_interdependence),
			color: ramp
				.color_for_impact_fraction(c.impact / MAX_IMPACT_SCORE)
				.to_string(),
			class,
			risk: RiskSummary {
				impact: c.impact,
				interdependence: c.interdependence,
				max_interdependence,
				assurance: 0.0,
			},
			from: c.from,
			to: c.to,
			from_label: c.from_label,
			to_label: c.to_label,
		})
		.collect();
	TierEdges {
		class,
		edges,
		max_interdependence,
	}
}

/// Impact and summed interdependence of a set of supply lines.
fn aggregate(matches: &[SupplyLineMatch], aggregator: &dyn ImpactAggregator) -> (f64, f64) {
	let impact = aggregator.aggregate(matches);
	let impact = if impact.is_finite() { impact } else { 0.0 };
	let interdependence = matches
		.iter()
		.map(|m| m.score)
		.filter(|s| s.is_finite())
		.sum();
	(impact, interdependence)
}

/// One edge per child project, from its single declared parent.
pub(crate) fn project_to_project(
	inputs: &RiskInputs,
	index: &ResourceIndex<'_>,
	seen: &mut SeenSets,
) -> TierEdges {
	let mut candidates = Vec::new();
	for project in &inputs.projects {
		let Some(parent) = project.parent() else {
			continue;
		};
		if !index.projects.contains_key(parent) {
			debug!("project {} has unknown parent {}", project.id, parent);
			continue;
		}
		seen.projects.insert(project.id.clone());
		seen.projects.insert(parent.to_string());

		let score = inputs.scores.project(&project.id);
		candidates.push(Candidate {
			from: Tier::Project.node_id(parent),
			to: Tier::Project.node_id(&project.id),
			from_label: index.project_name(parent).to_string(),
			to_label: project.name.clone(),
			impact: score.impact,
			interdependence: score.interdependence,
		});
	}
	finish(EdgeClass::ProjectToProject, candidates)
}

/// Product ← project edges, skipping pairs whose criticality resolves to 0.
pub(crate) fn project_to_product(
	inputs: &RiskInputs,
	index: &ResourceIndex<'_>,
	aggregator: &dyn ImpactAggregator,
	seen: &mut SeenSets,
) -> TierEdges {
	let mut candidates = Vec::new();
	for product in &inputs.products {
		let supply_lines = inputs.scores.supply_lines(&product.id);
		for project_id in product.project_ids() {
			if inputs.project_criticality(&product.id, &project_id) == 0.0 {
				continue;
			}
			if !index.projects.contains_key(project_id.as_str()) {
				debug!("product {} references unknown project {}", product.id, project_id);
				continue;
			}
			seen.products.insert(product.id.clone());
			seen.projects.insert(project_id.clone());

			let matches: Vec<SupplyLineMatch> = supply_lines
				.iter()
				.filter(|sl| sl.project_id.as_deref() == Some(project_id.as_str()))
				.cloned()
				.collect();
			let (impact, interdependence) = aggregate(&matches, aggregator);
			candidates.push(Candidate {
				from: Tier::Project.node_id(&project_id),
				to: Tier::Product.node_id(&product.id),
				from_label: index.project_name(&project_id).to_string(),
				to_label: product.name.clone(),
				impact,
				interdependence,
			});
		}
	}
	finish(EdgeClass::ProjectToProduct, candidates)
}

/// Product → supplier edges. No criticality filter applies here.
pub(crate) fn product_to_supplier(
	inputs: &RiskInputs,
	index: &ResourceIndex<'_>,
	aggregator: &dyn ImpactAggregator,
	seen: &mut SeenSets,
) -> TierEdges {
	let mut candidates = Vec::new();
	for product in &inputs.products {
		let supply_lines = inputs.scores.supply_lines(&product.id);
		for supplier_id in product.supplier_ids() {
			if !index.suppliers.contains_key(supplier_id.as_str()) {
				debug!("product {} references unknown supplier {}", product.id, supplier_id);
				continue;
			}
			seen.products.insert(product.id.clone());
			seen.suppliers.insert(supplier_id.clone());

			let matches: Vec<SupplyLineMatch> = supply_lines
				.iter()
				.filter(|sl| sl.supplier_id.as_deref() == Some(supplier_id.as_str()))
				.cloned()
				.collect();
			let (impact, interdependence) = aggregate(&matches, aggregator);
			candidates.push(Candidate {
				from: Tier::Product.node_id(&product.id),
				to: Tier::Supplier.node_id(&supplier_id),
				from_label: product.name.clone(),
				to_label: index.supplier_name(&supplier_id).to_string(),
				impact,
				interdependence,
			});
		}
	}
	finish(EdgeClass::ProductToSupplier, candidates)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::supply_chain::impact::CombinedImpact;
	use serde_json::json;

	fn inputs() -> RiskInputs {
		serde_json::from_value(json!({
			"projects": [
				{ "ID": "org", "Name": "Org" },
				{ "ID": "p1", "Name": "Bridge", "Parent ID": "org" },
				{ "ID": "p2", "Name": "Tunnel", "Parent ID": "org" }
			],
			"products": [
				{ "ID": "x", "Name": "Steel", "Project ID": "p1, p2", "Supplier ID": "s1" },
				{ "ID": "y", "Name": "Glass", "Project ID": "p1", "Supplier ID": "s1; s2" },
				{ "ID": "z", "Name": "Sand" }
			],
			"suppliers": [
				{ "ID": "s1", "Name": "Acme" },
				{ "ID": "s2", "Name": "Globex" }
			],
			"scores": {
				"project": {
					"p1": { "impact": 80, "interdependence": 4 },
					"p2": { "impact": null, "interdependence": 8 }
				},
				"product": {
					"x": { "supplyLines": [
						{ "projectId": "p1", "score": 3 },
						{ "projectId": "p1", "score": 4 },
						{ "projectId": "p2", "score": 100 },
						{ "supplierId": "s1", "score": 6 }
					] },
					"y": { "supplyLines": [
						{ "projectId": "p1", "score": 14 },
						{ "supplierId": "s1", "score": 2 },
						{ "supplierId": "s2", "score": 12 }
					] }
				}
			},
			"productsRisk": {
				"x": { "Criticality": { "project|p1": 2, "project|p2": 0 } },
				"y": { "Criticality": { "project|p1": 1 } }
			}
		}))
		.unwrap()
	}

	fn run(inputs: &RiskInputs) -> (TierEdges, TierEdges, TierEdges, SeenSets) {
		let index = ResourceIndex::build(&inputs.projects, &inputs.assets, &inputs.suppliers);
		let mut seen = SeenSets::default();
		let projects = project_to_project(inputs, &index, &mut seen);
		let products = project_to_product(inputs, &index, &CombinedImpact, &mut seen);
		let suppliers = product_to_supplier(inputs, &index, &CombinedImpact, &mut seen);
		(projects, products, suppliers, seen)
	}

	#[test]
	fn project_edges_read_child_scores() {
		let (projects, ..) = run(&inputs());
		assert_eq!(projects.max_interdependence, 8.0);
		let edge = &projects.edges[0];
		assert_eq!((edge.from.as_str(), edge.to.as_str()), ("P_org", "P_p1"));
		assert_eq!(edge.weight, 0.5);
		assert_eq!(edge.from_label, "Org");
		assert_eq!(edge.color, ImpactRamp::shared().color_for_impact_fraction(0.8));
		// no impact data is drawn at the low-risk end
		assert_eq!(projects.edges[1].color, "#228b22");
	}

	#[test]
	fn overlapping_supply_lines_sum_and_combine() {
		let (_, products, ..) = run(&inputs());
		let edge = products
			.edges
			.iter()
			.find(|e| e.from == "P_p1" && e.to == "PR_x")
			.unwrap();
		assert_eq!(edge.risk.interdependence, 7.0);
		assert_ne!(edge.risk.impact, 4.0);
		assert!(edge.risk.impact > 4.0);
	}

	#[test]
	fn zero_criticality_suppresses_the_edge_everywhere() {
		let (_, products, ..) = run(&inputs());
		assert!(!products.edges.iter().any(|e| e.from == "P_p2"));
		// the suppressed p2 line (score 100) does not set the denominator
		assert_eq!(products.max_interdependence, 14.0);
		assert_eq!(products.edges.len(), 2);
	}

	#[test]
	fn suppressed_pairs_stay_out_of_seen_sets() {
		let mut inputs = inputs();
		// detach p2 from the project tree so only the product link could mark it
		inputs.projects[2].parent_id = None;
		let (_, _, _, seen) = run(&inputs);
		assert!(!seen.projects.contains("p2"));
		assert!(seen.projects.contains("p1"));
	}

	#[test]
	fn each_class_normalizes_independently() {
		let (_, products, suppliers, _) = run(&inputs());
		assert_eq!(suppliers.max_interdependence, 12.0);
		let weights: Vec<_> = suppliers.edges.iter().map(|e| (e.to.as_str(), e.weight)).collect();
		assert_eq!(weights, vec![("S_s1", 0.5), ("S_s1", 2.0 / 12.0), ("S_s2", 1.0)]);
		for edge in products.edges.iter().chain(&suppliers.edges) {
			assert!((0.0..=1.0).contains(&edge.weight));
		}
	}

	#[test]
	fn empty_id_cells_yield_no_edges() {
		let (_, products, suppliers, seen) = run(&inputs());
		assert!(!products.edges.iter().any(|e| e.to == "PR_z"));
		assert!(!suppliers.edges.iter().any(|e| e.from == "PR_z"));
		assert!(!seen.products.contains("z"));
	}

	#[test]
	fn unknown_endpoints_are_not_emitted() {
		let mut inputs = inputs();
		inputs.products[1].supplier_ids = Some("s1, ghost".into());
		inputs.products[1].project_ids = Some("p1, nowhere".into());
		inputs
			.products_risk
			.get_mut("y")
			.unwrap()
			.criticality
			.insert("project|nowhere".into(), 5.0);
		let (_, products, suppliers, seen) = run(&inputs);
		assert!(!suppliers.edges.iter().any(|e| e.to == "S_ghost"));
		assert!(!products.edges.iter().any(|e| e.from == "P_nowhere"));
		assert!(!seen.suppliers.contains("ghost"));
	}

	#[test]
	fn zero_interdependence_class_has_zero_weights() {
		let mut inputs = inputs();
		inputs.scores.product.clear();
		let (_, products, suppliers, _) = run(&inputs);
		assert_eq!(products.max_interdependence, 0.0);
		assert!(products.edges.iter().all(|e| e.weight == 0.0));
		assert!(suppliers.edges.iter().all(|e| e.weight == 0.0));
		// no supply lines at all: impact has no data and maps to 0
		assert!(suppliers.edges.iter().all(|e| e.risk.impact == 0.0));
	}

	#[test]
	fn ratio_never_yields_nan() {
		assert_eq!(ratio(0.0, 0.0), 0.0);
		assert_eq!(ratio(3.0, 0.0), 0.0);
		assert_eq!(ratio(3.0, 6.0), 0.5);
	}
}
