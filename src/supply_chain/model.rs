//! Input records as they arrive from the upstream store.
//!
//! Field names follow the store's spreadsheet-style columns (`"ID"`,
//! `"Parent ID"`, ...). Everything optional in the store is optional here;
//! numeric fields are normalized once through [`ResourceScore::normalized`]
//! before any derivation code sees them.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::InputError;

/// A 2D coordinate in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate, growing downward.
	pub y: f64,
}

impl Point {
	/// Point at `(x, y)`.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// A project row. Rows without a parent are organization roots.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
	/// Store ID, kept as text.
	#[serde(rename = "ID", deserialize_with = "id_string")]
	pub id: String,
	/// Display name.
	#[serde(rename = "Name", default)]
	pub name: String,
	/// Parent project; blank for an organization root.
	#[serde(
		rename = "Parent ID",
		default,
		deserialize_with = "optional_id_string",
		skip_serializing_if = "Option::is_none"
	)]
	pub parent_id: Option<String>,
	/// Dot-separated hierarchy path such as `1.2.3`.
	#[serde(rename = "Level", default, skip_serializing_if = "Option::is_none")]
	pub level: Option<String>,
}

impl Project {
	/// The declared parent, ignoring blank cells.
	pub fn parent(&self) -> Option<&str> {
		self.parent_id
			.as_deref()
			.map(str::trim)
			.filter(|p| !p.is_empty())
	}

	/// Whether this row is an organization root.
	pub fn is_organization(&self) -> bool {
		self.parent().is_none()
	}

	/// Hierarchy depth from the `Level` path, never below 1.
	///
	/// `None` when the path is missing or blank.
	pub fn path_level(&self) -> Option<u32> {
		let path = self.level.as_deref().map(str::trim).filter(|l| !l.is_empty())?;
		let segments = path.split('.').count() as u32;
		Some(segments.saturating_sub(1).max(1))
	}
}

/// An asset row. Assets always hang off the first organization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
	/// Store ID, kept as text.
	#[serde(rename = "ID", deserialize_with = "id_string")]
	pub id: String,
	/// Display name.
	#[serde(rename = "Name", default)]
	pub name: String,
	/// Parent as written in the store; replaced when indexed.
	#[serde(
		rename = "Parent ID",
		default,
		deserialize_with = "optional_id_string",
		skip_serializing_if = "Option::is_none"
	)]
	pub parent_id: Option<String>,
}

/// A product row with its project and supplier cells.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
	/// Store ID, kept as text.
	#[serde(rename = "ID", deserialize_with = "id_string")]
	pub id: String,
	/// Display name.
	#[serde(rename = "Name", default)]
	pub name: String,
	/// Raw multi-valued project cell; see [`Product::project_ids`].
	#[serde(
		rename = "Project ID",
		default,
		deserialize_with = "optional_id_string",
		skip_serializing_if = "Option::is_none"
	)]
	pub project_ids: Option<String>,
	/// Raw multi-valued supplier cell.
	#[serde(
		rename = "Supplier ID",
		default,
		deserialize_with = "optional_id_string",
		skip_serializing_if = "Option::is_none"
	)]
	pub supplier_ids: Option<String>,
}

impl Product {
	/// IDs of the projects that use this product.
	pub fn project_ids(&self) -> Vec<String> {
		cell_multiples(self.project_ids.as_deref().unwrap_or(""))
	}

	/// IDs of the suppliers of this product.
	pub fn supplier_ids(&self) -> Vec<String> {
		cell_multiples(self.supplier_ids.as_deref().unwrap_or(""))
	}
}

/// A supplier row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
	/// Store ID, kept as text.
	#[serde(rename = "ID", deserialize_with = "id_string")]
	pub id: String,
	/// Display name.
	#[serde(rename = "Name", default)]
	pub name: String,
}

/// Split a multi-valued cell into its atomic IDs.
///
/// Order of first appearance is kept and duplicates are dropped, so the
/// result behaves as a set while staying deterministic.
pub fn cell_multiples(cell: &str) -> Vec<String> {
	let mut ids: Vec<String> = Vec::new();
	for part in cell.split([',', ';', '\n']) {
		let part = part.trim();
		if !part.is_empty() && !ids.iter().any(|id| id == part) {
			ids.push(part.to_string());
		}
	}
	ids
}

/// A scored relationship between a product and a project or supplier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyLineMatch {
	/// Impact of the line on a 0..=100 scale.
	#[serde(default)]
	pub score: f64,
	/// Project end of the line, when it has one.
	#[serde(
		default,
		deserialize_with = "optional_id_string",
		skip_serializing_if = "Option::is_none"
	)]
	pub project_id: Option<String>,
	/// Supplier end of the line, when it has one.
	#[serde(
		default,
		deserialize_with = "optional_id_string",
		skip_serializing_if = "Option::is_none"
	)]
	pub supplier_id: Option<String>,
}

/// Per-resource risk score as produced by the scoring engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceScore {
	/// `None` (or a non-finite value) means no data.
	#[serde(default)]
	pub impact: Option<f64>,
	/// How much else depends on the resource.
	#[serde(default)]
	pub interdependence: Option<f64>,
	/// Confidence in the resource's controls.
	#[serde(default)]
	pub assurance: Option<f64>,
	/// Scored lines; only products carry them.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub supply_lines: Vec<SupplyLineMatch>,
}

/// A score with every missing or non-finite component replaced by 0.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizedScore {
	/// Impact on a 0..=100 scale.
	pub impact: f64,
	/// Unbounded; normalized per tier later.
	pub interdependence: f64,
	/// Assurance on a 0..=100 scale.
	pub assurance: f64,
}

impl ResourceScore {
	/// This score with missing parts set to 0.
	pub fn normalized(&self) -> NormalizedScore {
		NormalizedScore {
			impact: finite_or_zero(self.impact),
			interdependence: finite_or_zero(self.interdependence),
			assurance: finite_or_zero(self.assurance),
		}
	}
}

pub(crate) fn finite_or_zero(value: Option<f64>) -> f64 {
	value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Scores indexed by tier name, then resource ID.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
	/// Keyed by project ID, organizations included.
	#[serde(default)]
	pub project: HashMap<String, ResourceScore>,
	/// Keyed by product ID.
	#[serde(default)]
	pub product: HashMap<String, ResourceScore>,
	/// Keyed by supplier ID.
	#[serde(default)]
	pub supplier: HashMap<String, ResourceScore>,
}

impl Scores {
	/// Normalized project score; all zero when absent.
	pub fn project(&self, id: &str) -> NormalizedScore {
		self.project.get(id).map(ResourceScore::normalized).unwrap_or_default()
	}

	/// Normalized product score.
	pub fn product(&self, id: &str) -> NormalizedScore {
		self.product.get(id).map(ResourceScore::normalized).unwrap_or_default()
	}

	/// Normalized supplier score.
	pub fn supplier(&self, id: &str) -> NormalizedScore {
		self.supplier.get(id).map(ResourceScore::normalized).unwrap_or_default()
	}

	/// Supply lines scored for a product.
	pub fn supply_lines(&self, product_id: &str) -> &[SupplyLineMatch] {
		self.product
			.get(product_id)
			.map(|s| s.supply_lines.as_slice())
			.unwrap_or(&[])
	}
}

/// Risk attributes of one product.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRisk {
	/// Keyed `project|<id>`.
	#[serde(rename = "Criticality", default)]
	pub criticality: HashMap<String, f64>,
}

impl ProductRisk {
	/// Criticality of this product for a project; a missing entry is 0.
	pub fn project_criticality(&self, project_id: &str) -> f64 {
		let key = format!("project|{project_id}");
		finite_or_zero(self.criticality.get(&key).copied())
	}
}

/// Everything the graph is derived from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskInputs {
	/// Project rows, organization roots included.
	#[serde(default)]
	pub projects: Vec<Project>,
	/// Asset rows.
	#[serde(default)]
	pub assets: Vec<Asset>,
	/// Product rows.
	#[serde(default)]
	pub products: Vec<Product>,
	/// Supplier rows.
	#[serde(default)]
	pub suppliers: Vec<Supplier>,
	/// Risk scores for every tier.
	#[serde(default)]
	pub scores: Scores,
	/// Keyed by product ID.
	#[serde(default)]
	pub products_risk: HashMap<String, ProductRisk>,
}

impl RiskInputs {
	/// Parse a JSON document holding all input lists.
	pub fn from_json(json: &str) -> Result<Self, InputError> {
		Ok(serde_json::from_str(json)?)
	}

	/// Organization roots, in input order.
	pub fn organizations(&self) -> impl Iterator<Item = &Project> {
		self.projects.iter().filter(|p| p.is_organization())
	}

	/// Whether the project, product and supplier lists are all populated.
	pub fn is_complete(&self) -> bool {
		!self.projects.is_empty() && !self.products.is_empty() && !self.suppliers.is_empty()
	}

	/// Criticality of a product for a project, 0 when unknown.
	pub fn project_criticality(&self, product_id: &str, project_id: &str) -> f64 {
		self.products_risk
			.get(product_id)
			.map(|risk| risk.project_criticality(project_id))
			.unwrap_or(0.0)
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
	Text(String),
	Integer(i64),
	Float(f64),
}

impl RawId {
	fn into_string(self) -> String {
		match self {
			RawId::Text(s) => s,
			RawId::Integer(i) => i.to_string(),
			RawId::Float(f) => f.to_string(),
		}
	}
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	RawId::deserialize(deserializer).map(RawId::into_string)
}

fn optional_id_string<'de, D: Deserializer<'de>>(
	deserializer: D,
) -> Result<Option<String>, D::Error> {
	Ok(Option::<RawId>::deserialize(deserializer)?.map(RawId::into_string))
}
