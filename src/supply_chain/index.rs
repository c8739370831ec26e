use std::collections::HashMap;

use super::model::{Asset, Project, Supplier};

/// ID-keyed lookups over the flat input lists.
#[derive(Clone, Debug, Default)]
pub struct ResourceIndex<'a> {
	/// Projects by ID.
	pub projects: HashMap<&'a str, &'a Project>,
	/// Assets, re-parented onto the inferred organization root.
	pub assets: HashMap<&'a str, Asset>,
	/// Suppliers by ID.
	pub suppliers: HashMap<&'a str, &'a Supplier>,
}

impl<'a> ResourceIndex<'a> {
	/// Index the input lists.
	pub fn build(projects: &'a [Project], assets: &'a [Asset], suppliers: &'a [Supplier]) -> Self {
		let organization = projects.iter().find(|p| p.is_organization());
		Self {
			projects: projects.iter().map(|p| (p.id.as_str(), p)).collect(),
			assets: assets
				.iter()
				.map(|a| {
					let asset = Asset {
						parent_id: organization.map(|o| o.id.clone()),
						..a.clone()
					};
					(a.id.as_str(), asset)
				})
				.collect(),
			suppliers: suppliers.iter().map(|s| (s.id.as_str(), s)).collect(),
		}
	}

	/// Project name, empty when unknown.
	pub fn project_name(&self, id: &str) -> &'a str {
		self.projects.get(id).map(|p| p.name.as_str()).unwrap_or("")
	}

	/// Supplier name, empty when unknown.
	pub fn supplier_name(&self, id: &str) -> &'a str {
		self.suppliers.get(id).map(|s| s.name.as_str()).unwrap_or("")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn project(id: &str, parent: Option<&str>) -> Project {
		Project {
			id: id.into(),
			name: format!("Project {id}"),
			parent_id: parent.map(Into::into),
			level: None,
		}
	}

	#[test]
	fn assets_hang_off_the_first_organization() {
		let projects = vec![project("p1", Some("org")), project("org", None), project("org2", None)];
		let assets = vec![Asset {
			id: "a1".into(),
			name: "Plant".into(),
			parent_id: Some("p1".into()),
		}];
		let index = ResourceIndex::build(&projects, &assets, &[]);
		assert_eq!(index.assets["a1"].parent_id.as_deref(), Some("org"));
		assert_eq!(index.projects.len(), 3);
	}

	#[test]
	fn unknown_ids_resolve_to_empty_names() {
		let suppliers = vec![Supplier {
			id: "s1".into(),
			name: "Acme".into(),
		}];
		let index = ResourceIndex::build(&[], &[], &suppliers);
		assert_eq!(index.supplier_name("s1"), "Acme");
		assert_eq!(index.supplier_name("s2"), "");
		assert_eq!(index.project_name("p"), "");
	}

	#[test]
	fn assets_without_an_organization_have_no_parent() {
		let assets = vec![Asset {
			id: "a1".into(),
			parent_id: Some("x".into()),
			..Default::default()
		}];
		let index = ResourceIndex::build(&[], &assets, &[]);
		assert_eq!(index.assets["a1"].parent_id, None);
	}
}
