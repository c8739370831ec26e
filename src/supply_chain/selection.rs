//! Descendant-propagating node selection.

use std::collections::{BTreeSet, HashSet};

use log::debug;

use super::graph::SupplyChainGraph;

/// Set of selected node ids, closed over descendants of explicit selections.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionTracker {
	selected: BTreeSet<String>,
}

impl SelectionTracker {
	/// Empty selection.
	pub fn new() -> Self {
		Self::default()
	}

	/// Whether `id` is selected.
	pub fn is_selected(&self, id: &str) -> bool {
		self.selected.contains(id)
	}

	/// Whether nothing is selected.
	pub fn is_empty(&self) -> bool {
		self.selected.is_empty()
	}

	/// Selected ids in sorted order.
	pub fn selected(&self) -> impl Iterator<Item = &str> {
		self.selected.iter().map(String::as_str)
	}

	/// Deselect everything.
	pub fn clear(&mut self) {
		self.selected.clear();
	}

	/// Select each id that is not selected yet, along with all its descendants.
	pub fn select<'a>(&mut self, graph: &SupplyChainGraph, ids: impl IntoIterator<Item = &'a str>) {
		for id in ids {
			if self.selected.contains(id) {
				continue;
			}
			self.selected.insert(id.to_string());
			for descendant in graph.descendants(id) {
				self.selected.insert(descendant.to_string());
			}
		}
		debug!("selection now holds {} nodes", self.selected.len());
	}

	/// Apply a deselect event carrying the ids that remain selected.
	///
	/// Every selected id missing from `surviving` is removed together with its
	/// descendants. Nodes a remaining selection still reaches without passing
	/// through a dropped id are then restored.
	pub fn deselect<'a>(
		&mut self,
		graph: &SupplyChainGraph,
		surviving: impl IntoIterator<Item = &'a str>,
	) {
		let surviving: HashSet<&str> = surviving.into_iter().collect();
		let dropped: Vec<String> = self
			.selected
			.iter()
			.filter(|id| !surviving.contains(id.as_str()))
			.cloned()
			.collect();
		if dropped.is_empty() {
			return;
		}

		for id in &dropped {
			self.selected.remove(id);
			for descendant in graph.descendants(id) {
				self.selected.remove(descendant);
			}
		}

		let blocked: HashSet<&str> = dropped.iter().map(String::as_str).collect();
		let remaining: Vec<String> = self.selected.iter().cloned().collect();
		for id in &remaining {
			for descendant in graph.descendants_avoiding(id, |d| blocked.contains(d)) {
				self.selected.insert(descendant.to_string());
			}
		}
		debug!(
			"deselected {} nodes, {} remain selected",
			dropped.len(),
			self.selected.len()
		);
	}
}
