//! Supply chain risk graph: derivation of the leveled node/edge structure
//! from flat resource and score records, plus the interaction state that
//! lives alongside it.
//!
//! Nothing in here touches the browser; the canvas component consumes
//! [`SupplyChainGraph`] and feeds [`GraphEvent`]s back through a
//! [`GraphSession`].

mod color;
mod edges;
mod error;
mod events;
mod graph;
mod impact;
mod index;
mod model;
mod nodes;
mod selection;
mod view_state;

pub use color::{ImpactRamp, RAMP_STEPS};
pub use edges::SeenSets;
pub use error::{InputError, PreferenceError};
pub use events::{
	GraphCommand, GraphEvent, GraphSession, NavigationRequest, ResourceType, navigation_target,
};
pub use graph::{
	DerivationOptions, EdgeClass, GraphEdge, GraphNode, RiskSummary, SupplyChainGraph, Tier,
	TierStats, derive_graph,
};
pub use impact::{CombinedImpact, ImpactAggregator, MAX_IMPACT_SCORE};
pub use index::ResourceIndex;
pub use model::{
	Asset, NormalizedScore, Point, Product, ProductRisk, Project, ResourceScore, RiskInputs,
	Scores, Supplier, SupplyLineMatch, cell_multiples,
};
pub use selection::SelectionTracker;
pub use view_state::{
	LayoutSource, MemoryPreferences, NODES_KEY, POSITION_KEY, PreferenceStore, SCALE_KEY,
	ViewPreferences, ViewRestore, ViewState, ViewStateSync, persist_view_state,
};
