use std::collections::{BTreeMap, HashMap, HashSet};

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData};

use super::options::NetworkOptions;
use super::scale;
use super::types::{EdgeInfo, NodeInfo};
use crate::supply_chain::{LayoutSource, Point, SupplyChainGraph};

const MIN_ZOOM: f64 = 0.05;
const MAX_ZOOM: f64 = 10.0;
const FIT_PADDING: f64 = 0.9;
/// Screen pixels around an edge stroke that still count as hovering it.
const EDGE_HIT_SLOP: f64 = 4.0;

fn segment_distance(px: f64, py: f64, (x1, y1): (f64, f64), (x2, y2): (f64, f64)) -> f64 {
	let (dx, dy) = (x2 - x1, y2 - y1);
	let len_sq = dx * dx + dy * dy;
	let t = if len_sq > 0.0 {
		(((px - x1) * dx + (py - y1) * dy) / len_sq).clamp(0.0, 1.0)
	} else {
		0.0
	};
	(px - (x1 + t * dx)).hypot(py - (y1 + t * dy))
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub moved: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<DefaultNodeIdx>,
	pub neighbors: HashSet<DefaultNodeIdx>,
	pub highlight_t: f64,
	pub prev_node: Option<DefaultNodeIdx>,
	pub prev_neighbors: HashSet<DefaultNodeIdx>,
	/// Index into the edge list of the edge under the pointer.
	pub edge: Option<usize>,
	/// Pointer position in screen space, for the tooltip.
	pub pointer: (f64, f64),
	delay_t: f64,
}

impl HoverState {
	/// Whether the hovered node has rested long enough to show its tooltip.
	pub fn tooltip_ready(&self, delay_secs: f64) -> bool {
		(self.node.is_some() || self.edge.is_some()) && self.delay_t >= delay_secs
	}
}

#[derive(Clone, Debug, Default)]
pub struct Stabilization {
	pub iterations: u32,
	pub settled: bool,
}

pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub options: NetworkOptions,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub stabilization: Stabilization,
	pub selected: HashSet<DefaultNodeIdx>,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	/// Keep every free node on its level row.
	pub layout_locked: bool,
	edges: Vec<EdgeInfo>,
	id_to_idx: HashMap<String, DefaultNodeIdx>,
}

impl ForceGraphState {
	pub fn new(data: &SupplyChainGraph, options: &NetworkOptions, width: f64, height: f64) -> Self {
		let mut graph = ForceGraph::new(options.physics.simulation_parameters());
		let mut id_to_idx = HashMap::new();
		let mut edges = Vec::new();
		let layout = &options.layout;

		// spread each level's row around x = 0
		let mut row_sizes: HashMap<u32, usize> = HashMap::new();
		for node in &data.nodes {
			*row_sizes.entry(node.level).or_default() += 1;
		}
		let mut row_slots: HashMap<u32, usize> = HashMap::new();

		for node in &data.nodes {
			let slot = row_slots.entry(node.level).or_default();
			let row_len = row_sizes[&node.level];
			let seeded = (
				(*slot as f64 - (row_len as f64 - 1.0) / 2.0) * layout.node_spacing,
				layout.row_y(node.level),
			);
			*slot += 1;
			let (x, y) = node.position.map(|p| (p.x, p.y)).unwrap_or(seeded);

			let idx = graph.add_node(NodeData {
				x: x as f32,
				y: y as f32,
				mass: 10.0,
				is_anchor: node.position.is_some(),
				user_data: NodeInfo {
					id: node.id.clone(),
					label: node.label.clone(),
					color: node.color.clone(),
					group: Some(node.group),
					shape: options.groups.shape(node.group),
					radius: scale::node_radius(node.size, options.node_scaling),
					level: node.level,
					risk: node.risk,
				},
			});
			id_to_idx.insert(node.id.clone(), idx);
		}

		for edge in &data.edges {
			if let (Some(&src), Some(&tgt)) = (id_to_idx.get(&edge.from), id_to_idx.get(&edge.to)) {
				graph.add_edge(src, tgt, EdgeData::default());
				edges.push(EdgeInfo {
					source: src,
					target: tgt,
					color: edge.color.clone(),
					width: scale::edge_width(edge.weight, options.edge_scaling),
					weight: edge.weight,
					from_label: edge.from_label.clone(),
					to_label: edge.to_label.clone(),
					risk: edge.risk,
				});
			}
		}

		Self {
			graph,
			options: options.clone(),
			edges,
			id_to_idx,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			stabilization: Stabilization::default(),
			selected: HashSet::new(),
			width,
			height,
			animation_running: options.physics.enabled,
			layout_locked: options.physics.enabled,
		}
	}

	pub fn edges(&self) -> &[EdgeInfo] {
		&self.edges
	}

	pub fn node_info(&self, idx: DefaultNodeIdx) -> Option<NodeInfo> {
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some(node.data.user_data.clone());
			}
		});
		found
	}

	pub fn node_id(&self, idx: DefaultNodeIdx) -> Option<String> {
		self.id_to_idx
			.iter()
			.find(|&(_, &i)| i == idx)
			.map(|(id, _)| id.clone())
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			// radius is in graph space, scales with zoom like the shapes
			if (dx * dx + dy * dy).sqrt() < node.data.user_data.radius {
				found = Some(node.index());
			}
		});
		found
	}

	/// Edge whose stroke passes within a few pixels of the screen point.
	pub fn edge_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let positions = self.node_positions();
		let slop = EDGE_HIT_SLOP / self.transform.k;
		self.edges.iter().position(|edge| {
			let (Some(&(x1, y1)), Some(&(x2, y2))) =
				(positions.get(&edge.source), positions.get(&edge.target))
			else {
				return false;
			};
			let (x1, y1, x2, y2) = (x1 as f64, y1 as f64, x2 as f64, y2 as f64);
			segment_distance(gx, gy, (x1, y1), (x2, y2)) <= edge.width / 2.0 + slop
		})
	}

	pub fn set_hover_edge(&mut self, edge: Option<usize>) {
		if self.hover.edge != edge {
			self.hover.edge = edge;
			if self.hover.node.is_none() {
				self.hover.delay_t = 0.0;
			}
		}
	}

	pub fn edge(&self, index: usize) -> Option<&EdgeInfo> {
		self.edges.get(index)
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Save previous state for fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();
		self.hover.delay_t = 0.0;

		if let Some(idx) = node {
			for edge in &self.edges {
				if edge.source == idx {
					self.hover.neighbors.insert(edge.target);
				} else if edge.target == idx {
					self.hover.neighbors.insert(edge.source);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	/// Replace the highlighted selection with these node ids.
	pub fn set_selection(&mut self, ids: &[String]) {
		self.selected = ids
			.iter()
			.filter_map(|id| self.id_to_idx.get(id).copied())
			.collect();
	}

	pub fn is_selected(&self, idx: DefaultNodeIdx) -> bool {
		self.selected.contains(&idx)
	}

	fn node_positions(&self) -> HashMap<DefaultNodeIdx, (f32, f32)> {
		let mut positions = HashMap::new();
		self.graph.visit_nodes(|node| {
			positions.insert(node.index(), (node.x(), node.y()));
		});
		positions
	}

	/// Advance physics and hover animation by `dt` seconds.
	///
	/// Returns `true` on the tick the simulation first settles.
	pub fn tick(&mut self, dt: f32) -> bool {
		let mut settled_now = false;
		if self.animation_running {
			let before = self.node_positions();
			self.graph.update(dt);
			if self.layout_locked {
				let layout = &self.options.layout;
				self.graph.visit_nodes_mut(|node| {
					if !node.data.is_anchor {
						node.data.y = layout.row_y(node.data.user_data.level) as f32;
					}
				});
			}
			let mut movement = 0.0_f64;
			self.graph.visit_nodes(|node| {
				if let Some(&(bx, by)) = before.get(&node.index()) {
					let (dx, dy) = ((node.x() - bx) as f64, (node.y() - by) as f64);
					movement = movement.max((dx * dx + dy * dy).sqrt());
				}
			});

			let physics = &self.options.physics;
			self.stabilization.iterations += 1;
			if !self.stabilization.settled
				&& (movement < physics.settle_threshold
					|| self.stabilization.iterations >= physics.max_stabilization_iterations)
			{
				self.stabilization.settled = true;
				settled_now = true;
			}
		} else if !self.stabilization.settled {
			// physics disabled: the seeded layout is final
			self.stabilization.settled = true;
			settled_now = true;
		}

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() || self.hover.edge.is_some() {
			self.hover.delay_t += dt as f64;
		}
		if self.hover.node.is_some() {
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
		settled_now
	}

	/// Stop the simulation and let nodes leave their level rows.
	pub fn freeze(&mut self) {
		self.animation_running = false;
		self.layout_locked = false;
		self.stabilization.settled = true;
	}

	/// Center the viewport on `position` at `scale`; with neither, fit the graph.
	pub fn move_to(&mut self, scale: Option<f64>, position: Option<Point>) {
		if scale.is_none() && position.is_none() {
			self.fit();
			return;
		}
		let center = position.unwrap_or_else(|| self.view_position());
		let k = scale.unwrap_or(self.transform.k).clamp(MIN_ZOOM, MAX_ZOOM);
		self.transform = ViewTransform {
			x: self.width / 2.0 - center.x * k,
			y: self.height / 2.0 - center.y * k,
			k,
		};
	}

	/// Zoom and pan so every node is visible.
	pub fn fit(&mut self) {
		let (mut min_x, mut min_y, mut max_x, mut max_y) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
		self.graph.visit_nodes(|node| {
			let r = node.data.user_data.radius;
			let (x, y) = (node.x() as f64, node.y() as f64);
			min_x = min_x.min(x - r);
			min_y = min_y.min(y - r);
			max_x = max_x.max(x + r);
			max_y = max_y.max(y + r);
		});
		if min_x > max_x {
			return;
		}
		let (w, h) = ((max_x - min_x).max(1.0), (max_y - min_y).max(1.0));
		let k = (self.width / w).min(self.height / h) * FIT_PADDING;
		self.move_to(
			Some(k),
			Some(Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0)),
		);
	}

	/// Carry the viewport and the positions of surviving nodes over from the
	/// layout this one replaces.
	pub fn adopt_layout(&mut self, previous: &ForceGraphState) {
		self.transform = previous.transform.clone();
		let carried = previous.positions();
		self.graph.visit_nodes_mut(|node| {
			if let Some(point) = carried.get(&node.data.user_data.id) {
				node.data.x = point.x as f32;
				node.data.y = point.y as f32;
			}
		});
	}

	/// Zoom by `factor` keeping the screen point `(x, y)` fixed.
	pub fn zoom_at(&mut self, x: f64, y: f64, factor: f64) {
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Resize the viewport, keeping the same graph point at its center.
	pub fn resize(&mut self, width: f64, height: f64) {
		let center = self.view_position();
		self.width = width;
		self.height = height;
		self.move_to(Some(self.transform.k), Some(center));
	}
}

impl LayoutSource for ForceGraphState {
	fn positions(&self) -> BTreeMap<String, Point> {
		let mut positions = BTreeMap::new();
		self.graph.visit_nodes(|node| {
			positions.insert(
				node.data.user_data.id.clone(),
				Point::new(node.x() as f64, node.y() as f64),
			);
		});
		positions
	}

	fn scale(&self) -> f64 {
		self.transform.k
	}

	fn view_position(&self) -> Point {
		Point::new(
			(self.width / 2.0 - self.transform.x) / self.transform.k,
			(self.height / 2.0 - self.transform.y) / self.transform.k,
		)
	}
}
