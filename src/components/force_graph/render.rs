use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::DefaultNodeIdx;
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::scale;
use super::state::ForceGraphState;
use super::types::{EdgeInfo, NodeInfo, NodeShape};
use crate::supply_chain::Tier;

const BACKGROUND: &str = "#ffffff";
const SELECTION: &str = "#00007f";
const LABEL: &str = "#343434";
const TOOLTIP_WIDTH: f64 = 260.0;
const TOOLTIP_LINE: f64 = 18.0;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	let positions = node_positions(state);
	draw_edges(state, &positions, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
	draw_tooltip(state, ctx);
}

fn node_positions(state: &ForceGraphState) -> HashMap<DefaultNodeIdx, (f64, f64, f64)> {
	let mut positions = HashMap::new();
	state.graph.visit_nodes(|node| {
		positions.insert(
			node.index(),
			(node.x() as f64, node.y() as f64, node.data.user_data.radius),
		);
	});
	positions
}

fn draw_edges(
	state: &ForceGraphState,
	positions: &HashMap<DefaultNodeIdx, (f64, f64, f64)>,
	ctx: &CanvasRenderingContext2d,
) {
	let k = state.transform.k;
	let t = ease_out_cubic(state.hover.highlight_t);
	let has_highlight = state.has_active_highlight();
	let arrow_size = 14.0;

	for edge in state.edges() {
		let (Some(&(x1, y1, r1)), Some(&(x2, y2, r2))) =
			(positions.get(&edge.source), positions.get(&edge.target))
		else {
			continue;
		};
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		let is_highlighted = state.is_highlighted(edge.source) && state.is_highlighted(edge.target);
		let alpha = match (has_highlight, is_highlighted) {
			(false, _) => 0.85,
			(true, true) => 0.85 + 0.15 * t,
			(true, false) => 0.85 - 0.65 * t,
		};

		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(&edge.color);
		ctx.set_line_width(edge.width);
		// zero-weight links are drawn but marked as carrying no dependency
		if edge.weight <= 0.0 {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(10.0 / k.max(0.5)),
				&JsValue::from_f64(6.0 / k.max(0.5)),
			));
		} else {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(x1 + ux * r1, y1 + uy * r1);
		ctx.line_to(x2 - ux * (r2 + arrow_size), y2 - uy * (r2 + arrow_size));
		ctx.stroke();

		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_fill_style_str(&edge.color);
		let (tip_x, tip_y) = (x2 - ux * r2, y2 - uy * r2);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	ctx.set_global_alpha(1.0);
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn trace_shape(ctx: &CanvasRenderingContext2d, shape: NodeShape, x: f64, y: f64, r: f64) {
	ctx.begin_path();
	match shape {
		NodeShape::Dot => {
			let _ = ctx.arc(x, y, r, 0.0, 2.0 * PI);
		}
		NodeShape::Square => ctx.rect(x - r, y - r, 2.0 * r, 2.0 * r),
		NodeShape::Hexagon => polygon(ctx, x, y, r, 6, 0.0),
		NodeShape::Triangle => polygon(ctx, x, y, r, 3, -PI / 2.0),
	}
	ctx.close_path();
}

fn polygon(ctx: &CanvasRenderingContext2d, x: f64, y: f64, r: f64, sides: u32, rotation: f64) {
	for i in 0..sides {
		let angle = rotation + 2.0 * PI * i as f64 / sides as f64;
		let (px, py) = (x + r * angle.cos(), y + r * angle.sin());
		if i == 0 {
			ctx.move_to(px, py);
		} else {
			ctx.line_to(px, py);
		}
	}
}

fn draw_label(ctx: &CanvasRenderingContext2d, info: &NodeInfo, x: f64, y: f64, radius: f64, alpha: f64) {
	let is_org = info.group == Some(Tier::Organization);
	let size = scale::label_font_size(is_org);
	ctx.set_global_alpha(alpha);
	ctx.set_fill_style_str(LABEL);
	ctx.set_font(&format!("{size}px sans-serif"));
	ctx.set_text_align("center");
	let _ = ctx.fill_text(&info.label, x, y + radius + size);
	ctx.set_text_align("start");
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);

	state.graph.visit_nodes(|node| {
		let idx = node.index();
		if has_highlight && state.is_highlighted(idx) {
			return;
		}
		let info = &node.data.user_data;
		let (x, y) = (node.x() as f64, node.y() as f64);
		let alpha = 1.0 - 0.6 * t;

		ctx.set_global_alpha(alpha);
		trace_shape(ctx, info.shape, x, y, info.radius);
		ctx.set_fill_style_str(&info.color);
		ctx.fill();
		ctx.set_global_alpha(1.0);
		if state.is_selected(idx) {
			ctx.set_stroke_style_str(SELECTION);
			ctx.set_line_width(4.0 / k.max(0.25));
			ctx.stroke();
		}
		draw_label(ctx, info, x, y, info.radius, alpha);
	});

	if !has_highlight {
		return;
	}

	state.graph.visit_nodes(|node| {
		let idx = node.index();
		if !state.is_highlighted(idx) {
			return;
		}
		let info = &node.data.user_data;
		let (x, y) = (node.x() as f64, node.y() as f64);
		let radius = if state.is_hovered(idx) {
			info.radius * (1.0 + 0.15 * t)
		} else {
			info.radius
		};

		trace_shape(ctx, info.shape, x, y, radius);
		ctx.set_fill_style_str(&info.color);
		ctx.fill();
		if state.is_selected(idx) || (state.is_hovered(idx) && t > 0.01) {
			ctx.set_stroke_style_str(SELECTION);
			ctx.set_line_width(4.0 / k.max(0.25));
			ctx.stroke();
		}
		draw_label(ctx, info, x, y, radius, 1.0);
	});
}

/// Lines shown on hover: type, name, the three metrics and a navigation hint.
pub fn tooltip_lines(info: &NodeInfo) -> Vec<String> {
	let Some(tier) = info.group else {
		return vec![info.label.clone()];
	};
	let mut lines = vec![
		tier.display_name().to_string(),
		info.label.clone(),
		format!("Impact: {}", metric(info.risk.impact)),
		format!("Interdependence: {}", metric(info.risk.interdependence)),
		format!("Assurance: {}", metric(info.risk.assurance)),
	];
	if tier != Tier::Organization {
		lines.push(format!(
			"double-click to see {} metrics",
			tier.display_name()
		));
	}
	lines
}

/// Lines shown when hovering a supply line between two resources.
pub fn edge_tooltip_lines(from: &NodeInfo, to: &NodeInfo, edge: &EdgeInfo) -> Vec<String> {
	let kind = |info: &NodeInfo| info.group.map(Tier::display_name).unwrap_or("Resource");
	vec![
		"Supply Line".to_string(),
		format!("{}: {}", kind(from), edge.from_label),
		format!("{}: {}", kind(to), edge.to_label),
		format!("Impact: {}", metric(edge.risk.impact)),
		format!("Interdependence: {}", metric(edge.risk.interdependence)),
	]
}

/// Scores are shown rounded to whole numbers.
fn metric(value: f64) -> String {
	if value.is_finite() {
		format!("{value:.0}")
	} else {
		"0".to_string()
	}
}

fn draw_tooltip(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let delay = state.options.interaction.tooltip_delay_ms as f64 / 1000.0;
	if !state.options.interaction.hover || !state.hover.tooltip_ready(delay) {
		return;
	}
	let lines = match (state.hover.node, state.hover.edge) {
		(Some(idx), _) => state.node_info(idx).map(|info| tooltip_lines(&info)),
		(None, Some(index)) => state.edge(index).and_then(|edge| {
			let from = state.node_info(edge.source)?;
			let to = state.node_info(edge.target)?;
			Some(edge_tooltip_lines(&from, &to, edge))
		}),
		(None, None) => None,
	};
	let Some(lines) = lines else {
		return;
	};
	let height = TOOLTIP_LINE * lines.len() as f64 + 12.0;
	let (px, py) = state.hover.pointer;
	let x = (px + 16.0).min(state.width - TOOLTIP_WIDTH - 4.0).max(4.0);
	let y = (py + 16.0).min(state.height - height - 4.0).max(4.0);

	ctx.set_global_alpha(0.95);
	ctx.set_fill_style_str("#f5f4ed");
	ctx.fill_rect(x, y, TOOLTIP_WIDTH, height);
	ctx.set_stroke_style_str("#808074");
	ctx.set_line_width(1.0);
	ctx.stroke_rect(x, y, TOOLTIP_WIDTH, height);
	ctx.set_global_alpha(1.0);

	ctx.set_fill_style_str(LABEL);
	for (i, line) in lines.iter().enumerate() {
		let weight = if i == 1 { "bold " } else { "" };
		ctx.set_font(&format!("{weight}13px sans-serif"));
		let _ = ctx.fill_text(line, x + 8.0, y + 6.0 + TOOLTIP_LINE * (i as f64 + 0.75));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::supply_chain::RiskSummary;

	fn info(group: Tier) -> NodeInfo {
		NodeInfo {
			label: "Widget".to_string(),
			group: Some(group),
			risk: RiskSummary {
				impact: 42.2,
				interdependence: f64::NAN,
				max_interdependence: 1.0,
				assurance: 0.5,
			},
			..NodeInfo::default()
		}
	}

	#[test]
	fn tooltip_names_the_metrics_page() {
		let lines = tooltip_lines(&info(Tier::Product));
		assert_eq!(lines[0], "Product");
		assert_eq!(lines[1], "Widget");
		assert_eq!(lines[2], "Impact: 42");
		assert_eq!(lines[3], "Interdependence: 0");
		assert_eq!(lines.last().map(String::as_str), Some("double-click to see Product metrics"));
	}

	#[test]
	fn supply_line_tooltip_names_both_ends() {
		let edge = EdgeInfo {
			source: Default::default(),
			target: Default::default(),
			color: "#808080".to_string(),
			width: 1.0,
			weight: 0.0,
			from_label: "Widget".to_string(),
			to_label: "Acme".to_string(),
			risk: RiskSummary {
				impact: 12.4,
				interdependence: 7.0,
				max_interdependence: 7.0,
				assurance: 0.0,
			},
		};
		let lines = edge_tooltip_lines(&info(Tier::Product), &info(Tier::Supplier), &edge);
		assert_eq!(
			lines,
			vec!["Supply Line", "Product: Widget", "Supplier: Acme", "Impact: 12", "Interdependence: 7"]
		);
	}

	#[test]
	fn organizations_have_no_navigation_hint() {
		let lines = tooltip_lines(&info(Tier::Organization));
		assert_eq!(lines.len(), 5);
	}
}
