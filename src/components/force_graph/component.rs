use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use leptos::prelude::*;
use log::{debug, error, info};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::debounce::Debouncer;
use super::options::NetworkOptions;
use super::render;
use super::state::ForceGraphState;
use crate::supply_chain::{
	GraphCommand, GraphEvent, GraphSession, NavigationRequest, SupplyChainGraph, ViewPreferences,
	ViewState,
};

/// Pointer travel (px) after which a press counts as a drag, not a click.
const CLICK_SLOP: f64 = 3.0;

type SharedClosure = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Routes renderer events through the session and applies the resulting
/// commands back onto the canvas state.
#[derive(Clone)]
struct Dispatcher {
	state: Rc<RefCell<Option<ForceGraphState>>>,
	graph: Rc<RefCell<SupplyChainGraph>>,
	session: Rc<RefCell<GraphSession>>,
	preferences: Rc<ViewPreferences>,
	on_navigate: Option<Callback<NavigationRequest>>,
}

impl Dispatcher {
	fn dispatch(&self, event: GraphEvent) {
		debug!("graph event: {event:?}");
		let commands = {
			let graph = self.graph.borrow();
			self.session
				.borrow_mut()
				.handle(&graph, &self.preferences, event)
		};
		for command in commands {
			self.apply(command);
		}
	}

	fn apply(&self, command: GraphCommand) {
		if let GraphCommand::Navigate(request) = command {
			match self.on_navigate {
				Some(callback) => callback.run(request),
				None => debug!("no navigation handler for {request:?}"),
			}
			return;
		}
		let mut state = self.state.borrow_mut();
		let Some(s) = state.as_mut() else {
			return;
		};
		match command {
			GraphCommand::ApplySelection(ids) => s.set_selection(&ids),
			GraphCommand::RestoreView { scale, position } => s.move_to(scale, position),
			GraphCommand::FreezeLayout => s.freeze(),
			GraphCommand::Navigate(_) => {}
		}
	}

	fn selected(&self) -> Vec<String> {
		self.session
			.borrow()
			.selection()
			.selected()
			.map(str::to_string)
			.collect()
	}

	fn snapshot(&self) -> Option<ViewState> {
		self.state.borrow().as_ref().map(ViewState::capture)
	}
}

/// Window listeners and the animation loop, torn down with the component.
struct Listeners {
	running: Rc<Cell<bool>>,
	animate: SharedClosure,
	resize: Closure<dyn FnMut()>,
	unload: Closure<dyn FnMut()>,
	debouncer: Debouncer,
}

impl Listeners {
	fn teardown(&self) {
		self.running.set(false);
		self.debouncer.cancel();
		if let Some(window) = web_sys::window() {
			let _ = window
				.remove_event_listener_with_callback("resize", self.resize.as_ref().unchecked_ref());
			let _ = window.remove_event_listener_with_callback(
				"beforeunload",
				self.unload.as_ref().unchecked_ref(),
			);
		}
		self.animate.borrow_mut().take();
	}
}

fn measure(
	canvas: &HtmlCanvasElement,
	window: &Window,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	let inner = |value: Result<JsValue, JsValue>, fallback: f64| {
		value.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	if fullscreen {
		return (
			inner(window.inner_width(), 800.0),
			inner(window.inner_height(), 600.0),
		);
	}
	(
		width.unwrap_or_else(|| {
			canvas
				.parent_element()
				.map(|p| p.client_width() as f64)
				.unwrap_or(800.0)
		}),
		height.unwrap_or_else(|| {
			canvas
				.parent_element()
				.map(|p| p.client_height() as f64)
				.unwrap_or(600.0)
		}),
	)
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Canvas rendering of a [`SupplyChainGraph`] with hierarchical layout,
/// selection propagation and persisted view state.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<SupplyChainGraph>,
	#[prop(optional)] options: NetworkOptions,
	/// Saved scale and viewport restored after the first stabilization.
	#[prop(optional)]
	preferences: ViewPreferences,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(optional, into)] on_navigate: Option<Callback<NavigationRequest>>,
	/// Receives the final layout when the canvas goes away.
	#[prop(optional, into)]
	on_unload: Option<Callback<ViewState>>,
	/// Every change refits the viewport to the whole graph.
	#[prop(optional, into)]
	recenter: Option<Signal<u64>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let dispatcher = Dispatcher {
		state: Rc::new(RefCell::new(None)),
		graph: Rc::new(RefCell::new(SupplyChainGraph::default())),
		session: Rc::new(RefCell::new(GraphSession::new())),
		preferences: Rc::new(preferences),
		on_navigate,
	};
	let listeners: Rc<RefCell<Option<Listeners>>> = Rc::new(RefCell::new(None));
	let options = Rc::new(options);

	let (dispatcher_init, listeners_init) = (dispatcher.clone(), listeners.clone());
	Effect::new(move |_| {
		let graph = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(window) = web_sys::window() else {
			return;
		};
		let first_build = listeners_init.borrow().is_none();

		let (w, h) = match dispatcher_init.state.borrow().as_ref() {
			Some(s) => (s.width, s.height),
			None => measure(&canvas, &window, fullscreen, width, height),
		};
		let mut next = ForceGraphState::new(&graph, &options, w, h);
		if let Some(previous) = dispatcher_init.state.borrow().as_ref() {
			next.adopt_layout(previous);
		}
		info!(
			"graph built: {} nodes, {} edges",
			graph.nodes.len(),
			graph.edges.len()
		);
		*dispatcher_init.graph.borrow_mut() = graph;
		*dispatcher_init.state.borrow_mut() = Some(next);
		dispatcher_init.session.borrow_mut().reset_selection();
		dispatcher_init.dispatch(GraphEvent::StartStabilizing);

		if !first_build {
			return;
		}

		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		let ctx: CanvasRenderingContext2d = match canvas
			.get_context("2d")
			.ok()
			.flatten()
			.map(|c| c.dyn_into::<CanvasRenderingContext2d>())
		{
			Some(Ok(ctx)) => ctx,
			_ => {
				error!("canvas has no 2d context");
				return;
			}
		};

		let debouncer = Debouncer::new(Duration::from_millis(options.resize_debounce_ms));
		let (debounce_resize, dispatcher_resize, canvas_resize) =
			(debouncer.clone(), dispatcher_init.clone(), canvas.clone());
		let resize = Closure::<dyn FnMut()>::new(move || {
			let (state, canvas) = (dispatcher_resize.state.clone(), canvas_resize.clone());
			debounce_resize.schedule(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = measure(&canvas, &win, fullscreen, width, height);
				canvas.set_width(nw as u32);
				canvas.set_height(nh as u32);
				if let Some(ref mut s) = *state.borrow_mut() {
					s.resize(nw, nh);
				}
			});
		});
		let _ = window.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref());

		let dispatcher_unload = dispatcher_init.clone();
		let unload = Closure::<dyn FnMut()>::new(move || {
			if let (Some(callback), Some(snapshot)) =
				(on_unload, dispatcher_unload.snapshot())
			{
				callback.run(snapshot);
			}
		});
		let _ =
			window.add_event_listener_with_callback("beforeunload", unload.as_ref().unchecked_ref());

		let running = Rc::new(Cell::new(true));
		let animate: SharedClosure = Rc::new(RefCell::new(None));
		let (running_anim, animate_inner, dispatcher_anim) =
			(running.clone(), animate.clone(), dispatcher_init.clone());
		*animate.borrow_mut() = Some(Closure::new(move || {
			if !running_anim.get() {
				return;
			}
			let settled = match *dispatcher_anim.state.borrow_mut() {
				Some(ref mut s) => {
					let settled = s.tick(0.016);
					render::render(s, &ctx);
					settled
				}
				None => false,
			};
			if settled {
				dispatcher_anim.dispatch(GraphEvent::Stabilized);
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}

		*listeners_init.borrow_mut() = Some(Listeners {
			running,
			animate,
			resize,
			unload,
			debouncer,
		});
	});

	if let Some(recenter) = recenter {
		let state_fit = dispatcher.state.clone();
		Effect::new(move |seen: Option<u64>| {
			let count = recenter.get();
			if seen.is_some_and(|seen| seen != count) {
				if let Some(ref mut s) = *state_fit.borrow_mut() {
					s.fit();
				}
			}
			count
		});
	}

	let teardown = StoredValue::new_local((dispatcher.clone(), listeners));
	on_cleanup(move || {
		teardown.try_with_value(|(dispatcher, listeners)| {
			if let (Some(callback), Some(snapshot)) = (on_unload, dispatcher.snapshot()) {
				callback.run(snapshot);
			}
			if let Some(listeners) = listeners.borrow_mut().take() {
				listeners.teardown();
			}
		});
	});

	let state_md = dispatcher.state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.drag.moved = false;
			s.drag.start_x = x;
			s.drag.start_y = y;
			if let Some(idx) = s.node_at_position(x, y) {
				s.drag.active = true;
				s.drag.node_idx = Some(idx);
				s.graph.visit_nodes(|node| {
					if node.index() == idx {
						s.drag.node_start_x = node.x();
						s.drag.node_start_y = node.y();
					}
				});
			} else {
				s.pan.active = true;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let state_mm = dispatcher.state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut cursor = "grab";
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.hover.pointer = (x, y);
			if (s.drag.active || s.pan.active)
				&& (x - s.drag.start_x).hypot(y - s.drag.start_y) > CLICK_SLOP
			{
				s.drag.moved = true;
			}

			if !s.drag.active && !s.pan.active && s.options.interaction.hover {
				let hovered = s.node_at_position(x, y);
				s.set_hover(hovered);
				let edge = match hovered {
					Some(_) => None,
					None => s.edge_at_position(x, y),
				};
				s.set_hover_edge(edge);
			}
			if s.hover.node.is_some() {
				cursor = "pointer";
			}

			if s.drag.active {
				if let Some(idx) = s.drag.node_idx {
					let (dx, dy) = (
						(x - s.drag.start_x) / s.transform.k,
						(y - s.drag.start_y) / s.transform.k,
					);
					let (nx, ny) = (
						s.drag.node_start_x + dx as f32,
						s.drag.node_start_y + dy as f32,
					);
					s.graph.visit_nodes_mut(|node| {
						if node.index() == idx {
							node.data.x = nx;
							node.data.y = ny;
							node.data.is_anchor = true;
						}
					});
				}
				cursor = "grabbing";
			} else if s.pan.active {
				s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
				cursor = "grabbing";
			}
		}
		if let Some(canvas) = canvas_ref.get() {
			let _ = web_sys::HtmlElement::style(&canvas).set_property("cursor", cursor);
		}
	};

	let state_mu = dispatcher.state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
		}
	};

	let state_ml = dispatcher.state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
			s.set_hover(None);
			s.set_hover_edge(None);
		}
	};

	let dispatcher_click = dispatcher.clone();
	let on_click = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let (clicked, multiselect) = {
			let state = dispatcher_click.state.borrow();
			let Some(s) = state.as_ref() else {
				return;
			};
			if s.drag.moved {
				return;
			}
			let clicked = s
				.node_at_position(x, y)
				.map(|idx| (s.node_id(idx), s.is_selected(idx)));
			(clicked, s.options.interaction.multiselect)
		};
		let selected = dispatcher_click.selected();
		let toggle = multiselect && (ev.ctrl_key() || ev.meta_key() || ev.shift_key());

		match clicked {
			Some((Some(id), was_selected)) if toggle => {
				if was_selected {
					let surviving = selected.into_iter().filter(|s| *s != id).collect();
					dispatcher_click.dispatch(GraphEvent::DeselectNode { nodes: surviving });
				} else {
					let mut nodes = selected;
					nodes.push(id);
					dispatcher_click.dispatch(GraphEvent::SelectNode { nodes });
				}
			}
			Some((Some(id), _)) => {
				// a plain click replaces the selection
				if !selected.is_empty() {
					dispatcher_click.dispatch(GraphEvent::DeselectNode { nodes: Vec::new() });
				}
				dispatcher_click.dispatch(GraphEvent::SelectNode { nodes: vec![id] });
			}
			_ => {
				if !selected.is_empty() {
					dispatcher_click.dispatch(GraphEvent::DeselectNode { nodes: Vec::new() });
				}
			}
		}
	};

	let dispatcher_dbl = dispatcher.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let id = dispatcher_dbl
			.state
			.borrow()
			.as_ref()
			.and_then(|s| s.node_at_position(x, y).and_then(|idx| s.node_id(idx)));
		if let Some(id) = id {
			dispatcher_dbl.dispatch(GraphEvent::DoubleClick { nodes: vec![id] });
		}
	};

	let state_wh = dispatcher.state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.zoom_at(x, y, factor);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:click=on_click
			on:dblclick=on_dblclick
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
