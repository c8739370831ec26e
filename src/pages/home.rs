use leptos::prelude::*;
use log::{debug, info, warn};

use crate::components::force_graph::ForceGraphCanvas;
use crate::preferences::LocalStoragePreferences;
use crate::supply_chain::{
	CombinedImpact, DerivationOptions, NavigationRequest, RiskInputs, ViewPreferences, ViewState,
	derive_graph, persist_view_state,
};

/// Bundled demo organization.
const SAMPLE_DATA: &str = include_str!("../../data/sample_supply_chain.json");

fn load_preferences() -> ViewPreferences {
	match LocalStoragePreferences::open() {
		Ok(store) => ViewPreferences::load(&store),
		Err(err) => {
			warn!("starting without saved layout: {err}");
			ViewPreferences::default()
		}
	}
}

fn save_view_state(inputs_ready: bool, snapshot: &ViewState) {
	let saved = LocalStoragePreferences::open()
		.and_then(|mut store| persist_view_state(inputs_ready, snapshot, &mut store));
	match saved {
		Ok(true) => debug!("saved layout of {} nodes", snapshot.positions.len()),
		Ok(false) => {}
		Err(err) => warn!("could not save layout: {err}"),
	}
}

/// Risk graph of one organization's supply chain.
#[component]
fn SupplyChainGraphView(inputs: RiskInputs) -> impl IntoView {
	let preferences = load_preferences();
	let positions = preferences.nodes.clone();
	let inputs_ready = inputs.is_complete();
	let inputs = StoredValue::new(inputs);
	let (hide_unconnected, set_hide_unconnected) = signal(false);
	let (last_request, set_last_request) = signal(None::<NavigationRequest>);
	let (recenter, set_recenter) = signal(0u64);

	let graph = Signal::derive(move || {
		let options = DerivationOptions {
			hide_unconnected: hide_unconnected.get(),
		};
		inputs.with_value(|inputs| derive_graph(inputs, &positions, &options, &CombinedImpact))
	});

	let on_navigate = move |request: NavigationRequest| {
		info!("navigate to {}", request.path());
		set_last_request.set(Some(request));
	};
	let on_unload = move |snapshot: ViewState| save_view_state(inputs_ready, &snapshot);

	view! {
		<div class="fullscreen-graph">
			<ForceGraphCanvas
				data=graph
				preferences=preferences
				fullscreen=true
				on_navigate=on_navigate
				on_unload=on_unload
				recenter=recenter
			/>
			<div class="graph-overlay">
				<h1>"Supply Chain Risk"</h1>
				<p class="subtitle">
					"Click to select a resource and everything below it. Double-click to open its metrics."
				</p>
				<label>
					<input
						type="checkbox"
						prop:checked=hide_unconnected
						on:change=move |ev| set_hide_unconnected.set(event_target_checked(&ev))
					/>
					" Hide unconnected resources"
				</label>
				<button on:click=move |_| set_recenter.update(|n| *n += 1)>"Re-center Chart"</button>
				{move || {
					last_request
						.get()
						.map(|request| view! { <p class="navigation">"Opening " {request.path()}</p> })
				}}
			</div>
		</div>
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let inputs = RiskInputs::from_json(SAMPLE_DATA);

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			{inputs.map(|inputs| view! { <SupplyChainGraphView inputs /> })}
		</ErrorBoundary>
	}
}
