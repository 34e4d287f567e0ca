use std::collections::HashSet;

use leptos::ev::{MouseEvent, SubmitEvent};
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, info, warn};
use serde_json::Value;

use super::sample_graph::SampleGraph;
use crate::components::knowledge_graph::{
	Completion, ENTITY_TYPES, EntityDetail, EntityDetailProvider, GraphRequest, GraphSnapshot,
	KnowledgeGraphCanvas, RequestTracker, entity_style, fetch_graph,
};

const DEFAULT_LIMIT: usize = 40;
const DEFAULT_EXPAND_DEPTH: u32 = 2;

fn attribute_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

fn detail_panel(detail: EntityDetail, on_close: impl Fn() + 'static) -> impl IntoView {
	let style = entity_style(&detail.entity.kind);
	let badge = format!("background: {};", style.color.rgba(1.0));
	let attributes = detail
		.entity
		.attributes
		.iter()
		.map(|(key, value)| {
			view! {
				<dt>{key.clone()}</dt>
				<dd>{attribute_text(value)}</dd>
			}
		})
		.collect_view();
	let news = detail
		.news
		.into_iter()
		.map(|item| {
			let date = item.published_at.unwrap_or_default();
			match item.url {
				Some(url) => view! {
					<li>
						<a href=url target="_blank" rel="noopener">{item.title}</a>
						<span class="date">{date}</span>
					</li>
				}
				.into_any(),
				None => view! {
					<li>
						{item.title}
						<span class="date">{date}</span>
					</li>
				}
				.into_any(),
			}
		})
		.collect_view();
	let sources = detail
		.sources
		.into_iter()
		.map(|source| match source.url {
			Some(url) => view! { <li><a href=url target="_blank" rel="noopener">{source.name}</a></li> }
				.into_any(),
			None => view! { <li>{source.name}</li> }.into_any(),
		})
		.collect_view();

	view! {
		<aside class="detail-panel">
			<button class="close" on:click=move |_| on_close()>"×"</button>
			<span class="type-badge" style=badge>{style.label}</span>
			<h2>{detail.entity.name}</h2>
			<p class="entity-id">{detail.entity.id}</p>
			<dl class="attributes">{attributes}</dl>
			<h3>"News"</h3>
			<ul class="news">{news}</ul>
			<h3>"Sources"</h3>
			<ul class="sources">{sources}</ul>
		</aside>
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let provider = match SampleGraph::builtin() {
		Ok(provider) => StoredValue::new(provider),
		Err(err) => {
			error!("sample graph failed to load: {err}");
			return view! { <p class="status error">{err.to_string()}</p> }.into_any();
		}
	};

	let tracker = StoredValue::new(RequestTracker::default());
	let snapshot = RwSignal::new(GraphSnapshot::default());
	let loading = RwSignal::new(false);
	let status = RwSignal::new(None::<String>);
	let hidden = RwSignal::new(HashSet::<String>::new());
	let show_labels = RwSignal::new(true);
	let expand_depth = RwSignal::new(DEFAULT_EXPAND_DEPTH);
	let query = RwSignal::new(String::new());
	let selected = RwSignal::new(None::<String>);
	let detail = RwSignal::new(None::<EntityDetail>);
	let reset_view = RwSignal::new(0u32);

	let load_graph = move |request: GraphRequest| {
		let Some(ticket) = tracker.try_update_value(|t| t.begin(&request)) else {
			return;
		};
		info!("requesting {request:?}");
		loading.set(true);
		status.set(None);
		let graph = provider.get_value();
		spawn_local(async move {
			let result = fetch_graph(&graph, &request).await;
			let Some(completion) = tracker.try_update_value(|t| t.complete(ticket, result)) else {
				return;
			};
			match completion {
				Completion::Apply(next) => {
					if next.data.is_empty() {
						status.set(Some("No matching entities".to_string()));
					}
					snapshot.set(next);
				}
				Completion::Failed(err) => status.set(Some(err.to_string())),
				Completion::Stale => {}
			}
			loading.set(tracker.with_value(RequestTracker::is_loading));
		});
	};

	let on_select = Callback::new(move |id: String| {
		selected.set(Some(id.clone()));
		let graph = provider.get_value();
		spawn_local(async move {
			let result = graph.entity_detail(&id).await;
			if selected.get_untracked().as_deref() != Some(id.as_str()) {
				return;
			}
			match result {
				Ok(found) => detail.set(Some(found)),
				Err(err) => {
					warn!("entity detail for {id} failed: {err}");
					status.set(Some(err.to_string()));
				}
			}
		});
	});
	let on_clear = Callback::new(move |()| {
		selected.set(None);
		detail.set(None);
	});
	let on_expand = Callback::new(move |id: String| {
		load_graph(GraphRequest::Entity {
			focus_id: id,
			depth: expand_depth.get_untracked(),
		});
	});

	let on_search = move |ev: SubmitEvent| {
		ev.prevent_default();
		let keyword = query.get_untracked();
		if keyword.trim().is_empty() {
			return;
		}
		load_graph(GraphRequest::Search { keyword });
	};

	let reset_graph = move |_: MouseEvent| {
		query.set(String::new());
		on_clear.run(());
		load_graph(GraphRequest::Default {
			limit: DEFAULT_LIMIT,
		});
	};

	let chips = ENTITY_TYPES
		.iter()
		.map(|&kind| {
			let style = entity_style(kind);
			let swatch = format!("background: {};", style.color.rgba(1.0));
			view! {
				<button
					class="type-chip"
					class:off=move || hidden.with(|h| h.contains(kind))
					on:click=move |_| {
						hidden
							.update(|h| {
								if !h.remove(kind) {
									h.insert(kind.to_string());
								}
							})
					}
				>
					<span class="swatch" style=swatch></span>
					{style.label}
				</button>
			}
		})
		.collect_view();

	load_graph(GraphRequest::Default {
		limit: DEFAULT_LIMIT,
	});

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

			<div class="fullscreen-graph">
				<KnowledgeGraphCanvas
					data=snapshot
					hidden_types=hidden
					show_labels=show_labels
					loading=loading
					reset_view=reset_view
					on_select=on_select
					on_clear=on_clear
					on_expand=on_expand
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>"Knowledge Graph"</h1>
					<p class="subtitle">
						"Click a node for details. Double-click to expand. Drag to pin, scroll to zoom."
					</p>
					<form class="graph-search" on:submit=on_search>
						<input
							type="search"
							placeholder="Search entities"
							prop:value=query
							on:input=move |ev| query.set(event_target_value(&ev))
						/>
						<button type="submit" disabled=move || loading.get()>
							"Search"
						</button>
					</form>
					<div class="graph-controls">
						<label>
							"Expand depth "
							<select
								prop:value=move || expand_depth.get().to_string()
								on:change=move |ev| {
									if let Ok(depth) = event_target_value(&ev).parse() {
										expand_depth.set(depth);
									}
								}
							>
								<option value="1">"1"</option>
								<option value="2">"2"</option>
								<option value="3">"3"</option>
							</select>
						</label>
						<label>
							<input
								type="checkbox"
								prop:checked=show_labels
								on:change=move |ev| show_labels.set(event_target_checked(&ev))
							/>
							" Labels"
						</label>
						<button on:click=move |_| reset_view.update(|n| *n += 1)>"Reset view"</button>
						<button on:click=reset_graph disabled=move || loading.get()>
							"Reset graph"
						</button>
					</div>
					<div class="type-chips">{chips}</div>
					{move || {
						status
							.get()
							.map(|message| {
								view! {
									<p class="status">
										{message}
										<button on:click=move |_| status.set(None)>"×"</button>
									</p>
								}
							})
					}}
				</div>
				<Show when=move || loading.get()>
					<div class="loading-overlay">"Loading…"</div>
				</Show>
				{move || {
					detail
						.get()
						.map(|found| {
							detail_panel(found, move || on_clear.run(()))
						})
				}}
			</div>
		</ErrorBoundary>
	}
		.into_any()
}
