use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use leptos::prelude::*;
use log::{debug, warn};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, MouseEvent, TouchEvent, WheelEvent,
	Window,
};

use super::interaction::{CursorHint, GraphAction};
use super::render;
use super::state::KnowledgeGraphState;
use super::types::GraphSnapshot;

const FALLBACK_WIDTH: f64 = 800.0;
const FALLBACK_HEIGHT: f64 = 600.0;

/// The animation frame currently requested from the browser.
#[derive(Clone, Copy, Debug)]
struct FrameHandle {
	id: i32,
	epoch: u64,
}

/// Everything the canvas callbacks share. Owned by the component; the frame
/// and resize closures only hold weak references back to it.
#[derive(Default)]
struct CanvasRuntime {
	state: RefCell<Option<KnowledgeGraphState>>,
	ctx: RefCell<Option<CanvasRenderingContext2d>>,
	canvas: RefCell<Option<HtmlCanvasElement>>,
	frame: Cell<Option<FrameHandle>>,
	animate: RefCell<Option<Closure<dyn FnMut()>>>,
	resize: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl CanvasRuntime {
	/// Run `f` against the view state, then request a frame if it left any
	/// work pending. The state borrow is released before returning.
	fn update<R>(&self, f: impl FnOnce(&mut KnowledgeGraphState) -> R) -> Option<R> {
		let out = self.state.borrow_mut().as_mut().map(f);
		self.schedule();
		out
	}

	fn schedule(&self) {
		let Some(epoch) = self
			.state
			.borrow_mut()
			.as_mut()
			.and_then(|s| s.frames.claim_frame())
		else {
			return;
		};
		let animate = self.animate.borrow();
		let (Some(window), Some(cb)) = (web_sys::window(), animate.as_ref()) else {
			return;
		};
		match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
			Ok(id) => self.frame.set(Some(FrameHandle { id, epoch })),
			Err(err) => warn!("requestAnimationFrame failed: {err:?}"),
		}
	}

	fn cancel_frame(&self) {
		if let Some(handle) = self.frame.take() {
			if let Some(window) = web_sys::window() {
				let _ = window.cancel_animation_frame(handle.id);
			}
			debug!("cancelled frame {} of epoch {}", handle.id, handle.epoch);
		}
	}

	fn on_frame(&self) {
		let Some(handle) = self.frame.take() else {
			return;
		};
		{
			let mut guard = self.state.borrow_mut();
			let Some(state) = guard.as_mut() else {
				return;
			};
			if state.tick(handle.epoch).is_none() {
				return;
			}
			if let Some(ctx) = self.ctx.borrow().as_ref() {
				let mut painter = ctx.clone();
				render::render(&state.scene(), &mut painter);
			}
		}
		self.schedule();
	}

	/// Swap in a new node/edge set. The outstanding frame belongs to the old
	/// set and is cancelled before the new run is scheduled.
	fn load(&self, snapshot: &GraphSnapshot) {
		{
			let mut guard = self.state.borrow_mut();
			let Some(state) = guard.as_mut() else {
				return;
			};
			if state.revision() == Some(snapshot.revision) {
				return;
			}
			self.cancel_frame();
			state.load(snapshot);
		}
		self.schedule();
	}

	fn resize(&self, fullscreen: bool, width: Option<f64>, height: Option<f64>) {
		let Some(canvas) = self.canvas.borrow().clone() else {
			return;
		};
		let Some(window) = web_sys::window() else {
			return;
		};
		let (w, h) = surface_size(&window, &canvas, fullscreen, width, height);
		let ratio = window.device_pixel_ratio();
		apply_size(&canvas, w, h, ratio);
		self.update(|s| s.resize(w, h, ratio));
	}

	/// Pointer position in canvas CSS pixels.
	fn local_point(&self, client_x: f64, client_y: f64) -> Option<(f64, f64)> {
		let canvas = self.canvas.borrow();
		let rect = canvas.as_ref()?.get_bounding_client_rect();
		Some((client_x - rect.left(), client_y - rect.top()))
	}

	fn set_cursor(&self, cursor: CursorHint) {
		if let Some(canvas) = self.canvas.borrow().as_ref() {
			let _ = HtmlElement::style(canvas).set_property("cursor", cursor.as_css());
		}
	}

	/// Detach from the window once the component is unmounted.
	fn teardown(&self) {
		self.cancel_frame();
		let resize = self.resize.borrow_mut().take();
		if let (Some(window), Some(cb)) = (web_sys::window(), resize) {
			let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
		self.animate.borrow_mut().take();
		self.state.borrow_mut().take();
		debug!("knowledge graph canvas torn down");
	}
}

fn surface_size(
	window: &Window,
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	if fullscreen {
		let read = |v: Result<JsValue, JsValue>, fallback: f64| {
			v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
		};
		return (
			read(window.inner_width(), FALLBACK_WIDTH),
			read(window.inner_height(), FALLBACK_HEIGHT),
		);
	}
	let parent = canvas.parent_element();
	let measured = |f: fn(&web_sys::Element) -> i32, fallback: f64| {
		parent
			.as_ref()
			.map(|p| f(p) as f64)
			.filter(|v| *v > 0.0)
			.unwrap_or(fallback)
	};
	(
		width.unwrap_or_else(|| measured(web_sys::Element::client_width, FALLBACK_WIDTH)),
		height.unwrap_or_else(|| measured(web_sys::Element::client_height, FALLBACK_HEIGHT)),
	)
}

/// Back the canvas with device pixels while keeping its CSS size.
fn apply_size(canvas: &HtmlCanvasElement, width: f64, height: f64, ratio: f64) {
	canvas.set_width((width * ratio).round() as u32);
	canvas.set_height((height * ratio).round() as u32);
	let style = HtmlElement::style(canvas);
	let _ = style.set_property("width", &format!("{width}px"));
	let _ = style.set_property("height", &format!("{height}px"));
}

fn first_touch(ev: &TouchEvent) -> Option<(f64, f64)> {
	let touch = ev.touches().get(0).or_else(|| ev.changed_touches().get(0))?;
	Some((touch.client_x() as f64, touch.client_y() as f64))
}

#[derive(Clone, Copy)]
struct Callbacks {
	on_select: Option<Callback<String>>,
	on_clear: Option<Callback<()>>,
	on_expand: Option<Callback<String>>,
}

impl Callbacks {
	fn dispatch(self, action: Option<GraphAction>) {
		match action {
			Some(GraphAction::Select(id)) => {
				if let Some(cb) = self.on_select {
					cb.run(id);
				}
			}
			Some(GraphAction::ClearSelection) => {
				if let Some(cb) = self.on_clear {
					cb.run(());
				}
			}
			Some(GraphAction::Expand(id)) => {
				if let Some(cb) = self.on_expand {
					cb.run(id);
				}
			}
			None => {}
		}
	}
}

/// Interactive knowledge graph drawn onto a `<canvas>`.
///
/// `data` carries whole node/edge sets; a new `revision` replaces the graph
/// and restarts the layout around its focus. Bumping `reset_view` restores
/// the default zoom and pan.
#[component]
pub fn KnowledgeGraphCanvas(
	#[prop(into)] data: Signal<GraphSnapshot>,
	#[prop(into, default = Signal::stored(HashSet::new()))] hidden_types: Signal<HashSet<String>>,
	#[prop(into, default = Signal::stored(true))] show_labels: Signal<bool>,
	#[prop(into, default = Signal::stored(false))] loading: Signal<bool>,
	#[prop(into, default = Signal::stored(0))] reset_view: Signal<u32>,
	#[prop(optional)] on_select: Option<Callback<String>>,
	#[prop(optional)] on_clear: Option<Callback<()>>,
	#[prop(optional)] on_expand: Option<Callback<String>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let runtime = Rc::new(CanvasRuntime::default());
	let callbacks = Callbacks {
		on_select,
		on_clear,
		on_expand,
	};

	let rt = runtime.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let ctx = match canvas.get_context("2d") {
			Ok(Some(ctx)) => ctx.dyn_into::<CanvasRenderingContext2d>().ok(),
			_ => None,
		};
		let Some(ctx) = ctx else {
			warn!("canvas has no 2d context");
			return;
		};

		let (w, h) = surface_size(&window, &canvas, fullscreen, width, height);
		let ratio = window.device_pixel_ratio();
		apply_size(&canvas, w, h, ratio);

		let mut state = KnowledgeGraphState::new(w, h, ratio);
		state.set_hidden_types(hidden_types.get_untracked());
		state.set_show_labels(show_labels.get_untracked());
		state.set_interactive(!loading.get_untracked());
		*rt.state.borrow_mut() = Some(state);
		*rt.ctx.borrow_mut() = Some(ctx);
		*rt.canvas.borrow_mut() = Some(canvas);

		let weak: Weak<CanvasRuntime> = Rc::downgrade(&rt);
		*rt.animate.borrow_mut() = Some(Closure::new(move || {
			if let Some(rt) = weak.upgrade() {
				rt.on_frame();
			}
		}));

		let weak: Weak<CanvasRuntime> = Rc::downgrade(&rt);
		*rt.resize.borrow_mut() = Some(Closure::new(move || {
			if let Some(rt) = weak.upgrade() {
				rt.resize(fullscreen, width, height);
			}
		}));
		if let Some(ref cb) = *rt.resize.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		rt.load(&data.get_untracked());
	});

	let rt = SendWrapper::new(runtime.clone());
	on_cleanup(move || rt.teardown());

	let rt = runtime.clone();
	Effect::new(move |_| {
		let snapshot = data.get();
		rt.load(&snapshot);
	});

	let rt = runtime.clone();
	Effect::new(move |_| {
		let hidden = hidden_types.get();
		rt.update(|s| s.set_hidden_types(hidden));
	});

	let rt = runtime.clone();
	Effect::new(move |_| {
		let show = show_labels.get();
		rt.update(|s| s.set_show_labels(show));
	});

	let rt = runtime.clone();
	Effect::new(move |_| {
		let interactive = !loading.get();
		rt.update(|s| s.set_interactive(interactive));
		if !interactive {
			rt.set_cursor(CursorHint::Default);
		}
	});

	let rt = runtime.clone();
	Effect::new(move |prev: Option<u32>| {
		let generation = reset_view.get();
		if prev.is_some_and(|p| p != generation) {
			rt.update(KnowledgeGraphState::reset_view);
		}
		generation
	});

	let rt = runtime.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		if let Some((x, y)) = rt.local_point(ev.client_x() as f64, ev.client_y() as f64) {
			rt.update(|s| s.pointer_down(x, y));
		}
	};

	let rt = runtime.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = rt.local_point(ev.client_x() as f64, ev.client_y() as f64)
			&& let Some(cursor) = rt.update(|s| s.pointer_move(x, y))
		{
			rt.set_cursor(cursor);
		}
	};

	let rt = runtime.clone();
	let on_mouseup = move |_: MouseEvent| {
		let action = rt.update(KnowledgeGraphState::pointer_up).flatten();
		callbacks.dispatch(action);
	};

	let rt = runtime.clone();
	let on_mouseleave = move |_: MouseEvent| {
		rt.update(KnowledgeGraphState::pointer_leave);
		rt.set_cursor(CursorHint::Default);
	};

	let rt = runtime.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let action = rt
			.local_point(ev.client_x() as f64, ev.client_y() as f64)
			.and_then(|(x, y)| rt.update(|s| s.double_click(x, y)))
			.flatten();
		callbacks.dispatch(action);
	};

	let rt = runtime.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		rt.update(|s| s.wheel(ev.delta_y()));
	};

	let rt = runtime.clone();
	let on_touchstart = move |ev: TouchEvent| {
		if ev.touches().length() != 1 {
			return;
		}
		ev.prevent_default();
		if let Some((x, y)) = first_touch(&ev).and_then(|(cx, cy)| rt.local_point(cx, cy)) {
			rt.update(|s| {
				s.pointer_move(x, y);
				s.pointer_down(x, y);
			});
		}
	};

	let rt = runtime.clone();
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		if let Some((x, y)) = first_touch(&ev).and_then(|(cx, cy)| rt.local_point(cx, cy)) {
			rt.update(|s| s.pointer_move(x, y));
		}
	};

	let rt = runtime.clone();
	let on_touchend = move |ev: TouchEvent| {
		ev.prevent_default();
		let action = rt
			.update(|s| {
				let action = s.pointer_up();
				s.pointer_leave();
				action
			})
			.flatten();
		callbacks.dispatch(action);
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="knowledge-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:dblclick=on_dblclick
			on:wheel=on_wheel
			on:touchstart=on_touchstart
			on:touchmove=on_touchmove
			on:touchend=on_touchend
			on:touchcancel=move |_: TouchEvent| {
				runtime.update(KnowledgeGraphState::pointer_leave);
			}
			style="display: block; cursor: grab; touch-action: none;"
		/>
	}
}
