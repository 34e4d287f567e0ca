use std::collections::HashSet;

use log::info;

use super::animation::AnimationDriver;
use super::interaction::PointerMode;
use super::render::Scene;
use super::simulation::{Simulation, SimulationConfig};
use super::types::{GraphData, GraphSnapshot};

pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 5.0;

/// Pan offset and zoom applied to graph space when drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	pub fn zoom_by(&mut self, factor: f64) {
		self.k = (self.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
	}
}

/// Outcome of one animation frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameState {
	pub simulated: bool,
	pub settled: bool,
}

pub struct KnowledgeGraphState {
	pub simulation: Simulation,
	pub transform: ViewTransform,
	pub pointer: PointerMode,
	pub hovered: Option<usize>,
	pub selected: Option<usize>,
	pub hidden_types: HashSet<String>,
	pub show_labels: bool,
	/// False while a new graph is loading; pointer input is ignored.
	pub interactive: bool,
	pub frames: AnimationDriver,
	pub width: f64,
	pub height: f64,
	pub pixel_ratio: f64,
	revision: Option<u64>,
	config: SimulationConfig,
}

impl KnowledgeGraphState {
	pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Self {
		let config = SimulationConfig::default();
		Self {
			simulation: Simulation::new(&GraphData::default(), None, width, height, config),
			transform: ViewTransform::default(),
			pointer: PointerMode::Idle,
			hovered: None,
			selected: None,
			hidden_types: HashSet::new(),
			show_labels: true,
			interactive: true,
			frames: AnimationDriver::default(),
			width,
			height,
			pixel_ratio,
			revision: None,
			config,
		}
	}

	pub fn revision(&self) -> Option<u64> {
		self.revision
	}

	/// Replace the whole node/edge set. Returns the new animation epoch.
	pub fn load(&mut self, snapshot: &GraphSnapshot) -> u64 {
		let selected_id = self.selected_id().map(str::to_owned);
		self.simulation = Simulation::new(
			&snapshot.data,
			snapshot.focus.as_deref(),
			self.width,
			self.height,
			self.config,
		);
		self.selected = selected_id.and_then(|id| self.simulation.index_of(&id));
		self.hovered = None;
		self.pointer = PointerMode::Idle;
		self.revision = Some(snapshot.revision);
		info!(
			"loaded graph revision {}: {} nodes, {} edges",
			snapshot.revision,
			self.simulation.nodes().len(),
			self.simulation.edges().len()
		);
		self.frames.restart()
	}

	pub fn resize(&mut self, width: f64, height: f64, pixel_ratio: f64) {
		if width == self.width && height == self.height && pixel_ratio == self.pixel_ratio {
			return;
		}
		self.width = width;
		self.height = height;
		self.pixel_ratio = pixel_ratio;
		self.simulation.resize(width, height);
		self.frames.resume();
		self.frames.request_redraw();
	}

	pub fn set_hidden_types(&mut self, hidden: HashSet<String>) {
		self.hidden_types = hidden;
		let hidden_now = |index: Option<usize>| {
			index.is_some_and(|i| {
				self.hidden_types
					.contains(&self.simulation.nodes()[i].node.kind)
			})
		};
		if hidden_now(self.hovered) {
			self.hovered = None;
		}
		if hidden_now(self.selected) {
			self.selected = None;
		}
		self.frames.request_redraw();
	}

	pub fn set_show_labels(&mut self, show: bool) {
		self.show_labels = show;
		self.frames.request_redraw();
	}

	pub fn set_interactive(&mut self, interactive: bool) {
		self.interactive = interactive;
		if !interactive {
			self.pointer_leave();
		}
	}

	pub fn reset_view(&mut self) {
		self.transform = ViewTransform::default();
		self.frames.request_redraw();
	}

	pub fn selected_id(&self) -> Option<&str> {
		self.selected
			.and_then(|i| self.simulation.nodes().get(i))
			.map(|n| n.node.id.as_str())
	}

	/// Run the frame requested under `epoch`: one simulation step unless a
	/// node is being dragged. `None` when the frame is stale.
	pub fn tick(&mut self, epoch: u64) -> Option<FrameState> {
		let plan = self.frames.begin_frame(epoch)?;
		let simulated = plan.simulate && !self.pointer.is_dragging();
		let settled = if simulated {
			self.simulation.step()
		} else {
			true
		};
		self.frames.finish_frame(simulated, settled);
		Some(FrameState { simulated, settled })
	}

	pub fn scene(&self) -> Scene<'_> {
		Scene {
			simulation: &self.simulation,
			transform: self.transform,
			hovered: self.hovered,
			selected: self.selected,
			hidden_types: &self.hidden_types,
			show_labels: self.show_labels,
			width: self.width,
			height: self.height,
			pixel_ratio: self.pixel_ratio,
		}
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use crate::components::knowledge_graph::simulation::tests::chain;

	pub(crate) fn snapshot(data: GraphData, focus: Option<&str>, revision: u64) -> GraphSnapshot {
		GraphSnapshot {
			data,
			focus: focus.map(str::to_owned),
			revision,
		}
	}

	/// Claim and run the next frame, if any is pending.
	pub(crate) fn run_frame(state: &mut KnowledgeGraphState) -> Option<FrameState> {
		let epoch = state.frames.claim_frame()?;
		state.tick(epoch)
	}

	#[test]
	fn test_zoom_sequence_stays_in_bounds() {
		let mut transform = ViewTransform::default();
		transform.zoom_by(1.1);
		transform.zoom_by(1.1);
		transform.zoom_by(0.9);
		assert!((transform.k - 1.089).abs() < 1e-9);

		for _ in 0..100 {
			transform.zoom_by(1.1);
		}
		assert_eq!(transform.k, MAX_ZOOM);
		for _ in 0..100 {
			transform.zoom_by(0.9);
		}
		assert_eq!(transform.k, MIN_ZOOM);
	}

	#[test]
	fn test_screen_to_graph_inverts_pan_and_zoom() {
		let transform = ViewTransform {
			x: 30.0,
			y: -20.0,
			k: 2.0,
		};
		assert_eq!(transform.screen_to_graph(130.0, 80.0), (50.0, 50.0));
		assert_eq!(transform.screen_to_graph(30.0, -20.0), (0.0, 0.0));
	}

	#[test]
	fn test_reset_view_restores_default_and_redraws() {
		let mut state = KnowledgeGraphState::new(800.0, 600.0, 1.0);
		state.load(&snapshot(chain(), Some("a"), 1));
		while run_frame(&mut state).is_some() {}

		state.transform = ViewTransform {
			x: 120.0,
			y: -45.0,
			k: 1.0,
		};
		state.transform.zoom_by(3.0);
		state.reset_view();
		assert_eq!(state.transform, ViewTransform::default());

		let frame = run_frame(&mut state).unwrap();
		assert!(!frame.simulated);
		assert!(run_frame(&mut state).is_none());
	}

	#[test]
	fn test_load_runs_until_settled_then_stops() {
		let mut state = KnowledgeGraphState::new(2000.0, 2000.0, 1.0);
		state.load(&snapshot(chain(), Some("a"), 1));
		assert_eq!(state.revision(), Some(1));

		let mut frames = 0;
		while let Some(frame) = run_frame(&mut state) {
			assert!(frame.simulated);
			frames += 1;
			assert!(frames <= 1000);
		}
		assert!(!state.frames.is_simulating());
		assert!(run_frame(&mut state).is_none());
	}

	#[test]
	fn test_reload_drops_stale_frames_and_keeps_selection() {
		let mut state = KnowledgeGraphState::new(800.0, 600.0, 1.0);
		state.load(&snapshot(chain(), Some("a"), 1));
		state.selected = state.simulation.index_of("b");
		let stale = state.frames.claim_frame().unwrap();

		let mut data = chain();
		data.nodes.reverse();
		state.load(&snapshot(data, Some("c"), 2));
		assert_eq!(state.tick(stale), None);
		assert_eq!(state.selected_id(), Some("b"));
		assert_eq!(state.simulation.focus(), state.simulation.index_of("c"));
		assert!(run_frame(&mut state).is_some());
	}

	#[test]
	fn test_hiding_selected_type_clears_selection() {
		let mut state = KnowledgeGraphState::new(800.0, 600.0, 1.0);
		state.load(&snapshot(chain(), Some("a"), 1));
		state.selected = Some(1);
		state.hovered = Some(1);
		state.set_hidden_types(["person".to_string()].into());
		assert_eq!(state.selected, None);
		assert_eq!(state.hovered, None);
	}

	#[test]
	fn test_resize_resumes_simulation() {
		let mut state = KnowledgeGraphState::new(800.0, 600.0, 1.0);
		state.load(&snapshot(chain(), Some("a"), 1));
		while run_frame(&mut state).is_some() {}
		state.resize(1024.0, 768.0, 2.0);
		assert!(state.frames.is_simulating());
		assert_eq!(state.simulation.center(), (512.0, 384.0));
		assert_eq!(state.scene().pixel_ratio, 2.0);
	}
}
