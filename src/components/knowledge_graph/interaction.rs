use super::state::KnowledgeGraphState;

/// Extra graph-space slack around a node's radius that still counts as a hit.
pub const HIT_TOLERANCE: f64 = 10.0;
/// Screen distance a press may travel and still count as a click.
pub const CLICK_SLOP: f64 = 3.0;
pub const ZOOM_IN: f64 = 1.1;
pub const ZOOM_OUT: f64 = 0.9;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PointerMode {
	#[default]
	Idle,
	Panning {
		start_x: f64,
		start_y: f64,
		origin_x: f64,
		origin_y: f64,
		moved: bool,
	},
	Dragging {
		node: usize,
		start_x: f64,
		start_y: f64,
		moved: bool,
	},
}

impl PointerMode {
	pub fn is_dragging(&self) -> bool {
		matches!(self, PointerMode::Dragging { .. })
	}
}

/// Requests the canvas hands back to its host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphAction {
	Select(String),
	ClearSelection,
	Expand(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorHint {
	Default,
	Pointer,
	Grab,
	Grabbing,
}

impl CursorHint {
	pub fn as_css(self) -> &'static str {
		match self {
			CursorHint::Default => "default",
			CursorHint::Pointer => "pointer",
			CursorHint::Grab => "grab",
			CursorHint::Grabbing => "grabbing",
		}
	}
}

fn beyond_slop(dx: f64, dy: f64) -> bool {
	dx * dx + dy * dy > CLICK_SLOP * CLICK_SLOP
}

impl KnowledgeGraphState {
	/// Topmost visible node under a screen position.
	pub fn node_at(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.transform.screen_to_graph(sx, sy);
		let scene = self.scene();
		let highlight = scene.highlight_set();
		scene.draw_order(&highlight).into_iter().rev().find(|&index| {
			let (x, y) = self.simulation.position(index);
			let distance = ((x - gx).powi(2) + (y - gy).powi(2)).sqrt();
			distance <= scene.node_radius(index) + HIT_TOLERANCE
		})
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		if !self.interactive {
			return;
		}
		self.pointer = match self.node_at(sx, sy) {
			Some(node) => {
				let (gx, gy) = self.transform.screen_to_graph(sx, sy);
				self.simulation.pin(node, gx, gy);
				self.frames.pause();
				self.frames.request_redraw();
				PointerMode::Dragging {
					node,
					start_x: sx,
					start_y: sy,
					moved: false,
				}
			}
			None => PointerMode::Panning {
				start_x: sx,
				start_y: sy,
				origin_x: self.transform.x,
				origin_y: self.transform.y,
				moved: false,
			},
		};
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) -> CursorHint {
		match self.pointer {
			PointerMode::Panning {
				start_x,
				start_y,
				origin_x,
				origin_y,
				moved,
			} => {
				let (dx, dy) = (sx - start_x, sy - start_y);
				self.transform.x = origin_x + dx;
				self.transform.y = origin_y + dy;
				self.pointer = PointerMode::Panning {
					start_x,
					start_y,
					origin_x,
					origin_y,
					moved: moved || beyond_slop(dx, dy),
				};
				self.frames.request_redraw();
				CursorHint::Grabbing
			}
			PointerMode::Dragging {
				node,
				start_x,
				start_y,
				moved,
			} => {
				let (gx, gy) = self.transform.screen_to_graph(sx, sy);
				self.simulation.pin(node, gx, gy);
				self.pointer = PointerMode::Dragging {
					node,
					start_x,
					start_y,
					moved: moved || beyond_slop(sx - start_x, sy - start_y),
				};
				self.frames.request_redraw();
				CursorHint::Grabbing
			}
			PointerMode::Idle => {
				if !self.interactive {
					return CursorHint::Default;
				}
				let hovered = self.node_at(sx, sy);
				if hovered != self.hovered {
					self.hovered = hovered;
					self.frames.request_redraw();
				}
				if hovered.is_some() {
					CursorHint::Pointer
				} else {
					CursorHint::Grab
				}
			}
		}
	}

	/// Finish a press. A press that never left the click slop is a click.
	pub fn pointer_up(&mut self) -> Option<GraphAction> {
		match std::mem::take(&mut self.pointer) {
			PointerMode::Idle => None,
			PointerMode::Panning { moved: true, .. } => None,
			PointerMode::Panning { moved: false, .. } => self.clear_selection(),
			PointerMode::Dragging { node, moved, .. } => {
				self.simulation.unpin(node);
				self.frames.resume();
				if moved { None } else { self.select(node) }
			}
		}
	}

	/// The pointer left the surface: end any gesture without clicking.
	pub fn pointer_leave(&mut self) {
		if let PointerMode::Dragging { node, .. } = std::mem::take(&mut self.pointer) {
			self.simulation.unpin(node);
			self.frames.resume();
		}
		if self.hovered.take().is_some() {
			self.frames.request_redraw();
		}
	}

	pub fn wheel(&mut self, delta_y: f64) {
		if !self.interactive || delta_y == 0.0 {
			return;
		}
		self.transform
			.zoom_by(if delta_y > 0.0 { ZOOM_OUT } else { ZOOM_IN });
		self.frames.request_redraw();
	}

	pub fn double_click(&mut self, sx: f64, sy: f64) -> Option<GraphAction> {
		if !self.interactive {
			return None;
		}
		let node = self.node_at(sx, sy)?;
		Some(GraphAction::Expand(
			self.simulation.nodes()[node].node.id.clone(),
		))
	}

	fn select(&mut self, node: usize) -> Option<GraphAction> {
		self.selected = Some(node);
		self.simulation.refocus(node);
		self.frames.resume();
		self.frames.request_redraw();
		Some(GraphAction::Select(
			self.simulation.nodes()[node].node.id.clone(),
		))
	}

	fn clear_selection(&mut self) -> Option<GraphAction> {
		self.selected.take()?;
		self.frames.request_redraw();
		Some(GraphAction::ClearSelection)
	}
}
