use std::collections::HashSet;
use std::f64::consts::TAU;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::registry::{Rgb, entity_style, node_caption, relation_label};
use super::simulation::{SimEdge, SimNode, Simulation};
use super::state::ViewTransform;

const BACKGROUND: &str = "#1a1a2e";
const EMPTY_TEXT: &str = "rgba(226, 232, 240, 0.6)";
const LABEL_TEXT: &str = "rgba(255, 255, 255, 0.92)";
const BADGE_TEXT: &str = "rgba(203, 213, 225, 0.9)";
const CHIP_FILL: &str = "rgba(15, 23, 42, 0.85)";
const CHIP_TEXT: &str = "rgba(226, 232, 240, 0.95)";

const NODE_LABEL_FONT: &str = "11px sans-serif";
const EDGE_LABEL_FONT: &str = "10px sans-serif";
const BADGE_FONT: &str = "9px sans-serif";

/// Perpendicular bow of an edge, relative to its straight-line length.
pub const EDGE_BOW: f64 = 0.06;
pub const BASE_RADIUS: f64 = 20.0;
pub const MAX_DEGREE_BONUS: f64 = 12.0;
const LABEL_WIDTH_RATIO: f64 = 1.8;

pub enum Fill<'a> {
	/// Shaded disc, lit from the upper left.
	Radial { inner: &'a str, outer: &'a str },
	/// Soft glow fading out towards the rim.
	Halo { color: &'a str },
}

/// Immediate-mode 2D surface the scene is drawn onto. Text is drawn
/// centred on its anchor.
pub trait Painter {
	fn begin_frame(&mut self, width: f64, height: f64, pixel_ratio: f64, background: &str);
	fn set_view(&mut self, x: f64, y: f64, k: f64);
	fn end_frame(&mut self);
	fn stroke_curve(
		&mut self,
		from: (f64, f64),
		control: (f64, f64),
		to: (f64, f64),
		color: &str,
		width: f64,
	);
	fn fill_circle(&mut self, center: (f64, f64), radius: f64, fill: Fill<'_>);
	fn stroke_circle(
		&mut self,
		center: (f64, f64),
		radius: f64,
		color: &str,
		width: f64,
		dashed: bool,
	);
	fn fill_rounded_rect(&mut self, x: f64, y: f64, w: f64, h: f64, radius: f64, color: &str);
	fn set_font(&mut self, font: &str);
	fn measure_text(&mut self, text: &str) -> f64;
	fn fill_text(&mut self, text: &str, x: f64, y: f64, color: &str);
}

/// Everything one frame needs, borrowed from the view state.
pub struct Scene<'a> {
	pub simulation: &'a Simulation,
	pub transform: ViewTransform,
	pub hovered: Option<usize>,
	pub selected: Option<usize>,
	pub hidden_types: &'a HashSet<String>,
	pub show_labels: bool,
	pub width: f64,
	pub height: f64,
	pub pixel_ratio: f64,
}

impl Scene<'_> {
	pub fn is_visible(&self, index: usize) -> bool {
		!self
			.hidden_types
			.contains(&self.simulation.nodes()[index].node.kind)
	}

	/// Hovered and selected nodes plus their direct neighbours.
	pub fn highlight_set(&self) -> HashSet<usize> {
		let mut set = HashSet::new();
		for index in [self.hovered, self.selected].into_iter().flatten() {
			set.insert(index);
			set.extend(self.simulation.neighbors(index).iter().copied());
		}
		set
	}

	pub fn node_radius(&self, index: usize) -> f64 {
		node_radius(
			&self.simulation.nodes()[index],
			self.selected == Some(index),
			self.hovered == Some(index),
		)
	}

	/// Visible nodes in paint order: plain, then highlighted, then the
	/// hovered/selected nodes themselves.
	pub fn draw_order(&self, highlight: &HashSet<usize>) -> Vec<usize> {
		let mut order: Vec<usize> = (0..self.simulation.nodes().len())
			.filter(|&i| self.is_visible(i))
			.collect();
		order.sort_by_key(|&i| {
			if self.hovered == Some(i) || self.selected == Some(i) {
				2
			} else if highlight.contains(&i) {
				1
			} else {
				0
			}
		});
		order
	}
}

pub fn node_radius(node: &SimNode, selected: bool, hovered: bool) -> f64 {
	let mut radius = BASE_RADIUS + (node.degree as f64 * 1.5).min(MAX_DEGREE_BONUS);
	if selected {
		radius += 5.0;
	}
	if hovered {
		radius += 3.0;
	}
	radius
}

/// Control point of the quadratic curve drawn for an edge.
pub fn edge_control(from: (f64, f64), to: (f64, f64)) -> (f64, f64) {
	let (dx, dy) = (to.0 - from.0, to.1 - from.1);
	(
		(from.0 + to.0) / 2.0 - dy * EDGE_BOW,
		(from.1 + to.1) / 2.0 + dx * EDGE_BOW,
	)
}

fn curve_midpoint(from: (f64, f64), control: (f64, f64), to: (f64, f64)) -> (f64, f64) {
	(
		0.25 * from.0 + 0.5 * control.0 + 0.25 * to.0,
		0.25 * from.1 + 0.5 * control.1 + 0.25 * to.1,
	)
}

/// Shorten `text` with an ellipsis until it fits `max_width`.
pub fn fit_label(painter: &mut impl Painter, text: &str, max_width: f64) -> String {
	if painter.measure_text(text) <= max_width {
		return text.to_string();
	}
	let chars: Vec<char> = text.chars().collect();
	for keep in (1..chars.len()).rev() {
		let mut candidate: String = chars[..keep].iter().collect();
		candidate.push('…');
		if painter.measure_text(&candidate) <= max_width {
			return candidate;
		}
	}
	"…".to_string()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EdgeEmphasis {
	/// Touches the hovered or selected node.
	Active,
	/// Both ends are in the highlight set.
	Highlighted,
	Plain,
	/// Not part of an active highlight.
	Muted,
}

fn edge_emphasis(scene: &Scene, edge: &SimEdge, highlight: &HashSet<usize>) -> EdgeEmphasis {
	let touches = |i: usize| edge.source == i || edge.target == i;
	if scene.selected.is_some_and(touches) || scene.hovered.is_some_and(touches) {
		EdgeEmphasis::Active
	} else if highlight.contains(&edge.source) && highlight.contains(&edge.target) {
		EdgeEmphasis::Highlighted
	} else if highlight.is_empty() {
		EdgeEmphasis::Plain
	} else {
		EdgeEmphasis::Muted
	}
}

pub fn render(scene: &Scene, painter: &mut impl Painter) {
	painter.begin_frame(scene.width, scene.height, scene.pixel_ratio, BACKGROUND);
	if scene.simulation.is_empty() {
		painter.set_font("14px sans-serif");
		painter.fill_text(
			"No graph data",
			scene.width / 2.0,
			scene.height / 2.0,
			EMPTY_TEXT,
		);
		painter.end_frame();
		return;
	}

	let t = scene.transform;
	painter.set_view(t.x, t.y, t.k);
	let highlight = scene.highlight_set();
	draw_edges(scene, &highlight, painter);
	draw_nodes(scene, &highlight, painter);
	painter.end_frame();
}

fn draw_edges(scene: &Scene, highlight: &HashSet<usize>, painter: &mut impl Painter) {
	let sim = scene.simulation;
	let mut labels = Vec::new();

	for edge in sim.edges() {
		if !scene.is_visible(edge.source) || !scene.is_visible(edge.target) {
			continue;
		}
		let (from, to) = (sim.position(edge.source), sim.position(edge.target));
		let control = edge_control(from, to);
		let emphasis = edge_emphasis(scene, edge, highlight);
		let (color, width) = match emphasis {
			EdgeEmphasis::Active => ("rgba(250, 204, 21, 0.9)", 2.6),
			EdgeEmphasis::Highlighted => ("rgba(96, 165, 250, 0.75)", 1.8),
			EdgeEmphasis::Plain => ("rgba(148, 163, 184, 0.4)", 1.2),
			EdgeEmphasis::Muted => ("rgba(148, 163, 184, 0.12)", 1.0),
		};
		painter.stroke_curve(from, control, to, color, width);

		if scene.show_labels
			&& matches!(emphasis, EdgeEmphasis::Active | EdgeEmphasis::Highlighted)
		{
			labels.push((curve_midpoint(from, control, to), &edge.edge.relation));
		}
	}

	// Chips go on top of every edge so later curves never cross them.
	painter.set_font(EDGE_LABEL_FONT);
	for ((x, y), relation) in labels {
		let text = relation_label(relation);
		let width = painter.measure_text(text);
		painter.fill_rounded_rect(x - width / 2.0 - 5.0, y - 8.0, width + 10.0, 16.0, 4.0, CHIP_FILL);
		painter.fill_text(text, x, y, CHIP_TEXT);
	}
}

fn draw_nodes(scene: &Scene, highlight: &HashSet<usize>, painter: &mut impl Painter) {
	let sim = scene.simulation;
	let has_highlight = !highlight.is_empty();

	for index in scene.draw_order(highlight) {
		let node = &sim.nodes()[index];
		let center = sim.position(index);
		let is_selected = scene.selected == Some(index);
		let is_hovered = scene.hovered == Some(index);
		let is_highlighted = highlight.contains(&index);
		let radius = scene.node_radius(index);
		let color = entity_style(&node.node.kind).color;

		if is_selected || is_hovered {
			let glow = color.rgba(if is_selected { 0.45 } else { 0.3 });
			painter.fill_circle(center, radius * 1.7, Fill::Halo { color: &glow });
		}

		let (inner_alpha, outer_alpha) = if is_highlighted {
			(1.0, 0.9)
		} else if has_highlight {
			(0.3, 0.2)
		} else {
			(0.85, 0.65)
		};
		let inner = lighten(color, 0.45).rgba(inner_alpha);
		let outer = color.rgba(outer_alpha);
		painter.fill_circle(
			center,
			radius,
			Fill::Radial {
				inner: &inner,
				outer: &outer,
			},
		);

		if is_selected {
			painter.stroke_circle(center, radius + 2.0, "rgba(255, 255, 255, 0.95)", 2.5, false);
		} else if is_hovered {
			painter.stroke_circle(center, radius + 2.0, "rgba(255, 255, 255, 0.5)", 1.5, true);
		}

		if scene.show_labels || is_highlighted {
			painter.set_font(NODE_LABEL_FONT);
			let caption = fit_label(painter, node_caption(&node.node), radius * LABEL_WIDTH_RATIO);
			painter.fill_text(&caption, center.0, center.1, LABEL_TEXT);
		}

		if is_highlighted && sim.focus() != Some(index) {
			let hops = node.depth;
			let badge = if hops == 1 {
				"1 hop".to_string()
			} else {
				format!("{hops} hops")
			};
			painter.set_font(BADGE_FONT);
			painter.fill_text(&badge, center.0, center.1 + radius + 10.0, BADGE_TEXT);
		}
	}
}

fn lighten(color: Rgb, amount: f64) -> Rgb {
	let mix = |c: u8| (c as f64 + (255.0 - c as f64) * amount).round() as u8;
	Rgb(mix(color.0), mix(color.1), mix(color.2))
}

impl Painter for CanvasRenderingContext2d {
	fn begin_frame(&mut self, width: f64, height: f64, pixel_ratio: f64, background: &str) {
		let _ = self.set_transform(pixel_ratio, 0.0, 0.0, pixel_ratio, 0.0, 0.0);
		self.set_fill_style_str(background);
		self.fill_rect(0.0, 0.0, width, height);
		self.set_text_align("center");
		self.set_text_baseline("middle");
		self.save();
	}

	fn set_view(&mut self, x: f64, y: f64, k: f64) {
		let _ = self.translate(x, y);
		let _ = self.scale(k, k);
	}

	fn end_frame(&mut self) {
		self.restore();
	}

	fn stroke_curve(
		&mut self,
		from: (f64, f64),
		control: (f64, f64),
		to: (f64, f64),
		color: &str,
		width: f64,
	) {
		self.begin_path();
		self.move_to(from.0, from.1);
		self.quadratic_curve_to(control.0, control.1, to.0, to.1);
		self.set_stroke_style_str(color);
		self.set_line_width(width);
		self.stroke();
	}

	fn fill_circle(&mut self, (x, y): (f64, f64), radius: f64, fill: Fill<'_>) {
		self.begin_path();
		let _ = self.arc(x, y, radius, 0.0, TAU);
		match fill {
			Fill::Radial { inner, outer } => {
				let (fx, fy) = (x - radius * 0.3, y - radius * 0.3);
				match self.create_radial_gradient(fx, fy, radius * 0.1, x, y, radius) {
					Ok(gradient) => {
						let _ = gradient.add_color_stop(0.0, inner);
						let _ = gradient.add_color_stop(1.0, outer);
						self.set_fill_style_canvas_gradient(&gradient);
					}
					Err(_) => self.set_fill_style_str(outer),
				}
			}
			Fill::Halo { color } => {
				match self.create_radial_gradient(x, y, radius * 0.5, x, y, radius) {
					Ok(gradient) => {
						let _ = gradient.add_color_stop(0.0, color);
						let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
						self.set_fill_style_canvas_gradient(&gradient);
					}
					Err(_) => self.set_fill_style_str(color),
				}
			}
		}
		self.fill();
	}

	fn stroke_circle(
		&mut self,
		(x, y): (f64, f64),
		radius: f64,
		color: &str,
		width: f64,
		dashed: bool,
	) {
		if dashed {
			let _ = self.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(4.0),
				&JsValue::from_f64(3.0),
			));
		}
		self.begin_path();
		let _ = self.arc(x, y, radius, 0.0, TAU);
		self.set_stroke_style_str(color);
		self.set_line_width(width);
		self.stroke();
		if dashed {
			let _ = self.set_line_dash(&js_sys::Array::new());
		}
	}

	fn fill_rounded_rect(&mut self, x: f64, y: f64, w: f64, h: f64, radius: f64, color: &str) {
		let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
		self.begin_path();
		self.move_to(x + r, y);
		self.line_to(x + w - r, y);
		self.quadratic_curve_to(x + w, y, x + w, y + r);
		self.line_to(x + w, y + h - r);
		self.quadratic_curve_to(x + w, y + h, x + w - r, y + h);
		self.line_to(x + r, y + h);
		self.quadratic_curve_to(x, y + h, x, y + h - r);
		self.line_to(x, y + r);
		self.quadratic_curve_to(x, y, x + r, y);
		self.close_path();
		self.set_fill_style_str(color);
		self.fill();
	}

	fn set_font(&mut self, font: &str) {
		CanvasRenderingContext2d::set_font(self, font);
	}

	fn measure_text(&mut self, text: &str) -> f64 {
		CanvasRenderingContext2d::measure_text(self, text)
			.map(|metrics| metrics.width())
			.unwrap_or(text.chars().count() as f64 * 6.0)
	}

	fn fill_text(&mut self, text: &str, x: f64, y: f64, color: &str) {
		self.set_fill_style_str(color);
		let _ = CanvasRenderingContext2d::fill_text(self, text, x, y);
	}
}
