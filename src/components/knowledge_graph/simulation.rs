use std::collections::HashMap;
use std::f64::consts::TAU;

use log::debug;

use super::depth::assign_depths;
use super::layout::{LayoutConfig, radial_positions};
use super::types::{GraphData, GraphEdge, GraphNode};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
	/// Damping coefficient applied to every force.
	pub alpha: f64,
	pub same_depth_distance: f64,
	pub cross_depth_distance: f64,
	/// Spring stiffness relative to `alpha`.
	pub spring_scale: f64,
	pub rest_length: f64,
	pub rest_length_per_depth: f64,
	pub ring_tolerance: f64,
	pub radial_strength: f64,
	/// Fraction of `radial_strength` used when a node sits inside its ring.
	pub inward_strength: f64,
	pub velocity_decay: f64,
	pub settle_threshold: f64,
	pub padding: f64,
	/// Floor applied to distances before any division.
	pub min_distance: f64,
	pub layout: LayoutConfig,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self {
			alpha: 0.12,
			same_depth_distance: 70.0,
			cross_depth_distance: 90.0,
			spring_scale: 0.03,
			rest_length: 120.0,
			rest_length_per_depth: 60.0,
			ring_tolerance: 40.0,
			radial_strength: 0.01,
			inward_strength: 0.3,
			velocity_decay: 0.82,
			settle_threshold: 0.05,
			padding: 40.0,
			min_distance: 0.01,
			layout: LayoutConfig::default(),
		}
	}
}

#[derive(Clone, Debug)]
pub struct SimNode {
	pub node: GraphNode,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Position forced by an ongoing drag; `None` means free.
	pub pinned: Option<(f64, f64)>,
	pub depth: u32,
	pub degree: u32,
}

/// An edge whose endpoints are indices into the owning simulation's nodes.
#[derive(Clone, Debug)]
pub struct SimEdge {
	pub edge: GraphEdge,
	pub source: usize,
	pub target: usize,
}

pub struct Simulation {
	nodes: Vec<SimNode>,
	edges: Vec<SimEdge>,
	neighbors: Vec<Vec<usize>>,
	index: HashMap<String, usize>,
	focus: Option<usize>,
	width: f64,
	height: f64,
	config: SimulationConfig,
}

impl Simulation {
	pub fn new(
		data: &GraphData,
		focus: Option<&str>,
		width: f64,
		height: f64,
		config: SimulationConfig,
	) -> Self {
		let mut index = HashMap::with_capacity(data.nodes.len());
		let mut graph_nodes = Vec::with_capacity(data.nodes.len());
		for node in &data.nodes {
			if index.contains_key(&node.id) {
				debug!("skipping duplicate node id {}", node.id);
				continue;
			}
			index.insert(node.id.clone(), graph_nodes.len());
			graph_nodes.push(node.clone());
		}

		let edges: Vec<SimEdge> = data
			.edges
			.iter()
			.filter_map(|edge| {
				let source = *index.get(&edge.source)?;
				let target = *index.get(&edge.target)?;
				Some(SimEdge {
					edge: edge.clone(),
					source,
					target,
				})
			})
			.collect();
		let dropped = data.edges.len() - edges.len();
		if dropped > 0 {
			debug!("dropped {dropped} dangling edges");
		}

		let mut neighbors = vec![Vec::new(); graph_nodes.len()];
		for edge in &edges {
			if edge.source != edge.target {
				neighbors[edge.source].push(edge.target);
				neighbors[edge.target].push(edge.source);
			}
		}

		let pairs = edge_pairs(&edges);
		let focus_index = focus.and_then(|id| index.get(id).copied());
		let assignment = assign_depths(graph_nodes.len(), &pairs, focus_index);
		let positions = radial_positions(&assignment.depths, width, height, &config.layout);

		let nodes = graph_nodes
			.into_iter()
			.zip(positions)
			.zip(assignment.depths.iter().zip(&assignment.degrees))
			.map(|((node, (x, y)), (&depth, &degree))| SimNode {
				node,
				x,
				y,
				vx: 0.0,
				vy: 0.0,
				pinned: None,
				depth,
				degree,
			})
			.collect();

		Self {
			nodes,
			edges,
			neighbors,
			index,
			focus: assignment.focus,
			width,
			height,
			config,
		}
	}

	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	pub fn edges(&self) -> &[SimEdge] {
		&self.edges
	}

	pub fn neighbors(&self, index: usize) -> &[usize] {
		self.neighbors.get(index).map_or(&[], Vec::as_slice)
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub fn focus(&self) -> Option<usize> {
		self.focus
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}

	/// Position safe to draw: non-finite coordinates read as the centre.
	pub fn position(&self, index: usize) -> (f64, f64) {
		let node = &self.nodes[index];
		if node.x.is_finite() && node.y.is_finite() {
			(node.x, node.y)
		} else {
			self.center()
		}
	}

	/// Force `index` to sit at `(x, y)` until [`Simulation::unpin`].
	pub fn pin(&mut self, index: usize, x: f64, y: f64) -> bool {
		if !x.is_finite() || !y.is_finite() {
			return false;
		}
		let Some(node) = self.nodes.get_mut(index) else {
			return false;
		};
		node.pinned = Some((x, y));
		node.x = x;
		node.y = y;
		node.vx = 0.0;
		node.vy = 0.0;
		true
	}

	pub fn unpin(&mut self, index: usize) -> bool {
		match self.nodes.get_mut(index) {
			Some(node) => node.pinned.take().is_some(),
			None => false,
		}
	}

	/// Recompute depths around a new focus and shift the whole layout so the
	/// focus lands on the centre. Containment then moves the other nodes onto
	/// their new rings.
	pub fn refocus(&mut self, index: usize) {
		if index >= self.nodes.len() || self.focus == Some(index) {
			return;
		}
		let pairs = edge_pairs(&self.edges);
		let assignment = assign_depths(self.nodes.len(), &pairs, Some(index));
		for (node, depth) in self.nodes.iter_mut().zip(assignment.depths) {
			node.depth = depth;
		}
		self.focus = assignment.focus;

		let (cx, cy) = self.center();
		let (fx, fy) = self.position(index);
		let (dx, dy) = (cx - fx, cy - fy);
		for node in &mut self.nodes {
			node.x += dx;
			node.y += dy;
			if let Some((px, py)) = node.pinned.as_mut() {
				*px += dx;
				*py += dy;
			}
		}
	}

	/// Adopt new canvas dimensions, keeping the layout centred.
	pub fn resize(&mut self, width: f64, height: f64) {
		let (dx, dy) = ((width - self.width) / 2.0, (height - self.height) / 2.0);
		for node in &mut self.nodes {
			node.x += dx;
			node.y += dy;
			if let Some((px, py)) = node.pinned.as_mut() {
				*px += dx;
				*py += dy;
			}
		}
		self.width = width;
		self.height = height;
	}

	/// Advance one relaxation step. Returns `true` once the layout has settled.
	pub fn step(&mut self) -> bool {
		if self.nodes.is_empty() {
			return true;
		}

		for node in &mut self.nodes {
			if let Some((px, py)) = node.pinned {
				node.x = px;
				node.y = py;
				node.vx = 0.0;
				node.vy = 0.0;
			}
		}

		self.apply_repulsion();
		self.apply_springs();
		self.apply_containment();
		self.integrate()
	}

	fn apply_repulsion(&mut self) {
		let config = &self.config;
		let count = self.nodes.len();
		for i in 0..count {
			for j in (i + 1)..count {
				let (a, b) = (&self.nodes[i], &self.nodes[j]);
				let threshold = if a.depth == b.depth {
					config.same_depth_distance
				} else {
					config.cross_depth_distance
				};
				let (dx, dy) = (b.x - a.x, b.y - a.y);
				let distance = (dx * dx + dy * dy).sqrt();
				if !distance.is_finite() || distance >= threshold {
					continue;
				}

				let (ux, uy) = direction(dx, dy, distance, i, j, config.min_distance);
				let push = (threshold - distance.max(config.min_distance)) * config.alpha;
				nudge(&mut self.nodes[i], -ux * push, -uy * push);
				nudge(&mut self.nodes[j], ux * push, uy * push);
			}
		}
	}

	fn apply_springs(&mut self) {
		let Self {
			nodes,
			edges,
			config,
			..
		} = self;
		let stiffness = config.alpha * config.spring_scale;

		for edge in edges.iter() {
			let (source, target) = (edge.source, edge.target);
			if source == target {
				continue;
			}
			let (s, t) = (&nodes[source], &nodes[target]);
			let depth_gap = s.depth.abs_diff(t.depth) as f64;
			let rest = config.rest_length + config.rest_length_per_depth * depth_gap;
			let (dx, dy) = (t.x - s.x, t.y - s.y);
			let distance = (dx * dx + dy * dy).sqrt();
			if !distance.is_finite() {
				continue;
			}

			let distance = distance.max(config.min_distance);
			let pull = (distance - rest) / distance * stiffness;
			nudge(&mut nodes[source], dx * pull, dy * pull);
			nudge(&mut nodes[target], -dx * pull, -dy * pull);
		}
	}

	fn apply_containment(&mut self) {
		let (cx, cy) = self.center();
		let config = &self.config;
		for (index, node) in self.nodes.iter_mut().enumerate() {
			let (dx, dy) = (node.x - cx, node.y - cy);
			let radius = (dx * dx + dy * dy).sqrt();
			if !radius.is_finite() || radius < config.min_distance {
				continue;
			}

			// The focus is pulled onto the centre itself.
			if Some(index) == self.focus {
				let correction = -radius * config.radial_strength;
				nudge(node, dx / radius * correction, dy / radius * correction);
				continue;
			}

			let deviation = radius - config.layout.ring_radius(node.depth);
			let correction = if deviation > config.ring_tolerance {
				-(deviation - config.ring_tolerance) * config.radial_strength
			} else if deviation < -config.ring_tolerance {
				(-deviation - config.ring_tolerance) * config.radial_strength * config.inward_strength
			} else {
				continue;
			};
			nudge(node, dx / radius * correction, dy / radius * correction);
		}
	}

	fn integrate(&mut self) -> bool {
		let (cx, cy) = self.center();
		let config = &self.config;
		let (min_x, max_x) = (config.padding, self.width - config.padding);
		let (min_y, max_y) = (config.padding, self.height - config.padding);

		let mut movement = 0.0;
		for node in &mut self.nodes {
			if let Some((px, py)) = node.pinned {
				node.x = px;
				node.y = py;
				node.vx = 0.0;
				node.vy = 0.0;
				continue;
			}

			node.vx *= config.velocity_decay;
			node.vy *= config.velocity_decay;
			if !node.vx.is_finite() || !node.vy.is_finite() {
				node.vx = 0.0;
				node.vy = 0.0;
			}
			node.x += node.vx;
			node.y += node.vy;
			if !node.x.is_finite() || !node.y.is_finite() {
				node.x = cx;
				node.y = cy;
				node.vx = 0.0;
				node.vy = 0.0;
			}

			// Measured before the wall clamp, so a node held against the
			// border by a live force still counts as moving.
			movement += node.vx.abs() + node.vy.abs();
			node.x = clamp_axis(node.x, min_x, max_x);
			node.y = clamp_axis(node.y, min_y, max_y);
		}
		movement < config.settle_threshold
	}
}

fn edge_pairs(edges: &[SimEdge]) -> Vec<(usize, usize)> {
	edges.iter().map(|e| (e.source, e.target)).collect()
}

fn nudge(node: &mut SimNode, fx: f64, fy: f64) {
	if node.pinned.is_none() {
		node.vx += fx;
		node.vy += fy;
	}
}

/// Unit vector from `i` towards `j`. Coincident nodes get a stable
/// pseudo-random direction so they can separate.
fn direction(dx: f64, dy: f64, distance: f64, i: usize, j: usize, floor: f64) -> (f64, f64) {
	if distance > floor {
		(dx / distance, dy / distance)
	} else {
		let angle = (i as f64 * 0.618_034 + j as f64 * 0.414_214 + 0.37) * TAU;
		(angle.cos(), angle.sin())
	}
}

fn clamp_axis(value: f64, min: f64, max: f64) -> f64 {
	if max < min {
		return (min + max) / 2.0;
	}
	value.clamp(min, max)
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use crate::components::knowledge_graph::types::Attributes;

	pub(crate) fn node(id: &str, kind: &str) -> GraphNode {
		GraphNode {
			id: id.into(),
			name: id.to_uppercase(),
			kind: kind.into(),
			attributes: Attributes::new(),
		}
	}

	pub(crate) fn edge(source: &str, target: &str) -> GraphEdge {
		GraphEdge {
			id: format!("{source}-{target}"),
			source: source.into(),
			target: target.into(),
			relation: "related_to".into(),
			weight: 1.0,
			attributes: Attributes::new(),
		}
	}

	pub(crate) fn chain() -> GraphData {
		GraphData {
			nodes: vec![node("a", "company"), node("b", "person"), node("c", "industry")],
			edges: vec![edge("a", "b"), edge("b", "c")],
		}
	}

	#[test]
	fn test_build_assigns_depths_and_degrees() {
		let sim = Simulation::new(&chain(), Some("a"), 800.0, 600.0, SimulationConfig::default());
		let depths: Vec<_> = sim.nodes().iter().map(|n| n.depth).collect();
		let degrees: Vec<_> = sim.nodes().iter().map(|n| n.degree).collect();
		assert_eq!(depths, vec![0, 1, 2]);
		assert_eq!(degrees, vec![1, 2, 1]);
		assert_eq!(sim.focus(), Some(0));
		assert_eq!(sim.position(0), (400.0, 300.0));
	}

	#[test]
	fn test_dangling_edges_are_dropped() {
		let mut data = chain();
		data.edges.push(edge("a", "ghost"));
		data.edges.push(edge("ghost", "c"));
		let sim = Simulation::new(&data, None, 800.0, 600.0, SimulationConfig::default());
		assert_eq!(sim.edges().len(), 2);
		for e in sim.edges() {
			assert_eq!(sim.nodes()[e.source].node.id, e.edge.source);
			assert_eq!(sim.nodes()[e.target].node.id, e.edge.target);
		}
		assert_eq!(sim.neighbors(1), &[0, 2]);
	}

	#[test]
	fn test_duplicate_ids_keep_first() {
		let mut data = chain();
		data.nodes.push(node("a", "event"));
		let sim = Simulation::new(&data, None, 800.0, 600.0, SimulationConfig::default());
		assert_eq!(sim.nodes().len(), 3);
		assert_eq!(sim.nodes()[0].node.kind, "company");
	}

	#[test]
	fn test_empty_step_is_settled() {
		let mut sim = Simulation::new(
			&GraphData::default(),
			None,
			800.0,
			600.0,
			SimulationConfig::default(),
		);
		assert!(sim.step());
		assert!(sim.is_empty());
	}

	#[test]
	fn test_pinned_node_stays_exactly_on_pin() {
		let mut sim = Simulation::new(&chain(), Some("a"), 800.0, 600.0, SimulationConfig::default());
		// Right on top of a neighbour so repulsion and springs both act.
		let (ax, ay) = sim.position(0);
		assert!(sim.pin(1, ax + 1.0, ay));
		for _ in 0..25 {
			sim.step();
			assert_eq!(sim.position(1), (ax + 1.0, ay));
		}
		assert!(sim.unpin(1));
		assert!(sim.nodes()[1].pinned.is_none());
		assert!(!sim.unpin(1));
	}

	#[test]
	fn test_pin_rejects_non_finite() {
		let mut sim = Simulation::new(&chain(), None, 800.0, 600.0, SimulationConfig::default());
		assert!(!sim.pin(0, f64::NAN, 1.0));
		assert!(!sim.pin(7, 1.0, 1.0));
		assert!(sim.nodes()[0].pinned.is_none());
	}

	#[test]
	fn test_coincident_nodes_separate() {
		let data = GraphData {
			nodes: vec![node("a", "company"), node("b", "company"), node("c", "company")],
			edges: Vec::new(),
		};
		let mut sim = Simulation::new(&data, None, 800.0, 600.0, SimulationConfig::default());
		for node in &mut sim.nodes {
			node.x = 300.0;
			node.y = 300.0;
		}
		sim.step();
		for node in sim.nodes() {
			assert!(node.x.is_finite() && node.y.is_finite());
		}
		assert_ne!(sim.position(0), sim.position(1));
	}

	#[test]
	fn test_non_finite_position_resets_to_centre() {
		let mut sim = Simulation::new(&chain(), Some("a"), 800.0, 600.0, SimulationConfig::default());
		sim.nodes[2].x = f64::NAN;
		sim.nodes[2].vy = f64::INFINITY;
		assert_eq!(sim.position(2), (400.0, 300.0));
		sim.step();
		for node in sim.nodes() {
			assert!(node.x.is_finite() && node.y.is_finite());
		}
	}

	#[test]
	fn test_positions_stay_inside_padded_canvas() {
		let mut sim = Simulation::new(&chain(), Some("a"), 800.0, 600.0, SimulationConfig::default());
		for _ in 0..50 {
			sim.step();
		}
		for node in sim.nodes() {
			assert!((40.0..=760.0).contains(&node.x));
			assert!((40.0..=560.0).contains(&node.y));
		}
	}

	#[test]
	fn test_tiny_canvas_does_not_panic() {
		let mut sim = Simulation::new(&chain(), Some("a"), 10.0, 10.0, SimulationConfig::default());
		sim.step();
		assert_eq!(sim.position(0), (5.0, 5.0));
	}

	#[test]
	fn test_settles_and_stays_settled() {
		let mut sim =
			Simulation::new(&chain(), Some("a"), 2000.0, 2000.0, SimulationConfig::default());
		let settled_at = (0..5000).find(|_| sim.step());
		assert!(settled_at.is_some());

		let before: Vec<_> = (0..3).map(|i| sim.position(i)).collect();
		assert!(sim.step());
		assert!(sim.step());
		for (i, (x, y)) in before.into_iter().enumerate() {
			let (nx, ny) = sim.position(i);
			assert!((nx - x).abs() + (ny - y).abs() < 0.05);
		}
	}

	#[test]
	fn test_refocus_recomputes_depths() {
		let mut sim = Simulation::new(&chain(), Some("a"), 800.0, 600.0, SimulationConfig::default());
		sim.refocus(2);
		let depths: Vec<_> = sim.nodes().iter().map(|n| n.depth).collect();
		assert_eq!(depths, vec![2, 1, 0]);
		assert_eq!(sim.focus(), Some(2));
	}

	fn distance_from_centre(sim: &Simulation, index: usize) -> f64 {
		let (x, y) = sim.position(index);
		let (cx, cy) = sim.center();
		((x - cx).powi(2) + (y - cy).powi(2)).sqrt()
	}

	#[test]
	fn test_refocus_moves_new_focus_to_centre() {
		let mut sim =
			Simulation::new(&chain(), Some("a"), 2000.0, 2000.0, SimulationConfig::default());
		assert!((0..5000).any(|_| sim.step()));
		assert!(distance_from_centre(&sim, 2) > 300.0);

		sim.refocus(2);
		assert!(distance_from_centre(&sim, 2) < 1e-6);
		for _ in 0..3000 {
			sim.step();
		}
		let (a, b, c) = (
			distance_from_centre(&sim, 0),
			distance_from_centre(&sim, 1),
			distance_from_centre(&sim, 2),
		);
		assert!(c < SimulationConfig::default().ring_tolerance, "focus at {c}");
		assert!(c < b && b < a, "a={a} b={b} c={c}");
	}

	#[test]
	fn test_nodes_pressed_against_walls_do_not_settle() {
		let data = GraphData {
			nodes: vec![node("a", "company"), node("b", "person")],
			edges: Vec::new(),
		};
		let mut sim = Simulation::new(&data, None, 100.0, 100.0, SimulationConfig::default());
		for _ in 0..50 {
			assert!(!sim.step());
			for node in sim.nodes() {
				assert!((40.0..=60.0).contains(&node.x));
				assert!((40.0..=60.0).contains(&node.y));
			}
		}
		let moving = sim.nodes().iter().any(|n| n.vx.abs() + n.vy.abs() > 0.0);
		assert!(moving);
	}

	#[test]
	fn test_resize_keeps_layout_centred() {
		let mut sim = Simulation::new(&chain(), Some("a"), 800.0, 600.0, SimulationConfig::default());
		sim.pin(1, 100.0, 100.0);
		sim.resize(1000.0, 800.0);
		assert_eq!(sim.center(), (500.0, 400.0));
		assert_eq!(sim.position(0), (500.0, 400.0));
		assert_eq!(sim.nodes()[1].pinned, Some((200.0, 200.0)));
	}
}

#[cfg(test)]
mod property_tests {
	use super::tests::{edge, node};
	use super::*;
	use proptest::prelude::*;

	fn graph_strategy() -> impl Strategy<Value = GraphData> {
		(1usize..=200).prop_flat_map(|n| {
			proptest::collection::vec((0..n + 5, 0..n + 5), 0..(n * 2)).prop_map(move |pairs| {
				GraphData {
					nodes: (0..n).map(|i| node(&format!("n{i}"), "company")).collect(),
					edges: pairs
						.into_iter()
						.map(|(a, b)| edge(&format!("n{a}"), &format!("n{b}")))
						.collect(),
				}
			})
		})
	}

	proptest! {
		#![proptest_config(ProptestConfig::with_cases(24))]

		#[test]
		fn prop_steps_never_produce_non_finite_positions(
			data in graph_strategy(),
			width in 0.0f64..1600.0,
			height in 0.0f64..1200.0,
		) {
			let mut sim = Simulation::new(&data, None, width, height, SimulationConfig::default());
			for _ in 0..15 {
				sim.step();
				for node in sim.nodes() {
					prop_assert!(node.x.is_finite() && node.y.is_finite());
				}
			}
		}

		#[test]
		fn prop_edges_only_reference_live_nodes(data in graph_strategy()) {
			let sim = Simulation::new(&data, None, 800.0, 600.0, SimulationConfig::default());
			for e in sim.edges() {
				prop_assert!(e.source < sim.nodes().len());
				prop_assert!(e.target < sim.nodes().len());
				prop_assert_eq!(&sim.nodes()[e.source].node.id, &e.edge.source);
				prop_assert_eq!(&sim.nodes()[e.target].node.id, &e.edge.target);
			}
		}
	}
}
