use std::f64::consts::TAU;

/// Ring geometry shared by the initial placement and the radial
/// containment force.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
	pub ring_base: f64,
	pub ring_step: f64,
	/// Angle reserved per node on a ring.
	pub angle_per_node: f64,
	/// Narrowest arc used for a ring, so two or three siblings still spread.
	pub min_spread: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			ring_base: 100.0,
			ring_step: 160.0,
			angle_per_node: 0.45,
			min_spread: TAU / 6.0,
		}
	}
}

impl LayoutConfig {
	pub fn ring_radius(&self, depth: u32) -> f64 {
		self.ring_base + depth as f64 * self.ring_step
	}
}

/// Angles for `count` siblings sharing one ring, as a symmetric arc around 0.
fn ring_angles(count: usize, config: &LayoutConfig) -> Vec<f64> {
	match count {
		0 => Vec::new(),
		1 => vec![0.0],
		_ => {
			let spread = (count as f64 * config.angle_per_node).max(config.min_spread);
			if spread >= TAU {
				let step = TAU / count as f64;
				(0..count).map(|i| i as f64 * step - TAU / 2.0).collect()
			} else {
				let step = spread / (count - 1) as f64;
				(0..count).map(|i| i as f64 * step - spread / 2.0).collect()
			}
		}
	}
}

/// Initial position of every node: rings by depth around the canvas centre.
/// A lone depth-0 node (normally the focus) sits on the centre itself. When
/// several nodes share depth 0 they collapse onto one slot of the inner ring
/// and repulsion pulls them apart.
pub fn radial_positions(
	depths: &[u32],
	width: f64,
	height: f64,
	config: &LayoutConfig,
) -> Vec<(f64, f64)> {
	let (cx, cy) = (width / 2.0, height / 2.0);
	let mut positions = vec![(cx, cy); depths.len()];

	let max_depth = depths.iter().copied().max().unwrap_or(0) as usize;
	let mut rings: Vec<Vec<usize>> = vec![Vec::new(); max_depth + 1];
	for (index, &depth) in depths.iter().enumerate() {
		rings[depth as usize].push(index);
	}

	for (depth, members) in rings.iter().enumerate() {
		let radius = config.ring_radius(depth as u32);
		let angles = match (depth, members.len()) {
			(0, 1) => continue,
			(0, count) => vec![0.0; count],
			(_, count) => ring_angles(count, config),
		};
		for (&index, angle) in members.iter().zip(angles) {
			positions[index] = (cx + radius * angle.cos(), cy + radius * angle.sin());
		}
	}
	positions
}
