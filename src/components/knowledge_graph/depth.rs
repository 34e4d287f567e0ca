//! Hop distance from the focus node, by bounded edge relaxation.

/// Upper bound on relaxation passes. Graphs whose diameter from the focus
/// exceeds this leave the farthest nodes at a too-small depth.
pub const MAX_RELAXATION_PASSES: usize = 20;

const UNREACHED: u32 = u32::MAX;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepthAssignment {
	/// Index of the node treated as depth 0, `None` only for an empty graph.
	pub focus: Option<usize>,
	pub depths: Vec<u32>,
	pub degrees: Vec<u32>,
}

/// Count edges touching each node. A self-loop counts once.
pub fn degrees(node_count: usize, edges: &[(usize, usize)]) -> Vec<u32> {
	let mut degrees = vec![0u32; node_count];
	for &(source, target) in edges {
		degrees[source] += 1;
		if target != source {
			degrees[target] += 1;
		}
	}
	degrees
}

/// Assign depths over an index graph. `edges` must only reference indices
/// below `node_count`; a `focus` outside that range is ignored and the
/// highest-degree node (first on ties) is used instead.
pub fn assign_depths(
	node_count: usize,
	edges: &[(usize, usize)],
	focus: Option<usize>,
) -> DepthAssignment {
	let degrees = degrees(node_count, edges);
	let focus = focus.filter(|&f| f < node_count).or_else(|| {
		let mut best: Option<usize> = None;
		for (index, &degree) in degrees.iter().enumerate() {
			if best.is_none_or(|b| degree > degrees[b]) {
				best = Some(index);
			}
		}
		best
	});

	let mut depths = vec![UNREACHED; node_count];
	if let Some(focus) = focus {
		depths[focus] = 0;
	}

	for _ in 0..MAX_RELAXATION_PASSES {
		let mut changed = false;
		for &(a, b) in edges {
			let nearest = depths[a].min(depths[b]);
			if nearest == UNREACHED {
				continue;
			}
			let next = nearest + 1;
			for end in [a, b] {
				if depths[end] > next {
					depths[end] = next;
					changed = true;
				}
			}
		}
		if !changed {
			break;
		}
	}

	for depth in &mut depths {
		if *depth == UNREACHED {
			*depth = 0;
		}
	}

	DepthAssignment {
		focus,
		depths,
		degrees,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_chain_from_explicit_focus() {
		// A - B - C
		let result = assign_depths(3, &[(0, 1), (1, 2)], Some(0));
		assert_eq!(result.focus, Some(0));
		assert_eq!(result.depths, vec![0, 1, 2]);
		assert_eq!(result.degrees, vec![1, 2, 1]);
	}

	#[test]
	fn test_reversed_edge_order_still_converges() {
		let result = assign_depths(4, &[(2, 3), (1, 2), (0, 1)], Some(0));
		assert_eq!(result.depths, vec![0, 1, 2, 3]);
	}

	#[test]
	fn test_missing_focus_picks_highest_degree() {
		// Star around 2, plus a tail on 4.
		let edges = [(2, 0), (2, 1), (2, 3), (3, 4)];
		let result = assign_depths(5, &edges, None);
		assert_eq!(result.focus, Some(2));
		assert_eq!(result.depths, vec![1, 1, 0, 1, 2]);
	}

	#[test]
	fn test_degree_ties_pick_first_occurrence() {
		let result = assign_depths(4, &[(0, 1), (2, 3)], None);
		assert_eq!(result.focus, Some(0));
	}

	#[test]
	fn test_out_of_range_focus_falls_back() {
		let result = assign_depths(3, &[(1, 2), (1, 0)], Some(99));
		assert_eq!(result.focus, Some(1));
	}

	#[test]
	fn test_disconnected_nodes_get_depth_zero() {
		let result = assign_depths(5, &[(0, 1), (3, 4)], Some(0));
		assert_eq!(result.depths, vec![0, 1, 0, 0, 0]);
	}

	#[test]
	fn test_cycle_terminates() {
		let result = assign_depths(4, &[(0, 1), (1, 2), (2, 3), (3, 0)], Some(0));
		assert_eq!(result.depths, vec![0, 1, 2, 1]);
	}

	#[test]
	fn test_empty_graph() {
		let result = assign_depths(0, &[], None);
		assert_eq!(result.focus, None);
		assert!(result.depths.is_empty());
	}

	#[test]
	fn test_long_chain_is_bounded() {
		// Edges listed far-end first so each pass only advances one hop.
		let n = MAX_RELAXATION_PASSES + 5;
		let edges: Vec<_> = (0..n - 1).rev().map(|i| (i, i + 1)).collect();
		let result = assign_depths(n, &edges, Some(0));
		assert_eq!(result.depths[MAX_RELAXATION_PASSES], MAX_RELAXATION_PASSES as u32);
		assert_eq!(result.depths[n - 1], 0);
	}
}

#[cfg(test)]
mod property_tests {
	use std::collections::VecDeque;

	use super::*;
	use proptest::prelude::*;

	fn bfs(node_count: usize, edges: &[(usize, usize)], focus: usize) -> Vec<Option<u32>> {
		let mut adjacency = vec![Vec::new(); node_count];
		for &(a, b) in edges {
			adjacency[a].push(b);
			adjacency[b].push(a);
		}
		let mut distance = vec![None; node_count];
		distance[focus] = Some(0);
		let mut queue = VecDeque::from([focus]);
		while let Some(current) = queue.pop_front() {
			let next = distance[current].map(|d| d + 1);
			for &neighbor in &adjacency[current] {
				if distance[neighbor].is_none() {
					distance[neighbor] = next;
					queue.push_back(neighbor);
				}
			}
		}
		distance
	}

	fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
		(1usize..=20).prop_flat_map(|n| (Just(n), proptest::collection::vec((0..n, 0..n), 0..40)))
	}

	proptest! {
		/// Reachable nodes get their exact BFS distance, everything else 0.
		#[test]
		fn prop_depths_match_bfs((n, edges) in graph_strategy(), focus_seed in 0usize..20) {
			let focus = focus_seed % n;
			let result = assign_depths(n, &edges, Some(focus));
			prop_assert_eq!(result.depths[focus], 0);

			let expected = bfs(n, &edges, focus);
			for (index, distance) in expected.iter().enumerate() {
				prop_assert_eq!(result.depths[index], distance.unwrap_or(0));
			}
		}
	}
}
