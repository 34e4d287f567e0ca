//! In-memory financial knowledge graph used by the demo page.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use serde::Deserialize;

use crate::components::knowledge_graph::{
	EntityDetail, EntityDetailProvider, GraphData, GraphDataProvider, NewsItem, ProviderError,
	SourceRef,
};

const BUILTIN: &str = include_str!("sample_graph.json");

#[derive(Clone, Debug, Default, Deserialize)]
struct DetailExtras {
	#[serde(default)]
	news: Vec<NewsItem>,
	#[serde(default)]
	sources: Vec<SourceRef>,
}

#[derive(Debug, Deserialize)]
struct Dataset {
	#[serde(flatten)]
	graph: GraphData,
	#[serde(default)]
	details: HashMap<String, DetailExtras>,
}

/// Read-only graph answering provider queries from memory. Cheap to clone.
#[derive(Clone, Debug)]
pub struct SampleGraph {
	graph: Arc<GraphData>,
	details: Arc<HashMap<String, DetailExtras>>,
	/// Node id -> indices of the edges touching it.
	incident: Arc<HashMap<String, Vec<usize>>>,
}

impl SampleGraph {
	pub fn builtin() -> Result<Self, ProviderError> {
		Self::from_json(BUILTIN)
	}

	pub fn from_json(text: &str) -> Result<Self, ProviderError> {
		let dataset: Dataset = serde_json::from_str(text)?;
		let mut incident: HashMap<String, Vec<usize>> = HashMap::new();
		for (i, edge) in dataset.graph.edges.iter().enumerate() {
			incident.entry(edge.source.clone()).or_default().push(i);
			if edge.target != edge.source {
				incident.entry(edge.target.clone()).or_default().push(i);
			}
		}
		Ok(Self {
			graph: Arc::new(dataset.graph),
			details: Arc::new(dataset.details),
			incident: Arc::new(incident),
		})
	}

	fn contains(&self, id: &str) -> bool {
		self.graph.nodes.iter().any(|n| n.id == id)
	}

	fn degree(&self, id: &str) -> usize {
		self.incident.get(id).map_or(0, Vec::len)
	}

	fn neighbors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
		self.incident
			.get(id)
			.into_iter()
			.flatten()
			.map(move |&i| {
				let edge = &self.graph.edges[i];
				if edge.source == id { edge.target.as_str() } else { edge.source.as_str() }
			})
	}

	/// Nodes in `keep` (in dataset order) and the edges running between them.
	fn subgraph(&self, keep: &HashSet<&str>) -> GraphData {
		GraphData {
			nodes: self
				.graph
				.nodes
				.iter()
				.filter(|n| keep.contains(n.id.as_str()))
				.cloned()
				.collect(),
			edges: self
				.graph
				.edges
				.iter()
				.filter(|e| keep.contains(e.source.as_str()) && keep.contains(e.target.as_str()))
				.cloned()
				.collect(),
		}
	}

	/// The `limit` best connected nodes.
	pub fn top_connected(&self, limit: usize) -> GraphData {
		let mut ranked: Vec<&str> = self.graph.nodes.iter().map(|n| n.id.as_str()).collect();
		ranked.sort_by_key(|id| std::cmp::Reverse(self.degree(id)));
		ranked.truncate(limit);
		self.subgraph(&ranked.into_iter().collect())
	}

	/// Everything within `depth` hops of `focus_id`, edges treated as undirected.
	pub fn neighborhood(&self, focus_id: &str, depth: u32) -> Result<GraphData, ProviderError> {
		if !self.contains(focus_id) {
			return Err(ProviderError::NotFound(focus_id.to_string()));
		}
		let mut seen: HashSet<&str> = HashSet::from([focus_id]);
		let mut queue = VecDeque::from([(focus_id, 0u32)]);
		while let Some((id, hops)) = queue.pop_front() {
			if hops == depth {
				continue;
			}
			for next in self.neighbors(id) {
				if seen.insert(next) {
					queue.push_back((next, hops + 1));
				}
			}
		}
		Ok(self.subgraph(&seen))
	}

	/// Case-insensitive name/id matches plus their direct neighbours.
	pub fn search(&self, keyword: &str) -> Result<GraphData, ProviderError> {
		let needle = keyword.trim().to_lowercase();
		if needle.is_empty() {
			return Err(ProviderError::Request("empty search keyword".into()));
		}
		let mut keep: HashSet<&str> = HashSet::new();
		for node in &self.graph.nodes {
			if node.name.to_lowercase().contains(&needle) || node.id.to_lowercase().contains(&needle) {
				keep.insert(node.id.as_str());
				keep.extend(self.neighbors(&node.id));
			}
		}
		Ok(self.subgraph(&keep))
	}

	pub fn detail(&self, id: &str) -> Result<EntityDetail, ProviderError> {
		let entity = self
			.graph
			.nodes
			.iter()
			.find(|n| n.id == id)
			.cloned()
			.ok_or_else(|| ProviderError::NotFound(id.to_string()))?;
		let extras = self.details.get(id).cloned().unwrap_or_default();
		Ok(EntityDetail {
			entity,
			news: extras.news,
			sources: extras.sources,
		})
	}
}

impl GraphDataProvider for SampleGraph {
	async fn default_graph(&self, limit: usize) -> Result<GraphData, ProviderError> {
		Ok(self.top_connected(limit))
	}

	async fn entity_graph(&self, focus_id: &str, depth: u32) -> Result<GraphData, ProviderError> {
		self.neighborhood(focus_id, depth)
	}

	async fn search_graph(&self, keyword: &str) -> Result<GraphData, ProviderError> {
		self.search(keyword)
	}
}

impl EntityDetailProvider for SampleGraph {
	async fn entity_detail(&self, id: &str) -> Result<EntityDetail, ProviderError> {
		self.detail(id)
	}
}
