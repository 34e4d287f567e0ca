use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form key/value attributes carried by nodes, edges and entity details.
pub type Attributes = BTreeMap<String, Value>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	pub id: String,
	pub name: String,
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub attributes: Attributes,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
	pub id: String,
	pub source: String,
	pub target: String,
	#[serde(rename = "type")]
	pub relation: String,
	#[serde(default = "default_weight")]
	pub weight: f64,
	#[serde(default)]
	pub attributes: Attributes,
}

fn default_weight() -> f64 {
	1.0
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	#[serde(default)]
	pub nodes: Vec<GraphNode>,
	#[serde(default)]
	pub edges: Vec<GraphEdge>,
}

impl GraphData {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

/// A node/edge set delivered to the canvas together with the node it is
/// centred on. `revision` changes every time the set is replaced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
	pub data: GraphData,
	pub focus: Option<String>,
	pub revision: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
	pub title: String,
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub published_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
	pub name: String,
	#[serde(default)]
	pub url: Option<String>,
}

/// Everything the side panel shows about one entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityDetail {
	pub entity: GraphNode,
	#[serde(default)]
	pub news: Vec<NewsItem>,
	#[serde(default)]
	pub sources: Vec<SourceRef>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_edge_defaults_when_fields_missing() {
		let edge: GraphEdge = serde_json::from_str(
			r#"{"id":"e1","source":"a","target":"b","type":"supplies"}"#,
		)
		.unwrap();
		assert_eq!(edge.relation, "supplies");
		assert_eq!(edge.weight, 1.0);
		assert!(edge.attributes.is_empty());
	}

	#[test]
	fn test_node_type_tag_uses_wire_name() {
		let node = GraphNode {
			id: "n1".into(),
			name: "Acme".into(),
			kind: "company".into(),
			attributes: Attributes::new(),
		};
		let json = serde_json::to_value(&node).unwrap();
		assert_eq!(json["type"], "company");
		assert!(json.get("kind").is_none());
	}
}
