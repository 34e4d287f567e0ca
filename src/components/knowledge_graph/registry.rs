//! Fixed lookup tables from type tags to colours and display labels.

use super::types::GraphNode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
	pub fn rgba(self, alpha: f64) -> String {
		format!("rgba({}, {}, {}, {})", self.0, self.1, self.2, alpha.clamp(0.0, 1.0))
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityStyle {
	pub color: Rgb,
	pub label: &'static str,
}

const DEFAULT_ENTITY: EntityStyle = EntityStyle {
	color: Rgb(148, 163, 184),
	label: "Entity",
};

/// Entity type tags in the order the filter chips show them.
pub const ENTITY_TYPES: &[&str] = &[
	"company", "person", "industry", "product", "stock", "fund", "event", "concept", "region",
];

pub fn entity_style(kind: &str) -> EntityStyle {
	let (color, label) = match kind {
		"company" => (Rgb(59, 130, 246), "Company"),
		"person" => (Rgb(16, 185, 129), "Person"),
		"industry" => (Rgb(168, 85, 247), "Industry"),
		"product" => (Rgb(245, 158, 11), "Product"),
		"stock" => (Rgb(239, 68, 68), "Stock"),
		"fund" => (Rgb(6, 182, 212), "Fund"),
		"event" => (Rgb(244, 63, 94), "Event"),
		"concept" => (Rgb(132, 204, 22), "Concept"),
		"region" => (Rgb(234, 179, 8), "Region"),
		_ => return DEFAULT_ENTITY,
	};
	EntityStyle { color, label }
}

pub fn relation_label(relation: &str) -> &'static str {
	match relation {
		"belongs_to" => "Belongs to",
		"competes_with" => "Competes with",
		"supplies" => "Supplies",
		"customer_of" => "Customer of",
		"invests_in" => "Invests in",
		"holds" => "Holds",
		"executive_of" => "Executive of",
		"founded" => "Founded",
		"produces" => "Produces",
		"listed_as" => "Listed as",
		"affects" => "Affects",
		"located_in" => "Located in",
		"related_to" => "Related to",
		_ => "Related",
	}
}

/// Caption drawn inside a node. Stocks prefer their ticker, everything else
/// its name; an empty name falls back to the id.
pub fn node_caption(node: &GraphNode) -> &str {
	if node.kind == "stock"
		&& let Some(ticker) = node.attributes.get("ticker").and_then(|v| v.as_str())
		&& !ticker.is_empty()
	{
		return ticker;
	}
	if node.name.is_empty() { &node.id } else { &node.name }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::knowledge_graph::types::Attributes;

	#[test]
	fn test_unknown_tags_fall_back() {
		assert_eq!(entity_style("spaceship"), DEFAULT_ENTITY);
		assert_eq!(relation_label("orbits"), "Related");
	}

	#[test]
	fn test_every_listed_type_has_its_own_style() {
		for kind in ENTITY_TYPES {
			assert_ne!(entity_style(kind), DEFAULT_ENTITY, "{kind}");
		}
	}

	#[test]
	fn test_stock_caption_prefers_ticker() {
		let mut attributes = Attributes::new();
		attributes.insert("ticker".into(), "NVDA".into());
		let node = GraphNode {
			id: "s1".into(),
			name: "NVIDIA Corp. common stock".into(),
			kind: "stock".into(),
			attributes,
		};
		assert_eq!(node_caption(&node), "NVDA");

		let unnamed = GraphNode {
			id: "c9".into(),
			name: String::new(),
			kind: "company".into(),
			attributes: Attributes::new(),
		};
		assert_eq!(node_caption(&unnamed), "c9");
	}

	#[test]
	fn test_rgba_clamps_alpha() {
		assert_eq!(Rgb(1, 2, 3).rgba(1.5), "rgba(1, 2, 3, 1)");
	}
}
