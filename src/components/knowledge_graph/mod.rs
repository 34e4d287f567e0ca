//! Force-directed knowledge graph canvas.
//!
//! The pure core (depth assignment, radial seeding, force simulation, scene
//! rendering, pointer handling and frame scheduling) lives in plain modules
//! that never touch the DOM. [`component`] wires it to a `<canvas>`.

mod animation;
mod component;
mod depth;
mod interaction;
mod layout;
mod loader;
mod registry;
mod render;
mod simulation;
mod state;
mod types;

pub use component::KnowledgeGraphCanvas;
pub use loader::{
	Completion, EntityDetailProvider, GraphDataProvider, GraphRequest, ProviderError,
	RequestTracker, fetch_graph,
};
pub use registry::{ENTITY_TYPES, entity_style};
pub use types::{EntityDetail, GraphData, GraphSnapshot, NewsItem, SourceRef};
