//! Provider seams and in-flight request bookkeeping.
//!
//! Providers are asynchronous and may complete out of order. Every request is
//! issued through a [`RequestTracker`] ticket, and only the completion of the
//! newest ticket is ever turned into a [`GraphSnapshot`].

use std::future::Future;

use log::{debug, warn};
use thiserror::Error;

use super::types::{EntityDetail, GraphData, GraphSnapshot};

#[derive(Debug, Error)]
pub enum ProviderError {
	#[error("request failed: {0}")]
	Request(String),
	#[error("no entity with id `{0}`")]
	NotFound(String),
	#[error("malformed graph payload: {0}")]
	Decode(#[from] serde_json::Error),
}

/// The three ways a node/edge set can be asked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphRequest {
	Default { limit: usize },
	Entity { focus_id: String, depth: u32 },
	Search { keyword: String },
}

impl GraphRequest {
	/// Node the resulting layout should centre on, if the request names one.
	pub fn focus(&self) -> Option<&str> {
		match self {
			Self::Entity { focus_id, .. } => Some(focus_id),
			Self::Default { .. } | Self::Search { .. } => None,
		}
	}
}

pub trait GraphDataProvider {
	fn default_graph(&self, limit: usize) -> impl Future<Output = Result<GraphData, ProviderError>>;

	fn entity_graph(
		&self,
		focus_id: &str,
		depth: u32,
	) -> impl Future<Output = Result<GraphData, ProviderError>>;

	fn search_graph(&self, keyword: &str) -> impl Future<Output = Result<GraphData, ProviderError>>;
}

pub trait EntityDetailProvider {
	fn entity_detail(&self, id: &str) -> impl Future<Output = Result<EntityDetail, ProviderError>>;
}

pub async fn fetch_graph<P: GraphDataProvider>(
	provider: &P,
	request: &GraphRequest,
) -> Result<GraphData, ProviderError> {
	match request {
		GraphRequest::Default { limit } => provider.default_graph(*limit).await,
		GraphRequest::Entity { focus_id, depth } => provider.entity_graph(focus_id, *depth).await,
		GraphRequest::Search { keyword } => provider.search_graph(keyword).await,
	}
}

/// Handle for one issued request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
	id: u64,
	focus: Option<String>,
}

#[derive(Debug)]
pub enum Completion {
	/// Newest request succeeded; replace the whole graph with this snapshot.
	Apply(GraphSnapshot),
	/// Newest request failed; the current graph stays as it is.
	Failed(ProviderError),
	/// A newer request was issued after this one.
	Stale,
}

#[derive(Clone, Debug, Default)]
pub struct RequestTracker {
	latest: u64,
	pending: bool,
}

impl RequestTracker {
	pub fn begin(&mut self, request: &GraphRequest) -> Ticket {
		self.latest += 1;
		self.pending = true;
		debug!("graph request #{}: {request:?}", self.latest);
		Ticket {
			id: self.latest,
			focus: request.focus().map(str::to_owned),
		}
	}

	pub fn is_loading(&self) -> bool {
		self.pending
	}

	pub fn complete(&mut self, ticket: Ticket, result: Result<GraphData, ProviderError>) -> Completion {
		if ticket.id != self.latest {
			debug!(
				"discarding response #{} superseded by #{}",
				ticket.id, self.latest
			);
			return Completion::Stale;
		}
		self.pending = false;
		match result {
			Ok(data) => Completion::Apply(GraphSnapshot {
				data,
				focus: ticket.focus,
				revision: ticket.id,
			}),
			Err(err) => {
				warn!("graph request #{} failed: {err}", ticket.id);
				Completion::Failed(err)
			}
		}
	}
}
