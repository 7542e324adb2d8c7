//! # chronofact-core
//!
//! Core types, traits, and business logic for the chronofact temporal
//! knowledge-graph memory service. This crate owns the bitemporal data
//! model and every pure/service-layer algorithm; it has no dependency on a
//! concrete graph store or LLM/embedder provider — those are supplied
//! through `adapters/` and `connectors/` crates implementing the traits
//! defined here.

pub mod analytics;
pub mod config;
pub mod errors;
pub mod extraction;
pub mod facts;
pub mod group;
pub mod queue;
pub mod scoring;
pub mod search;
pub mod temporal;
pub mod traits;
pub mod types;

pub use errors::{CoreError, GraphError, LlmError};
pub use traits::{EmbedderGateway, GraphStore, LlmGateway, PresentationAdapter};
pub use types::{EntityEdge, EntityNode, EpisodeSource, EpisodicNode, GroupId, MentionsEdge};

/// Prelude module for convenient imports across adapters/connectors/presentation.
pub mod prelude {
    pub use crate::config::*;
    pub use crate::errors::*;
    pub use crate::traits::*;
    pub use crate::types::*;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use uuid::Uuid;
}
