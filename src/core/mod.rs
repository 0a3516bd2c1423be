pub mod duration;
pub mod engine;
pub mod filter;
pub mod pipeline;
pub mod ranking;
pub mod report;
pub mod search;

pub use crate::domain::model::{Itinerary, Offer, SearchQuery, Segment};
pub use crate::domain::ports::{Notifier, Pipeline, SearchProvider, SearchResponse};
pub use crate::utils::error::Result;
