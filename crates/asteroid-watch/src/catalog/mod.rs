//! Scored near-Earth object catalog: feed ingestion, risk assessment, and reads.

pub mod domain;
pub mod feed;
pub mod repository;
pub mod risk;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    CachedAsteroid, CloseApproach, DiameterRange, NearEarthObject, NeoId, OrbitalElements,
};
pub use feed::{FeedError, FeedProvider, FeedRange, NasaFeedClient};
pub use repository::{CatalogFilter, CatalogQuery, CatalogRepository, CatalogStats};
pub use risk::{assess_risk, RiskAssessment, RiskFactors, RiskTier};
pub use router::catalog_router;
pub use service::{CatalogService, CatalogServiceError, IngestSummary, PageRequest};
