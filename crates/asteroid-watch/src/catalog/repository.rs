use std::cmp::Ordering;

use serde::Serialize;

use super::domain::{CachedAsteroid, NeoId};
use super::risk::RiskTier;
use crate::store::RepositoryError;

/// Row filter shared by list and count queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub hazardous_only: bool,
    /// Empty means any tier.
    pub tiers: Vec<RiskTier>,
}

impl CatalogFilter {
    pub fn hazardous() -> Self {
        Self {
            hazardous_only: true,
            tiers: Vec::new(),
        }
    }

    pub fn tier(tier: RiskTier) -> Self {
        Self {
            hazardous_only: false,
            tiers: vec![tier],
        }
    }

    /// HIGH and CRITICAL objects, regardless of the hazard flag.
    pub fn high_risk() -> Self {
        Self {
            hazardous_only: false,
            tiers: vec![RiskTier::High, RiskTier::Critical],
        }
    }

    pub fn matches(&self, asteroid: &CachedAsteroid) -> bool {
        if self.hazardous_only && !asteroid.object.is_potentially_hazardous {
            return false;
        }
        self.tiers.is_empty() || self.tiers.contains(&asteroid.tier())
    }
}

/// Ordered (score descending) window over the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub filter: CatalogFilter,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl CatalogQuery {
    pub fn all(filter: CatalogFilter) -> Self {
        Self {
            filter,
            offset: 0,
            limit: None,
        }
    }
}

/// Catalog ordering: highest score first, ties broken by identifier.
pub fn by_score_desc(left: &CachedAsteroid, right: &CachedAsteroid) -> Ordering {
    right
        .score()
        .cmp(&left.score())
        .then_with(|| left.id().cmp(right.id()))
}

/// Storage for scored objects. Writes replace whole rows keyed by [`NeoId`].
pub trait CatalogRepository: Send + Sync {
    fn upsert_many(&self, asteroids: Vec<CachedAsteroid>) -> Result<usize, RepositoryError>;
    fn get(&self, id: &NeoId) -> Result<Option<CachedAsteroid>, RepositoryError>;
    fn list(&self, query: &CatalogQuery) -> Result<Vec<CachedAsteroid>, RepositoryError>;
    /// Case-insensitive substring match on the display name.
    fn search(&self, needle: &str, limit: usize) -> Result<Vec<CachedAsteroid>, RepositoryError>;
    fn count(&self, filter: &CatalogFilter) -> Result<usize, RepositoryError>;
}

/// Headline counts for dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub hazardous: usize,
    pub critical: usize,
    pub high: usize,
}
