use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use time::Date;

use crate::core::config::{Settings, StorageBackend};
use crate::db::models::{Material, Round, RoundSummary, ScoreRecord};
use crate::services::memory_store::MemoryStore;
use crate::services::pg_store::PgStore;
use crate::services::regions::{Region, RegionSet, RegionValidationError};
use crate::services::score_policy::ScoreMismatch;

#[derive(Debug, Error)]
pub(crate) enum EngineError {
    #[error(transparent)]
    InvalidRegions(#[from] RegionValidationError),
    #[error(transparent)]
    ScoreMismatch(#[from] ScoreMismatch),
    #[error("{0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl EngineError {
    pub(crate) fn material_not_found(material_id: &str) -> Self {
        Self::NotFound(format!("Material '{material_id}' not found"))
    }

    pub(crate) fn round_not_found(class_name: &str, round_number: i32) -> Self {
        Self::NotFound(format!("Round {round_number} of class '{class_name}' not found"))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NewMaterial {
    pub(crate) class_name: String,
    pub(crate) round_number: i32,
    pub(crate) title: Option<String>,
    pub(crate) page_count: i32,
    pub(crate) file_ref: String,
}

#[derive(Debug, Clone)]
pub(crate) struct NewRound {
    pub(crate) class_name: String,
    pub(crate) round_number: i32,
    pub(crate) round_name: Option<String>,
    pub(crate) held_on: Option<Date>,
}

impl NewRound {
    pub(crate) fn bare(class_name: &str, round_number: i32) -> Self {
        Self { class_name: class_name.to_string(), round_number, round_name: None, held_on: None }
    }
}

/// Per-material question regions.
///
/// A replacement is all-or-nothing: readers see either the previous set or
/// the new one. Two concurrent replacements race and the last one wins.
#[async_trait]
pub(crate) trait RegionStore: Send + Sync {
    async fn replace_regions(
        &self,
        material_id: &str,
        regions: Vec<Region>,
    ) -> Result<RegionSet, EngineError>;

    async fn regions(&self, material_id: &str) -> Result<RegionSet, EngineError>;

    /// Succeeds without changes when the question has no region.
    async fn remove_region(
        &self,
        material_id: &str,
        question_number: u32,
    ) -> Result<RegionSet, EngineError>;
}

#[async_trait]
pub(crate) trait MaterialCatalog: Send + Sync {
    /// Makes `material` the active one for its round, superseding any previous upload.
    async fn register_material(&self, material: NewMaterial) -> Result<Material, EngineError>;

    async fn material(&self, material_id: &str) -> Result<Material, EngineError>;

    async fn delete_material(&self, material_id: &str) -> Result<(), EngineError>;

    async fn active_material(
        &self,
        class_name: &str,
        round_number: i32,
    ) -> Result<Option<Material>, EngineError>;

    async fn upsert_round(&self, round: NewRound) -> Result<Round, EngineError>;

    async fn round(&self, class_name: &str, round_number: i32)
        -> Result<Option<Round>, EngineError>;

    /// Rounds of a class in ascending round number.
    async fn rounds_for_class(&self, class_name: &str) -> Result<Vec<RoundSummary>, EngineError>;

    async fn class_names(&self) -> Result<Vec<String>, EngineError>;
}

#[async_trait]
pub(crate) trait ScoreBook: Send + Sync {
    /// Upserts by `(class, round, student)`, creating the round when needed.
    async fn save_score(&self, record: ScoreRecord) -> Result<ScoreRecord, EngineError>;

    async fn scores_for_round(
        &self,
        class_name: &str,
        round_number: i32,
    ) -> Result<Vec<ScoreRecord>, EngineError>;

    async fn score(
        &self,
        class_name: &str,
        round_number: i32,
        student_id: &str,
    ) -> Result<Option<ScoreRecord>, EngineError>;
}

#[async_trait]
pub(crate) trait Store: RegionStore + MaterialCatalog + ScoreBook {
    fn backend(&self) -> StorageBackend;

    async fn ping(&self) -> Result<(), EngineError>;
}

pub(crate) async fn build_store(settings: &Settings) -> anyhow::Result<Arc<dyn Store>> {
    let limit = settings.storage().max_regions_per_material;
    match settings.storage().backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryStore::new(limit)))
        }
        StorageBackend::Postgres => {
            let pool = crate::db::init_pool(settings).await?;
            crate::db::run_migrations(&pool).await?;
            Ok(Arc::new(PgStore::new(pool, limit)))
        }
    }
}

pub(crate) fn page_count_bound(page_count: i32) -> u32 {
    u32::try_from(page_count).unwrap_or(0)
}
