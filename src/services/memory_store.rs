use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::config::StorageBackend;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Material, Round, RoundSummary, ScoreRecord};
use crate::services::regions::{validate_replacement, Region, RegionSet};
use crate::services::store::{
    page_count_bound, EngineError, MaterialCatalog, NewMaterial, NewRound, RegionStore, ScoreBook,
    Store,
};

type RoundKey = (String, i32);
type ScoreKey = (String, i32, String);

struct MaterialEntry {
    material: Material,
    regions: Vec<Region>,
}

impl MaterialEntry {
    fn snapshot(&self) -> RegionSet {
        RegionSet {
            revision: self.material.regions_revision,
            regions: self.regions.clone(),
        }
    }
}

#[derive(Default)]
struct Inner {
    materials: HashMap<String, MaterialEntry>,
    rounds: BTreeMap<RoundKey, Round>,
    scores: BTreeMap<ScoreKey, ScoreRecord>,
}

impl Inner {
    fn upsert_round(&mut self, round: NewRound) -> Round {
        let now = primitive_now_utc();
        let key = (round.class_name.clone(), round.round_number);
        let entry = self.rounds.entry(key).or_insert_with(|| Round {
            id: Uuid::new_v4().to_string(),
            class_name: round.class_name.clone(),
            round_number: round.round_number,
            round_name: None,
            held_on: None,
            created_at: now,
            updated_at: now,
        });
        if round.round_name.is_some() {
            entry.round_name = round.round_name;
        }
        if round.held_on.is_some() {
            entry.held_on = round.held_on;
        }
        entry.updated_at = now;
        entry.clone()
    }

    fn entry(&self, material_id: &str) -> Result<&MaterialEntry, EngineError> {
        self.materials.get(material_id).ok_or_else(|| EngineError::material_not_found(material_id))
    }

    fn entry_mut(&mut self, material_id: &str) -> Result<&mut MaterialEntry, EngineError> {
        self.materials
            .get_mut(material_id)
            .ok_or_else(|| EngineError::material_not_found(material_id))
    }
}

/// Process-local backend used for tests and single-operator setups.
///
/// Region sets are replaced whole under the write lock and copied out under
/// the read lock, so readers never observe a partially applied replacement.
pub(crate) struct MemoryStore {
    inner: RwLock<Inner>,
    max_regions: usize,
}

impl MemoryStore {
    pub(crate) fn new(max_regions: usize) -> Self {
        Self { inner: RwLock::new(Inner::default()), max_regions }
    }
}

#[async_trait]
impl RegionStore for MemoryStore {
    async fn replace_regions(
        &self,
        material_id: &str,
        regions: Vec<Region>,
    ) -> Result<RegionSet, EngineError> {
        let mut inner = self.inner.write().await;
        let entry = inner.entry_mut(material_id)?;

        let regions =
            validate_replacement(regions, page_count_bound(entry.material.page_count), self.max_regions)?;
        entry.regions = regions;
        entry.material.regions_revision += 1;

        Ok(entry.snapshot())
    }

    async fn regions(&self, material_id: &str) -> Result<RegionSet, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner.entry(material_id)?.snapshot())
    }

    async fn remove_region(
        &self,
        material_id: &str,
        question_number: u32,
    ) -> Result<RegionSet, EngineError> {
        let mut inner = self.inner.write().await;
        let entry = inner.entry_mut(material_id)?;

        let before = entry.regions.len();
        entry.regions.retain(|region| region.question_number != question_number);
        if entry.regions.len() != before {
            entry.material.regions_revision += 1;
        }

        Ok(entry.snapshot())
    }
}

#[async_trait]
impl MaterialCatalog for MemoryStore {
    async fn register_material(&self, material: NewMaterial) -> Result<Material, EngineError> {
        let now = primitive_now_utc();
        let mut inner = self.inner.write().await;

        inner.upsert_round(NewRound::bare(&material.class_name, material.round_number));

        let mut superseded = Vec::new();
        for entry in inner.materials.values_mut() {
            let current = &mut entry.material;
            if current.is_active
                && current.class_name == material.class_name
                && current.round_number == material.round_number
            {
                current.is_active = false;
                current.superseded_at = Some(now);
                superseded.push(current.id.clone());
            }
        }

        let created = Material {
            id: Uuid::new_v4().to_string(),
            class_name: material.class_name,
            round_number: material.round_number,
            title: material.title,
            page_count: material.page_count,
            file_ref: material.file_ref,
            is_active: true,
            regions_revision: 0,
            uploaded_at: now,
            superseded_at: None,
        };
        inner.materials.insert(
            created.id.clone(),
            MaterialEntry { material: created.clone(), regions: Vec::new() },
        );

        if !superseded.is_empty() {
            tracing::info!(
                material_id = %created.id,
                superseded = ?superseded,
                class_name = %created.class_name,
                round_number = created.round_number,
                "Material superseded previous upload"
            );
        }

        Ok(created)
    }

    async fn material(&self, material_id: &str) -> Result<Material, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner.entry(material_id)?.material.clone())
    }

    async fn delete_material(&self, material_id: &str) -> Result<(), EngineError> {
        let mut inner = self.inner.write().await;
        inner
            .materials
            .remove(material_id)
            .map(|_| ())
            .ok_or_else(|| EngineError::material_not_found(material_id))
    }

    async fn active_material(
        &self,
        class_name: &str,
        round_number: i32,
    ) -> Result<Option<Material>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner
            .materials
            .values()
            .map(|entry| &entry.material)
            .find(|material| {
                material.is_active
                    && material.class_name == class_name
                    && material.round_number == round_number
            })
            .cloned())
    }

    async fn upsert_round(&self, round: NewRound) -> Result<Round, EngineError> {
        let mut inner = self.inner.write().await;
        Ok(inner.upsert_round(round))
    }

    async fn round(
        &self,
        class_name: &str,
        round_number: i32,
    ) -> Result<Option<Round>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner.rounds.get(&(class_name.to_string(), round_number)).cloned())
    }

    async fn rounds_for_class(&self, class_name: &str) -> Result<Vec<RoundSummary>, EngineError> {
        let inner = self.inner.read().await;
        let summaries = inner
            .rounds
            .values()
            .filter(|round| round.class_name == class_name)
            .map(|round| {
                let active_material_id = inner
                    .materials
                    .values()
                    .map(|entry| &entry.material)
                    .find(|material| {
                        material.is_active
                            && material.class_name == round.class_name
                            && material.round_number == round.round_number
                    })
                    .map(|material| material.id.clone());
                let score_count = inner
                    .scores
                    .keys()
                    .filter(|(class, number, _)| {
                        class == &round.class_name && *number == round.round_number
                    })
                    .count();
                RoundSummary {
                    round_number: round.round_number,
                    round_name: round.round_name.clone(),
                    held_on: round.held_on,
                    active_material_id,
                    score_count: i64::try_from(score_count).unwrap_or(i64::MAX),
                }
            })
            .collect();
        Ok(summaries)
    }

    async fn class_names(&self) -> Result<Vec<String>, EngineError> {
        let inner = self.inner.read().await;
        let mut names: Vec<String> = inner.rounds.keys().map(|(class, _)| class.clone()).collect();
        names.dedup();
        Ok(names)
    }
}

#[async_trait]
impl ScoreBook for MemoryStore {
    async fn save_score(&self, record: ScoreRecord) -> Result<ScoreRecord, EngineError> {
        let mut inner = self.inner.write().await;
        inner.upsert_round(NewRound::bare(&record.class_name, record.round_number));

        let key = (record.class_name.clone(), record.round_number, record.student_id.clone());
        let created_at =
            inner.scores.get(&key).map(|existing| existing.created_at).unwrap_or(record.created_at);
        let saved = ScoreRecord { created_at, ..record };
        inner.scores.insert(key, saved.clone());
        Ok(saved)
    }

    async fn scores_for_round(
        &self,
        class_name: &str,
        round_number: i32,
    ) -> Result<Vec<ScoreRecord>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner
            .scores
            .values()
            .filter(|record| record.class_name == class_name && record.round_number == round_number)
            .cloned()
            .collect())
    }

    async fn score(
        &self,
        class_name: &str,
        round_number: i32,
        student_id: &str,
    ) -> Result<Option<ScoreRecord>, EngineError> {
        let inner = self.inner.read().await;
        let key = (class_name.to_string(), round_number, student_id.to_string());
        Ok(inner.scores.get(&key).cloned())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    async fn ping(&self) -> Result<(), EngineError> {
        Ok(())
    }
}
