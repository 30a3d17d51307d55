use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::config::StorageBackend;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Material, RegionRow, Round, RoundSummary, ScoreRecord};
use crate::repositories;
use crate::services::regions::{validate_replacement, Rect, Region, RegionSet};
use crate::services::store::{
    page_count_bound, EngineError, MaterialCatalog, NewMaterial, NewRound, RegionStore, ScoreBook,
    Store,
};

/// Relational backend. Multi-statement writes run in one transaction.
#[derive(Clone)]
pub(crate) struct PgStore {
    pool: PgPool,
    max_regions: usize,
}

impl PgStore {
    pub(crate) fn new(pool: PgPool, max_regions: usize) -> Self {
        Self { pool, max_regions }
    }
}

fn region_from_row(row: RegionRow) -> Option<Region> {
    Some(Region {
        question_number: u32::try_from(row.question_number).ok()?,
        page_number: u32::try_from(row.page_number).ok()?,
        rect: Rect { x: row.x, y: row.y, width: row.width, height: row.height },
    })
}

#[async_trait]
impl RegionStore for PgStore {
    async fn replace_regions(
        &self,
        material_id: &str,
        regions: Vec<Region>,
    ) -> Result<RegionSet, EngineError> {
        let mut tx = self.pool.begin().await?;

        let page_count = repositories::materials::lock_page_count(&mut *tx, material_id)
            .await?
            .ok_or_else(|| EngineError::material_not_found(material_id))?;
        let regions = validate_replacement(regions, page_count_bound(page_count), self.max_regions)?;

        repositories::regions::delete_for_material(&mut *tx, material_id).await?;
        repositories::regions::insert_many(&mut *tx, material_id, &regions).await?;
        let revision = repositories::materials::bump_regions_revision(&mut *tx, material_id).await?;

        tx.commit().await?;

        Ok(RegionSet { revision, regions })
    }

    async fn regions(&self, material_id: &str) -> Result<RegionSet, EngineError> {
        let rows = repositories::regions::snapshot_for_material(&self.pool, material_id).await?;
        let Some(revision) = rows.first().map(|row| row.regions_revision) else {
            return Err(EngineError::material_not_found(material_id));
        };

        let regions = rows
            .into_iter()
            .filter_map(|row| row.into_region_row())
            .filter_map(region_from_row)
            .collect();

        Ok(RegionSet { revision, regions })
    }

    async fn remove_region(
        &self,
        material_id: &str,
        question_number: u32,
    ) -> Result<RegionSet, EngineError> {
        let mut tx = self.pool.begin().await?;

        repositories::materials::lock_page_count(&mut *tx, material_id)
            .await?
            .ok_or_else(|| EngineError::material_not_found(material_id))?;

        // Numbers past the int4 range can never have been stored.
        let deleted = match i32::try_from(question_number) {
            Ok(question_number) => {
                repositories::regions::delete_one(&mut *tx, material_id, question_number).await?
            }
            Err(_) => false,
        };
        if deleted {
            repositories::materials::bump_regions_revision(&mut *tx, material_id).await?;
        }

        tx.commit().await?;

        self.regions(material_id).await
    }
}

#[async_trait]
impl MaterialCatalog for PgStore {
    async fn register_material(&self, material: NewMaterial) -> Result<Material, EngineError> {
        let now = primitive_now_utc();
        let mut tx = self.pool.begin().await?;

        repositories::rounds::upsert(
            &mut *tx,
            repositories::rounds::UpsertRound {
                id: &Uuid::new_v4().to_string(),
                class_name: &material.class_name,
                round_number: material.round_number,
                round_name: None,
                held_on: None,
                now,
            },
        )
        .await?;

        let superseded = repositories::materials::supersede_active_for_round(
            &mut *tx,
            &material.class_name,
            material.round_number,
            now,
        )
        .await?;

        let created = repositories::materials::insert_active(
            &mut *tx,
            repositories::materials::CreateMaterial {
                id: &Uuid::new_v4().to_string(),
                class_name: &material.class_name,
                round_number: material.round_number,
                title: material.title.as_deref(),
                page_count: material.page_count,
                file_ref: &material.file_ref,
                uploaded_at: now,
            },
        )
        .await?;

        tx.commit().await?;

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
        repositories::materials::find_by_id(&self.pool, material_id)
            .await?
            .ok_or_else(|| EngineError::material_not_found(material_id))
    }

    async fn delete_material(&self, material_id: &str) -> Result<(), EngineError> {
        if repositories::materials::delete(&self.pool, material_id).await? {
            Ok(())
        } else {
            Err(EngineError::material_not_found(material_id))
        }
    }

    async fn active_material(
        &self,
        class_name: &str,
        round_number: i32,
    ) -> Result<Option<Material>, EngineError> {
        Ok(repositories::materials::find_active_for_round(&self.pool, class_name, round_number)
            .await?)
    }

    async fn upsert_round(&self, round: NewRound) -> Result<Round, EngineError> {
        let round = repositories::rounds::upsert(
            &self.pool,
            repositories::rounds::UpsertRound {
                id: &Uuid::new_v4().to_string(),
                class_name: &round.class_name,
                round_number: round.round_number,
                round_name: round.round_name.as_deref(),
                held_on: round.held_on,
                now: primitive_now_utc(),
            },
        )
        .await?;
        Ok(round)
    }

    async fn round(
        &self,
        class_name: &str,
        round_number: i32,
    ) -> Result<Option<Round>, EngineError> {
        Ok(repositories::rounds::find(&self.pool, class_name, round_number).await?)
    }

    async fn rounds_for_class(&self, class_name: &str) -> Result<Vec<RoundSummary>, EngineError> {
        Ok(repositories::rounds::list_summaries(&self.pool, class_name).await?)
    }

    async fn class_names(&self) -> Result<Vec<String>, EngineError> {
        Ok(repositories::rounds::list_class_names(&self.pool).await?)
    }
}

#[async_trait]
impl ScoreBook for PgStore {
    async fn save_score(&self, record: ScoreRecord) -> Result<ScoreRecord, EngineError> {
        let mut tx = self.pool.begin().await?;

        repositories::rounds::upsert(
            &mut *tx,
            repositories::rounds::UpsertRound {
                id: &Uuid::new_v4().to_string(),
                class_name: &record.class_name,
                round_number: record.round_number,
                round_name: None,
                held_on: None,
                now: record.updated_at,
            },
        )
        .await?;
        let saved = repositories::scores::upsert(&mut *tx, &record).await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn scores_for_round(
        &self,
        class_name: &str,
        round_number: i32,
    ) -> Result<Vec<ScoreRecord>, EngineError> {
        Ok(repositories::scores::list_for_round(&self.pool, class_name, round_number).await?)
    }

    async fn score(
        &self,
        class_name: &str,
        round_number: i32,
        student_id: &str,
    ) -> Result<Option<ScoreRecord>, EngineError> {
        Ok(repositories::scores::find(&self.pool, class_name, round_number, student_id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Postgres
    }

    async fn ping(&self) -> Result<(), EngineError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::types::AssignmentGrade;
    use crate::services::regions::RegionValidationError;
    use crate::test_support::pg_test_pool;

    fn new_material(class_name: &str, round_number: i32, page_count: i32) -> NewMaterial {
        NewMaterial {
            class_name: class_name.to_string(),
            round_number,
            title: Some("Weekly test".to_string()),
            page_count,
            file_ref: format!("{class_name}-{round_number}"),
        }
    }

    fn region(question_number: u32, page_number: u32) -> Region {
        Region {
            question_number,
            page_number,
            rect: Rect { x: 0.0, y: 0.0, width: 100.0, height: f64::from(question_number) },
        }
    }

    fn score(class_name: &str, round_number: i32, student_id: &str, test_score: i32) -> ScoreRecord {
        let now = primitive_now_utc();
        ScoreRecord {
            class_name: class_name.to_string(),
            round_number,
            student_id: student_id.to_string(),
            student_name: None,
            test_score: Some(test_score),
            total_questions: Some(20),
            wrong_questions: "3, 7".to_string(),
            assignment1: AssignmentGrade::B,
            assignment2: AssignmentGrade::FMissing,
            memo: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn replace_then_read_returns_sorted_set_and_bumps_revision() {
        let Some((pool, _guard)) = pg_test_pool().await else { return };
        let store = PgStore::new(pool, 100);
        let material = store.register_material(new_material("A1", 1, 3)).await.unwrap();

        let empty = store.regions(&material.id).await.unwrap();
        assert_eq!(empty, RegionSet::default());

        let saved = store
            .replace_regions(&material.id, vec![region(9, 2), region(2, 1), region(5, 3)])
            .await
            .unwrap();
        assert_eq!(saved.revision, 1);

        let read = store.regions(&material.id).await.unwrap();
        assert_eq!(read, saved);
        let numbers: Vec<u32> = read.regions.iter().map(|r| r.question_number).collect();
        assert_eq!(numbers, vec![2, 5, 9]);

        let cleared = store.replace_regions(&material.id, Vec::new()).await.unwrap();
        assert_eq!(cleared.revision, 2);
        assert!(store.regions(&material.id).await.unwrap().regions.is_empty());
    }

    #[tokio::test]
    async fn rejected_replacement_leaves_previous_set() {
        let Some((pool, _guard)) = pg_test_pool().await else { return };
        let store = PgStore::new(pool, 100);
        let material = store.register_material(new_material("A1", 1, 2)).await.unwrap();
        let before = store.replace_regions(&material.id, vec![region(1, 1)]).await.unwrap();

        let duplicate = store.replace_regions(&material.id, vec![region(3, 1), region(3, 2)]).await;
        assert!(matches!(
            duplicate,
            Err(EngineError::InvalidRegions(RegionValidationError::DuplicateQuestion {
                question_number: 3
            }))
        ));

        let oversized = store.replace_regions(&material.id, vec![region(3_000_000_000, 1)]).await;
        assert!(matches!(
            oversized,
            Err(EngineError::InvalidRegions(RegionValidationError::QuestionTooLarge { .. }))
        ));

        assert_eq!(store.regions(&material.id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn unknown_material_is_not_found() {
        let Some((pool, _guard)) = pg_test_pool().await else { return };
        let store = PgStore::new(pool, 100);

        assert!(matches!(store.regions("missing").await, Err(EngineError::NotFound(_))));
        assert!(matches!(
            store.replace_regions("missing", vec![region(1, 1)]).await,
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(store.remove_region("missing", 1).await, Err(EngineError::NotFound(_))));
        assert!(matches!(store.delete_material("missing").await, Err(EngineError::NotFound(_))));
    }

    #[tokio::test]
    async fn remove_region_only_bumps_revision_when_something_changed() {
        let Some((pool, _guard)) = pg_test_pool().await else { return };
        let store = PgStore::new(pool, 100);
        let material = store.register_material(new_material("A1", 1, 2)).await.unwrap();
        store.replace_regions(&material.id, vec![region(1, 1), region(2, 2)]).await.unwrap();

        let unchanged = store.remove_region(&material.id, 7).await.unwrap();
        assert_eq!(unchanged.revision, 1);
        let out_of_range = store.remove_region(&material.id, 3_000_000_000).await.unwrap();
        assert_eq!(out_of_range.revision, 1);
        assert_eq!(out_of_range.regions.len(), 2);

        let removed = store.remove_region(&material.id, 1).await.unwrap();
        assert_eq!(removed.revision, 2);
        assert_eq!(removed.regions, vec![region(2, 2)]);
    }

    #[tokio::test]
    async fn new_upload_supersedes_active_material() {
        let Some((pool, _guard)) = pg_test_pool().await else { return };
        let store = PgStore::new(pool, 100);
        let first = store.register_material(new_material("A1", 3, 2)).await.unwrap();
        store.replace_regions(&first.id, vec![region(1, 1)]).await.unwrap();
        let second = store.register_material(new_material("A1", 3, 4)).await.unwrap();

        let active = store.active_material("A1", 3).await.unwrap().expect("active material");
        assert_eq!(active.id, second.id);

        let old = store.material(&first.id).await.unwrap();
        assert!(!old.is_active);
        assert!(old.superseded_at.is_some());
        assert_eq!(store.regions(&first.id).await.unwrap().regions.len(), 1);

        store.delete_material(&second.id).await.unwrap();
        assert!(store.active_material("A1", 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn scores_upsert_and_feed_round_summaries() {
        let Some((pool, _guard)) = pg_test_pool().await else { return };
        let store = PgStore::new(pool, 100);
        let material = store.register_material(new_material("B2", 2, 1)).await.unwrap();
        store.save_score(score("B2", 1, "s2", 12)).await.unwrap();
        store.save_score(score("B2", 1, "s1", 10)).await.unwrap();

        let mut update = score("B2", 1, "s1", 17);
        update.memo = Some("retake".to_string());
        let saved = store.save_score(update).await.unwrap();
        assert_eq!(saved.test_score, Some(17));

        let scores = store.scores_for_round("B2", 1).await.unwrap();
        let students: Vec<&str> = scores.iter().map(|s| s.student_id.as_str()).collect();
        assert_eq!(students, vec!["s1", "s2"]);
        assert_eq!(scores[0].memo.as_deref(), Some("retake"));
        assert_eq!(scores[0].assignment2, AssignmentGrade::FMissing);

        let rounds = store.rounds_for_class("B2").await.unwrap();
        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[0].round_number, 1);
        assert_eq!(rounds[0].score_count, 2);
        assert_eq!(rounds[1].active_material_id.as_deref(), Some(material.id.as_str()));
        assert_eq!(store.class_names().await.unwrap(), vec!["B2".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_readers_see_whole_sets_only() {
        let Some((pool, _guard)) = pg_test_pool().await else { return };
        let store = Arc::new(PgStore::new(pool, 1000));
        let material = store.register_material(new_material("A1", 1, 1)).await.unwrap();
        let small: Vec<Region> = (1..=3).map(|n| region(n, 1)).collect();
        let large: Vec<Region> = (1..=300).map(|n| region(n, 1)).collect();
        store.replace_regions(&material.id, small.clone()).await.unwrap();

        let writer = {
            let store = Arc::clone(&store);
            let id = material.id.clone();
            let (small, large) = (small.clone(), large.clone());
            tokio::spawn(async move {
                for i in 0..40 {
                    let next = if i % 2 == 0 { large.clone() } else { small.clone() };
                    store.replace_regions(&id, next).await.unwrap();
                }
            })
        };

        let mut readers = Vec::new();
        for _ in 0..3 {
            let store = Arc::clone(&store);
            let id = material.id.clone();
            let (small, large) = (small.clone(), large.clone());
            readers.push(tokio::spawn(async move {
                for _ in 0..40 {
                    let set = store.regions(&id).await.unwrap();
                    assert!(set.regions == small || set.regions == large);
                }
            }));
        }

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }
}
