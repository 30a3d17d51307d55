use crate::core::time::primitive_now_utc;
use crate::db::models::{Material, Round, ScoreRecord};
use crate::db::types::AssignmentGrade;
use crate::services::aggregate::{summarize, EntrySession, ScoreSummary};
use crate::services::compiler::{compile, extract_etag, ExtractDescriptor};
use crate::services::regions::{Region, RegionSet};
use crate::services::score_policy::ScoreConsistency;
use crate::services::store::{EngineError, Store};
use crate::services::wrong_list::WrongQuestionSet;

/// Extracts for one student against one material, with the cache key that
/// identifies this exact result.
#[derive(Debug, Clone)]
pub(crate) struct CompiledNote {
    pub(crate) material: Material,
    pub(crate) revision: i64,
    pub(crate) wrong: WrongQuestionSet,
    pub(crate) extracts: Vec<ExtractDescriptor>,
    pub(crate) etag: String,
}

#[derive(Debug, Clone)]
pub(crate) struct RoundReport {
    pub(crate) round: Round,
    pub(crate) summary: ScoreSummary,
}

#[derive(Debug, Clone)]
pub(crate) struct ScoreInput {
    pub(crate) class_name: String,
    pub(crate) round_number: i32,
    pub(crate) student_id: String,
    pub(crate) student_name: Option<String>,
    pub(crate) test_score: Option<i32>,
    pub(crate) total_questions: Option<i32>,
    pub(crate) wrong_questions: String,
    pub(crate) assignment1: AssignmentGrade,
    pub(crate) assignment2: AssignmentGrade,
    pub(crate) memo: Option<String>,
}

/// A stored total of zero means the grader never entered one.
pub(crate) fn known_total(total_questions: Option<i32>) -> Option<u32> {
    total_questions.and_then(|total| u32::try_from(total).ok()).filter(|total| *total > 0)
}

pub(crate) async fn resolve_material(
    store: &dyn Store,
    class_name: &str,
    round_number: i32,
) -> Result<Material, EngineError> {
    store.active_material(class_name, round_number).await?.ok_or_else(|| {
        EngineError::NotFound(format!(
            "No material uploaded for round {round_number} of class '{class_name}'"
        ))
    })
}

pub(crate) async fn save_regions(
    store: &dyn Store,
    material_id: &str,
    regions: Vec<Region>,
) -> Result<RegionSet, EngineError> {
    let submitted = regions.len();
    match store.replace_regions(material_id, regions).await {
        Ok(saved) => {
            metrics::counter!("region_saves_total", "outcome" => "saved").increment(1);
            tracing::info!(
                material_id,
                revision = saved.revision,
                regions = saved.regions.len(),
                "Regions replaced"
            );
            Ok(saved)
        }
        Err(err) => {
            if matches!(err, EngineError::InvalidRegions(_)) {
                metrics::counter!("region_saves_total", "outcome" => "rejected").increment(1);
                tracing::info!(material_id, submitted, error = %err, "Region save rejected");
            }
            Err(err)
        }
    }
}

pub(crate) async fn compile_for_material(
    store: &dyn Store,
    material: Material,
    wrong: WrongQuestionSet,
) -> Result<CompiledNote, EngineError> {
    let set = store.regions(&material.id).await?;
    let extracts = compile(&material.id, &set.regions, &wrong);
    let etag = extract_etag(&material.id, set.revision, &wrong);

    metrics::counter!("extract_compiles_total").increment(1);
    tracing::debug!(
        material_id = %material.id,
        revision = set.revision,
        wrong = wrong.len(),
        extracts = extracts.len(),
        "Compiled extracts"
    );

    Ok(CompiledNote { material, revision: set.revision, wrong, extracts, etag })
}

/// Resolves the round's material, parses the wrong list and compiles.
pub(crate) async fn compile_extracts(
    store: &dyn Store,
    class_name: &str,
    round_number: i32,
    wrong_text: &str,
    total_questions: Option<u32>,
) -> Result<CompiledNote, EngineError> {
    let material = resolve_material(store, class_name, round_number).await?;
    let wrong = WrongQuestionSet::parse_free_text(wrong_text, total_questions);
    compile_for_material(store, material, wrong).await
}

/// Same as [`compile_extracts`] with the wrong list and total taken from the
/// student's stored score record.
pub(crate) async fn compile_extracts_for_student(
    store: &dyn Store,
    class_name: &str,
    round_number: i32,
    student_id: &str,
) -> Result<CompiledNote, EngineError> {
    let record = store.score(class_name, round_number, student_id).await?.ok_or_else(|| {
        EngineError::NotFound(format!(
            "No score record for student '{student_id}' in round {round_number} of class '{class_name}'"
        ))
    })?;

    compile_extracts(
        store,
        class_name,
        round_number,
        &record.wrong_questions,
        known_total(record.total_questions),
    )
    .await
}

pub(crate) async fn summarize_round(
    store: &dyn Store,
    class_name: &str,
    round_number: i32,
    session: &EntrySession,
) -> Result<RoundReport, EngineError> {
    let round = store
        .round(class_name, round_number)
        .await?
        .ok_or_else(|| EngineError::round_not_found(class_name, round_number))?;
    let records = store.scores_for_round(class_name, round_number).await?;

    Ok(RoundReport { round, summary: summarize(&records, session) })
}

/// Canonicalizes the wrong list, applies the consistency mode and upserts.
pub(crate) async fn save_score(
    store: &dyn Store,
    mode: ScoreConsistency,
    input: ScoreInput,
) -> Result<ScoreRecord, EngineError> {
    let total = known_total(input.total_questions);
    let wrong = WrongQuestionSet::parse_free_text(&input.wrong_questions, total);
    let checked_total = total.and(input.total_questions);

    let test_score = match mode.apply(input.test_score, checked_total, &wrong) {
        Ok(score) => score,
        Err(err) => {
            metrics::counter!("score_saves_total", "outcome" => "rejected").increment(1);
            tracing::warn!(
                class_name = %input.class_name,
                round_number = input.round_number,
                student_id = %input.student_id,
                error = %err,
                "Score rejected by consistency check"
            );
            return Err(err.into());
        }
    };

    let now = primitive_now_utc();
    let record = ScoreRecord {
        class_name: input.class_name,
        round_number: input.round_number,
        student_id: input.student_id,
        student_name: input.student_name,
        test_score,
        total_questions: checked_total,
        wrong_questions: wrong.to_free_text(),
        assignment1: input.assignment1,
        assignment2: input.assignment2,
        memo: input.memo,
        created_at: now,
        updated_at: now,
    };

    let saved = store.save_score(record).await?;
    metrics::counter!("score_saves_total", "outcome" => "saved").increment(1);
    tracing::info!(
        class_name = %saved.class_name,
        round_number = saved.round_number,
        student_id = %saved.student_id,
        mode = mode.as_str(),
        "Score saved"
    );
    Ok(saved)
}
