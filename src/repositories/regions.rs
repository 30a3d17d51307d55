use sqlx::PgPool;

use crate::db::models::RegionRow;
use crate::services::regions::Region;

/// One row per region, or a single row with empty region columns when the
/// material has none. Reading revision and regions in one statement keeps
/// the pair consistent with concurrent replacements.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RegionSnapshotRow {
    pub(crate) regions_revision: i64,
    pub(crate) question_number: Option<i32>,
    pub(crate) page_number: Option<i32>,
    pub(crate) x: Option<f64>,
    pub(crate) y: Option<f64>,
    pub(crate) width: Option<f64>,
    pub(crate) height: Option<f64>,
}

impl RegionSnapshotRow {
    pub(crate) fn into_region_row(self) -> Option<RegionRow> {
        Some(RegionRow {
            question_number: self.question_number?,
            page_number: self.page_number?,
            x: self.x?,
            y: self.y?,
            width: self.width?,
            height: self.height?,
        })
    }
}

pub(crate) async fn snapshot_for_material(
    pool: &PgPool,
    material_id: &str,
) -> Result<Vec<RegionSnapshotRow>, sqlx::Error> {
    sqlx::query_as::<_, RegionSnapshotRow>(
        "SELECT m.regions_revision, r.question_number, r.page_number, r.x, r.y, r.width, r.height
         FROM materials m
         LEFT JOIN material_regions r ON r.material_id = m.id
         WHERE m.id = $1
         ORDER BY r.question_number",
    )
    .bind(material_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete_for_material(
    executor: impl sqlx::PgExecutor<'_>,
    material_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM material_regions WHERE material_id = $1")
        .bind(material_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn insert_many(
    executor: impl sqlx::PgExecutor<'_>,
    material_id: &str,
    regions: &[Region],
) -> Result<(), sqlx::Error> {
    if regions.is_empty() {
        return Ok(());
    }

    let question_numbers = regions
        .iter()
        .map(|region| to_int4(region.question_number))
        .collect::<Result<Vec<_>, _>>()?;
    let page_numbers = regions
        .iter()
        .map(|region| to_int4(region.page_number))
        .collect::<Result<Vec<_>, _>>()?;
    let xs: Vec<f64> = regions.iter().map(|region| region.rect.x).collect();
    let ys: Vec<f64> = regions.iter().map(|region| region.rect.y).collect();
    let widths: Vec<f64> = regions.iter().map(|region| region.rect.width).collect();
    let heights: Vec<f64> = regions.iter().map(|region| region.rect.height).collect();

    sqlx::query(
        "INSERT INTO material_regions (
            material_id, question_number, page_number, x, y, width, height
         )
         SELECT $1::varchar, *
         FROM UNNEST($2::int4[], $3::int4[], $4::float8[], $5::float8[], $6::float8[], $7::float8[])",
    )
    .bind(material_id)
    .bind(question_numbers)
    .bind(page_numbers)
    .bind(xs)
    .bind(ys)
    .bind(widths)
    .bind(heights)
    .execute(executor)
    .await?;
    Ok(())
}

fn to_int4(value: u32) -> Result<i32, sqlx::Error> {
    i32::try_from(value).map_err(|err| sqlx::Error::Encode(Box::new(err)))
}

pub(crate) async fn delete_one(
    executor: impl sqlx::PgExecutor<'_>,
    material_id: &str,
    question_number: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM material_regions
         WHERE material_id = $1 AND question_number = $2",
    )
    .bind(material_id)
    .bind(question_number)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
