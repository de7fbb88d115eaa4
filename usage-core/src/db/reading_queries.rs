use sqlx::PgPool;
use thiserror::Error;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::domain::{NewReading, Reading, ReadingPatch, UtilityType};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("reading {0} not found for this owner")]
    NotFound(Uuid),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Raw row shape. `utility_type` stays a string here so rows migrated from
/// older schemas decode without failing the whole query.
#[derive(Debug, sqlx::FromRow)]
struct ReadingRow {
    id: Uuid,
    owner_id: Uuid,
    date: Date,
    utility_type: String,
    usage: f64,
    notes: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ReadingRow> for Reading {
    fn from(row: ReadingRow) -> Self {
        Reading {
            id: row.id,
            owner_id: row.owner_id,
            date: row.date,
            utility_type: UtilityType::from_stored(&row.utility_type),
            usage: row.usage,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fetch every reading for one owner, most recent date first. Owner scoping
/// is enforced here; callers never filter by owner themselves.
pub async fn list_readings(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Reading>, StoreError> {
    let rows = sqlx::query_as::<_, ReadingRow>(
        r#"
        SELECT
            id,
            owner_id,
            date,
            utility_type,
            usage,
            notes,
            created_at,
            updated_at
        FROM readings
        WHERE owner_id = $1
        ORDER BY date DESC, created_at DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Reading::from).collect())
}

/// Insert a validated reading and return the stored row.
pub async fn insert_reading(
    pool: &PgPool,
    owner_id: Uuid,
    new: &NewReading,
) -> Result<Reading, StoreError> {
    let row = sqlx::query_as::<_, ReadingRow>(
        r#"
        INSERT INTO readings (id, owner_id, date, utility_type, usage, notes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, now(), now())
        RETURNING id, owner_id, date, utility_type, usage, notes, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(new.date)
    .bind(new.utility_type.as_str())
    .bind(new.usage)
    .bind(&new.notes)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// Apply a partial update to one of the owner's readings. Fields absent from
/// the patch keep their stored value.
pub async fn update_reading(
    pool: &PgPool,
    id: Uuid,
    owner_id: Uuid,
    patch: &ReadingPatch,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        r#"
        UPDATE readings
        SET
            date = COALESCE($3, date),
            utility_type = COALESCE($4, utility_type),
            usage = COALESCE($5, usage),
            notes = COALESCE($6, notes),
            updated_at = now()
        WHERE id = $1
          AND owner_id = $2
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .bind(patch.date)
    .bind(patch.utility_type.map(|t| t.as_str()))
    .bind(patch.usage)
    .bind(&patch.notes)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(id));
    }
    Ok(())
}

/// Remove one of the owner's readings.
pub async fn delete_reading(pool: &PgPool, id: Uuid, owner_id: Uuid) -> Result<(), StoreError> {
    let result = sqlx::query(
        r#"
        DELETE FROM readings
        WHERE id = $1
          AND owner_id = $2
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(id));
    }
    Ok(())
}
