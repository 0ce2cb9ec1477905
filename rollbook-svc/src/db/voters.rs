//! Voter submission database operations

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use rollbook_common::{Error, Result};

use crate::models::{Gender, RecordStatus, VoterCandidate, VoterRecord};

/// Chunk insert failure, classified
///
/// A uniqueness violation means a row that passed the advisory
/// pre-check lost a race against a concurrent uploader. It is a
/// duplicate, not a storage fault, and must not be retried.
#[derive(Debug)]
pub enum ChunkInsertError {
    /// The (voter_id, phone_number) constraint rejected this row
    UniqueViolation { row: usize },
    /// Any other database failure
    Database(sqlx::Error),
}

impl std::fmt::Display for ChunkInsertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkInsertError::UniqueViolation { row } => {
                write!(f, "uniqueness constraint violated at row {}", row)
            }
            ChunkInsertError::Database(e) => write!(f, "chunk insert failed: {}", e),
        }
    }
}

fn map_row(row: &SqliteRow) -> Result<VoterRecord> {
    let id: String = row.get("id");
    let batch_id: Option<String> = row.get("batch_id");
    let gender: Option<String> = row.get("gender");
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    let submitted_at: Option<String> = row.get("submitted_at");
    let approved_at: Option<String> = row.get("approved_at");

    Ok(VoterRecord {
        id: super::parse_uuid(&id, "id")?,
        voter_id: row.get("voter_id"),
        phone_number: row.get("phone_number"),
        surname: row.get("surname"),
        name: row.get("name"),
        father_husband_name: row.get("father_husband_name"),
        gender: gender.as_deref().and_then(Gender::parse_str),
        age: row.get("age"),
        qualification: row.get("qualification"),
        caste: row.get("caste"),
        sub_caste: row.get("sub_caste"),
        pc: row.get("pc"),
        ac: row.get("ac"),
        mandal_ward_division: row.get("mandal_ward_division"),
        panchayat_name: row.get("panchayat_name"),
        village_name: row.get("village_name"),
        booth: row.get("booth"),
        batch_id: batch_id
            .map(|s| super::parse_uuid(&s, "batch_id"))
            .transpose()?,
        status: RecordStatus::parse_str(&status)
            .ok_or_else(|| Error::Internal(format!("Unknown record status: {}", status)))?,
        submitted_by: row.get("submitted_by"),
        approved_by: row.get("approved_by"),
        rejection_reason: row.get("rejection_reason"),
        created_at: super::parse_timestamp(&created_at, "created_at")?,
        updated_at: super::parse_timestamp(&updated_at, "updated_at")?,
        submitted_at: super::parse_timestamp_opt(submitted_at, "submitted_at")?,
        approved_at: super::parse_timestamp_opt(approved_at, "approved_at")?,
    })
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, voter_id, phone_number, surname, name, father_husband_name,
           gender, age, qualification, caste, sub_caste, pc, ac,
           mandal_ward_division, panchayat_name, village_name, booth,
           batch_id, status, submitted_by, approved_by, rejection_reason,
           created_at, updated_at, submitted_at, approved_at
    FROM voter_submissions
"#;

/// Advisory identity lookup on (voter_id, phone_number)
///
/// "Not found" is a first-class `None`, never an error code.
pub async fn find_by_identity(
    pool: &SqlitePool,
    voter_id: &str,
    phone_number: &str,
) -> Result<Option<Uuid>> {
    let id: Option<String> = sqlx::query_scalar(
        "SELECT id FROM voter_submissions WHERE voter_id = ? AND phone_number = ?",
    )
    .bind(voter_id)
    .bind(phone_number)
    .fetch_optional(pool)
    .await?;

    id.map(|s| super::parse_uuid(&s, "id")).transpose()
}

/// Load one submission
pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<VoterRecord>> {
    let query = format!("{} WHERE id = ?", SELECT_COLUMNS);
    let row = sqlx::query(&query)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(map_row).transpose()
}

/// List submissions, newest first, optionally filtered
pub async fn list(
    pool: &SqlitePool,
    status: Option<RecordStatus>,
    submitted_by: Option<&str>,
) -> Result<Vec<VoterRecord>> {
    let mut query = String::from(SELECT_COLUMNS);
    let mut clauses: Vec<&str> = Vec::new();
    if status.is_some() {
        clauses.push("status = ?");
    }
    if submitted_by.is_some() {
        clauses.push("submitted_by = ?");
    }
    if !clauses.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&clauses.join(" AND "));
    }
    query.push_str(" ORDER BY created_at DESC");

    let mut q = sqlx::query(&query);
    if let Some(status) = status {
        q = q.bind(status.as_str());
    }
    if let Some(submitter) = submitted_by {
        q = q.bind(submitter);
    }

    let rows = q.fetch_all(pool).await?;
    rows.iter().map(map_row).collect()
}

fn bind_candidate_insert<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    id: &'q str,
    candidate: &'q VoterCandidate,
    batch_id: Option<&'q str>,
    status: RecordStatus,
    submitted_by: &'q str,
    submitted_at: Option<&'q str>,
    now: &'q str,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(id)
        .bind(&candidate.voter_id)
        .bind(&candidate.phone_number)
        .bind(candidate.surname.as_deref())
        .bind(&candidate.name)
        .bind(candidate.father_husband_name.as_deref())
        .bind(candidate.gender.map(Gender::as_str))
        .bind(candidate.age)
        .bind(candidate.qualification.as_deref())
        .bind(candidate.caste.as_deref())
        .bind(candidate.sub_caste.as_deref())
        .bind(candidate.pc.as_deref())
        .bind(candidate.ac.as_deref())
        .bind(candidate.mandal_ward_division.as_deref())
        .bind(candidate.panchayat_name.as_deref())
        .bind(candidate.village_name.as_deref())
        .bind(candidate.booth.as_deref())
        .bind(batch_id)
        .bind(status.as_str())
        .bind(submitted_by)
        .bind(submitted_at)
        .bind(now)
        .bind(now)
}

const INSERT_SQL: &str = r#"
    INSERT INTO voter_submissions (
        id, voter_id, phone_number, surname, name, father_husband_name,
        gender, age, qualification, caste, sub_caste, pc, ac,
        mandal_ward_division, panchayat_name, village_name, booth,
        batch_id, status, submitted_by, submitted_at, created_at, updated_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// Insert a single submission (the add-voter path)
///
/// The caller is expected to run the advisory duplicate pre-check
/// first; the constraint still backstops races.
pub async fn insert_one(
    pool: &SqlitePool,
    candidate: &VoterCandidate,
    status: RecordStatus,
    submitted_by: &str,
    submitted_at: Option<DateTime<Utc>>,
) -> std::result::Result<Uuid, ChunkInsertError> {
    let id = Uuid::new_v4();
    let id_str = id.to_string();
    let now = Utc::now().to_rfc3339();
    let submitted_at = submitted_at.map(|dt| dt.to_rfc3339());

    let result = bind_candidate_insert(
        sqlx::query(INSERT_SQL),
        &id_str,
        candidate,
        None,
        status,
        submitted_by,
        submitted_at.as_deref(),
        &now,
    )
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(id),
        Err(e) => Err(classify_insert_error(e, candidate.row_number)),
    }
}

/// Insert one chunk of rows atomically
///
/// All-or-nothing for the chunk: any failure rolls the whole chunk
/// back. Previously committed chunks are unaffected.
pub async fn insert_chunk(
    pool: &SqlitePool,
    chunk: &[VoterCandidate],
    batch_id: Uuid,
    status: RecordStatus,
    submitted_by: &str,
    submitted_at: Option<DateTime<Utc>>,
) -> std::result::Result<(), ChunkInsertError> {
    let batch_id = batch_id.to_string();
    let now = Utc::now().to_rfc3339();
    let submitted_at = submitted_at.map(|dt| dt.to_rfc3339());

    let mut tx = pool.begin().await.map_err(ChunkInsertError::Database)?;

    for candidate in chunk {
        let id = Uuid::new_v4().to_string();
        let result = bind_candidate_insert(
            sqlx::query(INSERT_SQL),
            &id,
            candidate,
            Some(&batch_id),
            status,
            submitted_by,
            submitted_at.as_deref(),
            &now,
        )
        .execute(&mut *tx)
        .await;

        if let Err(e) = result {
            // Dropping the transaction rolls back the partial chunk
            return Err(classify_insert_error(e, candidate.row_number));
        }
    }

    tx.commit().await.map_err(ChunkInsertError::Database)?;
    Ok(())
}

fn classify_insert_error(error: sqlx::Error, row: usize) -> ChunkInsertError {
    if let sqlx::Error::Database(ref db_err) = error {
        if db_err.is_unique_violation() {
            return ChunkInsertError::UniqueViolation { row };
        }
    }
    ChunkInsertError::Database(error)
}

/// Guarded draft → pending transition
///
/// Returns the number of rows updated; 0 means the record was not in
/// draft (double submit, or already reviewed).
pub async fn submit_guarded<'e, E>(executor: E, id: Uuid, now: DateTime<Utc>) -> Result<u64>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE voter_submissions
        SET status = 'pending', submitted_at = ?, updated_at = ?
        WHERE id = ? AND status = 'draft'
        "#,
    )
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .bind(id.to_string())
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Guarded pending → approved/rejected transition
///
/// The status predicate makes re-application observe zero affected rows
/// instead of clobbering a terminal record.
pub async fn decide_guarded<'e, E>(
    executor: E,
    id: Uuid,
    new_status: RecordStatus,
    actor_id: &str,
    rejection_reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<u64>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    debug_assert!(new_status.is_terminal());

    let result = sqlx::query(
        r#"
        UPDATE voter_submissions
        SET status = ?, approved_by = ?, approved_at = ?,
            rejection_reason = ?, updated_at = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(new_status.as_str())
    .bind(actor_id)
    .bind(now.to_rfc3339())
    .bind(rejection_reason)
    .bind(now.to_rfc3339())
    .bind(id.to_string())
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Guarded pending → draft resubmission (owner pulls the record back)
pub async fn withdraw_guarded<'e, E>(executor: E, id: Uuid, now: DateTime<Utc>) -> Result<u64>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE voter_submissions
        SET status = 'draft', submitted_at = NULL, updated_at = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(now.to_rfc3339())
    .bind(id.to_string())
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
