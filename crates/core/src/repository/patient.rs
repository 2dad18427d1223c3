//! Patient repository: create, fetch, list, search, replace, patch, delete.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;

use crate::error::{RecordError, RecordResult};
use crate::model::{Patient, PatientDraft, PatientPage, PatientPatch};

use super::is_unique_violation;

/// Upper bound on the page size a caller can request; larger values are
/// clamped, not rejected.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Data access for patient records.
#[derive(Clone)]
pub struct PatientRepository {
    pool: SqlitePool,
}

impl PatientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new patient. Fails with [`RecordError::Conflict`] when the id
    /// is already taken, whether detected by the pre-check or by the store's
    /// primary-key constraint under a concurrent create.
    pub async fn create(&self, draft: &PatientDraft) -> RecordResult<Patient> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM patients WHERE id = ?")
            .bind(&draft.id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_some() {
            return Err(RecordError::Conflict(draft.id.clone()));
        }

        let now = Utc::now();
        let insert = sqlx::query(
            "INSERT INTO patients
                (id, family_name, given_name, gender, birth_date, medical_summary, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&draft.id)
        .bind(&draft.family_name)
        .bind(&draft.given_name)
        .bind(draft.gender)
        .bind(draft.birth_date)
        .bind(&draft.medical_summary)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await;

        match insert {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RecordError::Conflict(draft.id.clone()));
            }
            Err(err) => return Err(err.into()),
        }

        tx.commit().await?;

        Ok(Patient {
            id: draft.id.clone(),
            family_name: draft.family_name.clone(),
            given_name: draft.given_name.clone(),
            gender: draft.gender,
            birth_date: draft.birth_date,
            medical_summary: draft.medical_summary.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Fetch one patient by id.
    pub async fn fetch(&self, id: &str) -> RecordResult<Patient> {
        sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RecordError::NotFound(id.to_owned()))
    }

    /// One page of patients, most recently created first. Page numbers
    /// start at 1; out-of-range pages yield an empty `data` with the true
    /// `total`, and the size is clamped to [`MAX_PAGE_SIZE`].
    pub async fn list(&self, page: u32, size: u32) -> RecordResult<PatientPage> {
        let page = page.max(1);
        let size = size.clamp(1, MAX_PAGE_SIZE);
        let offset = i64::from(page - 1) * i64::from(size);

        let mut tx = self.pool.begin().await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patients")
            .fetch_one(&mut *tx)
            .await?;
        let data = sqlx::query_as::<_, Patient>(
            "SELECT * FROM patients
             ORDER BY created_at DESC, id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(i64::from(size))
        .bind(offset)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PatientPage {
            total,
            page,
            size,
            data,
        })
    }

    /// Case-insensitive substring search over family and given names. An
    /// empty query matches every patient.
    pub async fn search(&self, name: &str) -> RecordResult<Vec<Patient>> {
        let pattern = format!("%{}%", name.to_lowercase());
        let rows = sqlx::query_as::<_, Patient>(
            "SELECT * FROM patients
             WHERE LOWER(family_name) LIKE ? OR LOWER(given_name) LIKE ?
             ORDER BY family_name, given_name, id",
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Replace every mutable field of an existing patient. `created_at` is
    /// preserved; `updated_at` moves to now.
    pub async fn replace(&self, id: &str, draft: &PatientDraft) -> RecordResult<Patient> {
        let mut tx = self.pool.begin().await?;

        let now = Utc::now();
        let updated = sqlx::query(
            "UPDATE patients
             SET family_name = ?, given_name = ?, gender = ?, birth_date = ?,
                 medical_summary = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&draft.family_name)
        .bind(&draft.given_name)
        .bind(draft.gender)
        .bind(draft.birth_date)
        .bind(&draft.medical_summary)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RecordError::NotFound(id.to_owned()));
        }

        let patient = sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(patient)
    }

    /// Apply a partial update. The statement is assembled from a fixed column
    /// list in a fixed order, only ever naming the fields the patch sets.
    pub async fn patch(&self, id: &str, patch: &PatientPatch) -> RecordResult<Patient> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM patients WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(RecordError::NotFound(id.to_owned()));
        }
        if patch.is_empty() {
            return Err(RecordError::EmptyUpdate);
        }

        let mut assignments = Vec::new();
        if patch.family_name.is_some() {
            assignments.push("family_name = ?");
        }
        if patch.given_name.is_some() {
            assignments.push("given_name = ?");
        }
        if patch.gender.is_some() {
            assignments.push("gender = ?");
        }
        if patch.birth_date.is_some() {
            assignments.push("birth_date = ?");
        }
        if patch.medical_summary.is_some() {
            assignments.push("medical_summary = ?");
        }
        assignments.push("updated_at = ?");

        let sql = format!(
            "UPDATE patients SET {} WHERE id = ?",
            assignments.join(", ")
        );
        let mut query = sqlx::query(&sql);
        if let Some(family_name) = &patch.family_name {
            query = query.bind(family_name);
        }
        if let Some(given_name) = &patch.given_name {
            query = query.bind(given_name);
        }
        if let Some(gender) = patch.gender {
            query = query.bind(gender);
        }
        if let Some(birth_date) = patch.birth_date {
            query = query.bind(birth_date);
        }
        if let Some(medical_summary) = &patch.medical_summary {
            query = query.bind(medical_summary);
        }
        query.bind(Utc::now()).bind(id).execute(&mut *tx).await?;

        let patient = sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(patient)
    }

    /// Delete a patient and, via the cascade, all their observations.
    /// Returns how many observations went with them.
    pub async fn delete(&self, id: &str) -> RecordResult<u64> {
        let mut tx = self.pool.begin().await?;

        let observations: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM observations WHERE patient_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        let deleted = sqlx::query("DELETE FROM patients WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(RecordError::NotFound(id.to_owned()));
        }

        tx.commit().await?;
        Ok(observations as u64)
    }
}
