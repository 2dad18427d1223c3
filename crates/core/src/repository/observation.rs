//! Observation repository. Observations are append-only: they are created,
//! listed per patient, and removed only by the owning patient's cascade.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::error::{RecordError, RecordResult};
use crate::model::{Observation, ObservationDraft};

use super::is_foreign_key_violation;

#[derive(Clone)]
pub struct ObservationRepository {
    pool: SqlitePool,
}

impl ObservationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new observation under an existing patient. The id is a fresh
    /// UUID. A missing patient is [`RecordError::NotFound`] whether caught by
    /// the pre-check or by the foreign key under a concurrent delete.
    pub async fn create(&self, draft: &ObservationDraft) -> RecordResult<Observation> {
        let mut tx = self.pool.begin().await?;

        let patient: Option<String> = sqlx::query_scalar("SELECT id FROM patients WHERE id = ?")
            .bind(&draft.patient_id)
            .fetch_optional(&mut *tx)
            .await?;
        if patient.is_none() {
            return Err(RecordError::NotFound(draft.patient_id.clone()));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let insert = sqlx::query(
            "INSERT INTO observations
                (id, patient_id, category, code, display, value, unit, date, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&draft.patient_id)
        .bind(&draft.category)
        .bind(&draft.code)
        .bind(&draft.display)
        .bind(draft.value)
        .bind(&draft.unit)
        .bind(draft.date)
        .bind(now)
        .execute(&mut *tx)
        .await;

        match insert {
            Ok(_) => {}
            Err(err) if is_foreign_key_violation(&err) => {
                return Err(RecordError::NotFound(draft.patient_id.clone()));
            }
            Err(err) => return Err(err.into()),
        }

        tx.commit().await?;

        Ok(Observation {
            id,
            patient_id: draft.patient_id.clone(),
            category: draft.category.clone(),
            code: draft.code.clone(),
            display: draft.display.clone(),
            value: draft.value,
            unit: draft.unit.clone(),
            date: draft.date,
            created_at: now,
        })
    }

    /// All observations for one patient, newest clinical date first. Fails
    /// with [`RecordError::NotFound`] when the patient does not exist, so an
    /// empty list always means "patient with no observations".
    pub async fn list_for_patient(&self, patient_id: &str) -> RecordResult<Vec<Observation>> {
        let mut tx = self.pool.begin().await?;

        let patient: Option<String> = sqlx::query_scalar("SELECT id FROM patients WHERE id = ?")
            .bind(patient_id)
            .fetch_optional(&mut *tx)
            .await?;
        if patient.is_none() {
            return Err(RecordError::NotFound(patient_id.to_owned()));
        }

        let rows = sqlx::query_as::<_, Observation>(
            "SELECT * FROM observations
             WHERE patient_id = ?
             ORDER BY date DESC, created_at DESC",
        )
        .bind(patient_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::test_pool;
    use crate::model::{Gender, PatientDraft};
    use crate::repository::patient::PatientRepository;

    async fn seeded_patient(pool: &SqlitePool) -> PatientRepository {
        let patients = PatientRepository::new(pool.clone());
        patients
            .create(&PatientDraft {
                id: "p1".into(),
                family_name: "Smith".into(),
                given_name: "Anna".into(),
                gender: Gender::Female,
                birth_date: NaiveDate::from_ymd_opt(1990, 4, 1).unwrap(),
                medical_summary: String::new(),
            })
            .await
            .unwrap();
        patients
    }

    fn obs(patient_id: &str, date: NaiveDate, value: f64) -> ObservationDraft {
        ObservationDraft {
            patient_id: patient_id.into(),
            category: "vital-signs".into(),
            code: "8310-5".into(),
            display: "Body temperature".into(),
            value,
            unit: "Cel".into(),
            date,
        }
    }

    #[tokio::test]
    async fn create_and_list_newest_date_first() {
        let pool = test_pool().await;
        seeded_patient(&pool).await;
        let repo = ObservationRepository::new(pool);

        let early = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let late = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        repo.create(&obs("p1", early, 36.6)).await.unwrap();
        repo.create(&obs("p1", late, 37.2)).await.unwrap();

        let listed = repo.list_for_patient("p1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].date, late);
        assert_eq!(listed[1].date, early);
        assert_ne!(listed[0].id, listed[1].id);
    }

    #[tokio::test]
    async fn missing_patient_is_not_found() {
        let pool = test_pool().await;
        let repo = ObservationRepository::new(pool);

        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = repo
            .create(&obs("ghost", date, 36.6))
            .await
            .expect_err("no such patient");
        assert!(matches!(err, RecordError::NotFound(id) if id == "ghost"));

        let err = repo
            .list_for_patient("ghost")
            .await
            .expect_err("no such patient");
        assert!(matches!(err, RecordError::NotFound(_)));
    }

    #[tokio::test]
    async fn cascade_delete_removes_observations_and_reports_count() {
        let pool = test_pool().await;
        let patients = seeded_patient(&pool).await;
        let repo = ObservationRepository::new(pool.clone());

        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        repo.create(&obs("p1", date, 36.6)).await.unwrap();
        repo.create(&obs("p1", date, 36.9)).await.unwrap();

        let removed = patients.delete("p1").await.unwrap();
        assert_eq!(removed, 2);

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM observations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
