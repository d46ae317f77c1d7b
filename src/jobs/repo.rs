use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{JobPosting, NewJob};

#[async_trait]
pub trait JobStore: Send + Sync {
    /// All postings, newest first.
    async fn list(&self) -> anyhow::Result<Vec<JobPosting>>;
    async fn get(&self, id: i64) -> anyhow::Result<Option<JobPosting>>;
    async fn create(&self, job: NewJob) -> anyhow::Result<JobPosting>;
    /// Returns false if nothing was deleted.
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

const JOB_COLUMNS: &str = r#"
    id, job_title, company, department, job_type, location, salary_range, job_summary,
    experience_level, application_deadline, equal_opportunity_statement, how_to_apply,
    responsibilities, required_qualifications, preferred_skills, created_at
"#;

pub struct PgJobStore {
    db: PgPool,
}

impl PgJobStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn list(&self) -> anyhow::Result<Vec<JobPosting>> {
        let rows = sqlx::query_as::<_, JobPosting>(&format!(
            "SELECT {JOB_COLUMNS} FROM job_postings ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list job postings")?;
        Ok(rows)
    }

    async fn get(&self, id: i64) -> anyhow::Result<Option<JobPosting>> {
        let row = sqlx::query_as::<_, JobPosting>(&format!(
            "SELECT {JOB_COLUMNS} FROM job_postings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get job posting")?;
        Ok(row)
    }

    async fn create(&self, job: NewJob) -> anyhow::Result<JobPosting> {
        let row = sqlx::query_as::<_, JobPosting>(&format!(
            r#"
            INSERT INTO job_postings (
                job_title, company, department, job_type, location, salary_range, job_summary,
                experience_level, application_deadline, equal_opportunity_statement, how_to_apply,
                responsibilities, required_qualifications, preferred_skills
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(&job.job_title)
        .bind(&job.company)
        .bind(&job.department)
        .bind(&job.job_type)
        .bind(&job.location)
        .bind(&job.salary_range)
        .bind(&job.job_summary)
        .bind(job.experience_level)
        .bind(job.application_deadline)
        .bind(&job.equal_opportunity_statement)
        .bind(&job.how_to_apply)
        .bind(&job.responsibilities)
        .bind(&job.required_qualifications)
        .bind(&job.preferred_skills)
        .fetch_one(&self.db)
        .await
        .context("insert job posting")?;
        Ok(row)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM job_postings WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete job posting")?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
pub use memory::MemoryJobStore;

#[cfg(test)]
mod memory {
    use super::*;
    use std::sync::Mutex;
    use time::OffsetDateTime;

    #[derive(Default)]
    pub struct MemoryJobStore {
        rows: Mutex<Vec<JobPosting>>,
    }

    #[async_trait]
    impl JobStore for MemoryJobStore {
        async fn list(&self) -> anyhow::Result<Vec<JobPosting>> {
            let mut rows = self.rows.lock().unwrap().clone();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(rows)
        }

        async fn get(&self, id: i64) -> anyhow::Result<Option<JobPosting>> {
            Ok(self.rows.lock().unwrap().iter().find(|j| j.id == id).cloned())
        }

        async fn create(&self, job: NewJob) -> anyhow::Result<JobPosting> {
            let mut rows = self.rows.lock().unwrap();
            let id = rows.iter().map(|j| j.id).max().unwrap_or(0) + 1;
            let posting = JobPosting {
                id,
                job_title: job.job_title,
                company: job.company,
                department: job.department,
                job_type: job.job_type,
                location: job.location,
                salary_range: job.salary_range,
                job_summary: job.job_summary,
                experience_level: job.experience_level,
                application_deadline: job.application_deadline,
                equal_opportunity_statement: job.equal_opportunity_statement,
                how_to_apply: job.how_to_apply,
                responsibilities: job.responsibilities,
                required_qualifications: job.required_qualifications,
                preferred_skills: job.preferred_skills,
                created_at: OffsetDateTime::now_utc(),
            };
            rows.push(posting.clone());
            Ok(posting)
        }

        async fn delete(&self, id: i64) -> anyhow::Result<bool> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|j| j.id != id);
            Ok(rows.len() != before)
        }
    }
}
