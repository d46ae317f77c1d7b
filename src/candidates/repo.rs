use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::repo_types::{Candidate, CandidateFilter, CandidateSummary, NewCandidate};

#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// One page of matching candidates, newest first, and the total match count.
    async fn list(&self, filter: &CandidateFilter) -> anyhow::Result<(Vec<CandidateSummary>, i64)>;
    async fn get(&self, id: i64) -> anyhow::Result<Option<Candidate>>;
    async fn insert(&self, candidate: NewCandidate) -> anyhow::Result<i64>;
    /// Removes the row and hands it back so its documents can be cleaned up.
    async fn delete(&self, id: i64) -> anyhow::Result<Option<Candidate>>;
}

const SUMMARY_COLUMNS: &str = "id, full_name, email, mobile_number, preferred_role, skills, \
     preferred_locations, languages, resume_path, academic_docs_path, created_at";

/// Escapes LIKE metacharacters and wraps the needle for a substring match.
fn contains_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CandidateFilter) {
    qb.push(" WHERE TRUE");
    if let Some(email) = &filter.email {
        qb.push(" AND email ILIKE ").push_bind(contains_pattern(email));
    }
    if let Some(name) = &filter.full_name {
        qb.push(" AND full_name ILIKE ").push_bind(contains_pattern(name));
    }
    if let Some(from) = filter.created_from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.created_to {
        qb.push(" AND created_at <= ").push_bind(to);
    }
}

pub struct PgCandidateStore {
    db: PgPool,
}

impl PgCandidateStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn list(&self, filter: &CandidateFilter) -> anyhow::Result<(Vec<CandidateSummary>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM candidates");
        push_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.db)
            .await
            .context("count candidates")?;

        let mut page = QueryBuilder::<Postgres>::new(format!("SELECT {SUMMARY_COLUMNS} FROM candidates"));
        push_filters(&mut page, filter);
        page.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);
        let rows = page
            .build_query_as::<CandidateSummary>()
            .fetch_all(&self.db)
            .await
            .context("list candidates")?;

        Ok((rows, total))
    }

    async fn get(&self, id: i64) -> anyhow::Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, Candidate>("SELECT * FROM candidates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("get candidate")?;
        Ok(row)
    }

    async fn insert(&self, c: NewCandidate) -> anyhow::Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO candidates (
                full_name, email, mobile_number, alternate_contact_number, current_city,
                home_town, date_of_birth, gender, willing_to_relocate, preferred_locations,
                languages, linkedin_link, github_link, resume_path, academic_docs_path,
                highest_qualification, course_name, college_university, affiliated_university,
                year_of_passing, aggregate_marks, all_semesters_cleared, skills,
                internship_project_experience, project_description, preferred_role,
                expected_ctc, immediate_joining, open_to_shifts, opportunity_source,
                available_for_online_tests, has_laptop_internet, aadhar_number, pan_no,
                passport_available, certificate_name
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
                $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33, $34,
                $35, $36
            )
            RETURNING id
            "#,
        )
        .bind(&c.full_name)
        .bind(&c.email)
        .bind(&c.mobile_number)
        .bind(&c.alternate_contact_number)
        .bind(&c.current_city)
        .bind(&c.home_town)
        .bind(c.date_of_birth)
        .bind(&c.gender)
        .bind(c.willing_to_relocate)
        .bind(&c.preferred_locations)
        .bind(&c.languages)
        .bind(&c.linkedin_link)
        .bind(&c.github_link)
        .bind(&c.resume_path)
        .bind(&c.academic_docs_path)
        .bind(&c.highest_qualification)
        .bind(&c.course_name)
        .bind(&c.college_university)
        .bind(&c.affiliated_university)
        .bind(c.year_of_passing)
        .bind(c.aggregate_marks)
        .bind(c.all_semesters_cleared)
        .bind(&c.skills)
        .bind(c.internship_project_experience)
        .bind(&c.project_description)
        .bind(&c.preferred_role)
        .bind(c.expected_ctc)
        .bind(&c.immediate_joining)
        .bind(c.open_to_shifts)
        .bind(&c.opportunity_source)
        .bind(c.available_for_online_tests)
        .bind(c.has_laptop_internet)
        .bind(&c.aadhar_number)
        .bind(&c.pan_no)
        .bind(c.passport_available)
        .bind(&c.certificate_name)
        .fetch_one(&self.db)
        .await
        .context("insert candidate")?;
        Ok(id)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, Candidate>("DELETE FROM candidates WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("delete candidate")?;
        Ok(row)
    }
}

#[cfg(test)]
pub use memory::MemoryCandidateStore;


#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::form::{tests::complete_form, ApplicationForm, Attachments};

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("asha"), "%asha%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }

    fn candidate(name: &str, email: &str) -> NewCandidate {
        let mut form: ApplicationForm = serde_json::from_value(complete_form()).unwrap();
        form.full_name = name.into();
        form.email = email.into();
        form.validate(Attachments { resume: true, academics: false }, 2026)
            .unwrap()
    }

    fn filter() -> CandidateFilter {
        CandidateFilter {
            created_from: None,
            created_to: None,
            email: None,
            full_name: None,
            limit: 10,
            offset: 0,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn listing_filters_with_literal_wildcards(pool: PgPool) {
        let store = PgCandidateStore::new(pool);
        store.insert(candidate("Asha_Verma", "asha@example.com")).await.unwrap();
        store.insert(candidate("AshaXVerma", "ashax@example.com")).await.unwrap();
        let newest = store.insert(candidate("Ravi Kumar", "ravi_100%@mail.in")).await.unwrap();

        let (rows, total) = store.list(&filter()).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows[0].id, newest);

        let by_name = CandidateFilter { full_name: Some("a_v".into()), ..filter() };
        let (rows, total) = store.list(&by_name).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].full_name, "Asha_Verma");

        let by_email = CandidateFilter { email: Some("100%".into()), ..filter() };
        let (rows, total) = store.list(&by_email).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].email, "ravi_100%@mail.in");

        let second_page = CandidateFilter { limit: 2, offset: 2, ..filter() };
        let (rows, total) = store.list(&second_page).await.unwrap();
        assert_eq!((rows.len(), total), (1, 3));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delete_returns_the_removed_row(pool: PgPool) {
        let store = PgCandidateStore::new(pool);
        let mut c = candidate("Asha Verma", "asha@example.com");
        c.resume_path = Some("candidates/x/resume.pdf".into());
        let id = store.insert(c).await.unwrap();

        let got = store.get(id).await.unwrap().unwrap();
        assert_eq!(got.date_of_birth.to_string(), "2001-04-17");

        let removed = store.delete(id).await.unwrap().unwrap();
        assert_eq!(removed.resume_path.as_deref(), Some("candidates/x/resume.pdf"));
        assert!(store.get(id).await.unwrap().is_none());
        assert!(store.delete(id).await.unwrap().is_none());
    }
}
