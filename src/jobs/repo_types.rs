use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobPosting {
    pub id: i64,
    pub job_title: String,
    pub company: String,
    pub department: String,
    pub job_type: String,
    pub location: String,
    pub salary_range: String,
    pub job_summary: String,
    pub experience_level: i32,
    #[serde(with = "iso_date::option")]
    pub application_deadline: Option<Date>,
    pub equal_opportunity_statement: String,
    pub how_to_apply: String,
    pub responsibilities: Vec<String>,
    pub required_qualifications: Vec<String>,
    pub preferred_skills: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated input for a new posting.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub job_title: String,
    pub company: String,
    pub department: String,
    pub job_type: String,
    pub location: String,
    pub salary_range: String,
    pub job_summary: String,
    pub experience_level: i32,
    pub application_deadline: Option<Date>,
    pub equal_opportunity_statement: String,
    pub how_to_apply: String,
    pub responsibilities: Vec<String>,
    pub required_qualifications: Vec<String>,
    pub preferred_skills: Vec<String>,
}
