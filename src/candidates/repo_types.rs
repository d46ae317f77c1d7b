use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    pub alternate_contact_number: Option<String>,
    pub current_city: String,
    pub home_town: String,
    #[serde(with = "iso_date")]
    pub date_of_birth: Date,
    pub gender: String,
    pub willing_to_relocate: bool,
    pub preferred_locations: Vec<String>,
    pub languages: Vec<String>,
    pub linkedin_link: Option<String>,
    pub github_link: Option<String>,
    pub resume_path: Option<String>,
    pub academic_docs_path: Option<String>,
    pub highest_qualification: String,
    pub course_name: String,
    pub college_university: String,
    pub affiliated_university: String,
    pub year_of_passing: i32,
    pub aggregate_marks: f64,
    pub all_semesters_cleared: bool,
    pub skills: Vec<String>,
    pub internship_project_experience: bool,
    pub project_description: Option<String>,
    pub preferred_role: String,
    #[serde(rename = "expectedCTC")]
    pub expected_ctc: Option<f64>,
    pub immediate_joining: String,
    pub open_to_shifts: bool,
    pub opportunity_source: String,
    pub available_for_online_tests: bool,
    pub has_laptop_internet: bool,
    pub aadhar_number: Option<String>,
    pub pan_no: Option<String>,
    pub passport_available: bool,
    pub certificate_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// List row shown in the HR dashboard table.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummary {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    pub preferred_role: String,
    pub skills: Vec<String>,
    pub preferred_locations: Vec<String>,
    pub languages: Vec<String>,
    pub resume_path: Option<String>,
    pub academic_docs_path: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&Candidate> for CandidateSummary {
    fn from(c: &Candidate) -> Self {
        Self {
            id: c.id,
            full_name: c.full_name.clone(),
            email: c.email.clone(),
            mobile_number: c.mobile_number.clone(),
            preferred_role: c.preferred_role.clone(),
            skills: c.skills.clone(),
            preferred_locations: c.preferred_locations.clone(),
            languages: c.languages.clone(),
            resume_path: c.resume_path.clone(),
            academic_docs_path: c.academic_docs_path.clone(),
            created_at: c.created_at,
        }
    }
}

/// A validated application, before it has an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCandidate {
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    pub alternate_contact_number: Option<String>,
    pub current_city: String,
    pub home_town: String,
    pub date_of_birth: Date,
    pub gender: String,
    pub willing_to_relocate: bool,
    pub preferred_locations: Vec<String>,
    pub languages: Vec<String>,
    pub linkedin_link: Option<String>,
    pub github_link: Option<String>,
    pub resume_path: Option<String>,
    pub academic_docs_path: Option<String>,
    pub highest_qualification: String,
    pub course_name: String,
    pub college_university: String,
    pub affiliated_university: String,
    pub year_of_passing: i32,
    pub aggregate_marks: f64,
    pub all_semesters_cleared: bool,
    pub skills: Vec<String>,
    pub internship_project_experience: bool,
    pub project_description: Option<String>,
    pub preferred_role: String,
    pub expected_ctc: Option<f64>,
    pub immediate_joining: String,
    pub open_to_shifts: bool,
    pub opportunity_source: String,
    pub available_for_online_tests: bool,
    pub has_laptop_internet: bool,
    pub aadhar_number: Option<String>,
    pub pan_no: Option<String>,
    pub passport_available: bool,
    pub certificate_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFilter {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub created_from: Option<OffsetDateTime>,
    pub created_to: Option<OffsetDateTime>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_candidates: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            current_page: page,
            total_pages: (total + limit - 1) / limit,
            total_candidates: total,
            limit,
        }
    }
}
