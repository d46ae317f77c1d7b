use serde::Deserialize;
use serde_json::Value;
use time::{macros::format_description, Date};

use super::repo_types::NewJob;
use crate::error::{AppError, Result};

pub const DEFAULT_COMPANY: &str = "Ruhil Future Technologies";
pub const DEFAULT_JOB_TYPE: &str = "Full-time";

/// Body of `POST /api/jobs` as the dashboard form sends it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateJobRequest {
    pub job_title: String,
    pub company: String,
    pub department: String,
    pub job_type: String,
    pub location: String,
    pub salary_range: String,
    pub job_summary: String,
    /// The form sends this as a string; API clients may send a number.
    pub experience_level: Value,
    pub application_deadline: Option<String>,
    pub equal_opportunity_statement: String,
    pub how_to_apply: String,
    pub responsibilities: Vec<String>,
    pub required_qualifications: Vec<String>,
    pub preferred_skills: Vec<String>,
}

fn non_blank(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn required(field: &str, value: String) -> Result<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(value)
}

fn or_default(value: String, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

fn experience_years(value: &Value) -> Result<i32> {
    let years = match value {
        Value::Null => Some(0),
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) if s.trim().is_empty() => Some(0),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    };
    match years {
        Some(y) if y >= 0 => Ok(y),
        _ => Err(AppError::validation(
            "experience_level must be a non-negative number of years",
        )),
    }
}

fn deadline(value: Option<String>) -> Result<Option<Date>> {
    let Some(raw) = value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    Date::parse(&raw, format_description!("[year]-[month]-[day]"))
        .map(Some)
        .map_err(|_| AppError::validation("application_deadline must be a YYYY-MM-DD date"))
}

impl CreateJobRequest {
    pub fn validate(self) -> Result<NewJob> {
        Ok(NewJob {
            experience_level: experience_years(&self.experience_level)?,
            application_deadline: deadline(self.application_deadline)?,
            job_title: required("job_title", self.job_title)?,
            department: required("department", self.department)?,
            location: required("location", self.location)?,
            company: or_default(self.company, DEFAULT_COMPANY),
            job_type: or_default(self.job_type, DEFAULT_JOB_TYPE),
            salary_range: self.salary_range.trim().to_string(),
            job_summary: self.job_summary.trim().to_string(),
            equal_opportunity_statement: self.equal_opportunity_statement.trim().to_string(),
            how_to_apply: self.how_to_apply.trim().to_string(),
            responsibilities: non_blank(self.responsibilities),
            required_qualifications: non_blank(self.required_qualifications),
            preferred_skills: non_blank(self.preferred_skills),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form() -> CreateJobRequest {
        serde_json::from_value(json!({
            "job_title": " Backend Engineer ",
            "company": "",
            "department": "Engineering",
            "job_type": "",
            "location": "Gurgaon",
            "experience_level": "3",
            "application_deadline": "2026-12-31",
            "responsibilities": ["Build APIs", "  ", ""],
            "required_qualifications": ["B.Tech"],
            "preferred_skills": []
        }))
        .unwrap()
    }

    #[test]
    fn validate_fills_defaults_and_drops_blank_items() {
        let job = form().validate().unwrap();
        assert_eq!(job.job_title, "Backend Engineer");
        assert_eq!(job.company, DEFAULT_COMPANY);
        assert_eq!(job.job_type, DEFAULT_JOB_TYPE);
        assert_eq!(job.experience_level, 3);
        assert_eq!(job.responsibilities, vec!["Build APIs".to_string()]);
        assert_eq!(
            job.application_deadline,
            Some(time::macros::date!(2026 - 12 - 31))
        );
    }

    #[test]
    fn validate_requires_title() {
        let mut req = form();
        req.job_title = "   ".into();
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "job_title is required");
    }

    #[test]
    fn experience_accepts_numbers_and_rejects_garbage() {
        assert_eq!(experience_years(&json!(5)).unwrap(), 5);
        assert_eq!(experience_years(&json!("")).unwrap(), 0);
        assert!(experience_years(&json!("lots")).is_err());
        assert!(experience_years(&json!(-1)).is_err());
    }

    #[test]
    fn empty_deadline_is_none_and_bad_deadline_is_rejected() {
        assert_eq!(deadline(Some("".into())).unwrap(), None);
        assert!(deadline(Some("31/12/2026".into())).is_err());
    }
}
