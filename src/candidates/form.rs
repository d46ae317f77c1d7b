//! The multi-step application form as the careers site submits it, and its
//! step-by-step validation into a [`NewCandidate`].

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use time::{macros::format_description, Date};

use super::repo_types::NewCandidate;

lazy_static! {
    static ref PHONE_RE: Regex = Regex::new(r"^\d{10}$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^\S+@\S+\.\S+$").unwrap();
    static ref YEAR_RE: Regex = Regex::new(r"^\d{4}$").unwrap();
    static ref MARKS_RE: Regex = Regex::new(r"^\d{1,3}(\.\d{1,2})?$").unwrap();
    static ref CTC_RE: Regex = Regex::new(r"^\d+$").unwrap();
    static ref AADHAR_RE: Regex = Regex::new(r"^\d{12}$").unwrap();
    static ref PAN_RE: Regex = Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").unwrap();
    static ref PASSPORT_RE: Regex = Regex::new(r"^(?i)[A-Z0-9]{8,9}$").unwrap();
}

const MAX_CTC: u64 = 10_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationStep {
    PersonalDetails,
    LocationDetails,
    Education,
    Skills,
    Experience,
    Preferences,
    General,
    Documents,
    Declaration,
}

impl ApplicationStep {
    pub const ALL: [ApplicationStep; 9] = [
        ApplicationStep::PersonalDetails,
        ApplicationStep::LocationDetails,
        ApplicationStep::Education,
        ApplicationStep::Skills,
        ApplicationStep::Experience,
        ApplicationStep::Preferences,
        ApplicationStep::General,
        ApplicationStep::Documents,
        ApplicationStep::Declaration,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ApplicationStep::PersonalDetails => "Personal Details",
            ApplicationStep::LocationDetails => "Location Details",
            ApplicationStep::Education => "Education",
            ApplicationStep::Skills => "Skills",
            ApplicationStep::Experience => "Experience",
            ApplicationStep::Preferences => "Preferences",
            ApplicationStep::General => "General",
            ApplicationStep::Documents => "Documents",
            ApplicationStep::Declaration => "Declaration",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepError {
    pub step: ApplicationStep,
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step.title(), self.message)
    }
}

impl std::error::Error for StepError {}

/// The `data` part of the `/upload` multipart body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationForm {
    pub full_name: String,
    pub dob: String,
    pub gender: String,
    pub mobile: String,
    pub alt_mobile: String,
    pub email: String,
    pub current_city: String,
    pub home_town: String,
    pub willing_to_relocate: String,
    pub qualification: String,
    pub course: String,
    pub college: String,
    pub affiliated_univ: String,
    pub graduation_year: String,
    pub marks: String,
    pub all_sem_cleared: String,
    pub tech_skills: Vec<String>,
    pub other_tech_skills: String,
    pub certifications: String,
    pub has_internship: String,
    pub project_desc: String,
    pub github: String,
    pub linkedin: String,
    pub preferred_role: String,
    pub preferred_locations: Vec<String>,
    pub joining: String,
    pub shifts: String,
    #[serde(rename = "expectedCTC")]
    pub expected_ctc: String,
    pub source: String,
    pub online_test: String,
    pub laptop: String,
    pub languages: Vec<String>,
    pub aadhar: String,
    pub pan: String,
    pub passport: String,
    pub agree: bool,
}

/// Attachments present alongside the form; only their presence is checked here.
#[derive(Debug, Clone, Copy, Default)]
pub struct Attachments {
    pub resume: bool,
    pub academics: bool,
}

struct Checker {
    step: ApplicationStep,
}

impl Checker {
    fn fail(&self, field: &'static str, message: impl Into<String>) -> StepError {
        StepError {
            step: self.step,
            field,
            message: message.into(),
        }
    }

    fn required<'a>(&self, field: &'static str, label: &str, value: &'a str) -> Result<&'a str, StepError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(self.fail(field, format!("{} is required", label)));
        }
        Ok(value)
    }

    fn yes_no(&self, field: &'static str, label: &str, value: &str) -> Result<bool, StepError> {
        match self.required(field, label, value)?.to_ascii_lowercase().as_str() {
            "yes" => Ok(true),
            "no" => Ok(false),
            _ => Err(self.fail(field, format!("{} must be Yes or No", label))),
        }
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn non_blank(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl ApplicationForm {
    /// Runs every step in order and stops at the first failing one.
    /// `current_year` bounds the year of passing.
    pub fn validate(
        &self,
        attachments: Attachments,
        current_year: i32,
    ) -> Result<NewCandidate, StepError> {
        // Personal Details
        let c = Checker { step: ApplicationStep::PersonalDetails };
        let full_name = c.required("fullName", "Full Name", &self.full_name)?;
        let dob_raw = c.required("dob", "Date of Birth", &self.dob)?;
        let date_of_birth = Date::parse(dob_raw, format_description!("[year]-[month]-[day]"))
            .map_err(|_| c.fail("dob", "Date of Birth must be a YYYY-MM-DD date"))?;
        let gender = c.required("gender", "Gender", &self.gender)?;
        let mobile = c.required("mobile", "Mobile Number", &self.mobile)?;
        if !PHONE_RE.is_match(mobile) {
            return Err(c.fail("mobile", "Enter valid 10-digit number"));
        }
        let alt_mobile = optional(&self.alt_mobile);
        if alt_mobile.as_deref().is_some_and(|m| !PHONE_RE.is_match(m)) {
            return Err(c.fail("altMobile", "Enter valid 10-digit number"));
        }
        let email = c.required("email", "Email", &self.email)?.to_lowercase();
        if !EMAIL_RE.is_match(&email) {
            return Err(c.fail("email", "Email is invalid"));
        }

        // Location Details
        let c = Checker { step: ApplicationStep::LocationDetails };
        let current_city = c.required("currentCity", "Current City", &self.current_city)?;
        let home_town = c.required("homeTown", "Home Town", &self.home_town)?;
        let willing_to_relocate =
            c.yes_no("willingToRelocate", "Willing to relocate", &self.willing_to_relocate)?;

        // Education
        let c = Checker { step: ApplicationStep::Education };
        let qualification = c.required("qualification", "Qualification", &self.qualification)?;
        let course = c.required("course", "Course Name", &self.course)?;
        let college = c.required("college", "College/University", &self.college)?;
        let year_raw = c.required("graduationYear", "Year of Passing", &self.graduation_year)?;
        let max_year = current_year + 5;
        let year_of_passing = YEAR_RE
            .is_match(year_raw)
            .then(|| year_raw.parse::<i32>().ok())
            .flatten()
            .filter(|y| (1950..=max_year).contains(y))
            .ok_or_else(|| {
                c.fail("graduationYear", format!("Year must be between 1950 and {}", max_year))
            })?;
        let marks_raw = c.required("marks", "Aggregate Marks/CGPA", &self.marks)?;
        let aggregate_marks = MARKS_RE
            .is_match(marks_raw)
            .then(|| marks_raw.parse::<f64>().ok())
            .flatten()
            .filter(|m| (0.0..=100.0).contains(m))
            .ok_or_else(|| c.fail("marks", "Marks must be between 0 and 100"))?;
        let all_semesters_cleared =
            c.yes_no("allSemCleared", "All semesters cleared", &self.all_sem_cleared)?;

        // Skills
        let c = Checker { step: ApplicationStep::Skills };
        let mut skills: Vec<String> = non_blank(&self.tech_skills)
            .into_iter()
            .filter(|s| s != "Others")
            .collect();
        skills.extend(
            self.other_tech_skills
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
        if skills.is_empty() {
            return Err(c.fail("techSkills", "Select at least one skill"));
        }

        // Experience
        let c = Checker { step: ApplicationStep::Experience };
        let internship = c.yes_no("hasInternship", "Internship/project experience", &self.has_internship)?;
        let project_description = optional(&self.project_desc);
        if internship && project_description.is_none() {
            return Err(c.fail("projectDesc", "Description required"));
        }

        // Preferences
        let c = Checker { step: ApplicationStep::Preferences };
        let preferred_role = c.required("preferredRole", "Preferred Role", &self.preferred_role)?;
        let preferred_locations = non_blank(&self.preferred_locations);
        if preferred_locations.is_empty() {
            return Err(c.fail("preferredLocations", "Select at least one location"));
        }
        let immediate_joining = c.required("joining", "Immediate joining", &self.joining)?;
        let open_to_shifts = c.yes_no("shifts", "Open to shifts", &self.shifts)?;
        let expected_ctc = match optional(&self.expected_ctc) {
            None => None,
            Some(raw) => Some(
                CTC_RE
                    .is_match(&raw)
                    .then(|| raw.parse::<u64>().ok())
                    .flatten()
                    .filter(|v| *v <= MAX_CTC)
                    .ok_or_else(|| {
                        c.fail("expectedCTC", "CTC must be an integer between 0 and 1,00,00,000")
                    })? as f64,
            ),
        };

        // General
        let c = Checker { step: ApplicationStep::General };
        let opportunity_source = c.required("source", "Opportunity source", &self.source)?;
        let available_for_online_tests = c.yes_no("onlineTest", "Online test availability", &self.online_test)?;
        let has_laptop_internet = c.yes_no("laptop", "Laptop and internet", &self.laptop)?;
        let aadhar_number = optional(&self.aadhar);
        if aadhar_number.as_deref().is_some_and(|a| !AADHAR_RE.is_match(a)) {
            return Err(c.fail("aadhar", "Aadhar must be 12 digits"));
        }
        let pan_no = optional(&self.pan).map(|p| p.to_uppercase());
        if pan_no.as_deref().is_some_and(|p| !PAN_RE.is_match(p)) {
            return Err(c.fail("pan", "PAN must be 10 characters (e.g., ABCDE1234F)"));
        }
        let passport = optional(&self.passport);
        if passport.as_deref().is_some_and(|p| !PASSPORT_RE.is_match(p)) {
            return Err(c.fail("passport", "Passport should be 8-9 alphanumeric characters"));
        }

        // Documents
        let c = Checker { step: ApplicationStep::Documents };
        if !attachments.resume {
            return Err(c.fail("resume", "Resume is required"));
        }

        // Declaration
        let c = Checker { step: ApplicationStep::Declaration };
        if !self.agree {
            return Err(c.fail("agree", "You must agree to the declaration"));
        }

        Ok(NewCandidate {
            full_name: full_name.to_string(),
            email,
            mobile_number: mobile.to_string(),
            alternate_contact_number: alt_mobile,
            current_city: current_city.to_string(),
            home_town: home_town.to_string(),
            date_of_birth,
            gender: gender.to_string(),
            willing_to_relocate,
            preferred_locations,
            languages: non_blank(&self.languages),
            linkedin_link: optional(&self.linkedin),
            github_link: optional(&self.github),
            resume_path: None,
            academic_docs_path: None,
            highest_qualification: qualification.to_string(),
            course_name: course.to_string(),
            college_university: college.to_string(),
            affiliated_university: self.affiliated_univ.trim().to_string(),
            year_of_passing,
            aggregate_marks,
            all_semesters_cleared,
            skills,
            internship_project_experience: internship,
            project_description,
            preferred_role: preferred_role.to_string(),
            expected_ctc,
            immediate_joining: immediate_joining.to_string(),
            open_to_shifts,
            opportunity_source: opportunity_source.to_string(),
            available_for_online_tests,
            has_laptop_internet,
            aadhar_number,
            pan_no,
            passport_available: passport.is_some(),
            certificate_name: optional(&self.certifications),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn complete_form() -> serde_json::Value {
        json!({
            "fullName": "Asha Verma",
            "dob": "2001-04-17",
            "gender": "Female",
            "mobile": "9876543210",
            "altMobile": "",
            "email": "Asha@Example.com",
            "currentCity": "Rohtak",
            "homeTown": "Hisar",
            "willingToRelocate": "Yes",
            "qualification": "B.Tech",
            "course": "Computer Science",
            "college": "MDU",
            "affiliatedUniv": "MDU Rohtak",
            "graduationYear": "2023",
            "marks": "78.5",
            "allSemCleared": "Yes",
            "techSkills": ["Python", "SQL/Databases", "Others"],
            "otherTechSkills": "Rust, Go",
            "certifications": "AWS CCP",
            "hasInternship": "Yes",
            "projectDesc": "Built a job board",
            "github": "https://github.com/asha",
            "linkedin": "",
            "preferredRole": "Backend Developer",
            "preferredLocations": ["Gurgaon", "North India"],
            "joining": "Notice Period",
            "shifts": "No",
            "expectedCTC": "600000",
            "source": "LinkedIn",
            "onlineTest": "Yes",
            "laptop": "Yes",
            "languages": ["English", "Hindi"],
            "aadhar": "123412341234",
            "pan": "abcde1234f",
            "passport": "",
            "agree": true
        })
    }

    fn form(patch: serde_json::Value) -> ApplicationForm {
        let mut value = complete_form();
        for (k, v) in patch.as_object().unwrap() {
            value[k] = v.clone();
        }
        serde_json::from_value(value).unwrap()
    }

    const WITH_RESUME: Attachments = Attachments { resume: true, academics: false };

    #[test]
    fn complete_form_maps_to_candidate() {
        let c = form(json!({})).validate(WITH_RESUME, 2026).unwrap();
        assert_eq!(c.email, "asha@example.com");
        assert_eq!(c.skills, vec!["Python", "SQL/Databases", "Rust", "Go"]);
        assert_eq!(c.pan_no.as_deref(), Some("ABCDE1234F"));
        assert_eq!(c.expected_ctc, Some(600000.0));
        assert_eq!(c.alternate_contact_number, None);
        assert!(!c.passport_available);
        assert!(c.willing_to_relocate);
        assert!(!c.open_to_shifts);
        assert_eq!(c.certificate_name.as_deref(), Some("AWS CCP"));
    }

    #[test]
    fn reports_first_failing_step() {
        let err = form(json!({ "homeTown": "", "marks": "abc" }))
            .validate(WITH_RESUME, 2026)
            .unwrap_err();
        assert_eq!(err.step, ApplicationStep::LocationDetails);
        assert_eq!(err.field, "homeTown");
        assert_eq!(err.to_string(), "Location Details: Home Town is required");
    }

    #[test]
    fn personal_details_checks_phone_numbers() {
        let err = form(json!({ "mobile": "12345" })).validate(WITH_RESUME, 2026).unwrap_err();
        assert_eq!(err.field, "mobile");
        let err = form(json!({ "altMobile": "12" })).validate(WITH_RESUME, 2026).unwrap_err();
        assert_eq!(err.field, "altMobile");
    }

    #[test]
    fn education_bounds_year_and_marks() {
        let err = form(json!({ "graduationYear": "2040" })).validate(WITH_RESUME, 2026).unwrap_err();
        assert_eq!(err.step, ApplicationStep::Education);
        let err = form(json!({ "marks": "101" })).validate(WITH_RESUME, 2026).unwrap_err();
        assert_eq!(err.field, "marks");
    }

    #[test]
    fn internship_requires_description() {
        let err = form(json!({ "projectDesc": "  " })).validate(WITH_RESUME, 2026).unwrap_err();
        assert_eq!(err.step, ApplicationStep::Experience);
        assert!(form(json!({ "hasInternship": "No", "projectDesc": "" }))
            .validate(WITH_RESUME, 2026)
            .is_ok());
    }

    #[test]
    fn only_others_is_not_a_skill() {
        let err = form(json!({ "techSkills": ["Others"], "otherTechSkills": "" }))
            .validate(WITH_RESUME, 2026)
            .unwrap_err();
        assert_eq!(err.step, ApplicationStep::Skills);
    }

    #[test]
    fn general_checks_identity_numbers() {
        let err = form(json!({ "pan": "12345" })).validate(WITH_RESUME, 2026).unwrap_err();
        assert_eq!(err.field, "pan");
        let c = form(json!({ "passport": "k1234567" })).validate(WITH_RESUME, 2026).unwrap();
        assert!(c.passport_available);
    }

    #[test]
    fn resume_and_declaration_are_required() {
        let err = form(json!({})).validate(Attachments::default(), 2026).unwrap_err();
        assert_eq!(err.step, ApplicationStep::Documents);
        let err = form(json!({ "agree": false })).validate(WITH_RESUME, 2026).unwrap_err();
        assert_eq!(err.step, ApplicationStep::Declaration);
    }

    #[test]
    fn steps_are_listed_in_form_order() {
        let titles: Vec<_> = ApplicationStep::ALL.iter().map(|s| s.title()).collect();
        assert_eq!(titles.first(), Some(&"Personal Details"));
        assert_eq!(titles.last(), Some(&"Declaration"));
        assert_eq!(titles.len(), 9);
    }
}
