use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use super::repo_types::{Candidate, CandidateFilter, CandidateSummary, Pagination};
use crate::error::{AppError, Result};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Query string of `GET /api/candidates`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CandidateQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    #[serde(rename = "createdAt_gte")]
    pub created_at_gte: Option<String>,
    #[serde(rename = "createdAt_lte")]
    pub created_at_lte: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn timestamp(field: &str, value: Option<String>) -> Result<Option<OffsetDateTime>> {
    non_empty(value)
        .map(|raw| {
            OffsetDateTime::parse(&raw, &Rfc3339)
                .map_err(|_| AppError::validation(format!("{} must be an RFC 3339 timestamp", field)))
        })
        .transpose()
}

impl CandidateQuery {
    /// Resolves paging and filters; returns the page number alongside the filter.
    pub fn into_filter(self) -> Result<(i64, CandidateFilter)> {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| AppError::validation("page is out of range"))?;
        let filter = CandidateFilter {
            created_from: timestamp("createdAt_gte", self.created_at_gte)?,
            created_to: timestamp("createdAt_lte", self.created_at_lte)?,
            email: non_empty(self.email),
            full_name: non_empty(self.full_name),
            limit,
            offset,
        };
        Ok((page, filter))
    }
}

#[derive(Debug, Serialize)]
pub struct CandidateListResponse {
    pub success: bool,
    pub data: Vec<CandidateSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct CandidateResponse {
    pub success: bool,
    pub data: Candidate,
}

#[derive(Debug, Serialize)]
pub struct SuccessMessage {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl SuccessMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}
