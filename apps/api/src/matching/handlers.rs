//! Axum route handlers for candidate skill matching.

use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::skill_match::{skill_match, MatchBand, SkillMatch};
use crate::models::candidate::{CandidateSkillsRow, JobOrderRow};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SkillMatchRequest {
    pub candidate_skills: Vec<String>,
    pub required_skills: Vec<String>,
}

/// A scored match plus its presentation band, if scored.
#[derive(Debug, Serialize)]
pub struct ScoredMatch {
    #[serde(flatten)]
    pub result: SkillMatch,
    pub band: Option<MatchBand>,
    pub label: Option<&'static str>,
    pub color: Option<&'static str>,
}

impl From<SkillMatch> for ScoredMatch {
    fn from(result: SkillMatch) -> Self {
        let band = result.band();
        Self {
            result,
            band,
            label: band.map(|b| b.label()),
            color: band.map(|b| b.color()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub job_order_id: Uuid,
    pub candidate_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CandidateComparison {
    pub candidate_id: Uuid,
    pub full_name: String,
    #[serde(flatten)]
    pub scored: ScoredMatch,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub job_order_id: Uuid,
    pub job_title: String,
    pub required_skills: Vec<String>,
    /// False when the job order lists no required skills.
    pub scored: bool,
    pub comparisons: Vec<CandidateComparison>,
}

/// POST /api/v1/matching/skills
pub async fn handle_skill_match(Json(request): Json<SkillMatchRequest>) -> Json<ScoredMatch> {
    Json(skill_match(&request.candidate_skills, &request.required_skills).into())
}

/// POST /api/v1/matching/compare
///
/// Scores each candidate against one job order, in request order.
/// Unknown candidate ids are left out.
pub async fn handle_compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, AppError> {
    if request.candidate_ids.is_empty() {
        return Err(AppError::Validation(
            "candidate_ids cannot be empty".to_string(),
        ));
    }

    let job = sqlx::query_as::<_, JobOrderRow>(
        "SELECT id, title, required_skills FROM job_orders WHERE id = $1",
    )
    .bind(request.job_order_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Job order {} not found", request.job_order_id)))?;

    let candidates = sqlx::query_as::<_, CandidateSkillsRow>(
        "SELECT id, full_name, skills FROM candidates WHERE id = ANY($1)",
    )
    .bind(&request.candidate_ids)
    .fetch_all(&state.db)
    .await?;

    let comparisons = compare_candidates(&job.required_skills, &request.candidate_ids, candidates);

    Ok(Json(CompareResponse {
        job_order_id: job.id,
        job_title: job.title,
        scored: job.required_skills.iter().any(|s| !s.trim().is_empty()),
        required_skills: job.required_skills,
        comparisons,
    }))
}

fn compare_candidates(
    required_skills: &[String],
    order: &[Uuid],
    candidates: Vec<CandidateSkillsRow>,
) -> Vec<CandidateComparison> {
    let mut by_id: HashMap<Uuid, CandidateSkillsRow> =
        candidates.into_iter().map(|c| (c.id, c)).collect();

    order
        .iter()
        .filter_map(|id| by_id.remove(id))
        .map(|candidate| CandidateComparison {
            candidate_id: candidate.id,
            scored: skill_match(&candidate.skills, required_skills).into(),
            full_name: candidate.full_name,
        })
        .collect()
}
