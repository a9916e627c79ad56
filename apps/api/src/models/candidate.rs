use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateSkillsRow {
    pub id: Uuid,
    pub full_name: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobOrderRow {
    pub id: Uuid,
    pub title: String,
    pub required_skills: Vec<String>,
}
