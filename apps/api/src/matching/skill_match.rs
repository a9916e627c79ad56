//! Skill matching: overlap between a candidate's skills and a job's required skills.
//!
//! Comparison is case-insensitive. `matched` and `missing` keep the job's
//! spelling and order; `extra` keeps the candidate's.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub extra: Vec<String>,
    /// round(matched / required × 100). `None` when nothing is required.
    pub match_percentage: Option<u8>,
}

impl SkillMatch {
    pub fn band(&self) -> Option<MatchBand> {
        self.match_percentage.map(MatchBand::from_percentage)
    }
}

/// Qualitative label for a match percentage. Ordered weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBand {
    Weak,
    Partial,
    Strong,
}

impl MatchBand {
    pub const STRONG_THRESHOLD: u8 = 80;
    pub const PARTIAL_THRESHOLD: u8 = 50;

    pub fn from_percentage(percentage: u8) -> Self {
        if percentage >= Self::STRONG_THRESHOLD {
            MatchBand::Strong
        } else if percentage >= Self::PARTIAL_THRESHOLD {
            MatchBand::Partial
        } else {
            MatchBand::Weak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchBand::Strong => "Strong Match",
            MatchBand::Partial => "Partial Match",
            MatchBand::Weak => "Weak Match",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            MatchBand::Strong => "green",
            MatchBand::Partial => "amber",
            MatchBand::Weak => "red",
        }
    }
}

/// Scores `candidate_skills` against `required_skills`. Blank entries are ignored.
pub fn skill_match<C, R>(candidate_skills: &[C], required_skills: &[R]) -> SkillMatch
where
    C: AsRef<str>,
    R: AsRef<str>,
{
    let candidate: Vec<&str> = non_blank(candidate_skills);
    let required: Vec<&str> = non_blank(required_skills);

    let candidate_keys: HashSet<String> = candidate.iter().map(|s| s.to_lowercase()).collect();
    let required_keys: HashSet<String> = required.iter().map(|s| s.to_lowercase()).collect();

    let (matched, missing): (Vec<&str>, Vec<&str>) = required
        .iter()
        .partition(|s| candidate_keys.contains(&s.to_lowercase()));

    let extra: Vec<String> = candidate
        .iter()
        .filter(|s| !required_keys.contains(&s.to_lowercase()))
        .map(|s| s.to_string())
        .collect();

    // No division when nothing is required.
    let match_percentage = if required.is_empty() {
        None
    } else {
        Some(((matched.len() as f64 / required.len() as f64) * 100.0).round() as u8)
    };

    SkillMatch {
        matched: matched.into_iter().map(String::from).collect(),
        missing: missing.into_iter().map(String::from).collect(),
        extra,
        match_percentage,
    }
}

fn non_blank<S: AsRef<str>>(skills: &[S]) -> Vec<&str> {
    skills
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_of_three_is_67_percent() {
        let result = skill_match(&["Python", "SQL"], &["Python", "SQL", "Go"]);
        assert_eq!(result.matched, vec!["Python", "SQL"]);
        assert_eq!(result.missing, vec!["Go"]);
        assert!(result.extra.is_empty());
        assert_eq!(result.match_percentage, Some(67));
        assert_eq!(result.band(), Some(MatchBand::Partial));
    }

    #[test]
    fn test_case_insensitive_keeps_each_sides_casing() {
        let result = skill_match(&["python", "Docker", "rust"], &["Python", "RUST", "Kafka"]);
        assert_eq!(result.matched, vec!["Python", "RUST"]);
        assert_eq!(result.missing, vec!["Kafka"]);
        assert_eq!(result.extra, vec!["Docker"]);
    }

    #[test]
    fn test_empty_required_has_no_percentage() {
        let none: [&str; 0] = [];
        let result = skill_match(&["Python", "SQL"], &none);
        assert_eq!(result.match_percentage, None);
        assert_eq!(result.band(), None);
        assert!(result.matched.is_empty());
        assert!(result.missing.is_empty());
        assert_eq!(result.extra, vec!["Python", "SQL"]);
    }

    #[test]
    fn test_blank_entries_ignored() {
        let result = skill_match(&["  ", "Go "], &["go", ""]);
        assert_eq!(result.matched, vec!["go"]);
        assert_eq!(result.match_percentage, Some(100));
        assert!(result.extra.is_empty());
    }

    #[test]
    fn test_no_candidate_skills_is_zero() {
        let none: [String; 0] = [];
        let result = skill_match(&none, &["Rust".to_string()]);
        assert_eq!(result.match_percentage, Some(0));
        assert_eq!(result.band(), Some(MatchBand::Weak));
    }

    #[test]
    fn test_band_never_weakens_as_percentage_rises() {
        let bands: Vec<MatchBand> = (0..=100).map(MatchBand::from_percentage).collect();
        assert!(bands.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(MatchBand::from_percentage(80), MatchBand::Strong);
        assert_eq!(MatchBand::from_percentage(79), MatchBand::Partial);
        assert_eq!(MatchBand::from_percentage(49), MatchBand::Weak);
    }

    #[test]
    fn test_band_labels_and_colors() {
        assert_eq!(MatchBand::Strong.label(), "Strong Match");
        assert_eq!(MatchBand::Weak.color(), "red");
        assert_eq!(MatchBand::Partial.color(), "amber");
    }
}
