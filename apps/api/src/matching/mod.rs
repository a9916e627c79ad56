// Candidate ↔ job skill matching used by the comparison views.
// Scoring is pure; handlers only load skills and attach presentation bands.

pub mod handlers;
pub mod skill_match;
