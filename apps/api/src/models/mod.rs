pub mod candidate;
pub mod prospect;
