pub mod git;
pub mod progress;
