//! Candidate profile: the hardcoded CV every prompt is grounded in, plus the
//! lazily loaded supplemental interview document used by the chatbot.

pub mod supplemental;

pub use supplemental::SupplementalText;

pub const CANDIDATE_NAME: &str = "Rushil Chandrupatla";
pub const CANDIDATE_FIRST_NAME: &str = "Rushil";

/// Full CV text. Prompts embed it verbatim.
pub const CANDIDATE_CV: &str = include_str!("../../data/cv.txt");
