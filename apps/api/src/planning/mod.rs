//! 90-day plan generator: weak-signal extraction, context inference, plan
//! generation, job-fit analysis and plan text parsing.

pub mod analyzer;
pub mod handlers;
pub mod inference;
pub mod job_fit;
pub mod plan;
pub mod plan_parser;
pub mod prompts;
pub mod signals;
