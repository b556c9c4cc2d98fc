//! Recruiter-facing chatbot grounded in the CV and the supplemental document.

pub mod handlers;
pub mod prompts;
pub mod responder;
