//! Remote rewrite of redacted prompts
//!
//! The only asynchronous part of the pipeline. Local redaction always runs
//! first; the remote result is used only when it arrives in time and passes
//! the leakage check.

pub mod backend;
pub mod leakage;
pub mod openai;
pub mod orchestrator;

pub use backend::{RewriteBackend, RewriteCompletion, RewriteRequest, TokenUsage, SYSTEM_PROMPT};
pub use leakage::{find_leaks, scrub_leaks, LeakMatch, LeakVector};
pub use openai::{OpenAiRewriter, SecretString};
pub use orchestrator::{
    RewriteMethod, RewriteOrchestrator, RewriteOutcome, RewritePricing, RewriteState,
    RewriteUsage,
};
