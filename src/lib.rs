//! PromptGuard - Sensitive data detection, redaction and safe rewriting
//!
//! PromptGuard inspects prompts on their way to a third-party AI service,
//! detects sensitive data, classifies its risk, redacts it deterministically
//! and maps it to compliance frameworks. When a rewrite service is
//! configured, it also produces a naturally worded version of the redacted
//! prompt, falling back to the redacted text whenever the remote result is
//! late, broken or leaks an original value.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         PromptGuard                               │
//! │                                                                   │
//! │   raw text                                                        │
//! │      │                                                            │
//! │  ┌───▼───────────────┐     ┌────────────────────────────────┐     │
//! │  │     Detector      │◄────┤ PatternRegistry (Arc, immutable)│     │
//! │  │ context + dedup   │     └──────────────┬─────────────────┘     │
//! │  └───┬───────────────┘                    │                       │
//! │      │ findings                           │                       │
//! │  ┌───▼───────────────┐     ┌──────────────▼─────────────────┐     │
//! │  │  RiskAggregator   │     │           Redactor              │     │
//! │  │ + ComplianceMapper│     │ tokens + audit trail            │     │
//! │  └───────────────────┘     └──────────────┬─────────────────┘     │
//! │                                           │ redacted text         │
//! │                            ┌──────────────▼─────────────────┐     │
//! │                            │      RewriteOrchestrator        │     │
//! │                            │ one bounded remote attempt,     │     │
//! │                            │ leakage check, local fallback   │     │
//! │                            └──────────────┬─────────────────┘     │
//! └───────────────────────────────────────────┼──────────────────────┘
//!                                             │ redacted text + labels
//!                                  ┌──────────▼──────────┐
//!                                  │  Rewrite backend     │
//!                                  │  (OpenAI-compatible) │
//!                                  └─────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`privacy`]: rule table, registry, detection, risk, compliance, redaction
//! - [`rewrite`]: remote rewrite backend, leakage check, orchestration
//! - [`guard`]: facade wiring one registry through the pipeline
//! - [`api`]: HTTP API for host integrations
//! - [`config`]: Configuration management

pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod privacy;
pub mod rewrite;

pub use config::PromptGuardConfig;
pub use error::{Error, Result};
pub use guard::{PromptGuard, PromptGuardBuilder};
