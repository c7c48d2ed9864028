//! Sensitive-data detection, risk classification and redaction
//!
//! Provides the local, deterministic half of the pipeline:
//! - Declarative rule table compiled into an immutable registry
//! - Detection with context activation and per-value deduplication
//! - Risk aggregation and compliance mapping (HIPAA, PCI DSS, GDPR)
//! - Idempotent token redaction with an audit trail

pub mod analysis;
pub mod compliance;
pub mod detector;
pub mod handler;
mod masking;
pub mod redactor;
pub mod registry;
pub mod risk;
pub mod rules;

pub use analysis::{AnalysisMetadata, AnalysisReport};
pub use compliance::{ComplianceFramework, ComplianceMapper};
pub use detector::{DetectionResult, Detector, Finding, Span};
pub use handler::guard_router;
pub use masking::mask_value;
pub use redactor::{RedactionResult, Redactor, Substitution};
pub use registry::{PatternRegistry, PatternRule};
pub use risk::{RiskAggregator, RiskAssessment};
pub use rules::{builtin_rules, Category, MaskStyle, RiskLevel, RuleDefinition};
