//! PromptGuard facade
//!
//! Wires one shared [`PatternRegistry`] into the detector, redactor and
//! rewrite orchestrator, and exposes the operations host integrations call.

use crate::config::PromptGuardConfig;
use crate::error::Result;
use crate::privacy::{
    AnalysisReport, ComplianceFramework, ComplianceMapper, DetectionResult, Detector,
    PatternRegistry, RedactionResult, Redactor, RiskAggregator,
};
use crate::rewrite::{OpenAiRewriter, RewriteBackend, RewriteOrchestrator, RewriteOutcome};
use std::sync::Arc;

/// Detection, redaction and rewrite over one immutable rule set
#[derive(Debug, Clone)]
pub struct PromptGuard {
    registry: Arc<PatternRegistry>,
    mapper: ComplianceMapper,
    detector: Detector,
    redactor: Redactor,
    orchestrator: RewriteOrchestrator,
}

impl PromptGuard {
    pub fn builder() -> PromptGuardBuilder {
        PromptGuardBuilder::default()
    }

    /// Guard from config, with the OpenAI backend when a key is available
    pub fn from_config(config: &PromptGuardConfig) -> Result<Self> {
        Self::builder().config(config.clone()).build()
    }

    /// Analyze text for a host integration. Absent text yields a
    /// not-flagged, LOW-risk report.
    pub fn analyze(&self, text: Option<&str>, platform: &str) -> AnalysisReport {
        AnalysisReport::new(self.detector.detect_optional(text), platform)
    }

    pub fn detect(&self, text: &str) -> DetectionResult {
        self.detector.detect(text)
    }

    pub fn redact(&self, text: &str) -> RedactionResult {
        self.redactor.redact(text)
    }

    pub async fn rewrite(&self, text: &str) -> RewriteOutcome {
        self.orchestrator.rewrite(text, None).await
    }

    pub fn registry(&self) -> &Arc<PatternRegistry> {
        &self.registry
    }

    pub fn frameworks(&self) -> &'static [ComplianceFramework] {
        self.mapper.frameworks()
    }

    pub fn mapper(&self) -> &ComplianceMapper {
        &self.mapper
    }

    pub fn orchestrator(&self) -> &RewriteOrchestrator {
        &self.orchestrator
    }
}

/// Builder for [`PromptGuard`]
#[derive(Default)]
pub struct PromptGuardBuilder {
    config: PromptGuardConfig,
    registry: Option<Arc<PatternRegistry>>,
    backend: Option<Arc<dyn RewriteBackend>>,
}

impl PromptGuardBuilder {
    pub fn config(mut self, config: PromptGuardConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a prebuilt registry instead of building one from config
    pub fn registry(mut self, registry: Arc<PatternRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use this backend instead of the configured OpenAI one
    pub fn backend(mut self, backend: Arc<dyn RewriteBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn build(self) -> Result<PromptGuard> {
        let registry = match self.registry {
            Some(registry) => registry,
            None => Arc::new(PatternRegistry::from_config(&self.config.detection)?),
        };

        let mapper = ComplianceMapper::new();
        let detector = Detector::with_aggregator(registry.clone(), RiskAggregator::new(mapper));
        let redactor = Redactor::new(registry.clone());

        let rewrite = &self.config.rewrite;
        let backend = match self.backend {
            Some(backend) => Some(backend),
            None => OpenAiRewriter::from_config(rewrite)
                .map(|b| Arc::new(b) as Arc<dyn RewriteBackend>),
        };

        let mut orchestrator = RewriteOrchestrator::new(detector.clone(), redactor.clone())
            .with_timeout(rewrite.timeout())
            .with_pricing(rewrite.pricing());
        if let Some(backend) = backend {
            orchestrator = orchestrator.with_backend(backend);
        }

        tracing::info!(
            rules = registry.len(),
            backend = orchestrator.backend_name().unwrap_or("none"),
            "PromptGuard ready"
        );

        Ok(PromptGuard {
            registry,
            mapper,
            detector,
            redactor,
            orchestrator,
        })
    }
}
