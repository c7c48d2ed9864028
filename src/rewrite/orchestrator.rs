//! Rewrite orchestration
//!
//! ```text
//! INIT ─► LOCAL_REDACTING ─┬─► (no findings) DONE_UNCHANGED
//!                          └─► REMOTE_REWRITE_ATTEMPT ─┬─► REMOTE_SUCCESS ─► DONE
//!                                                      └─► REMOTE_FAILURE ─► DONE
//! ```
//!
//! The remote backend only ever receives the locally redacted text and the
//! detected category labels. Exactly one remote attempt is made per call,
//! bounded by a timeout. Timeouts, transport errors, empty replies and
//! leaked values all end in the locally redacted text.
//!
//! The redacted text is checked for original values before it is sent. If
//! any remain, they are scrubbed and the backend is not called.

use super::backend::{RewriteBackend, RewriteRequest, TokenUsage};
use super::leakage::{find_leaks, scrub_leaks, LeakMatch};
use crate::error::Error;
use crate::privacy::{DetectionResult, Detector, Redactor};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

/// Default bound on the remote call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(8000);

/// Diagnostic used when no backend is configured
pub const DISABLED_REASON: &str = "remote rewrite disabled";

/// How the returned text was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteMethod {
    RemoteRewrite,
    LocalRedactionFallback,
    /// No findings; the input is returned as is
    Unchanged,
}

impl std::fmt::Display for RewriteMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemoteRewrite => write!(f, "remote_rewrite"),
            Self::LocalRedactionFallback => write!(f, "local_redaction_fallback"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Orchestration states, reported in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteState {
    Init,
    LocalRedacting,
    RemoteRewriteAttempt,
    RemoteSuccess,
    RemoteFailure,
    Done,
    DoneUnchanged,
}

/// Token usage and cost of the remote attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteUsage {
    pub tokens_in: u32,
    pub tokens_out: u32,
    /// USD
    pub cost_estimate: f64,
}

/// Result of one orchestration call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteOutcome {
    pub method: RewriteMethod,
    pub text: String,
    pub usage: Option<RewriteUsage>,
    /// Diagnostic only; set when the fallback was taken
    pub error: Option<String>,
}

impl RewriteOutcome {
    fn fallback(text: String, usage: Option<RewriteUsage>, error: String) -> Self {
        Self {
            method: RewriteMethod::LocalRedactionFallback,
            text,
            usage,
            error: Some(error),
        }
    }
}

/// Per-1k-token prices used for `cost_estimate`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewritePricing {
    pub input_cost_per_1k: f64,
    pub output_cost_per_1k: f64,
}

impl Default for RewritePricing {
    fn default() -> Self {
        Self {
            input_cost_per_1k: 0.00015,
            output_cost_per_1k: 0.0006,
        }
    }
}

impl RewritePricing {
    pub fn usage(&self, tokens: TokenUsage) -> RewriteUsage {
        RewriteUsage {
            tokens_in: tokens.prompt_tokens,
            tokens_out: tokens.completion_tokens,
            cost_estimate: tokens.prompt_tokens as f64 / 1000.0 * self.input_cost_per_1k
                + tokens.completion_tokens as f64 / 1000.0 * self.output_cost_per_1k,
        }
    }
}

/// Single-shot, stateless rewrite orchestrator
#[derive(Clone)]
pub struct RewriteOrchestrator {
    detector: Detector,
    redactor: Redactor,
    backend: Option<Arc<dyn RewriteBackend>>,
    timeout: Duration,
    pricing: RewritePricing,
}

impl RewriteOrchestrator {
    /// Orchestrator without a backend; every flagged text falls back
    pub fn new(detector: Detector, redactor: Redactor) -> Self {
        Self {
            detector,
            redactor,
            backend: None,
            timeout: DEFAULT_TIMEOUT,
            pricing: RewritePricing::default(),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn RewriteBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_pricing(mut self, pricing: RewritePricing) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn backend_name(&self) -> Option<&str> {
        self.backend.as_ref().map(|b| b.name())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Rewrite `text`, using `detection` when the caller already has one
    /// for this exact text.
    pub async fn rewrite(&self, text: &str, detection: Option<&DetectionResult>) -> RewriteOutcome {
        trace_state(RewriteState::Init);
        let detection = match detection {
            Some(d) => Cow::Borrowed(d),
            None => Cow::Owned(self.detector.detect(text)),
        };

        if detection.findings.is_empty() {
            trace_state(RewriteState::DoneUnchanged);
            return RewriteOutcome {
                method: RewriteMethod::Unchanged,
                text: text.to_string(),
                usage: None,
                error: None,
            };
        }

        trace_state(RewriteState::LocalRedacting);
        let redacted = self.redactor.redact(text).redacted_text;

        let residue = find_leaks(&self.detector, text, &detection.findings, &redacted);
        let redacted = if residue.is_empty() {
            redacted
        } else {
            scrub_leaks(self.detector.registry(), text, &residue, &redacted)
        };

        let Some(backend) = &self.backend else {
            return self.finish_fallback(redacted, None, DISABLED_REASON.to_string());
        };

        if !residue.is_empty() {
            let err = Error::UnsafeRequest(describe(&residue));
            return self.finish_fallback(redacted, None, err.to_string());
        }

        trace_state(RewriteState::RemoteRewriteAttempt);
        let request = RewriteRequest::new(redacted.clone(), detection.detected_categories.clone());

        let completion = match tokio::time::timeout(self.timeout, backend.rewrite(&request)).await {
            Ok(Ok(completion)) => completion,
            Ok(Err(e)) => return self.finish_fallback(redacted, None, e.to_string()),
            Err(_) => {
                let err = Error::RemoteTimeout(self.timeout.as_millis() as u64);
                return self.finish_fallback(redacted, None, err.to_string());
            }
        };

        let usage = completion.usage.map(|u| self.pricing.usage(u));
        let candidate = normalize_output(&completion.text);

        if candidate.is_empty() {
            let err = Error::Remote("empty response".to_string());
            return self.finish_fallback(redacted, usage, err.to_string());
        }

        let leaks = find_leaks(&self.detector, text, &detection.findings, candidate);
        if !leaks.is_empty() {
            let err = Error::Leakage(describe(&leaks));
            return self.finish_fallback(redacted, usage, err.to_string());
        }

        trace_state(RewriteState::RemoteSuccess);
        trace_state(RewriteState::Done);
        tracing::info!(
            method = %RewriteMethod::RemoteRewrite,
            backend = backend.name(),
            tokens_in = usage.map(|u| u.tokens_in),
            tokens_out = usage.map(|u| u.tokens_out),
            "Rewrite complete"
        );

        RewriteOutcome {
            method: RewriteMethod::RemoteRewrite,
            text: candidate.to_string(),
            usage,
            error: None,
        }
    }

    fn finish_fallback(
        &self,
        redacted: String,
        usage: Option<RewriteUsage>,
        error: String,
    ) -> RewriteOutcome {
        trace_state(RewriteState::RemoteFailure);
        trace_state(RewriteState::Done);
        tracing::warn!(
            method = %RewriteMethod::LocalRedactionFallback,
            reason = %error,
            "Remote rewrite unavailable, returning redacted text"
        );
        RewriteOutcome::fallback(redacted, usage, error)
    }
}

impl std::fmt::Debug for RewriteOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteOrchestrator")
            .field("backend", &self.backend_name())
            .field("timeout", &self.timeout)
            .field("pricing", &self.pricing)
            .finish()
    }
}

fn describe(leaks: &[LeakMatch]) -> String {
    leaks
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn trace_state(state: RewriteState) {
    tracing::trace!(?state, "Rewrite state");
}

/// Trim whitespace and one pair of wrapping quotes
fn normalize_output(text: &str) -> &str {
    let trimmed = text.trim();
    for (open, close) in [('"', '"'), ('\'', '\''), ('\u{201c}', '\u{201d}')] {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.trim();
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::privacy::PatternRegistry;
    use crate::rewrite::backend::RewriteCompletion;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const INPUT: &str = "My email is john.doe@company.com and my API key is \
                         sk-test123456789012345678901234567890123456789012";

    enum Reply {
        Text(&'static str),
        Fail,
        Hang,
    }

    struct MockBackend {
        reply: Reply,
        usage: Option<TokenUsage>,
        requests: Mutex<Vec<RewriteRequest>>,
    }

    impl MockBackend {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                usage: None,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn with_usage(reply: Reply, usage: TokenUsage) -> Arc<Self> {
            Arc::new(Self {
                reply,
                usage: Some(usage),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RewriteBackend for MockBackend {
        async fn rewrite(&self, request: &RewriteRequest) -> Result<RewriteCompletion> {
            self.requests.lock().unwrap().push(request.clone());
            match self.reply {
                Reply::Text(text) => Ok(RewriteCompletion {
                    text: text.to_string(),
                    usage: self.usage,
                }),
                Reply::Fail => Err(Error::Remote("HTTP 503: overloaded".to_string())),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(RewriteCompletion::default())
                }
            }
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn orchestrator() -> RewriteOrchestrator {
        let registry = Arc::new(PatternRegistry::builtin().unwrap());
        RewriteOrchestrator::new(Detector::new(registry.clone()), Redactor::new(registry))
    }

    fn redacted_input() -> String {
        let registry = Arc::new(PatternRegistry::builtin().unwrap());
        Redactor::new(registry).redact(INPUT).redacted_text
    }

    #[tokio::test]
    async fn test_remote_success() {
        let backend = MockBackend::with_usage(
            Reply::Text("  \"Please use my work email and my API credentials.\"\n"),
            TokenUsage {
                prompt_tokens: 1000,
                completion_tokens: 500,
            },
        );
        let outcome = orchestrator()
            .with_backend(backend.clone())
            .rewrite(INPUT, None)
            .await;

        assert_eq!(outcome.method, RewriteMethod::RemoteRewrite);
        assert_eq!(outcome.text, "Please use my work email and my API credentials.");
        assert!(outcome.error.is_none());
        let usage = outcome.usage.unwrap();
        assert_eq!(usage.tokens_in, 1000);
        assert_eq!(usage.tokens_out, 500);
        assert!((usage.cost_estimate - 0.00045).abs() < 1e-12);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_backend_never_sees_raw_values() {
        let backend = MockBackend::new(Reply::Text("Please use my email."));
        orchestrator()
            .with_backend(backend.clone())
            .rewrite(INPUT, None)
            .await;

        let requests = backend.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.redacted_text, redacted_input());
        let wire = format!("{}{}", request.system_prompt, request.user_message());
        assert!(!wire.contains("john.doe@company.com"));
        assert!(!wire.contains("sk-test1234567890"));
        assert!(request.user_message().contains("PII, Secrets"));
    }

    #[tokio::test]
    async fn test_leaked_value_falls_back() {
        let backend = MockBackend::new(Reply::Text(
            "Please email john.doe@company.com about my API credentials.",
        ));
        let outcome = orchestrator().with_backend(backend).rewrite(INPUT, None).await;

        assert_eq!(outcome.method, RewriteMethod::LocalRedactionFallback);
        assert_eq!(outcome.text, redacted_input());
        assert!(outcome.error.unwrap().contains("leaked"));
    }

    #[tokio::test]
    async fn test_residue_in_redacted_text_is_never_sent() {
        let backend = MockBackend::new(Reply::Text("A neutral request."));
        let outcome = orchestrator()
            .with_backend(backend.clone())
            .rewrite("card cvv: 123, order 41234", None)
            .await;

        assert_eq!(backend.calls(), 0);
        assert_eq!(outcome.method, RewriteMethod::LocalRedactionFallback);
        assert_eq!(outcome.text, "card cvv: [CVV_REDACTED], order 4[CVV_REDACTED]4");
        assert!(outcome.error.unwrap().starts_with("Refusing remote rewrite"));
        assert!(outcome.usage.is_none());
    }

    #[tokio::test]
    async fn test_residue_scrubbed_without_backend() {
        let outcome = orchestrator().rewrite("cvv 123 ref 91230", None).await;
        assert_eq!(outcome.method, RewriteMethod::LocalRedactionFallback);
        assert_eq!(outcome.error.as_deref(), Some(DISABLED_REASON));
        assert!(!outcome.text.contains("123"));
    }

    #[tokio::test]
    async fn test_transport_error_falls_back() {
        let outcome = orchestrator()
            .with_backend(MockBackend::new(Reply::Fail))
            .rewrite(INPUT, None)
            .await;

        assert_eq!(outcome.method, RewriteMethod::LocalRedactionFallback);
        assert_eq!(outcome.text, redacted_input());
        assert!(outcome.error.unwrap().contains("503"));
        assert!(outcome.usage.is_none());
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let outcome = orchestrator()
            .with_backend(MockBackend::new(Reply::Hang))
            .with_timeout(Duration::from_millis(50))
            .rewrite(INPUT, None)
            .await;

        assert_eq!(outcome.method, RewriteMethod::LocalRedactionFallback);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Remote rewrite timed out after 50 ms")
        );
        assert!(!outcome.text.contains("john.doe@company.com"));
    }

    #[tokio::test]
    async fn test_empty_reply_falls_back() {
        let backend = MockBackend::with_usage(
            Reply::Text("  \"\" "),
            TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 0,
            },
        );
        let outcome = orchestrator().with_backend(backend).rewrite(INPUT, None).await;

        assert_eq!(outcome.method, RewriteMethod::LocalRedactionFallback);
        assert!(outcome.error.unwrap().contains("empty response"));
        assert_eq!(outcome.usage.unwrap().tokens_in, 10);
    }

    #[tokio::test]
    async fn test_disabled_falls_back() {
        let outcome = orchestrator().rewrite(INPUT, None).await;
        assert_eq!(outcome.method, RewriteMethod::LocalRedactionFallback);
        assert_eq!(outcome.error.as_deref(), Some(DISABLED_REASON));
        assert!(outcome.text.contains("[EMAIL_REDACTED]"));
    }

    #[tokio::test]
    async fn test_no_findings_is_unchanged() {
        let backend = MockBackend::new(Reply::Text("should not be used"));
        let text = "Summarize the plot of Hamlet in two sentences.";
        let outcome = orchestrator()
            .with_backend(backend.clone())
            .rewrite(text, None)
            .await;

        assert_eq!(outcome.method, RewriteMethod::Unchanged);
        assert_eq!(outcome.text, text);
        assert!(outcome.error.is_none());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_uses_supplied_detection() {
        let o = orchestrator();
        let detection = Detector::new(Arc::new(PatternRegistry::builtin().unwrap())).detect(INPUT);
        let outcome = o.rewrite(INPUT, Some(&detection)).await;
        assert_eq!(outcome.method, RewriteMethod::LocalRedactionFallback);

        let outcome = o.rewrite(INPUT, Some(&DetectionResult::empty())).await;
        assert_eq!(outcome.method, RewriteMethod::Unchanged);
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_independent() {
        let o = orchestrator().with_backend(MockBackend::new(Reply::Text("A neutral request.")));
        let (a, b) = tokio::join!(o.rewrite(INPUT, None), o.rewrite("nothing here", None));
        assert_eq!(a.method, RewriteMethod::RemoteRewrite);
        assert_eq!(b.method, RewriteMethod::Unchanged);
    }

    #[test]
    fn test_method_serde() {
        assert_eq!(
            serde_json::to_string(&RewriteMethod::LocalRedactionFallback).unwrap(),
            "\"local_redaction_fallback\""
        );
        assert_eq!(RewriteMethod::Unchanged.to_string(), "unchanged");
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output("  hello \n"), "hello");
        assert_eq!(normalize_output("\"hello\""), "hello");
        assert_eq!(normalize_output("'hi'"), "hi");
        assert_eq!(normalize_output("\u{201c}hi\u{201d}"), "hi");
        assert_eq!(normalize_output("\"unbalanced"), "\"unbalanced");
    }
}
