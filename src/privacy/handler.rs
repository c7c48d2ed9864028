//! HTTP handlers for the Guard API
//!
//! Host integrations call these endpoints before a prompt leaves the page:
//! - POST /api/v1/guard/analyze: detection report with metadata
//! - POST /api/v1/guard/redact: token redaction with audit trail
//! - POST /api/v1/guard/rewrite: redaction plus remote rewrite
//! - GET /api/v1/guard/rules: rule listing (filterable by category)
//! - GET /api/v1/guard/frameworks: compliance frameworks
//!
//! Request bodies are read as loose JSON whatever their content type. An
//! empty or unparseable body, or a missing or non-string `text`, yields the
//! zero-value result instead of an error.

use crate::api::ApiError;
use crate::guard::PromptGuard;
use crate::privacy::{Category, ComplianceFramework, PatternRule, RiskLevel};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Platform label used when the caller sends none
const UNKNOWN_PLATFORM: &str = "unknown";

/// Create the guard router
pub fn guard_router(guard: Arc<PromptGuard>) -> Router {
    Router::new()
        .route("/api/v1/guard/analyze", post(analyze))
        .route("/api/v1/guard/redact", post(redact))
        .route("/api/v1/guard/rewrite", post(rewrite))
        .route("/api/v1/guard/rules", get(list_rules))
        .route("/api/v1/guard/frameworks", get(list_frameworks))
        .with_state(guard)
}

// =============================================================================
// Request / Response types
// =============================================================================

/// Query params for listing rules
#[derive(Debug, Deserialize)]
pub struct RulesQuery {
    pub category: Option<String>,
}

/// Rule info response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleInfo {
    pub id: String,
    pub category: Category,
    pub risk_level: RiskLevel,
    pub replacement_token: String,
    pub context_keywords: Vec<String>,
    pub frameworks: Vec<ComplianceFramework>,
    pub description: String,
}

/// Framework info response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkInfo {
    pub id: ComplianceFramework,
    pub name: String,
    pub description: String,
    pub rules: Vec<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Parse a request body, treating anything that is not JSON as null
fn loose_json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).unwrap_or_default()
}

fn text_field(body: &serde_json::Value) -> Option<&str> {
    body.get("text").and_then(|v| v.as_str())
}

fn rule_info(guard: &PromptGuard, rule: &PatternRule) -> RuleInfo {
    RuleInfo {
        id: rule.id().to_string(),
        category: rule.category(),
        risk_level: rule.risk_level(),
        replacement_token: rule.replacement_token().to_string(),
        context_keywords: rule.context_keywords().to_vec(),
        frameworks: guard.mapper().frameworks_for(rule.id()),
        description: rule.description().to_string(),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/v1/guard/analyze
async fn analyze(
    State(guard): State<Arc<PromptGuard>>,
    body: Bytes,
) -> impl IntoResponse {
    let body = loose_json(&body);
    let platform = body
        .get("platform")
        .and_then(|v| v.as_str())
        .unwrap_or(UNKNOWN_PLATFORM);

    Json(guard.analyze(text_field(&body), platform))
}

/// POST /api/v1/guard/redact
async fn redact(
    State(guard): State<Arc<PromptGuard>>,
    body: Bytes,
) -> impl IntoResponse {
    let body = loose_json(&body);
    let result = match text_field(&body) {
        Some(text) => guard.redact(text),
        None => Default::default(),
    };
    Json(result)
}

/// POST /api/v1/guard/rewrite
async fn rewrite(
    State(guard): State<Arc<PromptGuard>>,
    body: Bytes,
) -> impl IntoResponse {
    let body = loose_json(&body);
    let text = text_field(&body).unwrap_or_default();
    Json(guard.rewrite(text).await)
}

/// GET /api/v1/guard/rules?category=secrets
async fn list_rules(
    State(guard): State<Arc<PromptGuard>>,
    Query(params): Query<RulesQuery>,
) -> impl IntoResponse {
    let category = match params.category.as_deref().map(str::parse::<Category>) {
        None => None,
        Some(Ok(category)) => Some(category),
        Some(Err(message)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!(ApiError::bad_request(message))),
            );
        }
    };

    let rules: Vec<RuleInfo> = guard
        .registry()
        .all_rules()
        .iter()
        .filter(|r| category.map_or(true, |c| r.category() == c))
        .map(|r| rule_info(&guard, r))
        .collect();

    (StatusCode::OK, Json(serde_json::json!(rules)))
}

/// GET /api/v1/guard/frameworks
async fn list_frameworks(State(guard): State<Arc<PromptGuard>>) -> impl IntoResponse {
    let frameworks: Vec<FrameworkInfo> = guard
        .frameworks()
        .iter()
        .map(|f| FrameworkInfo {
            id: *f,
            name: f.name().to_string(),
            description: f.description().to_string(),
            rules: f.triggers().iter().map(|t| t.to_string()).collect(),
        })
        .collect();

    Json(frameworks)
}
