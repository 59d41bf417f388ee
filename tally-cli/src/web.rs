//! Tally web adapter
//!
//! Axum server offering a browser form and a small JSON API over the same
//! analysis pipeline the console uses. Transactions and income live only
//! for the duration of a request; the shared state is read-only.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tally_core::Transaction;
use tally_finance::{BudgetAnalysis, analyze};
use tally_ingest::{parse_manual_entries, parse_transactions_csv};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::llm::{Advisor, AdvisorError};

/// Maximum CSV upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Shared, read-only application state
pub struct AppState {
    /// `None` when no credential is configured
    pub advisor: Option<Arc<dyn Advisor>>,
    /// Categories listed in summaries
    pub top_n: usize,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/summary", post(summary_form))
        .route("/ask", post(ask_form))
        .route("/api/analyze", post(api_analyze))
        .route("/api/ask", post(api_ask))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + 64 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Tally listening on http://{}", addr);
    axum::serve(listener, create_router(state))
        .await
        .context("web server failed")
}

// ============================================================================
// Errors
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
        }
    }

    pub fn unavailable(msg: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.to_string(),
        }
    }
}

impl From<AdvisorError> for AppError {
    fn from(err: AdvisorError) -> Self {
        let status = match err {
            AdvisorError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AdvisorError::MissingCredential => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        };
        warn!(error = %err, "advisor request failed");
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, message = %self.message, "request failed");
        }
        let body = Json(serde_json::json!({
            "error": self.message
        }));
        (self.status, body).into_response()
    }
}

fn parse_income(raw: &str) -> Result<Option<f64>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(v) => check_income(Some(v)),
        Err(_) => Err(AppError::bad_request(&format!("Invalid income: {raw}"))),
    }
}

fn check_income(income: Option<f64>) -> Result<Option<f64>, AppError> {
    match income {
        Some(v) if !v.is_finite() || v < 0.0 => Err(AppError::bad_request(
            "Income must be a non-negative number",
        )),
        other => Ok(other),
    }
}

async fn relay(state: &AppState, question: &str) -> Result<String, AppError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::bad_request("Question must not be empty"));
    }
    let advisor = state
        .advisor
        .as_ref()
        .ok_or_else(|| AppError::unavailable("Advisor not configured (set OPENAI_API_KEY)"))?;
    Ok(advisor.ask(question).await?)
}

// ============================================================================
// JSON API
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub income: Option<f64>,
    /// Overrides the server's top-N for the summary text
    #[serde(default)]
    pub top: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub analysis: BudgetAnalysis,
    pub summary: String,
}

/// POST /api/analyze
async fn api_analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let income = check_income(req.income)?;
    let analysis = analyze(&req.transactions, income);
    let summary = analysis.summary(income, req.top.unwrap_or(state.top_n));
    Ok(Json(AnalyzeResponse { analysis, summary }))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// POST /api/ask
async fn api_ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let answer = relay(&state, &req.question).await?;
    Ok(Json(AskResponse { answer }))
}

// ============================================================================
// Browser form
// ============================================================================

async fn index() -> Html<String> {
    Html(page(""))
}

/// POST /summary
///
/// Multipart form with:
/// - income: monthly income (optional)
/// - file: CSV upload with description,amount columns (optional)
/// - entries: manual lines `description,amount`, used when no file is sent
async fn summary_form(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    match summarize_upload(&state, multipart).await {
        Ok(html) => html.into_response(),
        Err(err) => error_page("Could not summarize", err),
    }
}

async fn summarize_upload(state: &AppState, mut multipart: Multipart) -> Result<Html<String>, AppError> {
    let mut income = None;
    let mut entries = String::new();
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "income" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read income"))?;
                income = parse_income(&value)?;
            }
            "entries" => {
                entries = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read entries"))?;
            }
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read file data"))?;
                if bytes.len() > MAX_UPLOAD_SIZE {
                    return Err(AppError::bad_request(&format!(
                        "File too large. Maximum size is {} MB",
                        MAX_UPLOAD_SIZE / 1024 / 1024
                    )));
                }
                // Browsers send an empty part when no file is chosen
                if !bytes.is_empty() {
                    file_data = Some(bytes.to_vec());
                }
            }
            _ => {}
        }
    }

    let txns = match file_data {
        Some(data) => parse_transactions_csv(data.as_slice())
            .map_err(|e| AppError::bad_request(&format!("Invalid CSV: {e:#}")))?,
        None => parse_manual_entries(&entries),
    };

    if txns.is_empty() {
        return Ok(Html(page(
            "<p class=\"notice\">No valid transactions found. Use one <code>description,amount</code> per line.</p>",
        )));
    }

    let text = analyze(&txns, income).summary(income, state.top_n);
    Ok(Html(page(&format!(
        "<h2>Budget Summary</h2>\n<pre>{}</pre>",
        escape_html(&text)
    ))))
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    pub question: String,
}

/// POST /ask
async fn ask_form(State(state): State<Arc<AppState>>, Form(form): Form<AskForm>) -> Response {
    match relay(&state, &form.question).await {
        Ok(answer) => Html(page(&format!(
            "<h2>Advisor</h2>\n<p class=\"answer\">{}</p>",
            escape_html(&answer)
        )))
        .into_response(),
        Err(err) => error_page("Advisor error", err),
    }
}

/// Render an `AppError` inside the form page, keeping its status.
fn error_page(context: &str, err: AppError) -> Response {
    if err.status.is_server_error() {
        error!(status = %err.status, message = %err.message, "request failed");
    }
    (
        err.status,
        Html(page(&format!(
            "<p class=\"error\">{}: {}</p>",
            escape_html(context),
            escape_html(&err.message)
        ))),
    )
        .into_response()
}

fn page(result: &str) -> String {
    format!(
        r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Tally</title></head>
<body>
<h1>Tally: personal budget summary</h1>
<form method="post" action="/summary" enctype="multipart/form-data">
  <label>Monthly income <input name="income" type="number" min="0" step="100"></label>
  <p>Upload a CSV (columns: description,amount)</p>
  <input name="file" type="file" accept=".csv">
  <p>Or enter transactions, one per line (description,amount):</p>
  <textarea name="entries" rows="8" cols="40"></textarea>
  <button type="submit">Summarize</button>
</form>
<h2>Ask the finance advisor</h2>
<form method="post" action="/ask">
  <input name="question" size="60">
  <button type="submit">Ask</button>
</form>
{result}
</body>
</html>
"#
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
