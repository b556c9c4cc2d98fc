//! Interaction log: one append-only row per plan or chat interaction in an
//! external spreadsheet, plus a read path that rebuilds structured records.
//!
//! Writes are fire-and-forget: `record_*` spawns the append and returns
//! immediately. Sink failures are reported at `error!` and never retried.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::config::Config;

pub mod handlers;
pub mod sheets;

pub use sheets::GoogleSheetsSink;

const DEFAULT_READ_LIMIT: usize = 1000;
const STATS_READ_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTable {
    PlanGenerator,
    Chatbot,
}

impl LogTable {
    pub fn sheet_name(self) -> &'static str {
        match self {
            LogTable::PlanGenerator => "Plan Generator Logs",
            LogTable::Chatbot => "Chatbot Logs",
        }
    }

    /// Column order is part of the external sheet schema.
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            LogTable::PlanGenerator => &[
                "Timestamp",
                "Company Name",
                "Job Description",
                "Job Description Length",
                "Is URL",
                "Plan",
                "Plan Length",
                "Job Fit",
                "Job Fit Length",
                "Metadata",
                "Error",
            ],
            LogTable::Chatbot => &[
                "Timestamp",
                "Message",
                "Message Length",
                "Conversation History Length",
                "Response",
                "Response Length",
                "Metadata",
                "Error",
            ],
        }
    }
}

/// Backing store for log rows.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn append_row(&self, table: LogTable, row: Vec<Value>) -> anyhow::Result<()>;

    /// All rows of the table, header row included.
    async fn read_rows(&self, table: LogTable) -> anyhow::Result<Vec<Vec<String>>>;

    async fn write_header(&self, table: LogTable) -> anyhow::Result<()>;
}

// ────────────────────────────────────────────────────────────────────────────
// Write path
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct PlanLogEntry {
    pub company_name: String,
    pub job_description: String,
    pub is_url: bool,
    pub plan: String,
    /// Job-fit list as JSON text.
    pub job_fit: String,
    pub metadata: Option<Value>,
    pub error: Option<String>,
}

impl PlanLogEntry {
    fn into_row(self, timestamp: String) -> Vec<Value> {
        let job_description_len = self.job_description.chars().count();
        let plan_len = self.plan.chars().count();
        let job_fit_len = self.job_fit.chars().count();
        vec![
            json!(timestamp),
            json!(self.company_name),
            json!(self.job_description),
            json!(job_description_len),
            json!(self.is_url),
            json!(self.plan),
            json!(plan_len),
            json!(self.job_fit),
            json!(job_fit_len),
            json!(metadata_text(self.metadata)),
            json!(self.error.unwrap_or_default()),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatLogEntry {
    pub message: String,
    pub history_len: usize,
    pub response: String,
    pub metadata: Option<Value>,
    pub error: Option<String>,
}

impl ChatLogEntry {
    fn into_row(self, timestamp: String) -> Vec<Value> {
        let message_len = self.message.chars().count();
        let response_len = self.response.chars().count();
        vec![
            json!(timestamp),
            json!(self.message),
            json!(message_len),
            json!(self.history_len),
            json!(self.response),
            json!(response_len),
            json!(metadata_text(self.metadata)),
            json!(self.error.unwrap_or_default()),
        ]
    }
}

fn metadata_text(metadata: Option<Value>) -> String {
    metadata.unwrap_or_else(|| json!({})).to_string()
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ────────────────────────────────────────────────────────────────────────────
// Read path
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanUserInput {
    pub company_name: String,
    pub job_description: String,
    pub job_description_length: u64,
    pub is_url: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanModelOutput {
    pub plan: String,
    pub plan_length: u64,
    pub job_fit: String,
    pub job_fit_length: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLogRecord {
    pub timestamp: String,
    pub user_input: PlanUserInput,
    pub model_output: PlanModelOutput,
    pub metadata: Value,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUserInput {
    pub message: String,
    pub message_length: u64,
    pub conversation_history_length: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatModelOutput {
    pub response: String,
    pub response_length: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLogRecord {
    pub timestamp: String,
    pub user_input: ChatUserInput,
    pub model_output: ChatModelOutput,
    pub metadata: Value,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStats {
    pub plan_generator: TableStats,
    pub chatbot: TableStats,
}

/// Positional view over one sheet row; missing trailing cells read as empty.
struct Row<'a>(&'a [String]);

impl Row<'_> {
    fn text(&self, idx: usize) -> String {
        self.0.get(idx).cloned().unwrap_or_default()
    }

    fn count(&self, idx: usize) -> u64 {
        self.0
            .get(idx)
            .and_then(|cell| leading_integer(cell))
            .unwrap_or(0)
    }

    fn flag(&self, idx: usize) -> bool {
        self.0
            .get(idx)
            .is_some_and(|cell| cell.trim().eq_ignore_ascii_case("true"))
    }

    fn metadata(&self, idx: usize) -> Value {
        let raw = self.text(idx);
        if raw.is_empty() {
            return json!({});
        }
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Error parsing log metadata JSON: {e}");
            json!({})
        })
    }

    fn error(&self, idx: usize) -> Option<String> {
        Some(self.text(idx)).filter(|e| !e.is_empty())
    }
}

/// Integer prefix of a cell, so "12" and "12.0" both read as 12.
fn leading_integer(cell: &str) -> Option<u64> {
    let digits: String = cell
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn plan_record(row: &[String]) -> PlanLogRecord {
    let row = Row(row);
    PlanLogRecord {
        timestamp: row.text(0),
        user_input: PlanUserInput {
            company_name: row.text(1),
            job_description: row.text(2),
            job_description_length: row.count(3),
            is_url: row.flag(4),
        },
        model_output: PlanModelOutput {
            plan: row.text(5),
            plan_length: row.count(6),
            job_fit: row.text(7),
            job_fit_length: row.count(8),
        },
        metadata: row.metadata(9),
        error: row.error(10),
    }
}

fn chat_record(row: &[String]) -> ChatLogRecord {
    let row = Row(row);
    ChatLogRecord {
        timestamp: row.text(0),
        user_input: ChatUserInput {
            message: row.text(1),
            message_length: row.count(2),
            conversation_history_length: row.count(3),
        },
        model_output: ChatModelOutput {
            response: row.text(4),
            response_length: row.count(5),
        },
        metadata: row.metadata(6),
        error: row.error(7),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Logger
// ────────────────────────────────────────────────────────────────────────────

/// Handle shared by all handlers. A logger without a sink drops every write
/// and reads as empty.
#[derive(Clone, Default)]
pub struct InteractionLogger {
    sink: Option<Arc<dyn LogSink>>,
}

impl InteractionLogger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// Google Sheets sink when both the credentials and the sheet id are
    /// configured; otherwise logging is disabled.
    pub fn from_config(config: &Config, client: Client) -> Self {
        let (Some(credentials), Some(sheet_id)) = (
            config.google_service_account_credentials.as_deref(),
            config.google_sheet_id.as_deref(),
        ) else {
            warn!("Google Sheets logging not configured, interaction logging disabled");
            return Self::disabled();
        };

        match GoogleSheetsSink::from_credentials_json(client, credentials, sheet_id) {
            Ok(sink) => {
                info!("Interaction logging to Google Sheets enabled");
                Self::new(Arc::new(sink))
            }
            Err(e) => {
                error!("Error initializing Google Sheets client, logging disabled: {e}");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn record_plan(&self, entry: PlanLogEntry) {
        self.dispatch(LogTable::PlanGenerator, entry.into_row(now_timestamp()));
    }

    pub fn record_chat(&self, entry: ChatLogEntry) {
        self.dispatch(LogTable::Chatbot, entry.into_row(now_timestamp()));
    }

    /// Spawns the append and returns without waiting for it.
    fn dispatch(&self, table: LogTable, row: Vec<Value>) {
        let Some(sink) = self.sink.clone() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = sink.append_row(table, row).await {
                error!("Error appending to {}: {e:#}", table.sheet_name());
            }
        });
    }

    /// Writes the header row of both tables.
    pub async fn init_headers(&self) {
        let Some(sink) = &self.sink else {
            error!("Google Sheets not configured, cannot initialize headers");
            return;
        };
        for table in [LogTable::PlanGenerator, LogTable::Chatbot] {
            if let Err(e) = sink.write_header(table).await {
                error!("Error initializing {} headers: {e:#}", table.sheet_name());
                return;
            }
        }
        info!("Google Sheets initialized with headers");
    }

    /// Data rows (header skipped), oldest first, at most `limit`.
    async fn data_rows(&self, table: LogTable, limit: usize) -> anyhow::Result<Vec<Vec<String>>> {
        let Some(sink) = &self.sink else {
            return Ok(Vec::new());
        };
        let rows = sink.read_rows(table).await?;
        Ok(rows.into_iter().skip(1).take(limit).collect())
    }

    async fn data_rows_or_empty(&self, table: LogTable, limit: usize) -> Vec<Vec<String>> {
        self.data_rows(table, limit).await.unwrap_or_else(|e| {
            error!("Error reading from {}: {e:#}", table.sheet_name());
            Vec::new()
        })
    }

    pub async fn plan_logs(&self, limit: Option<usize>) -> Vec<PlanLogRecord> {
        let limit = limit.unwrap_or(DEFAULT_READ_LIMIT);
        self.data_rows_or_empty(LogTable::PlanGenerator, limit)
            .await
            .iter()
            .map(|row| plan_record(row))
            .collect()
    }

    pub async fn chatbot_logs(&self, limit: Option<usize>) -> Vec<ChatLogRecord> {
        let limit = limit.unwrap_or(DEFAULT_READ_LIMIT);
        self.data_rows_or_empty(LogTable::Chatbot, limit)
            .await
            .iter()
            .map(|row| chat_record(row))
            .collect()
    }

    /// Row counts per table; zeros when either read fails.
    pub async fn stats(&self) -> LogStats {
        let (plans, chats) = tokio::join!(
            self.data_rows(LogTable::PlanGenerator, STATS_READ_LIMIT),
            self.data_rows(LogTable::Chatbot, STATS_READ_LIMIT),
        );
        match (plans, chats) {
            (Ok(plans), Ok(chats)) => LogStats {
                plan_generator: TableStats { total: plans.len() },
                chatbot: TableStats { total: chats.len() },
            },
            (Err(e), _) | (_, Err(e)) => {
                error!("Error getting log stats: {e:#}");
                LogStats {
                    plan_generator: TableStats { total: 0 },
                    chatbot: TableStats { total: 0 },
                }
            }
        }
    }
}
