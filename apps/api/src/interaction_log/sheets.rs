//! Google Sheets log sink.
//!
//! Authenticates as a service account: an RS256-signed JWT assertion is
//! exchanged for an access token on every operation. Logging volume is low
//! enough that tokens are not cached.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use super::{LogSink, LogTable};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Invalid service account credentials: {0}")]
    Credentials(#[from] serde_json::Error),

    #[error("Service account signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid Sheets URL: {0}")]
    Url(String),
}

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

pub struct GoogleSheetsSink {
    client: Client,
    client_email: String,
    signing_key: EncodingKey,
    token_uri: String,
    sheets_base: String,
    spreadsheet_id: String,
}

impl GoogleSheetsSink {
    /// Builds a sink from the service-account JSON document.
    pub fn from_credentials_json(
        client: Client,
        credentials_json: &str,
        spreadsheet_id: impl Into<String>,
    ) -> Result<Self, SheetsError> {
        let key: ServiceAccountKey = serde_json::from_str(credentials_json)?;
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;

        Ok(Self {
            client,
            client_email: key.client_email,
            signing_key,
            token_uri: key
                .token_uri
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            sheets_base: SHEETS_API_BASE.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
        })
    }

    pub fn with_sheets_base(mut self, base: impl Into<String>) -> Self {
        self.sheets_base = base.into();
        self
    }

    async fn access_token(&self) -> Result<String, SheetsError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)?;

        let response = self
            .client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<TokenResponse>().await?.access_token)
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}{suffix}`
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, SheetsError> {
        let last_segment = format!("{range}{suffix}");
        let mut url =
            Url::parse(&self.sheets_base).map_err(|e| SheetsError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Url(self.sheets_base.clone()))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                last_segment.as_str(),
            ]);
        Ok(url)
    }
}

fn full_range(table: LogTable) -> String {
    format!("{}!A:Z", table.sheet_name())
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(SheetsError::Api {
        status: status.as_u16(),
        message,
    })
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl LogSink for GoogleSheetsSink {
    async fn append_row(&self, table: LogTable, row: Vec<Value>) -> anyhow::Result<()> {
        let token = self.access_token().await?;
        let mut url = self.values_url(&full_range(table), ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "values": [row] }))
            .send()
            .await?;
        check_status(response).await?;
        debug!("Log appended to {}", table.sheet_name());
        Ok(())
    }

    async fn read_rows(&self, table: LogTable) -> anyhow::Result<Vec<Vec<String>>> {
        let token = self.access_token().await?;
        let url = self.values_url(&full_range(table), "")?;

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let range: ValueRange = check_status(response).await?.json().await?;

        Ok(range
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    async fn write_header(&self, table: LogTable) -> anyhow::Result<()> {
        let token = self.access_token().await?;
        let mut url = self.values_url(&format!("{}!A1", table.sheet_name()), "")?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .json(&json!({ "values": [table.headers()] }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_KEY: &str = include_str!("testdata/service_account_key.pem");

    async fn sink_for(server: &MockServer) -> GoogleSheetsSink {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.test",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .mount(server)
            .await;

        let credentials = json!({
            "type": "service_account",
            "client_email": "logger@portfolio.iam.gserviceaccount.com",
            "private_key": TEST_KEY,
            "token_uri": format!("{}/token", server.uri()),
        })
        .to_string();

        GoogleSheetsSink::from_credentials_json(Client::new(), &credentials, "sheet-123")
            .unwrap()
            .with_sheets_base(server.uri())
    }

    #[test]
    fn test_invalid_credentials_are_rejected() {
        let err = GoogleSheetsSink::from_credentials_json(Client::new(), "not json", "id");
        assert!(matches!(err, Err(SheetsError::Credentials(_))));

        let bad_key = json!({"client_email": "a@b", "private_key": "nope"}).to_string();
        let err = GoogleSheetsSink::from_credentials_json(Client::new(), &bad_key, "id");
        assert!(matches!(err, Err(SheetsError::Signing(_))));
    }

    #[tokio::test]
    async fn test_append_row_posts_raw_values() {
        let server = MockServer::start().await;
        let sink = sink_for(&server).await;

        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-123/values/Chatbot%20Logs!A:Z:append"))
            .and(query_param("valueInputOption", "RAW"))
            .and(query_param("insertDataOption", "INSERT_ROWS"))
            .and(header("authorization", "Bearer ya29.test"))
            .and(body_json(json!({"values": [["2025-01-01T00:00:00.000Z", "hi", 2]]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        sink.append_row(
            LogTable::Chatbot,
            vec![json!("2025-01-01T00:00:00.000Z"), json!("hi"), json!(2)],
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_read_rows_stringifies_cells() {
        let server = MockServer::start().await;
        let sink = sink_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-123/values/Plan%20Generator%20Logs!A:Z"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "range": "'Plan Generator Logs'!A1:K2",
                "values": [["Timestamp", "Company Name"], ["2025-01-01T00:00:00.000Z", "Acme", 12, true]]
            })))
            .mount(&server)
            .await;

        let rows = sink.read_rows(LogTable::PlanGenerator).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["2025-01-01T00:00:00.000Z", "Acme", "12", "true"]);
    }

    #[tokio::test]
    async fn test_api_errors_surface_status() {
        let server = MockServer::start().await;
        let sink = sink_for(&server).await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
            .mount(&server)
            .await;

        let err = sink.write_header(LogTable::Chatbot).await.unwrap_err();
        match err.downcast_ref::<SheetsError>() {
            Some(SheetsError::Api { status, message }) => {
                assert_eq!(*status, 403);
                assert_eq!(message, "PERMISSION_DENIED");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
