//! Best-effort mirrors of the idea store.
//!
//! A sink only ever sees rows in creation order and deletions by position,
//! the way a spreadsheet would. It is never read back from.

use std::{future::Future, path::PathBuf, pin::Pin, time::Duration};

use reqwest::Client;
use tokio::sync::Mutex;
use url::Url;

use super::types::SinkRow;
use crate::{config::SinkConfig, error::SinkError};

pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + 'a>>;

/// An external tabular mirror of the ideas.
pub trait IdeaSink: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Append a row to the end of the table.
    fn append_row<'a>(&'a self, row: &'a SinkRow) -> SinkFuture<'a>;

    /// Delete the data row at this 1-based `position`.
    fn delete_row(&self, position: u64) -> SinkFuture<'_>;
}

/// Build a sink from its config.
pub fn from_config(config: &SinkConfig) -> Result<Box<dyn IdeaSink>, SinkError> {
    Ok(match config {
        SinkConfig::Sheets {
            spreadsheet_id,
            sheet_id,
            range,
            token_path,
            header_rows,
        } => {
            let token = std::fs::read_to_string(token_path)?;
            Box::new(SheetsSink::new(
                spreadsheet_id,
                *sheet_id,
                range,
                token.trim(),
                *header_rows,
            )?)
        }
        SinkConfig::JsonFile { path } => Box::new(JsonFileSink::new(path.clone())),
    })
}

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";
const SHEETS_TIMEOUT: Duration = Duration::from_secs(10);

/// Mirrors ideas into a Google Sheets spreadsheet.
pub struct SheetsSink {
    client: Client,
    append_url: Url,
    batch_update_url: Url,
    sheet_id: i64,
    header_rows: u64,
    token: String,
}

impl SheetsSink {
    pub fn new(
        spreadsheet_id: &str,
        sheet_id: i64,
        range: &str,
        token: &str,
        header_rows: u64,
    ) -> Result<SheetsSink, SinkError> {
        if token.is_empty() {
            return Err(SinkError::BadConfig("Sheets access token is empty".into()));
        }

        let base = Url::parse(SHEETS_API_BASE)
            .map_err(|e| SinkError::BadConfig(format!("bad Sheets API URL: {e}")))?;

        // Pushing path segments percent-encodes them, so ranges like
        // "Ideas list!A:D" come out right.
        let append_segment = format!("{range}:append");
        let mut append_url = base.clone();
        append_url
            .path_segments_mut()
            .map_err(|()| SinkError::BadConfig("Sheets API URL can't have a path".into()))?
            .pop_if_empty()
            .extend([spreadsheet_id, "values", append_segment.as_str()]);
        append_url
            .query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let batch_update_segment = format!("{spreadsheet_id}:batchUpdate");
        let mut batch_update_url = base;
        batch_update_url
            .path_segments_mut()
            .map_err(|()| SinkError::BadConfig("Sheets API URL can't have a path".into()))?
            .pop_if_empty()
            .push(&batch_update_segment);

        let client = Client::builder().timeout(SHEETS_TIMEOUT).build()?;

        Ok(SheetsSink {
            client,
            append_url,
            batch_update_url,
            sheet_id,
            header_rows,
            token: token.to_string(),
        })
    }

    async fn post(&self, url: &Url, body: serde_json::Value) -> Result<(), SinkError> {
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SinkError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    /// Zero-based sheet row index of the data row at 1-based `position`.
    fn row_index(&self, position: u64) -> u64 {
        self.header_rows + position - 1
    }
}

impl IdeaSink for SheetsSink {
    fn name(&self) -> &'static str {
        "Google Sheets"
    }

    fn append_row<'a>(&'a self, row: &'a SinkRow) -> SinkFuture<'a> {
        Box::pin(async move {
            let body = serde_json::json!({ "values": [row.to_cells()] });
            self.post(&self.append_url, body).await
        })
    }

    fn delete_row(&self, position: u64) -> SinkFuture<'_> {
        Box::pin(async move {
            if position == 0 {
                return Err(SinkError::NoSuchRow(position));
            }
            let start = self.row_index(position);
            let body = serde_json::json!({
                "requests": [{
                    "deleteDimension": {
                        "range": {
                            "sheetId": self.sheet_id,
                            "dimension": "ROWS",
                            "startIndex": start,
                            "endIndex": start + 1,
                        }
                    }
                }]
            });
            self.post(&self.batch_update_url, body).await
        })
    }
}

/// Mirrors ideas into a JSON file holding an array of rows.
pub struct JsonFileSink {
    path: PathBuf,
    // Read-modify-write of the whole file.
    lock: Mutex<()>,
}

impl JsonFileSink {
    #[must_use]
    pub fn new(path: PathBuf) -> JsonFileSink {
        JsonFileSink {
            path,
            lock: Mutex::new(()),
        }
    }

    async fn read_rows(&self) -> Result<Vec<Vec<serde_json::Value>>, SinkError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_rows(&self, rows: &[Vec<serde_json::Value>]) -> Result<(), SinkError> {
        let bytes = serde_json::to_vec_pretty(rows)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

impl IdeaSink for JsonFileSink {
    fn name(&self) -> &'static str {
        "JSON file"
    }

    fn append_row<'a>(&'a self, row: &'a SinkRow) -> SinkFuture<'a> {
        Box::pin(async move {
            let _lock = self.lock.lock().await;
            let mut rows = self.read_rows().await?;
            rows.push(row.to_cells());
            self.write_rows(&rows).await
        })
    }

    fn delete_row(&self, position: u64) -> SinkFuture<'_> {
        Box::pin(async move {
            let _lock = self.lock.lock().await;
            let mut rows = self.read_rows().await?;
            let index = usize::try_from(position)
                .ok()
                .and_then(|x| x.checked_sub(1))
                .filter(|&x| x < rows.len())
                .ok_or(SinkError::NoSuchRow(position))?;
            rows.remove(index);
            self.write_rows(&rows).await
        })
    }
}
