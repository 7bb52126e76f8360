//! Google Sheets v4 values API as a [`CellGrid`].

use log::debug;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::auth::{SheetAuth, TokenSource};
use super::grid::{CellBuffer, CellGrid, GridRange};
use crate::config::SheetSettings;
use crate::error::{GridError, Result};

/// Response body of `GET .../values/{range}`.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateRequest<'a> {
    value_input_option: &'static str,
    data: Vec<CellWrite<'a>>,
}

#[derive(Debug, Serialize)]
struct CellWrite<'a> {
    range: String,
    values: [[&'a str; 1]; 1],
}

/// One sheet of a spreadsheet, read and written through the values API.
pub struct SheetsGrid {
    client: reqwest::Client,
    api_base: Url,
    spreadsheet_id: String,
    sheet_title: Option<String>,
    tokens: TokenSource,
    buffer: CellBuffer,
}

impl SheetsGrid {
    pub fn new(
        client: reqwest::Client,
        api_base: &str,
        spreadsheet_id: impl Into<String>,
        sheet_title: Option<String>,
        auth: impl Into<SheetAuth>,
    ) -> Result<Self> {
        let api_base =
            Url::parse(api_base).map_err(|_| GridError::InvalidBaseUrl(api_base.to_string()))?;
        if api_base.cannot_be_a_base() {
            return Err(GridError::InvalidBaseUrl(api_base.to_string()).into());
        }
        Ok(Self {
            client,
            api_base,
            spreadsheet_id: spreadsheet_id.into(),
            sheet_title,
            tokens: TokenSource::new(auth.into()),
            buffer: CellBuffer::default(),
        })
    }

    pub fn from_settings(settings: &SheetSettings) -> Result<Self> {
        Self::new(
            reqwest::Client::new(),
            &settings.api_base,
            &settings.spreadsheet_id,
            settings.sheet_title.clone(),
            settings.auth()?,
        )
    }

    /// Prefix an A1 reference with the sheet title, if one is set.
    fn qualified(&self, a1: &str) -> String {
        match &self.sheet_title {
            Some(title) => format!("'{}'!{}", title.replace('\'', "''"), a1),
            None => a1.to_string(),
        }
    }

    fn endpoint(&self, tail: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str()])
                .extend(tail);
        }
        url
    }

}

/// Pass a success response through; turn anything else into [`GridError::Status`].
pub(super) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GridError::Status {
        status: status.as_u16(),
        body,
    }
    .into())
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl CellGrid for SheetsGrid {
    async fn load(&mut self, range: GridRange) -> Result<()> {
        let a1 = self.qualified(&range.to_string());
        let url = self.endpoint(&["values", a1.as_str()]);
        debug!("GET {}", url);

        let token = self.tokens.bearer(&self.client).await?;
        let response = self
            .client
            .get(url)
            .query(&[("majorDimension", "ROWS"), ("valueRenderOption", "FORMATTED_VALUE")])
            .bearer_auth(token)
            .send()
            .await
            .map_err(GridError::Http)?;
        let body: ValueRange = check_status(response)
            .await?
            .json()
            .await
            .map_err(GridError::Http)?;

        let values = body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        self.buffer.fill(range, values);
        Ok(())
    }

    fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.buffer.get(row, col)
    }

    fn set(&mut self, row: usize, col: usize, value: &str) -> Result<bool> {
        self.buffer.set(row, col, value)
    }

    async fn save(&mut self) -> Result<usize> {
        if self.buffer.staged_len() == 0 {
            return Ok(0);
        }

        let url = self.endpoint(&["values:batchUpdate"]);
        let response = {
            let request = BatchUpdateRequest {
                value_input_option: "RAW",
                data: self
                    .buffer
                    .staged()
                    .map(|((row, col), value)| CellWrite {
                        range: self.qualified(&GridRange::cell_a1(row, col)),
                        values: [[value]],
                    })
                    .collect(),
            };
            debug!("POST {} ({} cells)", url, request.data.len());

            let token = self.tokens.bearer(&self.client).await?;
            self.client
                .post(url)
                .bearer_auth(token)
                .json(&request)
                .send()
                .await
                .map_err(GridError::Http)?
        };
        check_status(response).await?;

        Ok(self.buffer.commit())
    }
}
