//! Data-link HTTP source.
//!
//! Downloads the full CSV table for a symbol and filters it to the session
//! window locally. Transient failures (5xx, 429, transport errors) are
//! retried with exponential backoff; client errors are not.

use crate::adapters::datalink_reader::parse_rows;
use crate::adapters::datalink_source::{source_url, ApiKey};
use crate::domain::data_row::DataRow;
use crate::domain::error::LinkError;
use crate::domain::value_column::DataDescriptor;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, warn};

pub struct RemoteAdapter {
    client: reqwest::blocking::Client,
    key: ApiKey,
    max_retries: u32,
    base_delay: Duration,
}

impl RemoteAdapter {
    pub fn new(key: ApiKey) -> Result<Self, LinkError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("linktrader/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LinkError::DataSource {
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            key,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    fn download(&self, symbol: &str) -> Result<String, LinkError> {
        let url = source_url(symbol, &self.key);
        let mut last_error = String::new();

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(symbol, attempt, ?delay, "retrying download");
                std::thread::sleep(delay);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp.text().map_err(|e| LinkError::DataSource {
                            reason: format!("{}: failed to read body: {}", symbol, e),
                        });
                    }
                    if status.is_client_error()
                        && status != reqwest::StatusCode::TOO_MANY_REQUESTS
                    {
                        return Err(LinkError::DataSource {
                            reason: format!("HTTP {} for {}", status, symbol),
                        });
                    }
                    last_error = format!("HTTP {} for {}", status, symbol);
                }
                Err(e) => {
                    last_error = format!("{}: {}", symbol, e);
                }
            }
            warn!(symbol, attempt, "download failed: {}", last_error);
        }

        Err(LinkError::DataSource { reason: last_error })
    }
}

impl DataPort for RemoteAdapter {
    fn fetch_rows(
        &self,
        symbol: &str,
        descriptor: &DataDescriptor,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DataRow>, LinkError> {
        let content = self.download(symbol)?;
        let rows = parse_rows(symbol, &content, descriptor).map_err(|source| {
            LinkError::Reader {
                symbol: symbol.to_string(),
                source,
            }
        })?;
        Ok(rows
            .into_iter()
            .filter(|r| r.date >= start_date && r.date <= end_date)
            .collect())
    }
}
