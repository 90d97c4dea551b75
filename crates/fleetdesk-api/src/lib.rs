// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use fleetdesk_app::{FieldEdit, FieldValue, FormPayload, Page, Section};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const FLEET_PATH: &str = "api/fleet";

/// Blocking client for the fleet list endpoint and its write path.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let base_url = Url::parse(&format!("{trimmed}/"))
            .with_context(|| format!("api.base_url {trimmed:?} is not a valid URL"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "api.base_url must use http or https, got {:?}",
                base_url.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// URL for one page of `section`. `q` is left off when `query` is blank.
    pub fn page_url(
        &self,
        section: Section,
        skip: usize,
        limit: usize,
        query: &str,
    ) -> Result<Url> {
        let mut url = self.fleet_url()?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("section", section.as_str())
                .append_pair("skip", &skip.to_string())
                .append_pair("limit", &limit.to_string());
            let query = query.trim();
            if !query.is_empty() {
                pairs.append_pair("q", query);
            }
        }
        Ok(url)
    }

    pub fn fetch_page<R: DeserializeOwned>(
        &self,
        section: Section,
        skip: usize,
        limit: usize,
        query: &str,
    ) -> Result<Page<R>> {
        let url = self.page_url(section, skip, limit, query)?;
        debug!(%url, "fetching fleet page");
        let body = self.send(self.http.get(url))?;
        Ok(parse_page(section, limit, &body))
    }

    /// Sends a partial update for one field of an existing record.
    pub fn update(&self, edit: &FieldEdit) -> Result<()> {
        let mut data = Map::new();
        data.insert(edit.field.to_owned(), field_json(&edit.value));
        let body = json!({
            "type": edit.section.record_type(),
            "id": edit.id,
            "data": data,
        });
        self.send(self.http.put(self.fleet_url()?).json(&body))
            .with_context(|| format!("update {} {}", edit.section.record_type(), edit.id))?;
        Ok(())
    }

    pub fn create(&self, payload: &FormPayload) -> Result<()> {
        payload.validate()?;
        let data: Map<String, Value> = payload
            .fields()
            .into_iter()
            .filter(|(_, value)| *value != FieldValue::Clear)
            .map(|(name, value)| (name.to_owned(), field_json(&value)))
            .collect();
        let record_type = payload.section().record_type();
        let body = json!({ "type": record_type, "data": data });
        self.send(self.http.post(self.fleet_url()?).json(&body))
            .with_context(|| format!("create {record_type}"))?;
        Ok(())
    }

    pub fn delete(&self, section: Section, id: &str) -> Result<()> {
        let id = id.trim();
        if id.is_empty() {
            bail!("row id is required for a delete");
        }
        let mut url = self.fleet_url()?;
        url.query_pairs_mut()
            .append_pair("type", section.record_type())
            .append_pair("id", id);
        self.send(self.http.delete(url))
            .with_context(|| format!("delete {} {id}", section.record_type()))?;
        Ok(())
    }

    fn fleet_url(&self) -> Result<Url> {
        self.base_url
            .join(FLEET_PATH)
            .with_context(|| format!("build fleet URL from {}", self.base_url()))
    }

    fn send(&self, request: RequestBuilder) -> Result<String> {
        let response = request
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        response.text().context("read fleet response body")
    }
}

/// Reads a list response. Shapes that lack the section's row array come back
/// as a malformed page rather than an error.
pub fn parse_page<R: DeserializeOwned>(section: Section, limit: usize, body: &str) -> Page<R> {
    let key = section.rows_key();
    let mut value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(error) => {
            warn!(section = section.as_str(), %error, "page response is not JSON");
            return Page::malformed();
        }
    };

    let Some(raw_rows) = value.get_mut(key).map(Value::take) else {
        return Page::malformed();
    };
    let rows: Vec<R> = match serde_json::from_value(raw_rows) {
        Ok(rows) => rows,
        Err(error) => {
            warn!(section = section.as_str(), %error, "page rows failed to decode");
            return Page::malformed();
        }
    };

    let total = value
        .get("total")
        .and_then(Value::as_u64)
        .unwrap_or(rows.len() as u64);
    let has_more = value
        .get("hasMore")
        .and_then(Value::as_bool)
        .unwrap_or(rows.len() == limit);
    Page::new(rows, total, has_more)
}

fn field_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(text) => Value::String(text.clone()),
        FieldValue::Number(number) => json!(number),
        FieldValue::Clear => Value::Null,
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!(
            "request to {base_url} timed out -- raise api.timeout or check the server ({error})"
        );
    }
    anyhow!("cannot reach {base_url} -- is the fleet server running? ({error})")
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.error.or(parsed.message)
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    let body = body.trim();
    if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
    message: Option<String>,
}
