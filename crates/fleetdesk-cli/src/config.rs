// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use fleetdesk_app::{ControllerOptions, DEFAULT_DEBOUNCE, DEFAULT_LOOKAHEAD_PX, PAGE_SIZE};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const APP_NAME: &str = "fleetdesk";
pub const CONFIG_PATH_ENV: &str = "FLEETDESK_CONFIG_PATH";

const CONFIG_VERSION: i64 = 1;
const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_API_TIMEOUT: &str = "10s";
const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub list: List,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            list: List::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_API_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_API_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct List {
    pub page_size: Option<i64>,
    pub debounce: Option<String>,
    pub lookahead_px: Option<i64>,
}

impl Default for List {
    fn default() -> Self {
        Self {
            page_size: Some(PAGE_SIZE as i64),
            debounce: Some(format!("{}ms", DEFAULT_DEBOUNCE.as_millis())),
            lookahead_px: Some(i64::from(DEFAULT_LOOKAHEAD_PX)),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is missing `version = 1`; add it and keep values under [api] and [list]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.api.base_url {
            validate_base_url(base_url)
                .with_context(|| format!("api.base_url in {}", path.display()))?;
        }

        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed.is_zero() {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(page_size) = self.list.page_size
            && !(1..=MAX_PAGE_SIZE).contains(&page_size)
        {
            bail!(
                "list.page_size in {} must be between 1 and {MAX_PAGE_SIZE}, got {}",
                path.display(),
                page_size
            );
        }

        if let Some(debounce) = &self.list.debounce {
            parse_duration(debounce)
                .with_context(|| format!("list.debounce in {}", path.display()))?;
        }

        if let Some(lookahead) = self.list.lookahead_px
            && u32::try_from(lookahead).is_err()
        {
            bail!(
                "list.lookahead_px in {} must be non-negative, got {}",
                path.display(),
                lookahead
            );
        }

        Ok(())
    }

    pub fn api_base_url(&self) -> &str {
        self.api
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_API_TIMEOUT))
    }

    pub fn page_size(&self) -> usize {
        self.list
            .page_size
            .and_then(|size| usize::try_from(size).ok())
            .filter(|size| *size > 0)
            .unwrap_or(PAGE_SIZE)
    }

    pub fn debounce(&self) -> Result<Duration> {
        match &self.list.debounce {
            Some(raw) => parse_duration(raw),
            None => Ok(DEFAULT_DEBOUNCE),
        }
    }

    pub fn lookahead_px(&self) -> u32 {
        self.list
            .lookahead_px
            .and_then(|px| u32::try_from(px).ok())
            .unwrap_or(DEFAULT_LOOKAHEAD_PX)
    }

    pub fn controller_options(&self) -> Result<ControllerOptions> {
        Ok(ControllerOptions {
            page_size: self.page_size(),
            debounce: self.debounce()?,
            lookahead_px: self.lookahead_px(),
        })
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# fleetdesk config\n# Place this file at: {}\n# or point {} at it.\n\nversion = 1\n\n[api]\nbase_url = \"{}\"\ntimeout = \"{}\"\n\n[list]\npage_size = {}\ndebounce = \"{}ms\"\n# Distance in pixels below the viewport at which the next page starts loading.\nlookahead_px = {}\n",
            path.display(),
            CONFIG_PATH_ENV,
            DEFAULT_API_BASE_URL,
            DEFAULT_API_TIMEOUT,
            PAGE_SIZE,
            DEFAULT_DEBOUNCE.as_millis(),
            DEFAULT_LOOKAHEAD_PX,
        )
    }
}

fn validate_base_url(raw: &str) -> Result<()> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("base URL must not be empty");
    }
    let url = Url::parse(trimmed)
        .with_context(|| format!("{trimmed:?} is not a URL; use e.g. {DEFAULT_API_BASE_URL}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("{trimmed:?} must use http or https");
    }
    if url.host_str().is_none_or(str::is_empty) {
        bail!("{trimmed:?} has no host");
    }
    if url.query().is_some() || url.fragment().is_some() {
        bail!("{trimmed:?} must not carry a query string or fragment");
    }
    Ok(())
}

pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 300ms or 10s)")
}
