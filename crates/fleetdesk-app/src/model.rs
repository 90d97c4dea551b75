// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::RequestId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    Repairs,
    Inspections,
}

impl Section {
    pub const ALL: [Self; 2] = [Self::Repairs, Self::Inspections];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Repairs => "repairs",
            Self::Inspections => "inspections",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "repairs" => Some(Self::Repairs),
            "inspections" => Some(Self::Inspections),
            _ => None,
        }
    }

    /// Key of the row array in a `GET /api/fleet` response for this section.
    pub const fn rows_key(self) -> &'static str {
        self.as_str()
    }

    /// `type` value used by the write endpoints.
    pub const fn record_type(self) -> &'static str {
        match self {
            Self::Repairs => "repair",
            Self::Inspections => "inspection",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Replace,
    Append,
}

/// A record shown in an incrementally loaded list.
pub trait Row: Clone {
    fn row_id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairRow {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub vehicle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub opened_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
}

impl Row for RepairRow {
    fn row_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRow {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub vehicle: String,
    #[serde(default)]
    pub inspector: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub odometer: Option<f64>,
    #[serde(default)]
    pub inspected_at: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Row for InspectionRow {
    fn row_id(&self) -> &str {
        &self.id
    }
}

/// One server slice of a filtered result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub rows: Vec<R>,
    pub total: u64,
    pub has_more: bool,
    /// The response lacked the section's row array or it failed to decode.
    pub malformed: bool,
}

impl<R> Page<R> {
    pub fn new(rows: Vec<R>, total: u64, has_more: bool) -> Self {
        Self {
            rows,
            total,
            has_more,
            malformed: false,
        }
    }

    pub fn malformed() -> Self {
        Self {
            rows: Vec::new(),
            total: 0,
            has_more: false,
            malformed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub request_id: RequestId,
    pub section: Section,
    pub skip: usize,
    pub limit: usize,
    pub query: String,
    pub mode: FetchMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    Transport(String),
    MalformedResponse,
}

impl LoadError {
    pub fn message(&self) -> String {
        match self {
            Self::Transport(error) => format!("load failed: {error}"),
            Self::MalformedResponse => "load failed: response had no rows for this section".into(),
        }
    }
}

/// Driver scorecard rating. Only maps a label to a display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Fantastic,
    Great,
    Fair,
    Poor,
    Unknown,
}

impl Tier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fantastic => "Fantastic",
            Self::Great => "Great",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::Unknown => "Unknown",
        }
    }

    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "fantastic" | "fantastic plus" | "fantastic+" => Self::Fantastic,
            "great" => Self::Great,
            "fair" => Self::Fair,
            "poor" => Self::Poor,
            _ => Self::Unknown,
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::Fantastic => "#16a34a",
            Self::Great => "#2563eb",
            Self::Fair => "#d97706",
            Self::Poor => "#dc2626",
            Self::Unknown => "#6b7280",
        }
    }
}
