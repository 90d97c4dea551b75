// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;
use std::fmt;

use anyhow::{Result, bail};

use crate::model::{InspectionRow, RepairRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Numeric,
    Date,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(Option<String>),
    Number(Option<f64>),
    Date(Option<String>),
}

impl CellValue {
    pub fn display(&self) -> String {
        match self {
            Self::Text(Some(value)) | Self::Date(Some(value)) => value.clone(),
            Self::Number(Some(value)) if value.fract() == 0.0 => format!("{value:.0}"),
            Self::Number(Some(value)) => format!("{value:.2}"),
            Self::Text(None) | Self::Number(None) | Self::Date(None) => String::new(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => *value,
            Self::Text(Some(value)) | Self::Date(Some(value)) => value.trim().parse().ok(),
            Self::Text(None) | Self::Date(None) => None,
        }
    }
}

/// Declared once per list; `accessor` decides how a row is read for this column.
pub struct Column<R> {
    pub key: &'static str,
    pub label: &'static str,
    pub sortable: bool,
    pub kind: ColumnKind,
    pub accessor: fn(&R) -> CellValue,
}

impl<R> Column<R> {
    pub const fn new(
        key: &'static str,
        label: &'static str,
        kind: ColumnKind,
        accessor: fn(&R) -> CellValue,
    ) -> Self {
        Self {
            key,
            label,
            sortable: true,
            kind,
            accessor,
        }
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn value(&self, row: &R) -> CellValue {
        (self.accessor)(row)
    }
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Column<R> {}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

pub fn validate_columns<R>(columns: &[Column<R>]) -> Result<()> {
    if columns.is_empty() {
        bail!("a list needs at least one column");
    }
    let mut seen = BTreeSet::new();
    for column in columns {
        if column.key.trim().is_empty() {
            bail!("column {:?} has an empty key", column.label);
        }
        if !seen.insert(column.key) {
            bail!("duplicate column key {:?}", column.key);
        }
    }
    Ok(())
}

pub fn find_column<'a, R>(columns: &'a [Column<R>], key: &str) -> Option<&'a Column<R>> {
    columns.iter().find(|column| column.key == key)
}

pub fn repair_columns() -> Vec<Column<RepairRow>> {
    vec![
        Column::new("vehicle", "Vehicle", ColumnKind::Text, |row: &RepairRow| {
            CellValue::Text(Some(row.vehicle.clone()))
        }),
        Column::new("description", "Description", ColumnKind::Text, |row: &RepairRow| {
            CellValue::Text(Some(row.description.clone()))
        }),
        Column::new("status", "Status", ColumnKind::Text, |row: &RepairRow| {
            CellValue::Text(row.status.clone())
        }),
        Column::new("vendor", "Vendor", ColumnKind::Text, |row: &RepairRow| {
            CellValue::Text(row.vendor.clone())
        }),
        Column::new("cost", "Cost", ColumnKind::Numeric, |row: &RepairRow| {
            CellValue::Number(row.cost)
        }),
        Column::new("openedAt", "Opened", ColumnKind::Date, |row: &RepairRow| {
            CellValue::Date(row.opened_at.clone())
        }),
        Column::new("closedAt", "Closed", ColumnKind::Date, |row: &RepairRow| {
            CellValue::Date(row.closed_at.clone())
        }),
        Column::new("id", "ID", ColumnKind::Text, |row: &RepairRow| {
            CellValue::Text(Some(row.id.clone()))
        })
        .unsortable(),
    ]
}

pub fn inspection_columns() -> Vec<Column<InspectionRow>> {
    vec![
        Column::new("vehicle", "Vehicle", ColumnKind::Text, |row: &InspectionRow| {
            CellValue::Text(Some(row.vehicle.clone()))
        }),
        Column::new("inspector", "Inspector", ColumnKind::Text, |row: &InspectionRow| {
            CellValue::Text(row.inspector.clone())
        }),
        Column::new("result", "Result", ColumnKind::Text, |row: &InspectionRow| {
            CellValue::Text(row.result.clone())
        }),
        Column::new("odometer", "Odometer", ColumnKind::Numeric, |row: &InspectionRow| {
            CellValue::Number(row.odometer)
        }),
        Column::new("inspectedAt", "Inspected", ColumnKind::Date, |row: &InspectionRow| {
            CellValue::Date(row.inspected_at.clone())
        }),
        Column::new("notes", "Notes", ColumnKind::Text, |row: &InspectionRow| {
            CellValue::Text(row.notes.clone())
        })
        .unsortable(),
        Column::new("id", "ID", ColumnKind::Text, |row: &InspectionRow| {
            CellValue::Text(Some(row.id.clone()))
        })
        .unsortable(),
    ]
}
