// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::columns::{CellValue, Column, ColumnKind, find_column};
use crate::model::SortDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: &'static str,
    pub direction: SortDirection,
}

/// Header-click sort state: unset, then asc, then desc, then unset again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    active: Option<SortSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortStatus {
    Unavailable,
    Asc(&'static str),
    Desc(&'static str),
    Cleared,
}

impl SortStatus {
    pub fn message(self) -> String {
        match self {
            Self::Unavailable => "sort unavailable".to_owned(),
            Self::Asc(column) => format!("sort {column} asc"),
            Self::Desc(column) => format!("sort {column} desc"),
            Self::Cleared => "sort cleared".to_owned(),
        }
    }
}

impl SortState {
    pub const fn unsorted() -> Self {
        Self { active: None }
    }

    pub const fn by(key: &'static str, direction: SortDirection) -> Self {
        Self {
            active: Some(SortSpec { key, direction }),
        }
    }

    pub const fn spec(self) -> Option<SortSpec> {
        self.active
    }

    pub fn key(self) -> Option<&'static str> {
        self.active.map(|spec| spec.key)
    }

    pub fn direction(self) -> Option<SortDirection> {
        self.active.map(|spec| spec.direction)
    }

    /// Advances the state for a click on `key`. A different column always
    /// starts over at ascending.
    pub fn click(&mut self, key: &'static str) -> SortStatus {
        self.active = match self.active {
            Some(SortSpec {
                key: current,
                direction: SortDirection::Asc,
            }) if current == key => Some(SortSpec {
                key,
                direction: SortDirection::Desc,
            }),
            Some(SortSpec {
                key: current,
                direction: SortDirection::Desc,
            }) if current == key => None,
            _ => Some(SortSpec {
                key,
                direction: SortDirection::Asc,
            }),
        };

        match self.active {
            Some(SortSpec {
                direction: SortDirection::Asc,
                ..
            }) => SortStatus::Asc(key),
            Some(SortSpec {
                direction: SortDirection::Desc,
                ..
            }) => SortStatus::Desc(key),
            None => SortStatus::Cleared,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(Option<f64>),
    Millis(i64),
    Text(String),
}

impl SortKey {
    fn from_cell(kind: ColumnKind, cell: &CellValue) -> Self {
        match kind {
            ColumnKind::Numeric => Self::Number(cell.as_number()),
            ColumnKind::Date => Self::Millis(epoch_millis(cell).unwrap_or(0)),
            ColumnKind::Text => Self::Text(cell.display().to_lowercase()),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(left), Self::Number(right)) => match (left, right) {
                (Some(left), Some(right)) => left.total_cmp(right),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            (Self::Millis(left), Self::Millis(right)) => left.cmp(right),
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            _ => Ordering::Equal,
        }
    }
}

/// Display order of `rows` as indices into the slice. Arrival order is kept
/// when unsorted and among equal keys.
pub fn sorted_indices<R>(rows: &[R], columns: &[Column<R>], state: SortState) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    let Some(spec) = state.spec() else {
        return order;
    };
    let Some(column) = find_column(columns, spec.key) else {
        return order;
    };

    let keys: Vec<SortKey> = rows
        .iter()
        .map(|row| SortKey::from_cell(column.kind, &column.value(row)))
        .collect();

    // slice::sort_by is stable.
    order.sort_by(|&left, &right| {
        let ordering = keys[left].compare(&keys[right]);
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    order
}

pub fn sort_rows<R: Clone>(rows: &[R], columns: &[Column<R>], state: SortState) -> Vec<R> {
    sorted_indices(rows, columns, state)
        .into_iter()
        .map(|index| rows[index].clone())
        .collect()
}

/// Milliseconds since the Unix epoch for a date-like cell.
pub fn epoch_millis(cell: &CellValue) -> Option<i64> {
    let raw = match cell {
        CellValue::Date(Some(value)) | CellValue::Text(Some(value)) => value.trim(),
        CellValue::Number(Some(value)) => return Some(*value as i64),
        _ => return None,
    };
    if raw.is_empty() {
        return None;
    }

    let parsed = OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .or_else(|| {
            PrimitiveDateTime::parse(
                raw,
                format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
            )
            .ok()
            .map(PrimitiveDateTime::assume_utc)
        })
        .or_else(|| {
            PrimitiveDateTime::parse(
                raw,
                format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
            )
            .ok()
            .map(PrimitiveDateTime::assume_utc)
        })
        .or_else(|| {
            Date::parse(raw, format_description!("[year]-[month]-[day]"))
                .ok()
                .map(|date| date.midnight().assume_utc())
        })?;

    i64::try_from(parsed.unix_timestamp_nanos() / 1_000_000).ok()
}
