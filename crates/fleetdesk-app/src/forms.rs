// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use time::Date;
use time::macros::format_description;

use crate::Section;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Date,
}

impl FieldKind {
    /// Reads what a user typed into a field of this kind. Blank input clears
    /// the field.
    pub fn parse(self, field: &str, raw: &str) -> Result<FieldValue> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(FieldValue::Clear);
        }
        match self {
            Self::Text => Ok(FieldValue::Text(trimmed.to_owned())),
            Self::Number => {
                let number: f64 = trimmed
                    .parse()
                    .with_context(|| format!("{field} must be a number, got {trimmed:?}"))?;
                if !number.is_finite() || number < 0.0 {
                    bail!("{field} cannot be negative");
                }
                Ok(FieldValue::Number(number))
            }
            Self::Date => {
                let date = Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
                    .with_context(|| {
                        format!("{field} must be a YYYY-MM-DD date, got {trimmed:?}")
                    })?;
                Ok(FieldValue::Text(date.to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepairFormInput {
    pub vehicle: String,
    pub description: String,
    pub status: String,
    pub vendor: String,
    pub cost: Option<f64>,
    pub opened_at: Date,
    pub closed_at: Option<Date>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectionFormInput {
    pub vehicle: String,
    pub inspector: String,
    pub result: String,
    pub odometer: Option<f64>,
    pub inspected_at: Date,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormPayload {
    Repair(RepairFormInput),
    Inspection(InspectionFormInput),
}

impl FormPayload {
    pub fn section(&self) -> Section {
        match self {
            Self::Repair(_) => Section::Repairs,
            Self::Inspection(_) => Section::Inspections,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Repair(repair) => repair.validate(),
            Self::Inspection(inspection) => inspection.validate(),
        }
    }

    /// Field names and values as the fleet endpoint expects them.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        match self {
            Self::Repair(repair) => vec![
                ("vehicle", text(&repair.vehicle)),
                ("description", text(&repair.description)),
                ("status", text(&repair.status)),
                ("vendor", text(&repair.vendor)),
                ("cost", number(repair.cost)),
                ("openedAt", FieldValue::Text(repair.opened_at.to_string())),
                ("closedAt", date(repair.closed_at)),
            ],
            Self::Inspection(inspection) => vec![
                ("vehicle", text(&inspection.vehicle)),
                ("inspector", text(&inspection.inspector)),
                ("result", text(&inspection.result)),
                ("odometer", number(inspection.odometer)),
                (
                    "inspectedAt",
                    FieldValue::Text(inspection.inspected_at.to_string()),
                ),
                ("notes", text(&inspection.notes)),
            ],
        }
    }
}

impl RepairFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.vehicle.trim().is_empty() {
            bail!("repair vehicle is required -- enter a unit number and retry");
        }
        if self.description.trim().is_empty() {
            bail!("repair description is required -- describe the work and retry");
        }
        if let Some(cost) = self.cost
            && (!cost.is_finite() || cost < 0.0)
        {
            bail!("repair cost cannot be negative");
        }
        if let Some(closed_at) = self.closed_at
            && closed_at < self.opened_at
        {
            bail!("repair close date must be on/after open date");
        }
        Ok(())
    }
}

impl InspectionFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.vehicle.trim().is_empty() {
            bail!("inspection vehicle is required -- enter a unit number and retry");
        }
        if self.result.trim().is_empty() {
            bail!("inspection result is required -- record pass or fail and retry");
        }
        if let Some(odometer) = self.odometer
            && (!odometer.is_finite() || odometer < 0.0)
        {
            bail!("inspection odometer cannot be negative");
        }
        Ok(())
    }
}

/// A single-field inline edit sent as a partial update.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEdit {
    pub section: Section,
    pub id: String,
    pub field: &'static str,
    pub value: FieldValue,
}

impl FieldEdit {
    /// Builds an edit from user input, typed by the field being edited.
    pub fn new(section: Section, id: &str, field: &str, raw: &str) -> Result<Self> {
        if id.trim().is_empty() {
            bail!("row id is required for an edit");
        }
        let Some((field, kind)) = editable_fields(section)
            .iter()
            .copied()
            .find(|(name, _)| *name == field)
        else {
            let names: Vec<&str> = editable_fields(section)
                .iter()
                .map(|(name, _)| *name)
                .collect();
            bail!(
                "{} field {field:?} cannot be edited; editable fields: {}",
                section.record_type(),
                names.join(", ")
            );
        };
        Ok(Self {
            section,
            id: id.trim().to_owned(),
            field,
            value: kind.parse(field, raw)?,
        })
    }
}

pub fn editable_fields(section: Section) -> &'static [(&'static str, FieldKind)] {
    match section {
        Section::Repairs => &[
            ("description", FieldKind::Text),
            ("status", FieldKind::Text),
            ("vendor", FieldKind::Text),
            ("cost", FieldKind::Number),
            ("closedAt", FieldKind::Date),
        ],
        Section::Inspections => &[
            ("inspector", FieldKind::Text),
            ("result", FieldKind::Text),
            ("odometer", FieldKind::Number),
            ("notes", FieldKind::Text),
        ],
    }
}

fn text(value: &str) -> FieldValue {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        FieldValue::Clear
    } else {
        FieldValue::Text(trimmed.to_owned())
    }
}

fn number(value: Option<f64>) -> FieldValue {
    value.map_or(FieldValue::Clear, FieldValue::Number)
}

fn date(value: Option<Date>) -> FieldValue {
    value.map_or(FieldValue::Clear, |date| FieldValue::Text(date.to_string()))
}
