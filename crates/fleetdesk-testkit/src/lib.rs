// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

use anyhow::{Context, Result, anyhow, bail};
use fleetdesk_app::{
    InspectionRow, Page, PageEvent, PageRequest, PageRuntime, RepairRow, RequestId, Row,
};
use time::format_description::well_known::Rfc3339;
use time::{Date, Duration, Month, OffsetDateTime};

const REFERENCE_YEAR: i32 = 2026;

const UNIT_PREFIXES: [&str; 5] = ["TRK", "VAN", "BOX", "RFR", "TRL"];

const REPAIR_WORK: [&str; 14] = [
    "Replace brake pads",
    "Replace front rotors",
    "Alternator failure",
    "Coolant leak at water pump",
    "Rear door hinge repair",
    "Liftgate hydraulic leak",
    "Replace windshield",
    "Tire rotation and balance",
    "DEF sensor fault",
    "Reefer unit not cooling",
    "Starter motor replacement",
    "Transmission slipping",
    "Headlight assembly cracked",
    "Mirror bracket broken",
];

const REPAIR_STATUSES: [&str; 4] = ["open", "in_progress", "waiting_parts", "closed"];

const VENDORS: [&str; 8] = [
    "Midway Fleet Service",
    "Apex Truck & Trailer",
    "Summit Diesel",
    "Harbor Tire Co",
    "Central Glass",
    "Reliable Reefer",
    "Northview Auto Electric",
    "Eagle Hydraulics",
];

const INSPECTORS: [&str; 10] = [
    "Avery Walker",
    "Jordan Hill",
    "Taylor Evans",
    "Riley Lopez",
    "Morgan Gray",
    "Casey Ward",
    "Quinn Reed",
    "Parker Diaz",
    "Drew Turner",
    "Rowan Price",
];

const INSPECTION_RESULTS: [&str; 3] = ["pass", "fail", "conditional"];

const INSPECTION_NOTES: [&str; 6] = [
    "Tread depth near minimum",
    "Wiper blades streaking",
    "All lights operational",
    "Minor oil seep at pan",
    "Fire extinguisher expired",
    "No defects found",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Generates believable repair and inspection rows from a fixed seed.
#[derive(Debug, Clone)]
pub struct FleetFaker {
    rng: DeterministicRng,
}

impl FleetFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn unit_number(&mut self) -> String {
        let prefix = self.pick(&UNIT_PREFIXES);
        format!("{prefix}-{:03}", self.rng.int_n(400) + 1)
    }

    pub fn repair(&mut self, index: usize) -> RepairRow {
        let status = self.pick(&REPAIR_STATUSES);
        let opened = self.datetime_in_year(REFERENCE_YEAR);
        let closed_at = (status == "closed")
            .then(|| opened + Duration::days(self.rng.int_n(21) as i64 + 1))
            .map(format_timestamp);
        let vendor = self.rng.bool().then(|| self.pick(&VENDORS).to_owned());
        let cost = (status != "open").then(|| (self.rng.int_n(480_000) as f64) / 100.0 + 25.0);

        RepairRow {
            id: format!("rep-{index:05}"),
            vehicle: self.unit_number(),
            description: self.pick(&REPAIR_WORK).to_owned(),
            status: Some(status.to_owned()),
            vendor,
            cost,
            opened_at: Some(format_timestamp(opened)),
            closed_at,
        }
    }

    pub fn inspection(&mut self, index: usize) -> InspectionRow {
        let result = self.pick(&INSPECTION_RESULTS);
        let notes = (result != "pass" || self.rng.bool())
            .then(|| self.pick(&INSPECTION_NOTES).to_owned());

        InspectionRow {
            id: format!("insp-{index:05}"),
            vehicle: self.unit_number(),
            inspector: Some(self.pick(&INSPECTORS).to_owned()),
            result: Some(result.to_owned()),
            odometer: Some((self.rng.int_n(350_000) + 1_000) as f64),
            inspected_at: Some(format_timestamp(self.datetime_in_year(REFERENCE_YEAR))),
            notes,
        }
    }

    pub fn repairs(&mut self, count: usize) -> Vec<RepairRow> {
        (0..count).map(|index| self.repair(index)).collect()
    }

    pub fn inspections(&mut self, count: usize) -> Vec<InspectionRow> {
        (0..count).map(|index| self.inspection(index)).collect()
    }

    pub fn datetime_in_year(&mut self, year: i32) -> OffsetDateTime {
        let start = midnight_utc(year, Month::January, 1);
        let seconds_in_year = 365 * 24 * 60 * 60;
        start + Duration::seconds(self.rng.int_n(seconds_in_year) as i64)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

/// Text the fake server matches `q` against.
pub trait Searchable: Row {
    fn search_text(&self) -> String;
}

impl Searchable for RepairRow {
    fn search_text(&self) -> String {
        [
            self.vehicle.as_str(),
            self.description.as_str(),
            self.status.as_deref().unwrap_or(""),
            self.vendor.as_deref().unwrap_or(""),
        ]
        .join(" ")
    }
}

impl Searchable for InspectionRow {
    fn search_text(&self) -> String {
        [
            self.vehicle.as_str(),
            self.inspector.as_deref().unwrap_or(""),
            self.result.as_deref().unwrap_or(""),
            self.notes.as_deref().unwrap_or(""),
        ]
        .join(" ")
    }
}

/// In-memory stand-in for `GET /api/fleet`: filters by `q`, then slices by
/// `skip`/`limit`.
#[derive(Debug, Clone)]
pub struct FakeFleetServer<R> {
    rows: Vec<R>,
    requests: Vec<PageRequest>,
    failures: VecDeque<String>,
}

impl<R: Searchable> FakeFleetServer<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows,
            requests: Vec::new(),
            failures: VecDeque::new(),
        }
    }

    pub fn requests(&self) -> &[PageRequest] {
        &self.requests
    }

    /// The next fetch fails with `error` instead of returning a page.
    pub fn fail_next(&mut self, error: &str) {
        self.failures.push_back(error.to_owned());
    }

    pub fn page(&self, skip: usize, limit: usize, query: &str) -> Page<R> {
        let needle = query.trim().to_lowercase();
        let matching: Vec<&R> = self
            .rows
            .iter()
            .filter(|row| needle.is_empty() || row.search_text().to_lowercase().contains(&needle))
            .collect();
        let total = matching.len();
        let rows: Vec<R> = matching
            .into_iter()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect();
        let has_more = skip.saturating_add(rows.len()) < total;
        Page::new(rows, total as u64, has_more)
    }
}

impl<R: Searchable> PageRuntime<R> for FakeFleetServer<R> {
    fn fetch(&mut self, request: &PageRequest) -> Result<Page<R>> {
        self.requests.push(request.clone());
        if let Some(error) = self.failures.pop_front() {
            bail!("{error}");
        }
        Ok(self.page(request.skip, request.limit, &request.query))
    }
}

/// Holds requests until a test resolves them, in whatever order it likes.
#[derive(Debug)]
pub struct DeferredRuntime<R> {
    server: FakeFleetServer<R>,
    pending: Vec<(PageRequest, Sender<PageEvent<R>>)>,
}

impl<R: Searchable> DeferredRuntime<R> {
    pub fn new(server: FakeFleetServer<R>) -> Self {
        Self {
            server,
            pending: Vec::new(),
        }
    }

    pub fn pending(&self) -> Vec<&PageRequest> {
        self.pending.iter().map(|(request, _)| request).collect()
    }

    pub fn server(&self) -> &FakeFleetServer<R> {
        &self.server
    }

    pub fn resolve(&mut self, request_id: RequestId) -> Result<()> {
        let position = self
            .pending
            .iter()
            .position(|(request, _)| request.request_id == request_id)
            .ok_or_else(|| anyhow!("no pending request {}", request_id.get()))?;
        let (request, tx) = self.pending.remove(position);
        let event = match self.server.fetch(&request) {
            Ok(page) => PageEvent::Loaded { request_id, page },
            Err(error) => PageEvent::Failed {
                request_id,
                error: error.to_string(),
            },
        };
        tx.send(event)
            .map_err(|_| anyhow!("page event channel closed"))?;
        Ok(())
    }
}

impl<R: Searchable> PageRuntime<R> for DeferredRuntime<R> {
    fn fetch(&mut self, request: &PageRequest) -> Result<Page<R>> {
        self.server.fetch(request)
    }

    fn spawn_fetch(&mut self, request: PageRequest, tx: Sender<PageEvent<R>>) -> Result<()> {
        self.pending.push((request, tx));
        Ok(())
    }
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56Z"
}

fn format_timestamp(value: OffsetDateTime) -> String {
    value
        .format(&Rfc3339)
        .unwrap_or_else(|_| fixture_datetime().to_owned())
}

fn midnight_utc(year: i32, month: Month, day: u8) -> OffsetDateTime {
    Date::from_calendar_date(year, month, day)
        .map(|date| date.midnight().assume_utc())
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::{FakeFleetServer, FleetFaker, Searchable};
    use fleetdesk_app::{FetchMode, PageRequest, PageRuntime, RequestId, Row, Section};
    use std::collections::BTreeSet;

    #[test]
    fn same_seed_same_rows() {
        let mut left = FleetFaker::new(42);
        let mut right = FleetFaker::new(42);
        assert_eq!(left.repairs(5), right.repairs(5));
        assert_eq!(left.inspections(5), right.inspections(5));
    }

    #[test]
    fn repair_rows_are_consistent() {
        let mut faker = FleetFaker::new(7);
        for row in faker.repairs(200) {
            assert!(row.id.starts_with("rep-"));
            assert!(!row.vehicle.is_empty());
            let closed = row.status.as_deref() == Some("closed");
            assert_eq!(closed, row.closed_at.is_some(), "row {}", row.id);
            if row.status.as_deref() == Some("open") {
                assert!(row.cost.is_none());
            }
        }
    }

    #[test]
    fn ids_are_unique() {
        let mut faker = FleetFaker::new(3);
        let rows = faker.inspections(120);
        let ids: BTreeSet<&str> = rows.iter().map(Row::row_id).collect();
        assert_eq!(ids.len(), 120);
    }

    #[test]
    fn server_pages_are_contiguous() {
        let mut faker = FleetFaker::new(1);
        let server = FakeFleetServer::new(faker.repairs(120));

        let first = server.page(0, 50, "");
        let last = server.page(100, 50, "");
        assert_eq!(first.rows.len(), 50);
        assert_eq!(first.total, 120);
        assert!(first.has_more);
        assert_eq!(last.rows.len(), 20);
        assert!(!last.has_more);
        assert_eq!(last.rows[0].id, "rep-00100");
    }

    #[test]
    fn server_filters_case_insensitively() {
        let mut faker = FleetFaker::new(9);
        let rows = faker.repairs(300);
        let server = FakeFleetServer::new(rows.clone());
        let page = server.page(0, 500, "BRAKE");
        let expected = rows
            .iter()
            .filter(|row| row.search_text().to_lowercase().contains("brake"))
            .count();
        assert_eq!(page.rows.len(), expected);
        assert_eq!(page.total as usize, expected);
    }

    #[test]
    fn injected_failure_applies_once() {
        let mut faker = FleetFaker::new(5);
        let mut server = FakeFleetServer::new(faker.repairs(3));
        server.fail_next("boom");
        let request = PageRequest {
            request_id: RequestId::new(1),
            section: Section::Repairs,
            skip: 0,
            limit: 10,
            query: String::new(),
            mode: FetchMode::Replace,
        };
        assert!(server.fetch(&request).is_err());
        assert_eq!(server.fetch(&request).map(|page| page.rows.len()).ok(), Some(3));
        assert_eq!(server.requests().len(), 2);
    }
}
