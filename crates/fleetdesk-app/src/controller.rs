// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow, bail};
use tracing::{debug, warn};

use crate::columns::{Column, find_column, validate_columns};
use crate::debounce::{DEFAULT_DEBOUNCE, Debouncer};
use crate::ids::{RequestId, SentinelId};
use crate::loader::{DEFAULT_LOOKAHEAD_PX, LoaderDecision, ScrollLoader, SentinelObservation};
use crate::model::{FetchMode, LoadError, Page, PageRequest, Row, Section};
use crate::sort::{SortState, SortStatus, sorted_indices};
use crate::store::RowStore;

pub const PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent<R> {
    Loaded { request_id: RequestId, page: Page<R> },
    Failed { request_id: RequestId, error: String },
}

impl<R> PageEvent<R> {
    pub const fn request_id(&self) -> RequestId {
        match self {
            Self::Loaded { request_id, .. } | Self::Failed { request_id, .. } => *request_id,
        }
    }
}

/// Executes page requests on behalf of a controller.
pub trait PageRuntime<R: Row> {
    fn fetch(&mut self, request: &PageRequest) -> Result<Page<R>>;

    /// Runs `request` and reports through `tx`. The default runs inline;
    /// runtimes that talk to a network override this with a worker.
    fn spawn_fetch(&mut self, request: PageRequest, tx: Sender<PageEvent<R>>) -> Result<()> {
        let request_id = request.request_id;
        let event = match self.fetch(&request) {
            Ok(page) => PageEvent::Loaded { request_id, page },
            Err(error) => PageEvent::Failed {
                request_id,
                error: format!("{error:#}"),
            },
        };
        tx.send(event)
            .map_err(|_| anyhow!("page event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    RowsReplaced { rows: usize, duplicates: usize },
    RowsAppended { rows: usize, duplicates: usize },
    EndOfList,
    LoadFailed(LoadError),
    StaleResultDropped(RequestId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub page_size: usize,
    pub debounce: Duration,
    pub lookahead_px: u32,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            debounce: DEFAULT_DEBOUNCE,
            lookahead_px: DEFAULT_LOOKAHEAD_PX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    request_id: RequestId,
    offset: usize,
    mode: FetchMode,
}

#[derive(Debug, Clone, Default)]
struct SortedView {
    generation: u64,
    sort: SortState,
    order: Vec<usize>,
    valid: bool,
}

/// State and behavior of one incrementally loaded list.
///
/// The controller never performs I/O. Operations that need the server return
/// a [`PageRequest`]; whoever runs it reports back through [`ListController::apply`].
/// Only the most recently issued request is authoritative, so results for
/// anything older are dropped on arrival.
#[derive(Debug)]
pub struct ListController<R: Row> {
    section: Section,
    columns: Vec<Column<R>>,
    page_size: usize,
    store: RowStore<R>,
    debouncer: Debouncer,
    loader: ScrollLoader,
    sort: SortState,
    view: SortedView,
    active_query: String,
    in_flight: Option<InFlight>,
    next_request_id: RequestId,
    is_loading_first_page: bool,
    is_loading_more: bool,
    last_error: Option<LoadError>,
    mounted: bool,
}

impl<R: Row> ListController<R> {
    pub fn new(
        section: Section,
        columns: Vec<Column<R>>,
        options: ControllerOptions,
    ) -> Result<Self> {
        validate_columns(&columns)?;
        if options.page_size == 0 {
            bail!("page size must be positive");
        }

        Ok(Self {
            section,
            columns,
            page_size: options.page_size,
            store: RowStore::new(),
            debouncer: Debouncer::new(options.debounce),
            loader: ScrollLoader::new(options.lookahead_px),
            sort: SortState::default(),
            view: SortedView::default(),
            active_query: String::new(),
            in_flight: None,
            next_request_id: RequestId::default(),
            is_loading_first_page: false,
            is_loading_more: false,
            last_error: None,
            mounted: false,
        })
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn loaded_rows(&self) -> &[R] {
        self.store.rows()
    }

    pub fn total(&self) -> Option<u64> {
        self.store.total()
    }

    pub fn has_more(&self) -> bool {
        self.store.has_more()
    }

    pub fn next_offset(&self) -> usize {
        self.store.next_offset()
    }

    pub fn active_query(&self) -> &str {
        &self.active_query
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn is_loading_first_page(&self) -> bool {
        self.is_loading_first_page
    }

    pub fn is_loading_more(&self) -> bool {
        self.is_loading_more
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight_request(&self) -> Option<RequestId> {
        self.in_flight.map(|in_flight| in_flight.request_id)
    }

    pub fn last_error(&self) -> Option<&LoadError> {
        self.last_error.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Starts watching `sentinel` and requests the first page.
    pub fn mount(&mut self, sentinel: SentinelId) -> PageRequest {
        self.mounted = true;
        self.loader.attach(sentinel);
        self.fetch_page(0, FetchMode::Replace)
    }

    /// Tears the list down: pending search input is dropped and any fetch
    /// still running will have its result ignored.
    pub fn unmount(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!(
                section = self.section.as_str(),
                request_id = in_flight.request_id.get(),
                "cancelled page request on unmount"
            );
        }
        self.mounted = false;
        self.loader.detach();
        self.debouncer.cancel();
        self.is_loading_first_page = false;
        self.is_loading_more = false;
    }

    pub fn set_search_input(&mut self, raw: &str, now: Instant) {
        self.debouncer.input(raw, now);
    }

    /// Advances the search debouncer; a settled query restarts the list.
    pub fn tick(&mut self, now: Instant) -> Option<PageRequest> {
        if !self.mounted {
            return None;
        }
        let query = self.debouncer.poll(now)?;
        Some(self.start_query(query))
    }

    pub fn flush_search(&mut self) -> Option<PageRequest> {
        if !self.mounted {
            return None;
        }
        let query = self.debouncer.flush()?;
        Some(self.start_query(query))
    }

    fn start_query(&mut self, query: String) -> PageRequest {
        self.active_query = query;
        self.store.reset();
        self.last_error = None;
        self.fetch_page(0, FetchMode::Replace)
    }

    /// Issues a request for the page at `offset`, superseding whatever
    /// request was in flight.
    pub fn fetch_page(&mut self, offset: usize, mode: FetchMode) -> PageRequest {
        self.next_request_id = self.next_request_id.next();
        let request_id = self.next_request_id;
        if let Some(previous) = self.in_flight.replace(InFlight {
            request_id,
            offset,
            mode,
        }) {
            debug!(
                section = self.section.as_str(),
                superseded = previous.request_id.get(),
                request_id = request_id.get(),
                "superseded in-flight page request"
            );
        }

        self.is_loading_first_page = offset == 0;
        self.is_loading_more = offset != 0;
        debug!(
            section = self.section.as_str(),
            request_id = request_id.get(),
            skip = offset,
            limit = self.page_size,
            query = %self.active_query,
            "issuing page request"
        );

        PageRequest {
            request_id,
            section: self.section,
            skip: offset,
            limit: self.page_size,
            query: self.active_query.clone(),
            mode,
        }
    }

    /// Reloads the first page for the active query. Loaded rows stay visible
    /// until the new page lands.
    pub fn refresh(&mut self) -> PageRequest {
        self.fetch_page(0, FetchMode::Replace)
    }

    pub fn loader_decision(&self, observation: SentinelObservation) -> LoaderDecision {
        if !self.mounted {
            return LoaderDecision::Detached;
        }
        self.loader
            .decide(observation, self.store.has_more(), self.in_flight.is_some())
    }

    pub fn on_sentinel(&mut self, observation: SentinelObservation) -> Option<PageRequest> {
        match self.loader_decision(observation) {
            LoaderDecision::Load => {
                Some(self.fetch_page(self.store.next_offset(), FetchMode::Append))
            }
            _ => None,
        }
    }

    pub fn apply(&mut self, event: PageEvent<R>) -> Vec<ListEvent> {
        let request_id = event.request_id();
        let in_flight = match self.in_flight {
            Some(in_flight) if in_flight.request_id == request_id => in_flight,
            _ => {
                debug!(
                    section = self.section.as_str(),
                    request_id = request_id.get(),
                    "dropping result for superseded page request"
                );
                return vec![ListEvent::StaleResultDropped(request_id)];
            }
        };

        self.in_flight = None;
        self.is_loading_first_page = false;
        self.is_loading_more = false;

        match event {
            PageEvent::Loaded { page, .. } if page.malformed => {
                warn!(
                    section = self.section.as_str(),
                    skip = in_flight.offset,
                    rows_key = self.section.rows_key(),
                    "page response is missing its row array"
                );
                self.last_error = Some(LoadError::MalformedResponse);
                vec![ListEvent::LoadFailed(LoadError::MalformedResponse)]
            }
            PageEvent::Loaded { page, .. } => {
                self.last_error = None;
                self.apply_page(in_flight, page)
            }
            PageEvent::Failed { error, .. } => {
                warn!(
                    section = self.section.as_str(),
                    skip = in_flight.offset,
                    %error,
                    "page load failed"
                );
                let error = LoadError::Transport(error);
                self.last_error = Some(error.clone());
                vec![ListEvent::LoadFailed(error)]
            }
        }
    }

    fn apply_page(&mut self, in_flight: InFlight, page: Page<R>) -> Vec<ListEvent> {
        let mut events = Vec::new();
        match in_flight.mode {
            FetchMode::Replace => {
                let update = self.store.replace(page.rows, page.total, page.has_more);
                events.push(ListEvent::RowsReplaced {
                    rows: update.kept,
                    duplicates: update.duplicates,
                });
                if update.duplicates > 0 {
                    warn!(
                        section = self.section.as_str(),
                        duplicates = update.duplicates,
                        "first page repeated row ids"
                    );
                }
            }
            FetchMode::Append => {
                let update = self.store.append(page.rows, page.total, page.has_more);
                events.push(ListEvent::RowsAppended {
                    rows: update.kept,
                    duplicates: update.duplicates,
                });
                if update.duplicates > 0 {
                    warn!(
                        section = self.section.as_str(),
                        skip = in_flight.offset,
                        duplicates = update.duplicates,
                        "server returned rows that were already loaded"
                    );
                }
            }
        }
        if !self.store.has_more() {
            events.push(ListEvent::EndOfList);
        }
        events
    }

    pub fn click_header(&mut self, key: &str) -> SortStatus {
        match find_column(&self.columns, key) {
            Some(column) if column.sortable => self.sort.click(column.key),
            _ => SortStatus::Unavailable,
        }
    }

    /// Loaded rows in display order. The ordering is cached until rows or
    /// sort state change.
    pub fn visible_rows(&mut self) -> Vec<&R> {
        self.refresh_view();
        let rows = self.store.rows();
        self.view
            .order
            .iter()
            .filter_map(|&index| rows.get(index))
            .collect()
    }

    fn refresh_view(&mut self) {
        let generation = self.store.generation();
        if self.view.valid && self.view.generation == generation && self.view.sort == self.sort {
            return;
        }
        self.view = SortedView {
            generation,
            sort: self.sort,
            order: sorted_indices(self.store.rows(), &self.columns, self.sort),
            valid: true,
        };
    }
}

/// Applies every event already waiting on `rx`.
pub fn drain_events<R: Row>(
    controller: &mut ListController<R>,
    rx: &Receiver<PageEvent<R>>,
) -> Vec<ListEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.extend(controller.apply(event));
    }
    events
}

/// Hands `request` to `runtime`, then applies results until the controller
/// has nothing in flight or `timeout` passes.
pub fn run_request<R: Row, T: PageRuntime<R>>(
    controller: &mut ListController<R>,
    runtime: &mut T,
    request: PageRequest,
    tx: &Sender<PageEvent<R>>,
    rx: &Receiver<PageEvent<R>>,
    timeout: Duration,
) -> Result<Vec<ListEvent>> {
    runtime.spawn_fetch(request, tx.clone())?;

    let deadline = Instant::now() + timeout;
    let mut events = Vec::new();
    while controller.is_fetching() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            bail!(
                "timed out after {timeout:?} waiting for {} page",
                controller.section().as_str()
            );
        }
        match rx.recv_timeout(remaining) {
            Ok(event) => events.extend(controller.apply(event)),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                bail!("page event channel closed")
            }
        }
    }
    Ok(events)
}
