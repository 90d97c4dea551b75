// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use fleetdesk_app::{
    ControllerOptions, FetchMode, ListController, ListEvent, LoadError, PageEvent, PageRequest,
    PageRuntime, RepairRow, Row, Section, SentinelId, SentinelObservation, SortStatus,
    drain_events, repair_columns, run_request,
};
use fleetdesk_testkit::{DeferredRuntime, FakeFleetServer, FleetFaker, Searchable};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

const SENTINEL: SentinelId = SentinelId::new(1);
const WAIT: Duration = Duration::from_secs(1);

fn repairs_controller() -> Result<ListController<RepairRow>> {
    ListController::new(
        Section::Repairs,
        repair_columns(),
        ControllerOptions::default(),
    )
}

fn channel() -> (Sender<PageEvent<RepairRow>>, Receiver<PageEvent<RepairRow>>) {
    mpsc::channel()
}

fn visible_sentinel() -> SentinelObservation {
    SentinelObservation::new(SENTINEL, 0)
}

fn ids(rows: &[RepairRow]) -> Vec<String> {
    rows.iter().map(|row| row.row_id().to_owned()).collect()
}

#[test]
fn scrolling_loads_every_page_without_gaps_or_duplicates() -> Result<()> {
    let mut faker = FleetFaker::new(11);
    let all = faker.repairs(120);
    let mut server = FakeFleetServer::new(all.clone());
    let mut list = repairs_controller()?;
    let (tx, rx) = channel();

    let first = list.mount(SENTINEL);
    run_request(&mut list, &mut server, first, &tx, &rx, WAIT)?;
    assert_eq!(list.loaded_rows().len(), 50);
    assert_eq!(list.total(), Some(120));
    assert!(list.has_more());

    while let Some(request) = list.on_sentinel(visible_sentinel()) {
        assert_eq!(request.mode, FetchMode::Append);
        assert_eq!(request.skip, list.next_offset());
        run_request(&mut list, &mut server, request, &tx, &rx, WAIT)?;
        assert_eq!(list.loaded_rows().len(), list.next_offset());
    }

    assert_eq!(ids(list.loaded_rows()), ids(&all));
    assert!(!list.has_more());

    let skips: Vec<usize> = server.requests().iter().map(|request| request.skip).collect();
    assert_eq!(skips, vec![0, 50, 100]);
    assert_eq!(server.requests()[2].limit, 50);

    for _ in 0..5 {
        assert!(list.on_sentinel(visible_sentinel()).is_none());
    }
    assert_eq!(server.requests().len(), 3);
    Ok(())
}

#[test]
fn last_page_reports_end_of_list() -> Result<()> {
    let mut faker = FleetFaker::new(2);
    let mut server = FakeFleetServer::new(faker.repairs(70));
    let mut list = repairs_controller()?;
    let (tx, rx) = channel();

    let first = list.mount(SENTINEL);
    let events = run_request(&mut list, &mut server, first, &tx, &rx, WAIT)?;
    assert_eq!(
        events,
        vec![ListEvent::RowsReplaced {
            rows: 50,
            duplicates: 0
        }]
    );

    let more = list
        .on_sentinel(visible_sentinel())
        .expect("second page should load");
    let events = run_request(&mut list, &mut server, more, &tx, &rx, WAIT)?;
    assert_eq!(
        events,
        vec![
            ListEvent::RowsAppended {
                rows: 20,
                duplicates: 0
            },
            ListEvent::EndOfList,
        ]
    );
    Ok(())
}

#[test]
fn query_change_clears_rows_before_new_page_arrives() -> Result<()> {
    let start = Instant::now();
    let mut faker = FleetFaker::new(4);
    let mut runtime = DeferredRuntime::new(FakeFleetServer::new(faker.repairs(200)));
    let mut list = repairs_controller()?;
    let (tx, rx) = channel();

    let first = list.mount(SENTINEL);
    runtime.spawn_fetch(first.clone(), tx.clone())?;
    runtime.resolve(first.request_id)?;
    drain_events(&mut list, &rx);
    assert_eq!(list.loaded_rows().len(), 50);

    list.set_search_input("brake", start);
    let request = list
        .tick(start + Duration::from_millis(300))
        .expect("settled query should fetch");
    assert!(list.loaded_rows().is_empty());
    assert_eq!(list.next_offset(), 0);
    assert!(list.is_loading_first_page());

    runtime.spawn_fetch(request.clone(), tx.clone())?;
    runtime.resolve(request.request_id)?;
    drain_events(&mut list, &rx);
    assert!(!list.loaded_rows().is_empty());
    assert!(
        list.loaded_rows()
            .iter()
            .all(|row| row.search_text().to_lowercase().contains("brake"))
    );
    Ok(())
}

#[test]
fn late_result_for_old_query_is_discarded() -> Result<()> {
    let start = Instant::now();
    let mut faker = FleetFaker::new(8);
    let mut runtime = DeferredRuntime::new(FakeFleetServer::new(faker.repairs(300)));
    let mut list = repairs_controller()?;
    let (tx, rx) = channel();

    let mounted = list.mount(SENTINEL);
    runtime.spawn_fetch(mounted.clone(), tx.clone())?;
    runtime.resolve(mounted.request_id)?;
    drain_events(&mut list, &rx);

    list.set_search_input("brake", start);
    let fetch_a = list.flush_search().expect("query x");
    runtime.spawn_fetch(fetch_a.clone(), tx.clone())?;

    list.set_search_input("tire", start + Duration::from_millis(10));
    let fetch_b = list.flush_search().expect("query y");
    runtime.spawn_fetch(fetch_b.clone(), tx.clone())?;

    runtime.resolve(fetch_b.request_id)?;
    runtime.resolve(fetch_a.request_id)?;
    let events = drain_events(&mut list, &rx);

    assert!(events.contains(&ListEvent::StaleResultDropped(fetch_a.request_id)));
    assert_eq!(list.active_query(), "tire");
    let expected = runtime.server().page(0, 50, "tire");
    assert_eq!(ids(list.loaded_rows()), ids(&expected.rows));
    assert!(!list.is_fetching());
    Ok(())
}

#[test]
fn typing_quickly_issues_one_fetch() -> Result<()> {
    let start = Instant::now();
    let mut list = repairs_controller()?;
    let _ = list.mount(SENTINEL);

    let mut issued: Vec<PageRequest> = Vec::new();
    list.set_search_input("alpha", start);
    issued.extend(list.tick(start + Duration::from_millis(150)));
    list.set_search_input("alphabet", start + Duration::from_millis(200));
    issued.extend(list.tick(start + Duration::from_millis(400)));
    issued.extend(list.tick(start + Duration::from_millis(500)));
    issued.extend(list.tick(start + Duration::from_millis(900)));

    let queries: Vec<&str> = issued.iter().map(|request| request.query.as_str()).collect();
    assert_eq!(queries, vec!["alphabet"]);
    Ok(())
}

#[test]
fn scroll_does_nothing_when_list_is_exhausted() -> Result<()> {
    let mut faker = FleetFaker::new(6);
    let mut server = FakeFleetServer::new(faker.repairs(10));
    let mut list = repairs_controller()?;
    let (tx, rx) = channel();

    let first = list.mount(SENTINEL);
    run_request(&mut list, &mut server, first, &tx, &rx, WAIT)?;
    assert!(!list.has_more());
    assert!(list.on_sentinel(SentinelObservation::new(SENTINEL, -500)).is_none());
    assert_eq!(server.requests().len(), 1);
    Ok(())
}

#[test]
fn failed_append_keeps_loaded_rows() -> Result<()> {
    let mut faker = FleetFaker::new(12);
    let mut server = FakeFleetServer::new(faker.repairs(90));
    let mut list = repairs_controller()?;
    let (tx, rx) = channel();

    let first = list.mount(SENTINEL);
    run_request(&mut list, &mut server, first, &tx, &rx, WAIT)?;

    server.fail_next("connection reset by peer");
    let more = list
        .on_sentinel(visible_sentinel())
        .expect("append should be issued");
    let events = run_request(&mut list, &mut server, more, &tx, &rx, WAIT)?;
    assert!(matches!(
        events.as_slice(),
        [ListEvent::LoadFailed(LoadError::Transport(message))]
            if message.contains("connection reset")
    ));
    assert_eq!(list.loaded_rows().len(), 50);
    assert_eq!(list.next_offset(), 50);

    let retry = list
        .on_sentinel(visible_sentinel())
        .expect("scrolling again retries");
    assert_eq!(retry.skip, 50);
    run_request(&mut list, &mut server, retry, &tx, &rx, WAIT)?;
    assert_eq!(list.loaded_rows().len(), 90);
    assert_eq!(list.last_error(), None);
    Ok(())
}

#[test]
fn sorting_by_cost_reorders_without_refetching() -> Result<()> {
    let mut faker = FleetFaker::new(21);
    let mut server = FakeFleetServer::new(faker.repairs(40));
    let mut list = repairs_controller()?;
    let (tx, rx) = channel();

    let first = list.mount(SENTINEL);
    run_request(&mut list, &mut server, first, &tx, &rx, WAIT)?;
    let arrival = ids(list.loaded_rows());

    assert_eq!(list.click_header("cost"), SortStatus::Asc("cost"));
    let costs: Vec<Option<f64>> = list.visible_rows().iter().map(|row| row.cost).collect();
    let first_priced = costs.iter().position(Option::is_some).unwrap_or(costs.len());
    assert!(costs[..first_priced].iter().all(Option::is_none));
    let priced: Vec<f64> = costs.iter().flatten().copied().collect();
    assert!(priced.windows(2).all(|pair| pair[0] <= pair[1]));

    assert_eq!(list.click_header("cost"), SortStatus::Desc("cost"));
    assert_eq!(list.click_header("cost"), SortStatus::Cleared);
    let restored: Vec<String> = list
        .visible_rows()
        .iter()
        .map(|row| row.id.clone())
        .collect();
    assert_eq!(restored, arrival);
    assert_eq!(server.requests().len(), 1);
    Ok(())
}
