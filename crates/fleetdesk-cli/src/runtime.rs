// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use fleetdesk_api::Client;
use fleetdesk_app::{Page, PageEvent, PageRequest, PageRuntime, Row};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use tracing::debug;

/// Runs page requests against the fleet API, one worker thread per request.
pub struct HttpRuntime<R> {
    client: Arc<Client>,
    rows: PhantomData<fn() -> R>,
}

impl<R> HttpRuntime<R> {
    pub fn new(client: Arc<Client>) -> Self {
        Self {
            client,
            rows: PhantomData,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl<R> PageRuntime<R> for HttpRuntime<R>
where
    R: Row + DeserializeOwned + Send + 'static,
{
    fn fetch(&mut self, request: &PageRequest) -> Result<Page<R>> {
        fetch_page(&self.client, request)
    }

    fn spawn_fetch(&mut self, request: PageRequest, tx: Sender<PageEvent<R>>) -> Result<()> {
        let client = Arc::clone(&self.client);
        let request_id = request.request_id;
        thread::Builder::new()
            .name(format!("fleet-page-{}", request_id.get()))
            .spawn(move || {
                let event = match fetch_page(&client, &request) {
                    Ok(page) => PageEvent::Loaded { request_id, page },
                    Err(error) => PageEvent::Failed {
                        request_id,
                        error: format!("{error:#}"),
                    },
                };
                if tx.send(event).is_err() {
                    debug!(
                        request_id = request_id.get(),
                        "page result arrived after the list went away"
                    );
                }
            })
            .context("spawn page fetch worker")?;
        Ok(())
    }
}

fn fetch_page<R: DeserializeOwned>(client: &Client, request: &PageRequest) -> Result<Page<R>> {
    client.fetch_page(
        request.section,
        request.skip,
        request.limit,
        &request.query,
    )
}
