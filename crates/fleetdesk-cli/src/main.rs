// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use fleetdesk_api::Client;
use fleetdesk_app::{
    Column, ControllerOptions, FieldEdit, ListController, PageRequest, Row, Section, SentinelId,
    SentinelObservation, SortDirection, SortStatus, inspection_columns, repair_columns,
    run_request,
};
use runtime::HttpRuntime;
use serde::de::DeserializeOwned;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV: &str = "FLEETDESK_LOG";
const SENTINEL: SentinelId = SentinelId::new(1);

fn main() {
    init_tracing();
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `fleetdesk --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let timeout = config.api_timeout()?;
    let client = Client::new(config.api_base_url(), timeout).with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;
    let controller_options = config.controller_options()?;
    if options.check_only {
        return Ok(());
    }

    let client = Arc::new(client);
    let browse = Browse {
        options: &options,
        controller: controller_options,
        wait: timeout + Duration::from_secs(1),
    };
    let table = match options.section {
        Section::Repairs => browse.run(client, repair_columns())?,
        Section::Inspections => browse.run(client, inspection_columns())?,
    };
    print!("{table}");
    Ok(())
}

struct Browse<'a> {
    options: &'a CliOptions,
    controller: ControllerOptions,
    wait: Duration,
}

impl Browse<'_> {
    /// Applies any requested write, then loads the list the way a scrolling
    /// user would and renders it as tab-separated text.
    fn run<R>(&self, client: Arc<Client>, columns: Vec<Column<R>>) -> Result<String>
    where
        R: Row + DeserializeOwned + Send + 'static,
    {
        let section = self.options.section;
        let mut runtime = HttpRuntime::<R>::new(client);
        self.apply_writes(runtime.client())?;

        let mut list = ListController::new(section, columns, self.controller)?;
        let (tx, rx) = mpsc::channel();

        let mut request = list.mount(SENTINEL);
        if let Some(query) = &self.options.query {
            list.set_search_input(query, Instant::now());
            if let Some(search) = list.flush_search() {
                request = search;
            }
        }

        let mut pages = 0;
        let mut next: Option<PageRequest> = Some(request);
        while let Some(request) = next.take() {
            run_request(&mut list, &mut runtime, request, &tx, &rx, self.wait)?;
            if let Some(error) = list.last_error() {
                bail!("{} {}", section.as_str(), error.message());
            }
            pages += 1;
            if self.options.max_pages.is_some_and(|limit| pages >= limit) {
                break;
            }
            next = list.on_sentinel(SentinelObservation::new(SENTINEL, 0));
        }
        info!(
            section = section.as_str(),
            pages,
            rows = list.loaded_rows().len(),
            "list loaded"
        );

        if let Some((key, direction)) = &self.options.sort {
            apply_sort(&mut list, key, *direction)?;
        }

        let mut out = String::new();
        let labels: Vec<&str> = list.columns().iter().map(|column| column.label).collect();
        out.push_str(&labels.join("\t"));
        out.push('\n');
        let columns = list.columns().to_vec();
        for row in list.visible_rows() {
            let cells: Vec<String> = columns
                .iter()
                .map(|column| column.value(row).display().replace(['\t', '\n'], " "))
                .collect();
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
        let total = list
            .total()
            .map_or_else(|| "?".to_owned(), |total| total.to_string());
        eprintln!(
            "{}: {} of {total} rows{}",
            section.as_str(),
            list.loaded_rows().len(),
            if list.has_more() { " (more available)" } else { "" }
        );
        Ok(out)
    }

    fn apply_writes(&self, client: &Client) -> Result<()> {
        let section = self.options.section;
        if let Some((id, field, value)) = &self.options.edit {
            let edit = FieldEdit::new(section, id, field, value)?;
            client.update(&edit)?;
            eprintln!("updated {} {id}: {field}", section.record_type());
        }
        if let Some(id) = &self.options.delete {
            client.delete(section, id)?;
            eprintln!("deleted {} {id}", section.record_type());
        }
        Ok(())
    }
}

fn apply_sort<R: Row>(
    list: &mut ListController<R>,
    key: &str,
    direction: SortDirection,
) -> Result<()> {
    let clicks = match direction {
        SortDirection::Asc => 1,
        SortDirection::Desc => 2,
    };
    for _ in 0..clicks {
        if list.click_header(key) == SortStatus::Unavailable {
            let sortable: Vec<&str> = list
                .columns()
                .iter()
                .filter(|column| column.sortable)
                .map(|column| column.key)
                .collect();
            bail!(
                "cannot sort {} by {key:?}; sortable columns: {}",
                list.section().as_str(),
                sortable.join(", ")
            );
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    section: Section,
    query: Option<String>,
    max_pages: Option<usize>,
    sort: Option<(String, SortDirection)>,
    edit: Option<(String, String, String)>,
    delete: Option<String>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
        section: Section::Repairs,
        query: None,
        max_pages: None,
        sort: None,
        edit: None,
        delete: None,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let mut value_for = |flag: &str, what: &str| {
            iter.next()
                .map(|value| value.as_ref().to_owned())
                .ok_or_else(|| anyhow!("{flag} requires {what}"))
        };
        match arg.as_ref() {
            "--config" => {
                options.config_path = PathBuf::from(value_for("--config", "a file path")?);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--section" => {
                let raw = value_for("--section", "repairs or inspections")?;
                options.section = Section::parse(&raw).ok_or_else(|| {
                    anyhow!("unknown section {raw:?}; use repairs or inspections")
                })?;
            }
            "--query" | "-q" => {
                options.query = Some(value_for("--query", "search text")?);
            }
            "--pages" => {
                let raw = value_for("--pages", "a page count")?;
                let pages: usize = raw
                    .parse()
                    .ok()
                    .filter(|pages| *pages > 0)
                    .ok_or_else(|| anyhow!("--pages must be a positive number, got {raw:?}"))?;
                options.max_pages = Some(pages);
            }
            "--sort" => {
                let raw = value_for("--sort", "a column key")?;
                options.sort = Some(parse_sort(&raw)?);
            }
            "--edit" => {
                let id = value_for("--edit", "a row id and FIELD=VALUE")?;
                let assignment = value_for("--edit", "a row id and FIELD=VALUE")?;
                let (field, value) = assignment.split_once('=').ok_or_else(|| {
                    anyhow!("--edit expects FIELD=VALUE after the row id, got {assignment:?}")
                })?;
                options.edit = Some((id, field.trim().to_owned(), value.to_owned()));
            }
            "--delete" => {
                options.delete = Some(value_for("--delete", "a row id")?);
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn parse_sort(raw: &str) -> Result<(String, SortDirection)> {
    let (key, direction) = match raw.split_once(':') {
        Some((key, direction)) => {
            let direction = SortDirection::parse(direction).ok_or_else(|| {
                anyhow!("sort direction must be asc or desc, got {direction:?}")
            })?;
            (key, direction)
        }
        None => (raw, SortDirection::Asc),
    };
    if key.is_empty() {
        bail!("--sort requires a column key, e.g. --sort openedAt:desc");
    }
    Ok((key.to_owned(), direction))
}

fn print_help() {
    println!("fleetdesk");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and exit");
    println!("  --section <name>         repairs (default) or inspections");
    println!("  --query, -q <text>       Filter rows server-side");
    println!("  --pages <n>              Stop after n pages");
    println!("  --sort <key>[:desc]      Sort loaded rows by a column");
    println!("  --edit <id> <f>=<v>      Update one field before listing");
    println!("  --delete <id>            Delete a row before listing");
    println!("  --help                   Show this help");
    println!();
    println!("Set {LOG_ENV}=debug to trace page requests on stderr.");
}
