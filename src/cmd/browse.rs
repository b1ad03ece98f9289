//! Prints a page (or a few) of the catalog, like the lecture grid would show
//! it.

use std::{future::Future, time::Duration};

use crate::{
    args::BrowseArgs,
    catalog::{Catalog, FetchOutcome, FilterCriteria},
    config::Config,
    model::LectureRecord,
    prelude::*,
    source::{LectureSource, RestSource},
};


/// How long a fetch has to take before we print a status line.
const PROGRESS_DELAY: Duration = Duration::from_millis(700);

pub(crate) async fn run(args: &BrowseArgs, config: &Config) -> Result<()> {
    let source = RestSource::new(&config.source, None)?;
    let catalog = Catalog::new(source, &config.catalog);
    let mut retries_left = args.retries;

    let mut loaded = Loaded::default();
    loaded.track(fetch(&catalog, Step::Refresh, &mut retries_left).await);

    let criteria = FilterCriteria {
        week: args.week,
        course: args.course.clone(),
        query: args.search.clone(),
    };
    if let Some(outcome) = catalog.set_filter(criteria).await {
        loaded.track(outcome);
    }

    while loaded.pages < args.pages && !loaded.exhausted && catalog.error().is_none() {
        if !loaded.track(fetch(&catalog, Step::LoadMore, &mut retries_left).await) {
            break;
        }
    }

    print_records(&catalog);

    match catalog.error() {
        Some(e) if loaded.pages == 0 => bail!("{e}"),
        Some(e) => {
            bunt::eprintln!("{$red}▶▶▶ {$bold}Error:{/$}{/$} {[yellow+intense]}", e);
            bunt::eprintln!("{$dimmed}Only partial results are shown. Try again with `--retries`.{/$}");
            Ok(())
        }
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Refresh,
    LoadMore,
}

/// Runs one step, repeating it on retryable errors while `retries_left`
/// allows.
async fn fetch<S: LectureSource>(
    catalog: &Catalog<S>,
    step: Step,
    retries_left: &mut u32,
) -> FetchOutcome {
    loop {
        let outcome = match step {
            Step::Refresh => with_progress(catalog, catalog.refresh()).await,
            Step::LoadMore => with_progress(catalog, catalog.load_more()).await,
        };

        match outcome {
            FetchOutcome::Failed(e) if e.is_retryable() && *retries_left > 0 => {
                *retries_left -= 1;
                warn!("{e} (retrying {step:?}, {retries_left} retries left)");
            }
            other => return other,
        }
    }
}

/// Drives `fut` and prints what the catalog is doing if it takes a while.
async fn with_progress<S: LectureSource>(
    catalog: &Catalog<S>,
    fut: impl Future<Output = FetchOutcome>,
) -> FetchOutcome {
    let progress = async {
        tokio::time::sleep(PROGRESS_DELAY).await;
        if catalog.is_loading() {
            bunt::eprintln!("{$dimmed}Loading lectures...{/$}");
        } else if catalog.is_refreshing() {
            bunt::eprintln!("{$dimmed}Loading page {}...{/$}", catalog.next_page());
        }
        std::future::pending::<()>().await;
    };

    tokio::select! {
        outcome = fut => outcome,
        _ = progress => unreachable!("progress future never completes"),
    }
}

/// What has been fetched during this run.
#[derive(Debug, Default)]
struct Loaded {
    pages: u32,
    exhausted: bool,
}

impl Loaded {
    /// Returns whether `outcome` brought in a page.
    fn track(&mut self, outcome: FetchOutcome) -> bool {
        match outcome {
            FetchOutcome::Ingested { page, added, exhausted } => {
                debug!("Loaded page {page} ({added} new lectures)");
                self.pages += 1;
                self.exhausted = exhausted;
                true
            }
            FetchOutcome::Exhausted => {
                self.exhausted = true;
                false
            }
            _ => false,
        }
    }
}

fn print_records<S: LectureSource>(catalog: &Catalog<S>) {
    let criteria = catalog.criteria();
    let records = catalog.visible_records();

    println!();
    bunt::println!("{$bold+blue+intense}{}{/$}", criteria);
    println!();

    if records.is_empty() {
        bunt::println!("{$dimmed}No lectures found.{/$}");
    }
    for record in &records {
        print_record(record);
    }

    println!();
    let more = if catalog.has_more() { ", more available" } else { "" };
    if criteria.is_unconstrained() {
        bunt::println!("{$dimmed}{} lectures loaded{}{/$}", catalog.cached_len(), more);
    } else {
        bunt::println!(
            "{$dimmed}{} of {} loaded lectures match{}{/$}",
            records.len(),
            catalog.cached_len(),
            more,
        );
    }
}

fn print_record(record: &LectureRecord) {
    let course = record.course().map_or_else(
        || record.course_id.clone(),
        |c| format!("{} ({})", c.name, c.level().name),
    );
    bunt::println!(" ▸ {[bold+intense]}", record.title);
    bunt::println!(
        "   {$dimmed}{} · {} · week {} · rating {} · {} views{/$}",
        record.instructor,
        course,
        record.week_number,
        record.rating,
        record.views,
    );
    if let Some(description) = record.description.as_deref().filter(|d| !d.trim().is_empty()) {
        println!("   {}", description.trim());
    }
    bunt::println!("   {[cyan]}", record.video_url);
}
