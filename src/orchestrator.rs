use chrono::NaiveDateTime;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::aggregator::{aggregate, AggregatedReport};
use crate::config::{AppConfig, RotationConfig};
use crate::counter::OccurrenceCounter;
use crate::fetcher::PageFetcher;
use crate::models::{Catalog, Category, ProductEntry, ScrapeResult};
use crate::plugins::notifiers::TelegramNotifier;
use crate::plugins::traits::NotifierPlugin;
use crate::report::{ReportContext, ReportFormatter};
use crate::utils::error::{AppError, Result};

pub const EXIT_OK: u8 = 0;
/// A run that panicked after INIT.
pub const EXIT_ABORTED: u8 = 1;
pub const EXIT_FATAL: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Scanning,
    Aggregating,
    Reporting,
    Done,
    FailedFatal,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Init => "INIT",
            RunState::Scanning => "SCANNING",
            RunState::Aggregating => "AGGREGATING",
            RunState::Reporting => "REPORTING",
            RunState::Done => "DONE",
            RunState::FailedFatal => "FAILED_FATAL",
        };
        f.write_str(name)
    }
}

/// Terminal result of a run: `Done`, or `FailedFatal` when INIT rejected the configuration.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub state: RunState,
    pub categories: Vec<Category>,
    pub results: Vec<ScrapeResult>,
    pub report: AggregatedReport,
    /// The rendered report, or the INIT error for a fatal run.
    pub message: String,
    pub notified: bool,
}

impl RunOutcome {
    pub fn fatal(error: &AppError) -> Self {
        Self {
            state: RunState::FailedFatal,
            categories: Vec::new(),
            results: Vec::new(),
            report: aggregate(&[]),
            message: error.to_string(),
            notified: false,
        }
    }

    /// A finished run exits cleanly even when scans or delivery failed.
    pub fn exit_code(&self) -> u8 {
        if self.state == RunState::FailedFatal {
            EXIT_FATAL
        } else {
            EXIT_OK
        }
    }
}

/// Drives one run: scan the active catalog slice, aggregate, format, notify.
pub struct Orchestrator {
    fetcher: PageFetcher,
    counter: OccurrenceCounter,
    formatter: ReportFormatter,
    notifier: Box<dyn NotifierPlugin>,
    catalog: Catalog,
    rotation: RotationConfig,
    pause: Duration,
    state: RunState,
}

impl Orchestrator {
    /// INIT then the whole run. An INIT failure ends in `FailedFatal`
    /// without touching the network.
    pub async fn start(config: &AppConfig, now: NaiveDateTime) -> RunOutcome {
        match Self::from_config(config) {
            Ok(mut orchestrator) => orchestrator.run(now).await,
            Err(e) => {
                error!("Run state {} -> {}: {}", RunState::Init, RunState::FailedFatal, e);
                RunOutcome::fatal(&e)
            }
        }
    }

    /// The INIT step: configuration and credentials are checked before any
    /// network activity.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let credentials = config.telegram.credentials()?;
        let notifier = TelegramNotifier::new(&config.telegram, credentials)?;
        Self::build(config, Box::new(notifier))
    }

    /// Like [`Orchestrator::from_config`] with a caller-supplied delivery channel.
    pub fn new(config: &AppConfig, notifier: Box<dyn NotifierPlugin>) -> Result<Self> {
        config.validate()?;
        Self::build(config, notifier)
    }

    fn build(config: &AppConfig, notifier: Box<dyn NotifierPlugin>) -> Result<Self> {
        Ok(Self {
            fetcher: PageFetcher::new(config.scraper.clone())?,
            counter: OccurrenceCounter::new(&config.vendor_table(), config.counting.clone()),
            formatter: ReportFormatter::new(config.report.clone()),
            notifier,
            catalog: config.catalog(),
            rotation: config.rotation.clone(),
            pause: Duration::from_millis(config.scraper.pause_ms),
            state: RunState::Init,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        info!("Run state {} -> {}", self.state, next);
        self.state = next;
    }

    pub async fn run(&mut self, now: NaiveDateTime) -> RunOutcome {
        let categories = self.rotation.active_categories(&now);

        self.transition(RunState::Scanning);
        let results = self.scan(&categories).await;

        self.transition(RunState::Aggregating);
        let report = aggregate(&results);
        info!(
            "{}/{} products scanned, {} occurrences",
            report.success_count, report.catalog_count, report.total_occurrences
        );

        self.transition(RunState::Reporting);
        let ctx = ReportContext {
            generated_at: now,
            categories: categories.clone(),
        };
        let message = self.formatter.format(&report, &ctx);
        let notified = self.deliver(&message).await;

        self.transition(RunState::Done);
        RunOutcome {
            state: self.state,
            categories,
            results,
            report,
            message,
            notified,
        }
    }

    /// Strictly sequential, with a pause between consecutive requests.
    pub async fn scan(&self, categories: &[Category]) -> Vec<ScrapeResult> {
        let entries = self.catalog.select(categories);
        info!(
            "Scanning {} products ({})",
            entries.len(),
            categories
                .iter()
                .map(Category::label)
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut results = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
            results.push(self.scan_product(entry).await);
        }
        results
    }

    pub async fn scan_product(&self, entry: &ProductEntry) -> ScrapeResult {
        match self.fetcher.fetch(&entry.url).await {
            Ok(page) => {
                let occurrences = self.counter.count(&page.body);
                info!(
                    "{}: {} occurrences from {} vendors ({}ms)",
                    entry.name,
                    occurrences.total,
                    occurrences.vendor_counts.len(),
                    page.response_time_ms
                );
                debug!("{}: {:?}", entry.name, occurrences.vendor_counts);
                ScrapeResult::success(&entry.name, &entry.url, occurrences.vendor_counts)
            }
            Err(e) => {
                warn!("{}: scan failed: {}", entry.name, e);
                ScrapeResult::failed(&entry.name, &entry.url, e)
            }
        }
    }

    async fn deliver(&self, message: &str) -> bool {
        info!(
            "Sending report via {} [{}] ({} characters)",
            self.notifier.name(),
            self.notifier.plugin_type(),
            message.chars().count()
        );
        match self.notifier.notify(message).await {
            Ok(result) if result.success => {
                info!("Report delivered (message id {:?})", result.message_id);
                true
            }
            Ok(result) => {
                warn!(
                    "Report rejected: {}",
                    result.error.unwrap_or_else(|| "unknown reason".to_string())
                );
                false
            }
            Err(e) => {
                warn!("Report delivery failed: {}", e);
                false
            }
        }
    }
}
