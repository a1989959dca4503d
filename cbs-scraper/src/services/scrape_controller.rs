//! Date-range driver for the discovery prober

use super::discovery_prober::{DateFlow, DiscoveryProber};
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::ScrapingResult;
use cbs_common::time::format_elapsed;
use chrono::{Duration as DateSpan, NaiveDate};
use std::time::Instant;
use tracing::{info, warn};

/// Days back from today covered when no start date is given
pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;

/// Ranges ending this close to today may predate publication
pub const RECENT_DAYS_WARNING: i64 = 3;

/// `(start, end)` defaulting to the last week through `today`
pub fn resolve_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> ScrapeResult<(NaiveDate, NaiveDate)> {
    let start = start.unwrap_or(today - DateSpan::days(DEFAULT_LOOKBACK_DAYS));
    let end = end.unwrap_or(today);
    if start > end {
        return Err(ScrapeError::InvalidDateRange(format!(
            "start {} is after end {}",
            start, end
        )));
    }
    Ok((start, end))
}

/// Whether `end` falls within the last few days before `today`
pub fn is_recent(end: NaiveDate, today: NaiveDate) -> bool {
    end >= today - DateSpan::days(RECENT_DAYS_WARNING)
}

/// Walks a date range in ascending order, one date at a time
pub struct ScrapeController {
    prober: DiscoveryProber,
}

impl ScrapeController {
    pub fn new(prober: DiscoveryProber) -> Self {
        Self { prober }
    }

    /// Scrape `start..=end` and return the run's counters
    pub async fn run(
        mut self,
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
    ) -> ScrapeResult<ScrapingResult> {
        if start > end {
            return Err(ScrapeError::InvalidDateRange(format!(
                "start {} is after end {}",
                start, end
            )));
        }

        if is_recent(end, today) {
            warn!(
                "Scraping very recent dates (within {} days of today: {}). \
                 Speeches may not be published yet for these dates.",
                RECENT_DAYS_WARNING, today
            );
        }

        let started = Instant::now();
        let dates: Vec<NaiveDate> = start.iter_days().take_while(|d| *d <= end).collect();
        let total = dates.len();
        let progress_interval = (total / 10).max(1);

        info!("Scraping speeches from {} to {} ({} days)", start, end, total);

        for (i, date) in dates.into_iter().enumerate() {
            let done = i + 1;
            if done % progress_interval == 0 || done == total {
                info!(
                    "Progress: {}/{} days ({:.1}%)",
                    done,
                    total,
                    done as f64 * 100.0 / total as f64
                );
            }

            info!("Scraping data for {}", date);
            if self.prober.scrape_date(date).await == DateFlow::Stop {
                break;
            }
        }

        let result = self.prober.into_result();
        let elapsed = started.elapsed();
        let seconds = elapsed.as_secs_f64();
        let rate = if seconds > 0.0 {
            (result.downloaded + result.skipped) as f64 / seconds
        } else {
            0.0
        };

        info!("Scraping completed in {}", format_elapsed(elapsed));
        info!(
            "Results: {} downloaded, {} skipped, {} failed (processing rate: {:.1} speeches/second)",
            result.downloaded, result.skipped, result.failed, rate
        );

        Ok(result)
    }
}
