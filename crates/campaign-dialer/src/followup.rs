//! Follow-up calls for callers who asked to be rung back.
//!
//! Scheduling is fire-and-forget: each job is a spawned task that sleeps for
//! its delay and then places one call. Pending jobs do not survive a restart.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::provider::{CallMetadata, CallProvider, SendCallRequest};

fn hours_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\s+hour").expect("hour pattern compiles"))
}

fn minutes_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\s+minute").expect("minute pattern compiles"))
}

/// Longest delay a follow-up may be scheduled out.
pub const MAX_FOLLOW_UP_DELAY: Duration = Duration::from_secs(30 * 24 * 3600);

/// Turns the analysis answer about a callback time into a delay from `now`.
///
/// Absolute timestamps win, then `tomorrow`, then `<n> hour(s)` and `<n> minute(s)`.
/// A timestamp in the past yields a zero delay. The result never exceeds
/// [`MAX_FOLLOW_UP_DELAY`].
pub fn parse_follow_up_time(hint: Option<&str>, now: DateTime<Utc>, default: Duration) -> Duration {
    let delay = requested_delay(hint, now, default);
    if delay > MAX_FOLLOW_UP_DELAY {
        warn!(
            requested_seconds = delay.as_secs(),
            max_seconds = MAX_FOLLOW_UP_DELAY.as_secs(),
            "follow-up delay capped"
        );
        return MAX_FOLLOW_UP_DELAY;
    }
    delay
}

fn requested_delay(hint: Option<&str>, now: DateTime<Utc>, default: Duration) -> Duration {
    let Some(hint) = hint.map(str::trim).filter(|hint| !hint.is_empty()) else {
        return default;
    };
    if hint.eq_ignore_ascii_case("no") {
        return default;
    }

    if let Some(target) = parse_timestamp(hint) {
        return (target - now).to_std().unwrap_or(Duration::ZERO);
    }

    let lowered = hint.to_lowercase();
    if lowered.contains("tomorrow") {
        return Duration::from_secs(24 * 3600);
    }
    if let Some(hours) = leading_count(hours_pattern(), &lowered) {
        return Duration::from_secs(hours.saturating_mul(3600));
    }
    if let Some(minutes) = leading_count(minutes_pattern(), &lowered) {
        return Duration::from_secs(minutes.saturating_mul(60));
    }

    warn!(%hint, "could not parse follow-up time, using default delay");
    default
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

fn leading_count(pattern: &Regex, text: &str) -> Option<u64> {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|count| count.as_str().parse().ok())
}

pub fn follow_up_task(original_call_id: &str) -> String {
    format!(
        "Follow-up call for original call ID: {original_call_id}. This call was scheduled based on the user's request."
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUpJob {
    pub original_call_id: String,
    pub phone_number: String,
    pub pathway_id: String,
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FollowUpStats {
    pub pending: usize,
    pub fired: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
struct Counters {
    pending: AtomicUsize,
    fired: AtomicUsize,
    failed: AtomicUsize,
}

#[derive(Clone)]
pub struct FollowUpScheduler {
    provider: Arc<dyn CallProvider>,
    webhook_url: String,
    counters: Arc<Counters>,
}

impl FollowUpScheduler {
    pub fn new(provider: Arc<dyn CallProvider>, webhook_url: String) -> Self {
        Self {
            provider,
            webhook_url,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn schedule(&self, job: FollowUpJob) -> JoinHandle<()> {
        info!(
            call_id = %job.original_call_id,
            phone_number = %job.phone_number,
            delay_seconds = job.delay.as_secs(),
            "follow-up scheduled"
        );
        self.counters.pending.fetch_add(1, Ordering::SeqCst);

        let scheduler = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(job.delay).await;
            scheduler.place(&job).await;
            scheduler.counters.pending.fetch_sub(1, Ordering::SeqCst);
        })
    }

    async fn place(&self, job: &FollowUpJob) {
        let call = SendCallRequest {
            phone_number: job.phone_number.clone(),
            pathway_id: Some(job.pathway_id.clone()),
            task: Some(follow_up_task(&job.original_call_id)),
            webhook: Some(self.webhook_url.clone()),
            ..SendCallRequest::default()
        };
        let metadata = CallMetadata::for_call(&call, None);

        match self.provider.send_call(&call, &metadata).await {
            Ok(_) => {
                self.counters.fired.fetch_add(1, Ordering::SeqCst);
                info!(call_id = %job.original_call_id, phone_number = %job.phone_number, "follow-up call placed");
            }
            Err(err) => {
                self.counters.failed.fetch_add(1, Ordering::SeqCst);
                error!(
                    call_id = %job.original_call_id,
                    phone_number = %job.phone_number,
                    error = %err,
                    "follow-up call failed"
                );
            }
        }
    }

    pub fn stats(&self) -> FollowUpStats {
        FollowUpStats {
            pending: self.counters.pending.load(Ordering::SeqCst),
            fired: self.counters.fired.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
        }
    }
}
