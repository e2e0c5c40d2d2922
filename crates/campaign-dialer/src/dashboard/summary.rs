use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};

use crate::calls::CallRecord;
use crate::campaigns::{percentage, round_one, Campaign, CampaignStatus, CampaignSummary};

const RECENT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_campaigns: usize,
    pub active_campaigns: usize,
    pub draft_campaigns: usize,
    pub total_contacts: i64,
    pub recent_calls: usize,
    pub total_calls: usize,
    pub success_rate: f64,
    pub call_growth: f64,
}

/// Headline numbers. `latest` holds the current version of each group; archived groups are
/// not counted as campaigns.
pub fn stats(
    latest: &[Campaign],
    total_contacts: i64,
    calls: &[CallRecord],
    now: DateTime<Utc>,
) -> DashboardStats {
    let summary = CampaignSummary::from_latest(latest);
    let recent_start = now - Duration::days(RECENT_WINDOW_DAYS);
    let previous_start = recent_start - Duration::days(RECENT_WINDOW_DAYS);

    let recent_calls = calls
        .iter()
        .filter(|call| call.created_at >= recent_start)
        .count();
    let previous_calls = calls
        .iter()
        .filter(|call| call.created_at >= previous_start && call.created_at < recent_start)
        .count();
    let completed = calls.iter().filter(|call| call.is_completed()).count();

    let call_growth = if previous_calls == 0 {
        0.0
    } else {
        round_one((recent_calls as f64 - previous_calls as f64) / previous_calls as f64 * 100.0)
    };

    DashboardStats {
        total_campaigns: summary.total_campaigns - summary.count(CampaignStatus::Archived),
        active_campaigns: summary.count(CampaignStatus::Active),
        draft_campaigns: summary.count(CampaignStatus::Draft),
        total_contacts,
        recent_calls,
        total_calls: calls.len(),
        success_rate: percentage(completed, calls.len()),
        call_growth,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub description: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub details: Value,
}

impl ActivityEntry {
    fn from_call(call: &CallRecord) -> Self {
        Self {
            kind: "call",
            id: call.call_id.clone(),
            description: format!("Call to {}", call.to_phone.as_deref().unwrap_or("Unknown")),
            status: call_status_label(call).to_string(),
            timestamp: call.created_at,
            details: json!({
                "phone": call.to_phone,
                "duration": call.call_length,
                "emotion": call.emotion,
            }),
        }
    }

    fn from_campaign(campaign: &Campaign) -> Self {
        Self {
            kind: "campaign",
            id: campaign.campaign_id.to_string(),
            description: format!(
                "Campaign '{}' {}",
                campaign.campaign_name,
                campaign.status.label()
            ),
            status: campaign.status.label().to_string(),
            timestamp: campaign.created_at,
            details: json!({
                "agent_name": campaign.agent_name,
                "voice": campaign.voice,
                "version": campaign.version,
                "contact_count": campaign.contact_list.len(),
            }),
        }
    }
}

/// Calls and campaign versions interleaved newest first.
pub fn recent_activity(
    calls: &[CallRecord],
    versions: &[Campaign],
    limit: usize,
) -> Vec<ActivityEntry> {
    let mut activity: Vec<ActivityEntry> = calls
        .iter()
        .map(ActivityEntry::from_call)
        .chain(versions.iter().map(ActivityEntry::from_campaign))
        .collect();
    activity.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    activity.truncate(limit);
    activity
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCalls {
    pub date: NaiveDate,
    pub calls: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelCount {
    pub status: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionCount {
    pub emotion: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardAnalytics {
    pub daily_calls: Vec<DailyCalls>,
    pub call_status_distribution: Vec<LabelCount>,
    pub campaign_status_distribution: Vec<LabelCount>,
    pub emotion_distribution: Vec<EmotionCount>,
    pub date_range: DateRange,
}

/// Chart data for calls created in the last `days` days. Campaign status covers every
/// current version regardless of the window.
pub fn analytics(
    calls: &[CallRecord],
    latest: &[Campaign],
    days: u32,
    now: DateTime<Utc>,
) -> DashboardAnalytics {
    let start = now - Duration::days(i64::from(days));
    let window: Vec<&CallRecord> = calls.iter().filter(|call| call.created_at >= start).collect();

    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for call in &window {
        *per_day.entry(call.created_at.date_naive()).or_default() += 1;
    }
    let daily_calls = per_day
        .into_iter()
        .map(|(date, calls)| DailyCalls { date, calls })
        .collect();

    let completed = window.iter().filter(|call| call.is_completed()).count();
    let call_status_distribution = [
        ("Completed", completed),
        ("In Progress", window.len() - completed),
    ]
    .into_iter()
    .filter(|(_, count)| *count > 0)
    .map(|(status, count)| LabelCount {
        status: status.to_string(),
        count,
    })
    .collect();

    let campaign_status_distribution = CampaignSummary::from_latest(latest)
        .by_status
        .into_iter()
        .filter(|entry| entry.count > 0)
        .map(|entry| LabelCount {
            status: title_case(entry.status.label()),
            count: entry.count,
        })
        .collect();

    let mut emotions: BTreeMap<String, usize> = BTreeMap::new();
    for emotion in window.iter().filter_map(|call| call.emotion.as_deref()) {
        *emotions.entry(title_case(emotion)).or_default() += 1;
    }
    let emotion_distribution = emotions
        .into_iter()
        .map(|(emotion, count)| EmotionCount { emotion, count })
        .collect();

    DashboardAnalytics {
        daily_calls,
        call_status_distribution,
        campaign_status_distribution,
        emotion_distribution,
        date_range: DateRange {
            start,
            end: now,
            days,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignLeader {
    pub name: String,
    pub call_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusiestHour {
    pub hour: u32,
    pub call_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardPerformance {
    pub average_call_duration: f64,
    pub completion_rate: f64,
    pub total_calls: usize,
    pub completed_calls: usize,
    pub most_successful_campaign: CampaignLeader,
    pub busiest_hour: BusiestHour,
}

/// Calls are attributed to a campaign group through the batch id its current version carries.
pub fn performance(calls: &[CallRecord], latest: &[Campaign]) -> DashboardPerformance {
    let durations: Vec<f64> = calls.iter().filter_map(|call| call.call_length).collect();
    let average_call_duration = if durations.is_empty() {
        0.0
    } else {
        let mean = durations.iter().sum::<f64>() / durations.len() as f64;
        (mean * 100.0).round() / 100.0
    };
    let completed_calls = calls.iter().filter(|call| call.is_completed()).count();

    DashboardPerformance {
        average_call_duration,
        completion_rate: percentage(completed_calls, calls.len()),
        total_calls: calls.len(),
        completed_calls,
        most_successful_campaign: most_successful(calls, latest),
        busiest_hour: busiest_hour(calls),
    }
}

fn most_successful(calls: &[CallRecord], latest: &[Campaign]) -> CampaignLeader {
    let mut completed_by_batch: HashMap<&str, usize> = HashMap::new();
    for call in calls.iter().filter(|call| call.is_completed()) {
        if let Some(batch_id) = call.batch_id.as_deref() {
            *completed_by_batch.entry(batch_id).or_default() += 1;
        }
    }

    latest
        .iter()
        .filter_map(|campaign| {
            let count = *completed_by_batch.get(campaign.batch_id.as_deref()?)?;
            Some((campaign.campaign_name.as_str(), count))
        })
        // Highest count wins; ties go to the alphabetically first name.
        .max_by(|(name_a, count_a), (name_b, count_b)| {
            count_a.cmp(count_b).then_with(|| name_b.cmp(name_a))
        })
        .map_or_else(
            || CampaignLeader {
                name: "N/A".to_string(),
                call_count: 0,
            },
            |(name, call_count)| CampaignLeader {
                name: name.to_string(),
                call_count,
            },
        )
}

fn busiest_hour(calls: &[CallRecord]) -> BusiestHour {
    let mut per_hour = [0usize; 24];
    for call in calls {
        per_hour[call.created_at.hour() as usize] += 1;
    }
    per_hour
        .iter()
        .enumerate()
        // Earliest hour wins a tie.
        .max_by(|(hour_a, count_a), (hour_b, count_b)| {
            count_a.cmp(count_b).then_with(|| hour_b.cmp(hour_a))
        })
        .filter(|(_, count)| **count > 0)
        .map_or(
            BusiestHour {
                hour: 0,
                call_count: 0,
            },
            |(hour, count)| BusiestHour {
                hour: hour as u32,
                call_count: *count,
            },
        )
}

fn call_status_label(call: &CallRecord) -> &'static str {
    if call.is_completed() {
        "completed"
    } else {
        "in_progress"
    }
}

fn title_case(word: &str) -> String {
    let lower = word.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn call(
        call_id: &str,
        created_at: DateTime<Utc>,
        completed: bool,
        emotion: Option<&str>,
        batch_id: Option<&str>,
    ) -> CallRecord {
        CallRecord {
            call_id: call_id.to_string(),
            batch_id: batch_id.map(str::to_string),
            emotion: emotion.map(str::to_string),
            from_phone: None,
            to_phone: Some("+14155550100".to_string()),
            call_length: Some(2.0),
            completed: Some(completed),
            summary: None,
            call_transcript: None,
            embedding: None,
            followup_scheduled: false,
            followup_at: None,
            created_at,
        }
    }

    fn campaign(name: &str, status: CampaignStatus, batch_id: Option<&str>) -> Campaign {
        Campaign {
            id: 1,
            campaign_id: Uuid::new_v4(),
            campaign_group_id: Uuid::new_v4(),
            version: 1,
            batch_id: batch_id.map(str::to_string),
            campaign_name: name.to_string(),
            agent_name: None,
            status,
            task: None,
            voice: None,
            pathway_id: None,
            start_date: None,
            end_date: None,
            contact_list: vec![1, 2],
            created_at: now() - Duration::hours(1),
            updated_at: now() - Duration::hours(1),
        }
    }

    #[test]
    fn stats_compare_recent_and_previous_week() {
        let calls = vec![
            call("a", now() - Duration::days(1), true, None, None),
            call("b", now() - Duration::days(2), true, None, None),
            call("c", now() - Duration::days(3), false, None, None),
            call("d", now() - Duration::days(10), true, None, None),
            call("e", now() - Duration::days(30), false, None, None),
        ];
        let latest = vec![
            campaign("A", CampaignStatus::Active, None),
            campaign("B", CampaignStatus::Draft, None),
            campaign("C", CampaignStatus::Archived, None),
        ];

        let stats = stats(&latest, 12, &calls, now());
        assert_eq!(stats.total_campaigns, 2);
        assert_eq!(stats.active_campaigns, 1);
        assert_eq!(stats.draft_campaigns, 1);
        assert_eq!(stats.total_contacts, 12);
        assert_eq!(stats.recent_calls, 3);
        assert_eq!(stats.total_calls, 5);
        assert_eq!(stats.success_rate, 60.0);
        assert_eq!(stats.call_growth, 200.0);
    }

    #[test]
    fn empty_stats_are_zero() {
        let stats = stats(&[], 0, &[], now());
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.call_growth, 0.0);
    }

    #[test]
    fn recent_activity_interleaves_and_truncates() {
        let calls = vec![
            call("newest", now(), true, None, None),
            call("oldest", now() - Duration::days(3), false, None, None),
        ];
        let versions = vec![campaign("Renewals", CampaignStatus::Draft, None)];

        let activity = recent_activity(&calls, &versions, 2);
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].id, "newest");
        assert_eq!(activity[0].status, "completed");
        assert_eq!(activity[1].kind, "campaign");
        assert_eq!(activity[1].description, "Campaign 'Renewals' draft");
    }

    #[test]
    fn analytics_windows_calls_by_day() {
        let calls = vec![
            call("a", now() - Duration::hours(1), true, Some("positive"), None),
            call("b", now() - Duration::hours(2), false, Some("Positive"), None),
            call("c", now() - Duration::days(1), true, Some("neutral"), None),
            call("old", now() - Duration::days(40), true, Some("negative"), None),
        ];
        let latest = vec![campaign("A", CampaignStatus::Active, None)];

        let analytics = analytics(&calls, &latest, 30, now());
        assert_eq!(analytics.daily_calls.len(), 2);
        assert_eq!(analytics.daily_calls[1].calls, 2);
        assert_eq!(
            analytics.call_status_distribution,
            vec![
                LabelCount {
                    status: "Completed".to_string(),
                    count: 2
                },
                LabelCount {
                    status: "In Progress".to_string(),
                    count: 1
                },
            ]
        );
        assert_eq!(analytics.campaign_status_distribution[0].status, "Active");
        assert_eq!(analytics.emotion_distribution.len(), 2);
        assert_eq!(analytics.emotion_distribution[1].emotion, "Positive");
        assert_eq!(analytics.emotion_distribution[1].count, 2);
        assert_eq!(analytics.date_range.days, 30);
    }

    #[test]
    fn performance_attributes_completed_calls_to_campaigns() {
        let at_nine = Utc.with_ymd_and_hms(2024, 6, 14, 9, 15, 0).unwrap();
        let at_ten = Utc.with_ymd_and_hms(2024, 6, 14, 10, 5, 0).unwrap();
        let calls = vec![
            call("a", at_nine, true, None, Some("batch_a")),
            call("b", at_nine, true, None, Some("batch_a")),
            call("c", at_ten, true, None, Some("batch_b")),
            call("d", at_ten, false, None, Some("batch_b")),
            call("e", at_nine, false, None, None),
        ];
        let latest = vec![
            campaign("Alpha", CampaignStatus::Active, Some("batch_a")),
            campaign("Beta", CampaignStatus::Paused, Some("batch_b")),
        ];

        let performance = performance(&calls, &latest);
        assert_eq!(performance.average_call_duration, 2.0);
        assert_eq!(performance.completed_calls, 3);
        assert_eq!(performance.completion_rate, 60.0);
        assert_eq!(
            performance.most_successful_campaign,
            CampaignLeader {
                name: "Alpha".to_string(),
                call_count: 2
            }
        );
        assert_eq!(
            performance.busiest_hour,
            BusiestHour {
                hour: 9,
                call_count: 3
            }
        );
    }

    #[test]
    fn performance_without_calls_reports_placeholders() {
        let performance = performance(&[], &[]);
        assert_eq!(performance.most_successful_campaign.name, "N/A");
        assert_eq!(performance.busiest_hour.call_count, 0);
        assert_eq!(performance.average_call_duration, 0.0);
    }
}
