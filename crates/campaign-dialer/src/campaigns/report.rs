use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::domain::{Campaign, CampaignStatus};
use crate::calls::{CallRecord, Sentiment};

/// `part / whole` as a percentage rounded to one decimal, 0 for an empty whole.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_one(part as f64 / whole as f64 * 100.0)
}

pub(crate) fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignAnalytics {
    pub campaign_id: Uuid,
    pub batch_id: Option<String>,
    pub total_calls: usize,
    pub completed_calls: usize,
    pub completion_rate: f64,
    pub sentiment_breakdown: BTreeMap<&'static str, usize>,
    pub follow_ups_scheduled: usize,
}

impl CampaignAnalytics {
    pub fn from_calls(campaign: &Campaign, calls: &[CallRecord]) -> Self {
        let completed_calls = calls.iter().filter(|call| call.is_completed()).count();
        let mut sentiment_breakdown: BTreeMap<&'static str, usize> = [
            Sentiment::Positive,
            Sentiment::Neutral,
            Sentiment::Negative,
            Sentiment::Unknown,
        ]
        .into_iter()
        .map(|sentiment| (sentiment.as_str(), 0))
        .collect();
        for call in calls {
            *sentiment_breakdown.entry(call.sentiment().as_str()).or_default() += 1;
        }

        Self {
            campaign_id: campaign.campaign_id,
            batch_id: campaign.batch_id.clone(),
            total_calls: calls.len(),
            completed_calls,
            completion_rate: percentage(completed_calls, calls.len()),
            sentiment_breakdown,
            follow_ups_scheduled: calls.iter().filter(|call| call.followup_scheduled).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: CampaignStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignSummary {
    pub total_campaigns: usize,
    pub by_status: Vec<StatusCount>,
}

impl CampaignSummary {
    /// Expects the current version of each group.
    pub fn from_latest(latest: &[Campaign]) -> Self {
        let by_status = CampaignStatus::ordered()
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: latest.iter().filter(|c| c.status == status).count(),
            })
            .collect();
        Self {
            total_campaigns: latest.len(),
            by_status,
        }
    }

    pub fn count(&self, status: CampaignStatus) -> usize {
        self.by_status
            .iter()
            .find(|entry| entry.status == status)
            .map_or(0, |entry| entry.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn campaign(status: CampaignStatus) -> Campaign {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        Campaign {
            id: 1,
            campaign_id: Uuid::new_v4(),
            campaign_group_id: Uuid::new_v4(),
            version: 1,
            batch_id: Some("batch_1".to_string()),
            campaign_name: "Renewals".to_string(),
            agent_name: None,
            status,
            task: None,
            voice: None,
            pathway_id: None,
            start_date: None,
            end_date: None,
            contact_list: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    fn call(emotion: Option<&str>, completed: Option<bool>, follow_up: bool) -> CallRecord {
        CallRecord {
            call_id: Uuid::new_v4().to_string(),
            batch_id: Some("batch_1".to_string()),
            emotion: emotion.map(str::to_string),
            from_phone: None,
            to_phone: None,
            call_length: None,
            completed,
            summary: None,
            call_transcript: None,
            embedding: None,
            followup_scheduled: follow_up,
            followup_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn analytics_counts_sentiment_and_completion() {
        let calls = vec![
            call(Some("positive"), Some(true), false),
            call(Some("Neutral"), Some(true), true),
            call(None, Some(false), false),
        ];
        let analytics = CampaignAnalytics::from_calls(&campaign(CampaignStatus::Active), &calls);

        assert_eq!(analytics.total_calls, 3);
        assert_eq!(analytics.completed_calls, 2);
        assert_eq!(analytics.completion_rate, 66.7);
        assert_eq!(analytics.sentiment_breakdown["positive"], 1);
        assert_eq!(analytics.sentiment_breakdown["neutral"], 1);
        assert_eq!(analytics.sentiment_breakdown["negative"], 0);
        assert_eq!(analytics.sentiment_breakdown["unknown"], 1);
        assert_eq!(analytics.follow_ups_scheduled, 1);
    }

    #[test]
    fn empty_analytics_has_zero_rate() {
        let analytics = CampaignAnalytics::from_calls(&campaign(CampaignStatus::Draft), &[]);
        assert_eq!(analytics.completion_rate, 0.0);
        assert_eq!(analytics.total_calls, 0);
    }

    #[test]
    fn summary_lists_every_status() {
        let latest = vec![
            campaign(CampaignStatus::Draft),
            campaign(CampaignStatus::Draft),
            campaign(CampaignStatus::Active),
        ];
        let summary = CampaignSummary::from_latest(&latest);
        assert_eq!(summary.total_campaigns, 3);
        assert_eq!(summary.by_status.len(), 5);
        assert_eq!(summary.count(CampaignStatus::Draft), 2);
        assert_eq!(summary.count(CampaignStatus::Archived), 0);
    }
}
