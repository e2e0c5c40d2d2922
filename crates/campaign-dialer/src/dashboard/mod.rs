//! Dashboard figures aggregated from calls, campaigns and contacts.

mod router;
mod service;
mod summary;

pub use router::dashboard_router;
pub use service::DashboardService;
pub use summary::{
    analytics, performance, recent_activity, stats, ActivityEntry, BusiestHour, CampaignLeader,
    DailyCalls, DashboardAnalytics, DashboardPerformance, DashboardStats, DateRange, EmotionCount,
    LabelCount,
};
