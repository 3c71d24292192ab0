/**
 * Dashboard Routes
 * Admin overview: lead counts and the recent activity feed
 */
use axum::{extract::State, Json};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::db::models::{LeadKind, RecentLead};
use crate::error::ApiError;
use crate::state::AppState;

/// Leads pulled from each collection before merging.
const RECENT_PER_KIND: usize = 2;
/// Entries kept in the merged feed.
const RECENT_FEED_LEN: usize = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_contacts: u64,
    pub total_newsletters: u64,
    pub total_popups: u64,
    /// Leads created in the last 24 hours across all three collections.
    pub recent_activity: u64,
    pub recent_activities: Vec<RecentActivity>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RecentActivity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LeadKind,
    pub message: String,
    pub time: String,
}

/// GET /api/dashboard
pub async fn get_dashboard_stats(
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, ApiError> {
    let store = &state.store;
    let since = Utc::now() - Duration::hours(24);

    let (total_contacts, total_newsletters, total_popups, contacts_24h, subscribers_24h, popups_24h) =
        tokio::try_join!(
            store.count_leads(LeadKind::Contact, None),
            store.count_active_subscribers(),
            store.count_leads(LeadKind::Popup, None),
            store.count_leads(LeadKind::Contact, Some(since)),
            store.count_leads(LeadKind::Newsletter, Some(since)),
            store.count_leads(LeadKind::Popup, Some(since)),
        )
        .map_err(ApiError::persistence("Failed to fetch dashboard stats"))?;

    let (contacts, subscribers, popups) = tokio::try_join!(
        store.recent_leads(LeadKind::Contact, RECENT_PER_KIND),
        store.recent_leads(LeadKind::Newsletter, RECENT_PER_KIND),
        store.recent_leads(LeadKind::Popup, RECENT_PER_KIND),
    )
    .map_err(ApiError::persistence("Failed to fetch dashboard stats"))?;

    let leads = contacts.into_iter().chain(subscribers).chain(popups).collect();
    let recent_activities = build_recent_activities(leads, Utc::now());

    tracing::debug!(
        total_contacts,
        total_newsletters,
        total_popups,
        activities = recent_activities.len(),
        "dashboard stats computed"
    );

    Ok(Json(DashboardStats {
        total_contacts,
        total_newsletters,
        total_popups,
        recent_activity: contacts_24h + subscribers_24h + popups_24h,
        recent_activities,
    }))
}

/// Merges the per-collection leads into the feed: newest first, at most
/// five entries, timestamps rendered relative to `now`.
pub fn build_recent_activities(mut leads: Vec<RecentLead>, now: DateTime<Utc>) -> Vec<RecentActivity> {
    leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    leads.truncate(RECENT_FEED_LEN);

    leads
        .into_iter()
        .map(|lead| RecentActivity {
            message: activity_message(&lead),
            time: format_time_ago(lead.created_at, now),
            id: lead.id,
            kind: lead.kind,
        })
        .collect()
}

fn activity_message(lead: &RecentLead) -> String {
    let name = lead.name.as_deref().unwrap_or(&lead.email);
    match lead.kind {
        LeadKind::Contact => format!("New contact form submission from {}", name),
        LeadKind::Newsletter => format!("New newsletter subscription from {}", lead.email),
        LeadKind::Popup => format!("New quote request from {}", name),
    }
}

/// "just now", "N minute(s) ago", "N hour(s) ago" or "N day(s) ago".
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - then;

    let (n, unit) = if elapsed < Duration::seconds(60) {
        return "just now".to_string();
    } else if elapsed < Duration::hours(1) {
        (elapsed.num_minutes(), "minute")
    } else if elapsed < Duration::days(1) {
        (elapsed.num_hours(), "hour")
    } else {
        (elapsed.num_days(), "day")
    };

    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}
