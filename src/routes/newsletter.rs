/**
 * Newsletter Routes
 * Subscriber intake/management and campaign drafting
 */
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::models::{
    NewCampaign, NewSubscriber, NewsletterCampaign, NewsletterSubscriber, SubscriberStatus,
};
use crate::db::StoreError;
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{self, ValidationError};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for POST /api/newsletter/subscribers
#[derive(Debug, Default, Deserialize)]
pub struct SubscribeRequest {
    pub email: Option<String>,
    pub name: Option<String>,
}

impl SubscribeRequest {
    pub fn validate(self) -> Result<NewSubscriber, ValidationError> {
        let email = validation::email(self.email.as_deref())?;
        let name = Some(validation::optional(self.name.as_deref())).filter(|n| !n.is_empty());

        Ok(NewSubscriber { email, name })
    }
}

/// Request body for PATCH /api/newsletter/subscribers
#[derive(Debug, Deserialize)]
pub struct UpdateSubscriberRequest {
    pub email: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscriberResponse {
    pub success: bool,
    pub subscriber: NewsletterSubscriber,
}

/// Request body for POST /api/newsletter/campaigns
#[derive(Debug, Default, Deserialize)]
pub struct CreateCampaignRequest {
    pub subject: Option<String>,
    pub content: Option<String>,
    /// The compose form sends an audience label such as `"all"`; only a
    /// non-negative integer is taken as a recipient count.
    pub recipients: Option<Value>,
}

impl CreateCampaignRequest {
    pub fn validate(self) -> Result<NewCampaign, ValidationError> {
        let subject = validation::required(self.subject.as_deref(), "Subject")?;
        let content = validation::required(self.content.as_deref(), "Content")?;
        let recipients = self
            .recipients
            .as_ref()
            .and_then(Value::as_i64)
            .filter(|n| *n >= 0)
            .unwrap_or(0);

        Ok(NewCampaign {
            subject,
            content,
            recipients,
        })
    }
}

/// Request body for PATCH /api/newsletter/campaigns
#[derive(Debug, Deserialize)]
pub struct SendCampaignRequest {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CampaignResponse {
    pub success: bool,
    pub campaign: NewsletterCampaign,
}

// ============================================================================
// Subscriber handlers
// ============================================================================

/// GET /api/newsletter/subscribers
pub async fn list_subscribers(
    State(state): State<AppState>,
) -> Result<Json<Vec<NewsletterSubscriber>>, ApiError> {
    let subscribers = state
        .store
        .list_subscribers()
        .await
        .map_err(ApiError::persistence("Failed to fetch subscribers"))?;

    Ok(Json(subscribers))
}

/// POST /api/newsletter/subscribers
///
/// New email: 201. Previously unsubscribed email: reactivated in place, 200.
/// Already active: 400.
pub async fn subscribe(
    State(state): State<AppState>,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubscriberResponse>), ApiError> {
    let Json(payload) = payload?;
    let new_subscriber = payload.validate()?;

    let existing = state
        .store
        .find_subscriber(&new_subscriber.email)
        .await
        .map_err(ApiError::persistence("Failed to subscribe"))?;

    match existing {
        Some(subscriber) if subscriber.status == SubscriberStatus::Unsubscribed => {
            let subscriber = state
                .store
                .set_subscriber_status(&subscriber.email, SubscriberStatus::Active)
                .await
                .map_err(ApiError::persistence("Failed to subscribe"))?
                .ok_or(ApiError::NotFound("Subscriber not found"))?;

            tracing::info!(subscriber_id = %subscriber.id, "subscriber reactivated");

            return Ok((
                StatusCode::OK,
                Json(SubscriberResponse {
                    success: true,
                    subscriber,
                }),
            ));
        }
        Some(_) => return Err(ApiError::Conflict("Email already subscribed")),
        None => {}
    }

    let subscriber = match state.store.create_subscriber(new_subscriber).await {
        Ok(subscriber) => subscriber,
        // Lost a race with a concurrent subscribe for the same address.
        Err(StoreError::Duplicate(_)) => return Err(ApiError::Conflict("Email already subscribed")),
        Err(e) => return Err(ApiError::persistence("Failed to subscribe")(e)),
    };

    tracing::info!(subscriber_id = %subscriber.id, "subscriber created");

    Ok((
        StatusCode::CREATED,
        Json(SubscriberResponse {
            success: true,
            subscriber,
        }),
    ))
}

/// PATCH /api/newsletter/subscribers - admin subscribe/unsubscribe toggle
pub async fn update_subscriber(
    State(state): State<AppState>,
    payload: Result<Json<UpdateSubscriberRequest>, JsonRejection>,
) -> Result<Json<SubscriberResponse>, ApiError> {
    let Json(payload) = payload?;

    let email = payload
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    let status = payload
        .status
        .as_deref()
        .and_then(|s| s.parse::<SubscriberStatus>().ok());

    let (Some(email), Some(status)) = (email, status) else {
        return Err(ApiError::invalid("Invalid request"));
    };

    let subscriber = state
        .store
        .set_subscriber_status(&email, status)
        .await
        .map_err(ApiError::persistence("Failed to update subscriber"))?
        .ok_or(ApiError::NotFound("Subscriber not found"))?;

    tracing::info!(subscriber_id = %subscriber.id, status = %status, "subscriber status updated");

    Ok(Json(SubscriberResponse {
        success: true,
        subscriber,
    }))
}

// ============================================================================
// Campaign handlers
// ============================================================================

/// GET /api/newsletter/campaigns
pub async fn list_campaigns(
    State(state): State<AppState>,
) -> Result<Json<Vec<NewsletterCampaign>>, ApiError> {
    let campaigns = state
        .store
        .list_campaigns()
        .await
        .map_err(ApiError::persistence("Failed to fetch campaigns"))?;

    Ok(Json(campaigns))
}

/// POST /api/newsletter/campaigns - store a draft
pub async fn create_campaign(
    State(state): State<AppState>,
    payload: Result<Json<CreateCampaignRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CampaignResponse>), ApiError> {
    let Json(payload) = payload?;
    let new_campaign = payload.validate()?;

    let campaign = state
        .store
        .create_campaign(new_campaign)
        .await
        .map_err(ApiError::persistence("Failed to create campaign"))?;

    tracing::info!(campaign_id = %campaign.id, "campaign drafted");

    Ok((
        StatusCode::CREATED,
        Json(CampaignResponse {
            success: true,
            campaign,
        }),
    ))
}

/// PATCH /api/newsletter/campaigns - record a campaign as sent. No mail goes
/// out; the metrics are reset to zero.
pub async fn send_campaign(
    State(state): State<AppState>,
    payload: Result<Json<SendCampaignRequest>, JsonRejection>,
) -> Result<Json<CampaignResponse>, ApiError> {
    let Json(payload) = payload?;

    let id = payload
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::invalid("Campaign ID is required"))?;

    let campaign = state
        .store
        .mark_campaign_sent(id, Utc::now())
        .await
        .map_err(ApiError::persistence("Failed to send campaign"))?
        .ok_or(ApiError::NotFound("Campaign not found"))?;

    tracing::info!(campaign_id = %campaign.id, "campaign marked as sent");

    Ok(Json(CampaignResponse {
        success: true,
        campaign,
    }))
}
