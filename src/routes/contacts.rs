/**
 * Contact Routes
 * "Contact Us" form intake and the admin contact inbox
 */
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::models::{Contact, LeadStatus, NewContact, DEFAULT_PROJECT_TYPE};
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{self, ValidationError};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for POST /api/contacts
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub project_type: Option<String>,
}

impl CreateContactRequest {
    pub fn validate(self) -> Result<NewContact, ValidationError> {
        let name = validation::required(self.name.as_deref(), "Name")?;
        let email = validation::email(self.email.as_deref())?;
        let message = validation::required(self.message.as_deref(), "Message")?;
        let phone = validation::phone(self.phone.as_deref())?;

        let project_type = match validation::optional(self.project_type.as_deref()) {
            p if p.is_empty() => DEFAULT_PROJECT_TYPE.to_string(),
            p => p,
        };

        Ok(NewContact {
            name,
            email,
            phone,
            message,
            project_type,
        })
    }
}

/// Request body for PATCH /api/contacts
#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    pub id: Option<String>,
    pub status: Option<String>,
}

/// Response for POST/PATCH /api/contacts
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub contact: Contact,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/contacts - every contact, newest first
pub async fn list_contacts(State(state): State<AppState>) -> Result<Json<Vec<Contact>>, ApiError> {
    let contacts = state
        .store
        .list_contacts()
        .await
        .map_err(ApiError::persistence("Failed to fetch contacts"))?;

    Ok(Json(contacts))
}

/// POST /api/contacts - contact form submission
pub async fn create_contact(
    State(state): State<AppState>,
    payload: Result<Json<CreateContactRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ContactResponse>), ApiError> {
    let Json(payload) = payload?;
    let new_contact = payload.validate()?;

    let contact = state
        .store
        .create_contact(new_contact)
        .await
        .map_err(ApiError::persistence("Failed to create contact"))?;

    tracing::info!(contact_id = %contact.id, "contact created");

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            contact,
        }),
    ))
}

/// PATCH /api/contacts - move a contact along new -> read -> replied
pub async fn update_contact_status(
    State(state): State<AppState>,
    payload: Result<Json<UpdateContactRequest>, JsonRejection>,
) -> Result<Json<ContactResponse>, ApiError> {
    let Json(payload) = payload?;

    let id = payload
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::invalid("Contact ID is required"))?;

    let status: LeadStatus = payload
        .status
        .as_deref()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ApiError::invalid("Status must be one of new, read, replied"))?;

    let current = state
        .store
        .find_contact(id)
        .await
        .map_err(ApiError::persistence("Failed to update contact"))?
        .ok_or(ApiError::NotFound("Contact not found"))?;

    if !current.status.can_become(status) {
        return Err(ApiError::invalid(format!(
            "Cannot change contact status from {} to {}",
            current.status, status
        )));
    }

    let contact = state
        .store
        .set_contact_status(id, status)
        .await
        .map_err(ApiError::persistence("Failed to update contact"))?
        .ok_or(ApiError::NotFound("Contact not found"))?;

    tracing::info!(contact_id = %contact.id, status = %status, "contact status updated");

    Ok(Json(ContactResponse {
        success: true,
        contact,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{get, patch, post, test_app};
    use serde_json::json;

    #[test]
    fn test_validate_defaults_project_type() {
        let req = CreateContactRequest {
            name: Some("Ada".into()),
            email: Some("Ada@Gmail.com".into()),
            message: Some("Living room refresh".into()),
            ..Default::default()
        };

        let contact = req.validate().unwrap();
        assert_eq!(contact.email, "ada@gmail.com");
        assert_eq!(contact.project_type, "residential");
        assert_eq!(contact.phone, "");
    }

    #[test]
    fn test_validate_requires_message() {
        let req = CreateContactRequest {
            name: Some("Ada".into()),
            email: Some("ada@gmail.com".into()),
            message: Some("   ".into()),
            ..Default::default()
        };

        assert_eq!(req.validate().unwrap_err().message(), "Message is required");
    }

    #[tokio::test]
    async fn test_rejects_disallowed_email_and_persists_nothing() {
        let (app, _) = test_app();

        let (status, body) = post(
            &app,
            "/api/contacts",
            json!({ "name": "A", "email": "a@hotmail.com", "message": "hi" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email must end with @gmail.com or @yahoo.com");

        let (_, listed) = get(&app, "/api/contacts").await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_creates_contact_with_lowercased_email() {
        let (app, _) = test_app();

        let (status, body) = post(
            &app,
            "/api/contacts",
            json!({ "name": "A", "email": "A@GMAIL.com", "message": "hi" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["contact"]["email"], "a@gmail.com");
        assert_eq!(body["contact"]["status"], "new");
        assert_eq!(body["contact"]["projectType"], "residential");

        let (status, listed) = get(&app, "/api/contacts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["_id"], body["contact"]["_id"]);
        assert_eq!(listed[0]["email"], "a@gmail.com");
    }

    #[tokio::test]
    async fn test_rejects_short_phone_accepts_formatted_phone() {
        let (app, _) = test_app();

        let (status, body) = post(
            &app,
            "/api/contacts",
            json!({ "name": "A", "email": "a@yahoo.com", "message": "hi", "phone": "555-1234" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Phone number must be 10 digits");

        let (status, body) = post(
            &app,
            "/api/contacts",
            json!({ "name": "A", "email": "a@yahoo.com", "message": "hi", "phone": "(555) 123-4567", "projectType": "commercial" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["contact"]["phone"], "(555) 123-4567");
        assert_eq!(body["contact"]["projectType"], "commercial");
    }

    #[tokio::test]
    async fn test_whitespace_phone_is_rejected_and_not_stored() {
        let (app, _) = test_app();

        let (status, body) = post(
            &app,
            "/api/contacts",
            json!({ "name": "A", "email": "a@gmail.com", "message": "hi", "phone": "   " }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Phone number must be 10 digits");

        let (_, listed) = get(&app, "/api/contacts").await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (app, _) = test_app();
        let (status, body) = crate::routes::test_support::send(
            &app,
            axum::http::Method::POST,
            "/api/contacts",
            Some(json!("not an object")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn test_listing_fails_with_500_when_store_is_down() {
        let (app, store) = test_app();
        store.set_offline(true);

        let (status, body) = get(&app, "/api/contacts").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch contacts");
    }

    #[tokio::test]
    async fn test_status_moves_forward_only() {
        let (app, _) = test_app();
        let (_, created) = post(
            &app,
            "/api/contacts",
            json!({ "name": "A", "email": "a@gmail.com", "message": "hi" }),
        )
        .await;
        let id = created["contact"]["_id"].clone();

        let (status, body) = patch(&app, "/api/contacts", json!({ "id": id, "status": "read" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["contact"]["status"], "read");

        let (status, body) =
            patch(&app, "/api/contacts", json!({ "id": id, "status": "replied" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["contact"]["status"], "replied");

        let (status, _) = patch(&app, "/api/contacts", json!({ "id": id, "status": "new" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_status_update_errors() {
        let (app, _) = test_app();

        let (status, _) = patch(&app, "/api/contacts", json!({ "status": "read" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = patch(
            &app,
            "/api/contacts",
            json!({ "id": "65f0c0ffee0000000000abcd", "status": "archived" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = patch(
            &app,
            "/api/contacts",
            json!({ "id": "65f0c0ffee0000000000abcd", "status": "read" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Contact not found");
    }
}
