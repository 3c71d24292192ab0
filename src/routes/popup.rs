/**
 * Popup Routes
 * "Get a Free Quote" popup intake and listing
 */
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Deserializer};

use crate::db::models::{NewPopupSubmission, PopupSubmission};
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{self, ValidationError};

/// Categories offered by the popup form. Informational: the server accepts
/// any non-empty project type.
pub const PROJECT_TYPES: &[&str] = &[
    "residential",
    "commercial",
    "renovation",
    "sustainable",
    "custom",
    "consultation",
];

/// Request body for POST /api/popup
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePopupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    /// The popup form may post the phone as a bare JSON number.
    #[serde(default, deserialize_with = "string_or_number")]
    pub phone: Option<String>,
    pub project_type: Option<String>,
    pub message: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Phone {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Phone>::deserialize(deserializer)?.map(|phone| match phone {
        Phone::Text(text) => text,
        Phone::Number(number) => number.to_string(),
    }))
}

impl CreatePopupRequest {
    pub fn validate(self) -> Result<NewPopupSubmission, ValidationError> {
        let name = validation::required(self.name.as_deref(), "Name")?;
        let email = validation::email(self.email.as_deref())?;
        let project_type = validation::required(self.project_type.as_deref(), "Project type")?;
        let phone = validation::phone(self.phone.as_deref())?;

        if !PROJECT_TYPES.contains(&project_type.as_str()) {
            tracing::debug!(project_type = %project_type, "popup submitted with unlisted project type");
        }

        Ok(NewPopupSubmission {
            name,
            email,
            phone,
            project_type,
            message: validation::optional(self.message.as_deref()),
        })
    }
}

/// GET /api/popup - every popup submission, newest first
pub async fn list_popups(
    State(state): State<AppState>,
) -> Result<Json<Vec<PopupSubmission>>, ApiError> {
    let popups = state
        .store
        .list_popups()
        .await
        .map_err(ApiError::persistence("Failed to fetch popup submissions"))?;

    Ok(Json(popups))
}

/// POST /api/popup - quote request; responds with the stored document itself
pub async fn create_popup(
    State(state): State<AppState>,
    payload: Result<Json<CreatePopupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PopupSubmission>), ApiError> {
    let Json(payload) = payload?;
    let new_popup = payload.validate()?;

    let popup = state
        .store
        .create_popup(new_popup)
        .await
        .map_err(ApiError::persistence("Failed to create popup submission"))?;

    tracing::info!(popup_id = %popup.id, project_type = %popup.project_type, "popup submission created");

    Ok((StatusCode::CREATED, Json(popup)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{get, post, test_app};
    use serde_json::json;

    #[test]
    fn test_validate_requires_project_type() {
        let req = CreatePopupRequest {
            name: Some("Lin".into()),
            email: Some("lin@yahoo.com".into()),
            ..Default::default()
        };
        assert_eq!(
            req.validate().unwrap_err().message(),
            "Project type is required"
        );
    }

    #[test]
    fn test_validate_accepts_unlisted_project_type() {
        let req = CreatePopupRequest {
            name: Some("Lin".into()),
            email: Some("lin@yahoo.com".into()),
            project_type: Some("boathouse".into()),
            ..Default::default()
        };
        let popup = req.validate().unwrap();
        assert_eq!(popup.project_type, "boathouse");
        assert_eq!(popup.message, "");
    }

    #[tokio::test]
    async fn test_create_returns_bare_document() {
        let (app, _) = test_app();

        let (status, body) = post(
            &app,
            "/api/popup",
            json!({
                "name": "Lin",
                "email": "Lin@Yahoo.com",
                "phone": "555 123 4567",
                "projectType": "renovation",
                "message": "Two bathrooms"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["email"], "lin@yahoo.com");
        assert_eq!(body["source"], "popup");
        assert_eq!(body["status"], "new");
        assert_eq!(body["projectType"], "renovation");
        assert!(body["_id"].is_string());

        let (status, listed) = get(&app, "/api/popup").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed[0]["_id"], body["_id"]);
        assert_eq!(listed[0]["message"], "Two bathrooms");
    }

    #[test]
    fn test_phone_accepts_json_number() {
        let req: CreatePopupRequest = serde_json::from_value(serde_json::json!({
            "name": "Lin",
            "email": "lin@gmail.com",
            "projectType": "custom",
            "phone": 5551234567u64
        }))
        .unwrap();
        assert_eq!(req.phone.as_deref(), Some("5551234567"));

        let req: CreatePopupRequest =
            serde_json::from_value(serde_json::json!({ "phone": null })).unwrap();
        assert!(req.phone.is_none());
    }

    #[tokio::test]
    async fn test_numeric_phone_is_stored_as_text() {
        let (app, _) = test_app();

        let (status, body) = post(
            &app,
            "/api/popup",
            json!({ "name": "Lin", "email": "lin@gmail.com", "projectType": "custom", "phone": 5551234567u64 }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["phone"], "5551234567");

        let (status, body) = post(
            &app,
            "/api/popup",
            json!({ "name": "Lin", "email": "lin@gmail.com", "projectType": "custom", "phone": 12345 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Phone number must be 10 digits");
    }

    #[tokio::test]
    async fn test_rejects_bad_email_and_phone() {
        let (app, _) = test_app();

        let (status, body) = post(
            &app,
            "/api/popup",
            json!({ "name": "Lin", "email": "lin@outlook.com", "projectType": "custom" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email must end with @gmail.com or @yahoo.com");

        let (status, body) = post(
            &app,
            "/api/popup",
            json!({ "name": "Lin", "email": "lin@gmail.com", "projectType": "custom", "phone": "12345678901" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Phone number must be 10 digits");

        let (_, listed) = get(&app, "/api/popup").await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_create_fails_with_500_when_store_is_down() {
        let (app, store) = test_app();
        store.set_offline(true);

        let (status, body) = post(
            &app,
            "/api/popup",
            json!({ "name": "Lin", "email": "lin@gmail.com", "projectType": "custom" }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to create popup submission");
    }
}
