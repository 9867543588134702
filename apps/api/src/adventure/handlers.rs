//! Axum route handlers for the Adventure API.

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    Form, Json,
};

use crate::adventure::generator::generate_adventure;
use crate::adventure::models::{Adventure, AdventureForm};
use crate::errors::{AppError, FieldViolation};
use crate::state::AppState;

/// Extracts `AdventureForm` from multipart, urlencoded, or JSON bodies.
/// The browser form posts multipart; scripts usually send JSON.
pub struct AdventureFormBody(pub AdventureForm);

#[async_trait]
impl<S> FromRequest<S> for AdventureFormBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let form = if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| malformed_body(e.body_text()))?;
            read_multipart(multipart).await?
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(form) = Form::<AdventureForm>::from_request(req, state)
                .await
                .map_err(|e| malformed_body(e.body_text()))?;
            form
        } else {
            let Json(form) = Json::<AdventureForm>::from_request(req, state)
                .await
                .map_err(|e| malformed_body(e.body_text()))?;
            form
        };

        Ok(AdventureFormBody(form))
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<AdventureForm, AppError> {
    let mut form = AdventureForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| malformed_body(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let slot = match name.as_str() {
            "location" => &mut form.location,
            "timeWindow" => &mut form.time_window,
            "interests" => &mut form.interests,
            "vibe" => &mut form.vibe,
            "approximationTime" => &mut form.approximation_time,
            _ => continue,
        };
        let value = field
            .text()
            .await
            .map_err(|e| malformed_body(e.body_text()))?;
        *slot = Some(value);
    }

    Ok(form)
}

fn malformed_body(reason: String) -> AppError {
    AppError::Validation(vec![FieldViolation::new("body", reason)])
}

/// POST /api/generate
///
/// Validates the form, asks the completion service for an itinerary, and
/// returns it normalized. A reroll is the same call made again.
pub async fn handle_generate(
    State(state): State<AppState>,
    AdventureFormBody(form): AdventureFormBody,
) -> Result<Json<Adventure>, AppError> {
    let adventure = generate_adventure(state.completion.as_ref(), form).await?;
    Ok(Json(adventure))
}
