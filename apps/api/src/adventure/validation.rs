//! Input validation — turns raw form fields into an `AdventureRequest`.
//!
//! Every violated field is collected before failing so the caller can fix the
//! whole form in one round trip. Unknown vibes are rejected here, unlike on the
//! output side where the normalizer silently corrects them.

use crate::adventure::models::{AdventureForm, AdventureRequest, Vibe};
use crate::errors::{AppError, FieldViolation};

const REQUIRED_FIELDS: &[(&str, &str)] = &[
    ("location", "Location is required"),
    ("timeWindow", "Time window is required"),
    ("interests", "Interests are required"),
];

pub fn validate_form(form: AdventureForm) -> Result<AdventureRequest, AppError> {
    let AdventureForm {
        location,
        time_window,
        interests,
        vibe,
        approximation_time,
    } = form;

    let mut violations = Vec::new();

    let required = [location, time_window, interests].map(non_empty);
    for (value, (field, message)) in required.iter().zip(REQUIRED_FIELDS) {
        if value.is_none() {
            violations.push(FieldViolation::new(*field, *message));
        }
    }

    let vibe = match non_empty(vibe) {
        None => None,
        Some(raw) => match Vibe::parse(&raw) {
            Some(v) => Some(v),
            None => {
                violations.push(FieldViolation::new(
                    "vibe",
                    format!("Invalid vibe '{raw}'; expected one of {}", Vibe::choices()),
                ));
                None
            }
        },
    };

    let [location, time_window, interests] = required;
    match (location, time_window, interests) {
        (Some(location), Some(time_window), Some(interests)) if violations.is_empty() => {
            Ok(AdventureRequest {
                location,
                time_window,
                interests,
                vibe,
                approximation_time: non_empty(approximation_time),
            })
        }
        _ => Err(AppError::Validation(violations)),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
