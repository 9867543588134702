use std::fmt;

use serde::{Deserialize, Serialize};

/// Overall mood of an itinerary. Wire form is the lower-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vibe {
    Chill,
    Quirky,
    Energetic,
    Romantic,
    Cultural,
    Balanced,
}

impl Vibe {
    pub const ALL: [Vibe; 6] = [
        Vibe::Chill,
        Vibe::Quirky,
        Vibe::Energetic,
        Vibe::Romantic,
        Vibe::Cultural,
        Vibe::Balanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Vibe::Chill => "chill",
            Vibe::Quirky => "quirky",
            Vibe::Energetic => "energetic",
            Vibe::Romantic => "romantic",
            Vibe::Cultural => "cultural",
            Vibe::Balanced => "balanced",
        }
    }

    /// Exact, case-sensitive match against the wire names.
    pub fn parse(value: &str) -> Option<Vibe> {
        Vibe::ALL.into_iter().find(|v| v.as_str() == value)
    }

    /// Comma-separated list of accepted names, for prompts and error messages.
    pub fn choices() -> String {
        Vibe::ALL
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Vibe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw inbound form fields, exactly as submitted. Nothing is checked yet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdventureForm {
    pub location: Option<String>,
    pub time_window: Option<String>,
    pub interests: Option<String>,
    pub vibe: Option<String>,
    pub approximation_time: Option<String>,
}

/// Validated input. Built only by `validation::validate_form`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdventureRequest {
    pub location: String,
    pub time_window: String,
    pub interests: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibe: Option<Vibe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approximation_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdventureStop {
    pub time: String,
    pub location: String,
    pub activity: String,
    pub duration: String,
    pub quirky_detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdventureStats {
    pub travel_time: String,
    /// `$<n>`, `$<n>-<m>`, `$<n>+` or `N/A`.
    pub cost: String,
    /// 1 – 10
    pub fun_factor: u8,
}

/// Canonical itinerary returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adventure {
    pub location: String,
    pub time_window: String,
    pub interests: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibe: Option<Vibe>,
    pub title: String,
    /// Visiting order.
    pub stops: Vec<AdventureStop>,
    pub stats: AdventureStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximation_time: Option<String>,
}
