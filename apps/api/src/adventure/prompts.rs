// Prompt text for itinerary generation.
// The normalizer's repair rules are tuned to the response shape described here;
// change both together.

use crate::adventure::models::AdventureRequest;

/// Fixed part of the system instruction.
pub const ADVENTURE_SYSTEM: &str = "You are MicroQuest, an assistant that plans personalized \
micro-adventures from a location, a time window, and a set of interests. \
Craft a bite-sized itinerary with specific stops, activities, and quirky details.

IMPORTANT RULES:
1. Always respond with a valid JSON object that exactly matches the schema provided by the user.
2. The \"vibe\" field must be one of these values only: 'chill', 'quirky', 'energetic', 'romantic', 'cultural', 'balanced'.
3. The \"interests\" field must be a string, not an array.
4. All required fields must be included.
5. The \"stops\" field must be an array of objects, each with time, location, activity, duration, and quirkyDetail.
6. The \"stats\" field must include travelTime, cost, and funFactor.
7. The funFactor must be a whole number between 1-10, based on how well the adventure matches the user's interests and vibe:
   - 1-3: Not a match
   - 4-6: Decent match with basic activities
   - 7-8: Good match with interesting activities
   - 9-10: Perfect match with exceptional activities and experiences";

/// Appended to the system instruction only when the user supplied time hints.
pub const TIME_APPROXIMATION_RULE: &str =
    "Use the provided time approximations to create a realistic itinerary with specific times.";

/// System and user text for one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdventurePrompt {
    pub system: String,
    pub user: String,
}

/// Renders the prompt for a validated request. Pure and deterministic.
pub fn build_prompt(request: &AdventureRequest) -> AdventurePrompt {
    let mut system = ADVENTURE_SYSTEM.to_string();
    if request.approximation_time.is_some() {
        system.push_str("\n\n");
        system.push_str(TIME_APPROXIMATION_RULE);
    }

    let mut user = format!(
        "Create a micro-adventure in {} for a time window of {} with interests in {}.",
        request.location, request.time_window, request.interests
    );
    if let Some(vibe) = request.vibe {
        user.push_str(&vibe_clause(vibe.as_str()));
    }
    if let Some(approximation) = &request.approximation_time {
        user.push_str(&approximation_clause(approximation));
    }
    user.push_str("\n\n");
    user.push_str(&response_shape(request));

    AdventurePrompt { system, user }
}

fn vibe_clause(vibe: &str) -> String {
    format!(" The adventure should have a {vibe} vibe.")
}

fn approximation_clause(approximation: &str) -> String {
    format!(" Please use these specific time approximations for the itinerary: {approximation}.")
}

/// The literal JSON contract the model is asked to follow.
fn response_shape(request: &AdventureRequest) -> String {
    let vibe = request.vibe.map(|v| v.as_str()).unwrap_or("balanced");
    format!(
        r#"Please respond with a JSON object that strictly follows this structure:
{{
  "location": {location},
  "timeWindow": {time_window},
  "interests": {interests},
  "vibe": "{vibe}",
  "title": "A creative title for the adventure",
  "stops": [
    {{
      "time": "Time for this stop (e.g., '10:00 AM')",
      "location": "Name of the location",
      "activity": "Description of the activity",
      "duration": "Duration (e.g., '1 hour')",
      "quirkyDetail": "A unique or interesting detail about this stop"
    }}
  ],
  "stats": {{
    "travelTime": "Estimated travel time between locations",
    "cost": "Estimated cost range (e.g., '$10-20')",
    "funFactor": "A number between 1-10 based on how enjoyable and exciting this adventure would be"
  }}
}}

Include 2-3 stops in total. If the time window comfortably allows it, add more stops."#,
        location = json_string(&request.location),
        time_window = json_string(&request.time_window),
        interests = json_string(&request.interests),
    )
}

/// Quoted, escaped JSON string literal.
fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
