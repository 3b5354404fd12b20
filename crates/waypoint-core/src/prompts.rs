//! Prompt templates for each generation step.
//!
//! Prompts are written in English and ask for Korean output. Every template
//! lists the variables it needs; the structured adapters fill
//! `format_instructions` themselves.

use crate::generation::{PromptTemplate, TemplateError};

pub const TRAITS_VARIABLES: &[&str] = &["place", "format_instructions"];

const TRAITS: &str = r#"You are a travel analyst. Analyse the travel destination below and extract its defining characteristics.

Destination: {{place}}

Instructions:
1. Keep "place" exactly as the destination given above.
2. List up to 8 primary traits (short Korean keywords), most characteristic first.
3. Group related tags into categories such as 자연, 문화, 음식, 활동.
4. Write a one-sentence Korean description of the destination.

{{format_instructions}}
"#;

pub const PURPOSE_VARIABLES: &[&str] = &["place_features", "user_purpose"];

const PURPOSE: &str = r#"You are a friendly travel planner chatting with a traveller in Korean.

Destination traits:
{{place_features}}

The traveller's purpose for this trip:
{{user_purpose}}

Reply in two or three Korean sentences: acknowledge the purpose, connect it to what the destination offers, and suggest what kind of experiences would suit it. Do not ask for information the traveller has not been asked for yet.
"#;

pub const RECOMMEND_VARIABLES: &[&str] = &[
    "place_name",
    "keywords",
    "main_purpose",
    "places_list",
    "limit",
    "format_instructions",
];

const RECOMMEND: &str = r#"You are a travel recommendation expert. Choose the best places for this traveller.

Traveller:
- Destination: {{place_name}}
- Keywords: {{keywords}}
- Purpose: {{main_purpose}}

Candidate places (number | name | address | description):
{{places_list}}

Instructions:
1. Select at most {{limit}} places that best match the keywords and purpose.
2. Copy each name and address exactly as written in the candidate list.
3. Give each place a one-sentence reason in Korean and a match_score from 1 to 10.

{{format_instructions}}
"#;

pub const PLANNER_VARIABLES: &[&str] = &[
    "main_place_name",
    "main_place_address",
    "main_place_latitude",
    "main_place_longitude",
    "main_place_reason",
    "categories",
    "main_purpose",
    "people",
    "travel_days",
    "considerations",
    "format_instructions",
];

const PLANNER: &str = r#"You are an expert travel planner. Build a complete {{travel_days}}-day itinerary in Korean.

Main destination:
- Name: {{main_place_name}}
- Address: {{main_place_address}}
- Coordinates: {{main_place_latitude}}, {{main_place_longitude}}
- Why it was chosen: {{main_place_reason}}

Traveller:
- Interests: {{categories}}
- Purpose: {{main_purpose}}
- Companions: {{people}}
- Considerations: {{considerations}}

Instructions:
1. Produce exactly {{travel_days}} entries in daily_plans, numbered from day 1 without gaps.
2. Each day's schedule is time-ordered and mixes places (kind "place"), meals (kind "restaurant", with cuisine_type and meal_time) and, except on the last day, lodging (kind "accommodation", with accommodation_type).
3. Keep travel between consecutive items realistic and close to the main destination.
4. Give every item a short Korean reason and every day a one-sentence summary.
5. Set total_days to {{travel_days}} and finish with a short overview with practical tips.

{{format_instructions}}
"#;

pub fn traits() -> Result<PromptTemplate, TemplateError> {
    PromptTemplate::new("place_traits", TRAITS, TRAITS_VARIABLES)
}

pub fn purpose() -> Result<PromptTemplate, TemplateError> {
    PromptTemplate::new("purpose_reply", PURPOSE, PURPOSE_VARIABLES)
}

pub fn recommend() -> Result<PromptTemplate, TemplateError> {
    PromptTemplate::new("recommend_places", RECOMMEND, RECOMMEND_VARIABLES)
}

pub fn planner() -> Result<PromptTemplate, TemplateError> {
    PromptTemplate::new("travel_plan", PLANNER, PLANNER_VARIABLES)
}
