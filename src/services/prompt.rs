//! Prompt construction for the LLM-backed fetchers.
//!
//! Prompts vary with the enabled feature flags and the response language.
//! Both ask for a single JSON object with an exact field set.

use std::fmt::Write;

use crate::features::{Feature, FeatureFlags};
use crate::types::{MealType, RECOMMENDATION_COUNT};

use super::food::RecommendationQuery;

/// Language the model is asked to answer in.
///
/// `vi` → Vietnamese, `fr` → French, anything else → English.
pub fn response_language(locale: Option<&str>) -> &'static str {
    match locale {
        Some("vi") => "Vietnamese",
        Some("fr") => "French",
        _ => "English",
    }
}

/// System + user prompt for a food-details request.
pub fn food_details(name: &str, locale: Option<&str>) -> (String, String) {
    let language = response_language(locale);
    let system = format!(
        "You are a helpful assistant that provides detailed information about foods and dishes. \
         Respond only in {language} with the requested JSON format."
    );
    let user = format!(
        "As a culinary expert, please provide detailed information about the dish or food called \"{name}\".\n\
         \n\
         Please include:\n\
         1. A brief description of the dish\n\
         2. A list of main ingredients\n\
         3. A brief overview of how it's prepared\n\
         \n\
         Format your response as a JSON object with EXACTLY these fields:\n\
         - 'name': the name of the dish\n\
         - 'description': a string with a description\n\
         - 'ingredients': an array of strings listing the main ingredients\n\
         - 'preparation': a string explaining how it's prepared"
    );
    (system, user)
}

/// System + user prompt for a recommendation request.
///
/// Sections are included only when their feature flag is on and the query
/// carries the corresponding input.
pub fn recommendations(flags: &FeatureFlags, query: &RecommendationQuery) -> (String, String) {
    let language = response_language(query.locale.as_deref());
    let system = format!(
        "You are a helpful assistant that provides food recommendations based on weather and user preferences.\n\
         Respond only in {language} with the requested JSON format.\n\
         IMPORTANT: When a location is provided, your recommended foods should be authentic and appropriate \
         to that location's cuisine and culinary traditions. Do not recommend dishes from other regions unless \
         they are commonly eaten in the specified location."
    );

    let use_weather = flags.is_enabled(Feature::UseWeatherForRecommendations);
    let use_location = flags.is_enabled(Feature::UseLocationForRecommendations);
    let location = query
        .weather
        .as_ref()
        .map(|w| w.location.trim())
        .filter(|l| use_location && !l.is_empty());

    let mut user = format!(
        "As a culinary expert, please recommend {RECOMMENDATION_COUNT} delicious foods or dishes"
    );

    match &query.weather {
        Some(weather) if use_weather || use_location => {
            user.push_str(" that would be perfect for the following conditions:\n");
            if let Some(location) = location {
                let _ = write!(
                    user,
                    "\nLocation: {location}\n\
                     IMPORTANT: Please recommend dishes that are popular, traditional, or commonly eaten in {location}. \
                     The recommendations should reflect the local cuisine and food culture of this location."
                );
            }
            if use_weather {
                let _ = write!(
                    user,
                    "\nTemperature: {}°C\nWeather Condition: {}",
                    weather.temperature, weather.condition_text
                );
            }
        }
        _ => user.push_str(" that are generally popular and delicious."),
    }

    if flags.is_enabled(Feature::FoodExclusions) && !query.excluded_foods.is_empty() {
        let _ = write!(
            user,
            "\n\nIMPORTANT: The user has specified the following foods or ingredients to exclude. \
             DO NOT recommend these foods or any dishes containing these ingredients:\n{}",
            query.excluded_foods.join(", ")
        );
    }

    if let Some(diners) = query.diners().filter(|_| flags.is_enabled(Feature::NumberOfDiners)) {
        let _ = write!(
            user,
            "\n\nThe user is planning a meal for {diners} people dining together. Please recommend foods that:\n\
             1. Are suitable for sharing in a group setting\n\
             2. Can be served family-style or as a shared platter\n\
             3. Are crowd-pleasers that appeal to diverse tastes\n\
             4. Are appropriate portion sizes for {diners} people"
        );
    }

    if let Some(meal_type) = query.meal_type.filter(|_| flags.is_enabled(Feature::MealTypeSelection)) {
        user.push_str(match meal_type {
            MealType::Full => {
                "\n\nThe user has requested a FULL SET MEAL recommendation. Please provide a complete meal set that includes:\n\
                 1. Main dishes (protein-focused dishes)\n\
                 2. Side dishes (vegetables, starches, etc.)\n\
                 3. Desserts or beverages to complete the meal\n\
                 4. Ensure the combination creates a balanced and cohesive dining experience"
            }
            MealType::Single => {
                "\n\nThe user has requested SINGLE DISH recommendations. Please provide individual dishes that:\n\
                 1. Are complete meals on their own\n\
                 2. Don't require additional side dishes to be satisfying\n\
                 3. Are well-balanced in terms of nutrition and flavor"
            }
        });
    }

    if let Some(requirements) = query.special_requirements(flags) {
        let _ = write!(
            user,
            "\n\nIMPORTANT: The user has provided the following special requirements or preferences. \
             Please consider these when making your recommendations:\n{requirements}"
        );
    }

    let conditions_clause = if use_weather { " in these conditions" } else { "" };
    let reasoning_clause = if use_weather {
        "for this weather (considering comfort, seasonal ingredients, local traditions, etc.)"
    } else {
        "based on your expertise"
    };
    let (authentic_clause, cuisine_clause) = match location {
        Some(location) => (
            format!(" and authentic to {location}"),
            format!(" and why they represent the cuisine of {location}"),
        ),
        None => (String::new(), String::new()),
    };
    let _ = write!(
        user,
        "\n\nPlease provide:\n\
         1. A mouthwatering list of {RECOMMENDATION_COUNT} recommended foods or dishes that would be especially enjoyable{conditions_clause}{authentic_clause}\n\
         2. A brief explanation of why these culinary choices are ideal {reasoning_clause}{cuisine_clause}\n\
         \n\
         IMPORTANT: Format your response as a JSON object with EXACTLY these two fields:\n\
         - 'foods': an array of strings with ONLY the food names (e.g. [\"Pasta\", \"Pizza\", \"Soup\"]). \
         Each item must be a simple food name without descriptions or additional details.\n\
         - 'reasoning': a string explaining why these foods are recommended\n\
         \n\
         Example of correct format:\n\
         {{\"foods\": [\"Hot Chocolate\", \"Beef Stew\", \"Roasted Chicken\", \"Pumpkin Soup\", \"Apple Pie\", \"Mulled Wine\"], \
         \"reasoning\": \"These warming foods are perfect for cold weather because...\"}}"
    );

    (system, user)
}
