//! `POST /recommendations` and `POST /food-details`.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::Deserialize;

use super::{parse_body, verify_human};
use crate::features::Feature;
use crate::providers::recaptcha::{ACTION_FOOD_DETAILS, ACTION_RECOMMENDATIONS};
use crate::server::error::ApiError;
use crate::server::state::AppState;
use crate::services::RecommendationQuery;
use crate::types::{FoodInfo, FoodRecommendation, MealType, Weather};

const RECOMMENDATIONS_FAILED: &str = "Failed to generate food recommendations";
const DETAILS_FAILED: &str = "Failed to get food details";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default)]
    pub weather: Option<Weather>,
    #[serde(default)]
    pub excluded_foods: Vec<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub number_of_diners: Option<u32>,
    #[serde(default)]
    pub meal_type: Option<MealType>,
    #[serde(default)]
    pub special_requirements: Option<String>,
    #[serde(default, alias = "recaptchaToken")]
    pub verification_token: Option<String>,
}

impl RecommendationRequest {
    fn into_query(self) -> (RecommendationQuery, Option<String>) {
        let query = RecommendationQuery {
            weather: self.weather,
            excluded_foods: self.excluded_foods,
            locale: self.locale,
            number_of_diners: self.number_of_diners,
            meal_type: self.meal_type,
            special_requirements: self.special_requirements,
        };
        (query, self.verification_token)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodDetailsRequest {
    pub name: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default, alias = "recaptchaToken")]
    pub verification_token: Option<String>,
}

/// POST /recommendations
///
/// Checks run in order: feature gate, body shape, weather presence, human
/// verification, then the per-input feature gates.
pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<FoodRecommendation>, ApiError> {
    state
        .flags
        .require(Feature::FoodRecommendations)
        .map_err(|e| ApiError::forbidden(e.to_string()))?;

    let request: RecommendationRequest = parse_body(&body)?;
    if request.number_of_diners == Some(0) {
        return Err(ApiError::invalid(
            "Invalid request data",
            serde_json::json!({ "numberOfDiners": "Number of diners must be positive" }),
        ));
    }
    let (query, token) = request.into_query();

    let has_weather = query
        .weather
        .as_ref()
        .is_some_and(|w| !w.condition.trim().is_empty());
    if state.flags.is_enabled(Feature::UseWeatherForRecommendations) && !has_weather {
        return Err(ApiError::bad_request(
            "Weather data is required for food recommendations",
        ));
    }

    verify_human(&state, token.as_deref(), ACTION_RECOMMENDATIONS).await?;

    query
        .check_features(&state.flags)
        .map_err(|e| ApiError::forbidden(e.to_string()))?;

    state
        .food
        .recommend(&query)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_service(e, RECOMMENDATIONS_FAILED))
}

/// POST /food-details
pub async fn food_details(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<FoodInfo>, ApiError> {
    state
        .flags
        .require(Feature::FoodDetails)
        .map_err(|e| ApiError::forbidden(e.to_string()))?;

    let request: FoodDetailsRequest = parse_body(&body)?;
    if request.name.trim().is_empty() {
        return Err(ApiError::invalid(
            "Invalid request data",
            serde_json::json!({ "name": "Food name is required" }),
        ));
    }

    verify_human(&state, request.verification_token.as_deref(), ACTION_FOOD_DETAILS).await?;

    let locale = request
        .locale
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| state.default_locale.clone());
    state
        .food
        .details(&request.name, Some(&locale))
        .await
        .map(Json)
        .map_err(|e| ApiError::from_service(e, DETAILS_FAILED))
}
