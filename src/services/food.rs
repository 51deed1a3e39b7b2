//! LLM-backed food recommendations and dish details.
//!
//! Model output is untrusted. It is parsed into strict types, and a payload
//! with missing or extra fields is a [`ForkcastError::MalformedResponse`].
//! Nothing is retried locally on a parse failure.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::{CachePolicy, CompletionRouter, prompt};
use crate::cache::CacheNamespace;
use crate::features::{Feature, FeatureFlags};
use crate::types::{DEFAULT_MODEL_CONFIG, FoodInfo, FoodRecommendation, MealType, RECOMMENDATION_COUNT, Weather};
use crate::{ForkcastError, Result};

/// Characters of free-text requirements that take part in the cache key.
const REQUIREMENTS_KEY_CHARS: usize = 50;

/// Inputs to a recommendation request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationQuery {
    pub weather: Option<Weather>,
    pub excluded_foods: Vec<String>,
    pub locale: Option<String>,
    pub number_of_diners: Option<u32>,
    pub meal_type: Option<MealType>,
    pub special_requirements: Option<String>,
}

impl RecommendationQuery {
    /// Party size, only when more than one person is dining.
    pub fn diners(&self) -> Option<u32> {
        self.number_of_diners.filter(|n| *n > 1)
    }

    /// Trimmed special requirements, when present and allowed by `flags`.
    pub fn special_requirements(&self, flags: &FeatureFlags) -> Option<&str> {
        if !flags.is_enabled(Feature::ExtendedSettings)
            || !flags.is_enabled(Feature::SpecialRequirements)
        {
            return None;
        }
        self.requested_requirements()
    }

    fn requested_requirements(&self) -> Option<&str> {
        self.special_requirements
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Reject inputs that need a disabled feature.
    pub fn check_features(&self, flags: &FeatureFlags) -> Result<()> {
        if !self.excluded_foods.is_empty() {
            flags.require(Feature::FoodExclusions)?;
        }
        if self.diners().is_some() {
            flags.require(Feature::NumberOfDiners)?;
        }
        if self.meal_type.is_some() {
            flags.require(Feature::MealTypeSelection)?;
        }
        if self.requested_requirements().is_some() && self.special_requirements(flags).is_none() {
            return Err(ForkcastError::FeatureDisabled(Feature::SpecialRequirements.label()));
        }
        Ok(())
    }

    /// Cache key built from the inputs that reach the prompt.
    ///
    /// Exclusions are order-insensitive and requirements are truncated.
    pub fn cache_key(&self, flags: &FeatureFlags) -> String {
        let location = self
            .weather
            .as_ref()
            .filter(|_| flags.is_enabled(Feature::UseLocationForRecommendations))
            .map(|w| w.location.trim().to_string())
            .filter(|l| !l.is_empty());
        let (temperature, condition) = match &self.weather {
            Some(w) if flags.is_enabled(Feature::UseWeatherForRecommendations) => (
                Some(format!("{:.1}", w.temperature)),
                Some(w.condition.clone()),
            ),
            _ => (None, None),
        };
        // One part per exclusion, length-tagged so names containing the
        // separator cannot collide with a longer list.
        let mut exclusions: Vec<String> = if flags.is_enabled(Feature::FoodExclusions) {
            self.excluded_foods
                .iter()
                .map(|food| format!("excl{}:{food}", food.len()))
                .collect()
        } else {
            Vec::new()
        };
        exclusions.sort();
        let diners = self
            .diners()
            .filter(|_| flags.is_enabled(Feature::NumberOfDiners))
            .map(|n| format!("diners:{n}"));
        let meal_type = self
            .meal_type
            .filter(|_| flags.is_enabled(Feature::MealTypeSelection))
            .map(|m| format!("mealType:{}", m.as_str()));
        let requirements = self.special_requirements(flags).map(|s| {
            let head: String = s.chars().take(REQUIREMENTS_KEY_CHARS).collect();
            format!("req:{head}")
        });

        let mut parts = vec![location, temperature, condition];
        parts.extend(exclusions.into_iter().map(Some));
        parts.extend([self.locale.clone(), diners, meal_type, requirements]);
        CacheNamespace::FoodRecommendation.key(parts)
    }
}

/// Cache key for a dish lookup: name case and padding are ignored.
pub fn details_key(name: &str, locale: Option<&str>) -> String {
    CacheNamespace::FoodDetails.key([
        Some(name.trim().to_lowercase()),
        locale.map(str::to_string),
    ])
}

#[derive(Debug, Clone)]
pub struct FoodService {
    llm: Arc<CompletionRouter>,
    model_config: String,
    flags: FeatureFlags,
    cache: CachePolicy,
}

impl FoodService {
    pub fn new(llm: Arc<CompletionRouter>, flags: FeatureFlags, cache: CachePolicy) -> Self {
        Self {
            llm,
            model_config: DEFAULT_MODEL_CONFIG.to_string(),
            flags,
            cache,
        }
    }

    /// Route completions through a model configuration other than the default.
    pub fn with_model_config(mut self, name: impl Into<String>) -> Self {
        self.model_config = name.into();
        self
    }

    pub fn model_config(&self) -> &str {
        &self.model_config
    }

    /// Recommend dishes for the query. Gated on `foodRecommendations`.
    #[instrument(skip_all, fields(locale = query.locale.as_deref()))]
    pub async fn recommend(&self, query: &RecommendationQuery) -> Result<FoodRecommendation> {
        self.flags.require(Feature::FoodRecommendations)?;
        query.check_features(&self.flags)?;
        self.cache
            .fetch(
                CacheNamespace::FoodRecommendation,
                || query.cache_key(&self.flags),
                || self.fetch_recommendations(query),
            )
            .await
    }

    /// Describe a single dish. Gated on `foodDetails`.
    #[instrument(skip(self))]
    pub async fn details(&self, name: &str, locale: Option<&str>) -> Result<FoodInfo> {
        self.flags.require(Feature::FoodDetails)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ForkcastError::InvalidInput("food name must not be empty".into()));
        }
        self.cache
            .fetch(
                CacheNamespace::FoodDetails,
                || details_key(name, locale),
                || self.fetch_details(name, locale),
            )
            .await
    }

    async fn fetch_recommendations(&self, query: &RecommendationQuery) -> Result<FoodRecommendation> {
        let (system, user) = prompt::recommendations(&self.flags, query);
        let content = self.llm.complete(&self.model_config, system, user).await?;
        let recommendation = parse_recommendation(&content)?;
        info!(count = recommendation.foods.len(), "generated recommendations");
        Ok(recommendation)
    }

    async fn fetch_details(&self, name: &str, locale: Option<&str>) -> Result<FoodInfo> {
        let (system, user) = prompt::food_details(name, locale);
        let content = self.llm.complete(&self.model_config, system, user).await?;
        parse_food_info(&content)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRecommendation {
    foods: Vec<String>,
    reasoning: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFoodInfo {
    name: String,
    description: String,
    ingredients: Vec<String>,
    preparation: String,
}

fn malformed(what: &str, e: impl std::fmt::Display) -> ForkcastError {
    ForkcastError::MalformedResponse(format!("{what}: {e}"))
}

/// Parse and validate a recommendation payload.
///
/// At most [`RECOMMENDATION_COUNT`] names are kept. A shorter list is
/// accepted with a warning.
pub fn parse_recommendation(content: &str) -> Result<FoodRecommendation> {
    let raw: RawRecommendation =
        serde_json::from_str(content).map_err(|e| malformed("recommendation", e))?;

    let mut foods: Vec<String> = raw.foods.iter().map(|f| f.trim().to_string()).collect();
    if foods.is_empty() || foods.iter().any(String::is_empty) {
        return Err(malformed("recommendation", "food names must be non-empty"));
    }
    if foods.len() < RECOMMENDATION_COUNT {
        warn!(count = foods.len(), "model returned fewer foods than requested");
    }
    foods.truncate(RECOMMENDATION_COUNT);

    Ok(FoodRecommendation {
        foods,
        reasoning: raw.reasoning,
    })
}

/// Parse and validate a dish-details payload.
pub fn parse_food_info(content: &str) -> Result<FoodInfo> {
    let raw: RawFoodInfo = serde_json::from_str(content).map_err(|e| malformed("food details", e))?;
    let name = raw.name.trim();
    if name.is_empty() {
        return Err(malformed("food details", "name must be non-empty"));
    }
    Ok(FoodInfo {
        name: name.to_string(),
        description: raw.description,
        ingredients: raw.ingredients,
        preparation: raw.preparation,
    })
}
