//! Feature flags.
//!
//! A fixed set of named booleans consumed read-only by the fetchers and
//! route handlers. Every flag defaults to enabled; deployments switch
//! features off through the `[features]` config table or through
//! `FORKCAST_FEATURE_<FLAG>=false` environment overrides.

use serde::{Deserialize, Serialize};

/// Environment prefix for per-flag overrides.
pub const FEATURE_ENV_PREFIX: &str = "FORKCAST_FEATURE_";

/// Named feature switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    IpGeolocation,
    ManualLocation,
    MapDisplay,
    FoodRecommendations,
    FoodDetails,
    FoodExclusions,
    ExtendedSettings,
    MealTypeSelection,
    SpecialRequirements,
    NumberOfDiners,
    FoodComparisonList,
    UseWeatherForRecommendations,
    UseLocationForRecommendations,
    Recaptcha,
    EnableCaching,
}

impl Feature {
    pub const ALL: [Feature; 15] = [
        Feature::IpGeolocation,
        Feature::ManualLocation,
        Feature::MapDisplay,
        Feature::FoodRecommendations,
        Feature::FoodDetails,
        Feature::FoodExclusions,
        Feature::ExtendedSettings,
        Feature::MealTypeSelection,
        Feature::SpecialRequirements,
        Feature::NumberOfDiners,
        Feature::FoodComparisonList,
        Feature::UseWeatherForRecommendations,
        Feature::UseLocationForRecommendations,
        Feature::Recaptcha,
        Feature::EnableCaching,
    ];

    /// Flag name as used in config files and API payloads.
    pub fn name(&self) -> &'static str {
        match self {
            Feature::IpGeolocation => "ipGeolocation",
            Feature::ManualLocation => "manualLocation",
            Feature::MapDisplay => "mapDisplay",
            Feature::FoodRecommendations => "foodRecommendations",
            Feature::FoodDetails => "foodDetails",
            Feature::FoodExclusions => "foodExclusions",
            Feature::ExtendedSettings => "extendedSettings",
            Feature::MealTypeSelection => "mealTypeSelection",
            Feature::SpecialRequirements => "specialRequirements",
            Feature::NumberOfDiners => "numberOfDiners",
            Feature::FoodComparisonList => "foodComparisonList",
            Feature::UseWeatherForRecommendations => "useWeatherForRecommendations",
            Feature::UseLocationForRecommendations => "useLocationForRecommendations",
            Feature::Recaptcha => "recaptcha",
            Feature::EnableCaching => "enableCaching",
        }
    }

    /// Human label used in "feature is disabled" errors.
    pub fn label(&self) -> &'static str {
        match self {
            Feature::IpGeolocation => "IP geolocation",
            Feature::ManualLocation => "Manual location",
            Feature::MapDisplay => "Map display",
            Feature::FoodRecommendations => "Food recommendations",
            Feature::FoodDetails => "Food details",
            Feature::FoodExclusions => "Food exclusions",
            Feature::ExtendedSettings => "Extended settings",
            Feature::MealTypeSelection => "Meal type selection",
            Feature::SpecialRequirements => "Special requirements",
            Feature::NumberOfDiners => "Number of diners",
            Feature::FoodComparisonList => "Food comparison list",
            Feature::UseWeatherForRecommendations => "Weather-based recommendations",
            Feature::UseLocationForRecommendations => "Location-based recommendations",
            Feature::Recaptcha => "Human verification",
            Feature::EnableCaching => "Caching",
        }
    }

    /// Environment variable overriding this flag, e.g. `FORKCAST_FEATURE_ENABLE_CACHING`.
    pub fn env_var(&self) -> String {
        let mut var = String::from(FEATURE_ENV_PREFIX);
        for (i, ch) in self.name().chars().enumerate() {
            if ch.is_ascii_uppercase() && i > 0 {
                var.push('_');
            }
            var.push(ch.to_ascii_uppercase());
        }
        var
    }
}

/// Snapshot of all feature flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureFlags {
    pub ip_geolocation: bool,
    pub manual_location: bool,
    pub map_display: bool,
    pub food_recommendations: bool,
    pub food_details: bool,
    pub food_exclusions: bool,
    pub extended_settings: bool,
    pub meal_type_selection: bool,
    pub special_requirements: bool,
    pub number_of_diners: bool,
    pub food_comparison_list: bool,
    pub use_weather_for_recommendations: bool,
    pub use_location_for_recommendations: bool,
    pub recaptcha: bool,
    pub enable_caching: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            ip_geolocation: true,
            manual_location: true,
            map_display: true,
            food_recommendations: true,
            food_details: true,
            food_exclusions: true,
            extended_settings: true,
            meal_type_selection: true,
            special_requirements: true,
            number_of_diners: true,
            food_comparison_list: true,
            use_weather_for_recommendations: true,
            use_location_for_recommendations: true,
            recaptcha: true,
            enable_caching: true,
        }
    }
}

impl FeatureFlags {
    /// All flags enabled.
    pub fn all_enabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        *self.slot(feature)
    }

    /// Builder-style toggle, mostly for tests and embedding applications.
    pub fn with(mut self, feature: Feature, enabled: bool) -> Self {
        *self.slot_mut(feature) = enabled;
        self
    }

    /// Fail with [`ForkcastError::FeatureDisabled`](crate::ForkcastError::FeatureDisabled)
    /// when `feature` is off.
    pub fn require(&self, feature: Feature) -> crate::Result<()> {
        if self.is_enabled(feature) {
            Ok(())
        } else {
            Err(crate::ForkcastError::FeatureDisabled(feature.label()))
        }
    }

    /// Apply `FORKCAST_FEATURE_*` overrides using the given lookup.
    ///
    /// Only the literal value `false` disables a flag; any other value
    /// enables it.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for feature in Feature::ALL {
            if let Some(value) = lookup(&feature.env_var()) {
                *self.slot_mut(feature) = value.trim() != "false";
            }
        }
        self
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn slot(&self, feature: Feature) -> &bool {
        match feature {
            Feature::IpGeolocation => &self.ip_geolocation,
            Feature::ManualLocation => &self.manual_location,
            Feature::MapDisplay => &self.map_display,
            Feature::FoodRecommendations => &self.food_recommendations,
            Feature::FoodDetails => &self.food_details,
            Feature::FoodExclusions => &self.food_exclusions,
            Feature::ExtendedSettings => &self.extended_settings,
            Feature::MealTypeSelection => &self.meal_type_selection,
            Feature::SpecialRequirements => &self.special_requirements,
            Feature::NumberOfDiners => &self.number_of_diners,
            Feature::FoodComparisonList => &self.food_comparison_list,
            Feature::UseWeatherForRecommendations => &self.use_weather_for_recommendations,
            Feature::UseLocationForRecommendations => &self.use_location_for_recommendations,
            Feature::Recaptcha => &self.recaptcha,
            Feature::EnableCaching => &self.enable_caching,
        }
    }

    fn slot_mut(&mut self, feature: Feature) -> &mut bool {
        match feature {
            Feature::IpGeolocation => &mut self.ip_geolocation,
            Feature::ManualLocation => &mut self.manual_location,
            Feature::MapDisplay => &mut self.map_display,
            Feature::FoodRecommendations => &mut self.food_recommendations,
            Feature::FoodDetails => &mut self.food_details,
            Feature::FoodExclusions => &mut self.food_exclusions,
            Feature::ExtendedSettings => &mut self.extended_settings,
            Feature::MealTypeSelection => &mut self.meal_type_selection,
            Feature::SpecialRequirements => &mut self.special_requirements,
            Feature::NumberOfDiners => &mut self.number_of_diners,
            Feature::FoodComparisonList => &mut self.food_comparison_list,
            Feature::UseWeatherForRecommendations => &mut self.use_weather_for_recommendations,
            Feature::UseLocationForRecommendations => &mut self.use_location_for_recommendations,
            Feature::Recaptcha => &mut self.recaptcha,
            Feature::EnableCaching => &mut self.enable_caching,
        }
    }
}
