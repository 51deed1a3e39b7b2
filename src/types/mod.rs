//! Public types for the Forkcast API.

mod chat;
mod food;
mod location;
mod model_config;
mod verification;
mod weather;

pub use chat::{ChatMessage, CompletionRequest, Role};
pub use food::{FoodInfo, FoodRecommendation, MealType, RECOMMENDATION_COUNT};
pub use location::{GeocodeResult, Location};
pub use model_config::{DEFAULT_MODEL_CONFIG, ModelConfig};
pub use verification::{Verification, VerificationCode};
pub use weather::{
    CurrentConditions, Forecast, HourlyForecast, HourlyPoint, MAX_HOURLY_FORECAST,
    UNKNOWN_CONDITION, WMO_CODES, Weather, weather_condition, weather_icon,
};
