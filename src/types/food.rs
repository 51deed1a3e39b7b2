//! Food recommendation and detail types

use serde::{Deserialize, Serialize};

/// Number of dishes a recommendation carries.
pub const RECOMMENDATION_COUNT: usize = 6;

/// Dish suggestions with the model's explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecommendation {
    pub foods: Vec<String>,
    pub reasoning: String,
}

/// Details about a single dish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodInfo {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub preparation: String,
}

/// Single dish vs. full set meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Single,
    Full,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Single => "single",
            MealType::Full => "full",
        }
    }
}
