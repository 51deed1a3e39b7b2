//! Route tests for recommendations, food details, geocoding and health.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use forkcast::Feature;
use forkcast::server::config::{CacheBackend, Config};
use forkcast::server::{AppState, create_app};

// ============================================================================
// Helpers
// ============================================================================

/// Config pointing every upstream at `server`, verification off.
fn config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.cache.backend = CacheBackend::Memory;
    config.providers.open_meteo_url = server.uri();
    config.providers.nominatim_url = server.uri();
    config.providers.ipapi_url = server.uri();
    config.verification.verify_url = format!("{}/siteverify", server.uri());
    config.verification.secret_key = Some("captcha-secret".into());
    let model = config.models.get_mut("openai").unwrap();
    model.base_url = format!("{}/v1", server.uri());
    model.api_key = Some("sk-test".into());
    config.features = config.features.with(Feature::Recaptcha, false);
    config
}

fn app(config: &Config) -> Router {
    let state = AppState::from_config(config).unwrap();
    create_app(Arc::new(state), Duration::from_secs(30))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

fn hanoi_weather() -> Value {
    json!({
        "temperature": 31.4,
        "condition": "3",
        "conditionText": "Overcast",
        "location": "Hoàn Kiếm, Hà Nội"
    })
}

fn completion(content: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content.to_string()}}]
    }))
}

fn six_foods() -> Value {
    json!({
        "foods": ["Phở", "Bún chả", "Bánh mì", "Chè", "Gỏi cuốn", "Cà phê sữa đá"],
        "reasoning": "Light and cooling dishes suit a hot, overcast day in Hà Nội."
    })
}

async fn mount_completion(server: &MockServer, content: Value, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(completion(content))
        .expect(expected_calls)
        .mount(server)
        .await;
}

// ============================================================================
// POST /recommendations
// ============================================================================

#[tokio::test]
async fn meal_type_with_flag_off_is_forbidden() {
    let server = MockServer::start().await;
    mount_completion(&server, six_foods(), 0).await;
    let mut config = config(&server);
    config.features = config.features.with(Feature::MealTypeSelection, false);
    let app = app(&config);

    let (status, body) = post(
        &app,
        "/recommendations",
        json!({"weather": hanoi_weather(), "mealType": "full"}),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("Meal type"));
}

#[tokio::test]
async fn recommendations_are_generated_and_cached() {
    let server = MockServer::start().await;
    mount_completion(&server, six_foods(), 1).await;
    let app = app(&config(&server));

    let request = json!({
        "weather": hanoi_weather(),
        "excludedFoods": ["peanuts", "beef"],
        "locale": "vi",
        "numberOfDiners": 4,
        "mealType": "single"
    });
    let (status, first) = post(&app, "/recommendations", request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["foods"].as_array().unwrap().len(), 6);
    assert_eq!(first["foods"][0], "Phở");

    // Same inputs with exclusions reordered hit the cache.
    let reordered = json!({
        "weather": hanoi_weather(),
        "excludedFoods": ["beef", "peanuts"],
        "locale": "vi",
        "numberOfDiners": 4,
        "mealType": "single"
    });
    let (status, second) = post(&app, "/recommendations", reordered).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
}

#[tokio::test]
async fn prompt_carries_language_and_exclusions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("French"))
        .and(body_string_contains("peanuts"))
        .and(body_string_contains("json_object"))
        .respond_with(completion(six_foods()))
        .expect(1)
        .mount(&server)
        .await;
    let app = app(&config(&server));

    let (status, _) = post(
        &app,
        "/recommendations",
        json!({"weather": hanoi_weather(), "excludedFoods": ["peanuts"], "locale": "fr"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn feature_disabled_is_checked_before_the_body() {
    let server = MockServer::start().await;
    let mut config = config(&server);
    config.features = config.features.with(Feature::FoodRecommendations, false);
    let app = app(&config);

    let (status, body) = post(&app, "/recommendations", json!("not an object")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Food recommendations feature is disabled");
}

#[tokio::test]
async fn invalid_body_is_rejected_with_details() {
    let server = MockServer::start().await;
    let app = app(&config(&server));

    let (status, body) = post(&app, "/recommendations", json!({"mealType": "brunch"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request data");
    assert!(body["details"]["message"].is_string());

    let (status, _) = post(
        &app,
        "/recommendations",
        json!({"weather": hanoi_weather(), "numberOfDiners": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn weather_is_required_when_weather_feature_is_on() {
    let server = MockServer::start().await;
    mount_completion(&server, six_foods(), 0).await;
    let app = app(&config(&server));

    let (status, body) = post(&app, "/recommendations", json!({"locale": "en"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Weather data is required for food recommendations");
}

#[tokio::test]
async fn special_requirements_need_extended_settings() {
    let server = MockServer::start().await;
    mount_completion(&server, six_foods(), 0).await;
    let mut config = config(&server);
    config.features = config.features.with(Feature::ExtendedSettings, false);
    let app = app(&config);

    let (status, body) = post(
        &app,
        "/recommendations",
        json!({"weather": hanoi_weather(), "specialRequirements": "vegetarian"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Special requirements feature is disabled");
}

#[tokio::test]
async fn rate_limit_is_reported_as_try_again() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "20"))
        .expect(1)
        .mount(&server)
        .await;
    let app = app(&config(&server));

    let (status, body) = post(&app, "/recommendations", json!({"weather": hanoi_weather()})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("try again"));
}

#[tokio::test]
async fn malformed_model_output_is_a_generic_500() {
    let server = MockServer::start().await;
    mount_completion(&server, json!({"dishes": ["Phở"]}), 1).await;
    let app = app(&config(&server));

    let (status, body) = post(&app, "/recommendations", json!({"weather": hanoi_weather()})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to generate food recommendations"}));
}

// ============================================================================
// Human verification
// ============================================================================

fn verified_config(server: &MockServer) -> Config {
    let mut config = config(server);
    config.features = config.features.with(Feature::Recaptcha, true);
    config
}

#[tokio::test]
async fn verification_token_is_required_when_enabled() {
    let server = MockServer::start().await;
    mount_completion(&server, six_foods(), 0).await;
    let app = app(&verified_config(&server));

    let (status, body) = post(&app, "/recommendations", json!({"weather": hanoi_weather()})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Human verification required");
}

#[tokio::test]
async fn low_score_is_rejected_with_details() {
    let server = MockServer::start().await;
    mount_completion(&server, six_foods(), 0).await;
    Mock::given(method("POST"))
        .and(path("/siteverify"))
        .and(body_string_contains("secret=captcha-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "score": 0.2,
            "action": "getRecommendations"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app(&verified_config(&server));

    let (status, body) = post(
        &app,
        "/recommendations",
        json!({"weather": hanoi_weather(), "recaptchaToken": "bot-token"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Human verification failed");
    assert_eq!(body["details"]["errorCodes"], json!(["low-score"]));
    assert_eq!(body["details"]["success"], false);
}

#[tokio::test]
async fn verified_request_reaches_the_model() {
    let server = MockServer::start().await;
    mount_completion(&server, six_foods(), 1).await;
    Mock::given(method("POST"))
        .and(path("/siteverify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "score": 0.9,
            "action": "getRecommendations"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app(&verified_config(&server));

    let (status, _) = post(
        &app,
        "/recommendations",
        json!({"weather": hanoi_weather(), "verificationToken": "human-token"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn food_details_verifies_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/siteverify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "score": 0.9,
            "action": "getRecommendations"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app(&verified_config(&server));

    // A token minted for another action is refused.
    let (status, body) = post(
        &app,
        "/food-details",
        json!({"name": "Phở", "recaptchaToken": "reused-token"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["errorCodes"], json!(["action-mismatch"]));
}

// ============================================================================
// POST /food-details
// ============================================================================

#[tokio::test]
async fn food_details_defaults_to_vietnamese() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Vietnamese"))
        .respond_with(completion(json!({
            "name": "Phở",
            "description": "Vietnamese noodle soup.",
            "ingredients": ["rice noodles", "beef", "star anise"],
            "preparation": "Simmer the broth for hours, then pour over noodles."
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app(&config(&server));

    let (status, body) = post(&app, "/food-details", json!({"name": "Phở"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Phở");
    assert_eq!(body["ingredients"].as_array().unwrap().len(), 3);

    // Case and padding do not split the cache.
    let (status, again) = post(&app, "/food-details", json!({"name": "  phở "})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, again);
}

#[tokio::test]
async fn food_details_requires_a_name() {
    let server = MockServer::start().await;
    let app = app(&config(&server));

    let (status, body) = post(&app, "/food-details", json!({"name": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["name"], "Food name is required");

    let (status, _) = post(&app, "/food-details", json!({"locale": "en"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn food_details_feature_gate() {
    let server = MockServer::start().await;
    let mut config = config(&server);
    config.features = config.features.with(Feature::FoodDetails, false);
    let app = app(&config);

    let (status, body) = post(&app, "/food-details", json!({"name": "Phở"})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Food details feature is disabled");
}

// ============================================================================
// Geocoding
// ============================================================================

#[tokio::test]
async fn forward_geocode_is_cached_by_normalized_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "lat": "48.8566",
            "lon": "2.3522",
            "display_name": "Paris, Île-de-France, France",
            "address": {"city": "Paris", "state": "Île-de-France", "country": "France"}
        }])))
        .expect(1)
        .mount(&server)
        .await;
    let app = app(&config(&server));

    let (status, body) = get(&app, "/geocode?q=Paris").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Paris");
    assert_eq!(body["region"], "Île-de-France");
    assert_eq!(body["displayName"], "Paris, Île-de-France, France");
    assert_eq!(body["latitude"], 48.8566);

    let (status, _) = get(&app, "/geocode?q=%20paris%20").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn geocode_without_query_is_rejected() {
    let server = MockServer::start().await;
    let app = app(&config(&server));

    let (status, body) = get(&app, "/geocode").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["q"], "Location query is required");
}

#[tokio::test]
async fn unknown_place_is_a_generic_500() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    let app = app(&config(&server));

    let (status, body) = get(&app, "/geocode?q=nowhere").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to geocode location");
}

#[tokio::test]
async fn geocode_does_not_depend_on_manual_location_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "lat": "48.8566",
            "lon": "2.3522",
            "display_name": "Paris, Île-de-France, France",
            "address": {"city": "Paris", "country": "France"}
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lat": "21.0285",
            "lon": "105.8542",
            "display_name": "Hoàn Kiếm, Hà Nội, Việt Nam",
            "address": {"city": "Hà Nội", "country": "Việt Nam"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    let mut config = config(&server);
    config.features = config.features.with(Feature::ManualLocation, false);
    let app = app(&config);

    let (status, body) = get(&app, "/geocode?q=Paris").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Paris");

    let (status, body) = get(&app, "/geocode?lat=21.0285&lon=105.8542").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Hà Nội");
}

#[tokio::test]
async fn ip_geolocation_uses_forwarded_address() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/203.0.113.7/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ip": "203.0.113.7",
            "latitude": 10.8231,
            "longitude": 106.6297,
            "city": "Ho Chi Minh City",
            "region": "Ho Chi Minh",
            "country_name": "Vietnam"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app(&config(&server));

    let request = Request::builder()
        .uri("/ip-geolocation")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Ho Chi Minh City");
    assert_eq!(body["country"], "Vietnam");
}

#[tokio::test]
async fn ip_geolocation_gate() {
    let server = MockServer::start().await;
    let mut config = config(&server);
    config.features = config.features.with(Feature::IpGeolocation, false);
    let app = app(&config);

    let (status, body) = get(&app, "/ip-geolocation").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "IP geolocation feature is disabled");
}

// ============================================================================
// GET /health
// ============================================================================

#[tokio::test]
async fn health_reports_store() {
    let server = MockServer::start().await;
    let app = app(&config(&server));

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"]["backend"], "memory");
    assert_eq!(body["store"]["ready"], true);
    assert!(body["version"].as_str().unwrap().starts_with(forkcast::PKG_VERSION));
}

#[tokio::test]
async fn slow_upstream_times_out_with_408() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    let state = AppState::from_config(&config(&server)).unwrap();
    let app = create_app(Arc::new(state), Duration::from_millis(100));

    let response = app
        .oneshot(Request::builder().uri("/geocode?q=Paris").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}
