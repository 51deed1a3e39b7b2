//! Config and secrets file loading.

use std::fs;

use forkcast::server::config::{CacheBackend, Config, Secrets};

#[test]
fn load_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
        [server]
        address = "0.0.0.0:8080"

        [cache]
        backend = "memory"
        memory_capacity = 500

        [features]
        recaptcha = false
        "#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.server.address, "0.0.0.0:8080");
    assert_eq!(config.cache.backend, CacheBackend::Memory);
    assert_eq!(config.cache.memory_capacity, 500);
    assert!(!config.features.recaptcha);
    assert!(config.features.food_details);
}

#[test]
fn invalid_toml_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[server\naddress = ").unwrap();

    let err = Config::load(Some(&path)).unwrap_err().to_string();
    assert!(err.contains("Failed to parse config file"));
}

#[test]
fn dangling_model_config_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
        [server]
        model_config = "openai"

        [models.gemini]
        model = "gemini-2.0-flash"
        "#,
    )
    .unwrap();

    assert!(Config::load(Some(&path)).is_err());
}

#[test]
fn secrets_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secrets.toml");
    fs::write(
        &path,
        r#"
        [models.openai]
        api_key = "sk-file"

        [recaptcha]
        secret_key = "captcha-file"
        "#,
    )
    .unwrap();

    let secrets = Secrets::load_from_file(&path).unwrap();
    let config = Config::default().with_secrets(&secrets);
    assert_eq!(config.models["openai"].api_key.as_deref(), Some("sk-file"));
    assert_eq!(config.verification.secret_key.as_deref(), Some("captcha-file"));
}

#[cfg(unix)]
#[test]
fn secrets_permissions_are_enforced() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secrets.toml");
    fs::write(&path, "").unwrap();

    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
    let err = Secrets::check_permissions(&path).unwrap_err().to_string();
    assert!(err.contains("insecure permissions 644"));

    fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
    assert!(Secrets::check_permissions(&path).is_ok());

    fs::set_permissions(&path, fs::Permissions::from_mode(0o400)).unwrap();
    assert!(Secrets::check_permissions(&path).is_ok());
}
