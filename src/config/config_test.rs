use serial_test::serial;
use temp_env::with_vars;

use super::*;

fn cleanup_all_session_env_vars() {
    for (key, _) in std::env::vars() {
        if key.starts_with("SESSION__") || key == "CONFIG_PATH" {
            std::env::remove_var(&key);
        }
    }
}

#[test]
#[serial]
fn default_config_should_initialize_with_hardcoded_values() {
    let config = SessionStoreConfig::default();

    assert_eq!(config.ttl_secs, 0);
    assert_eq!(config.prefix, "session:");
    assert_eq!(config.lock_expiry_ms, 5000);
    assert_eq!(config.retry_time_ms, 100);
    assert_eq!(config.delete_expiry_secs, 5000);
}

#[test]
#[serial]
fn new_should_set_ttl_and_keep_defaults() {
    let config = SessionStoreConfig::new(3600);

    assert_eq!(config.ttl_secs, 3600);
    assert_eq!(config.prefix, "session:");
    assert_eq!(config.lock_expiry_ms, 5000);
}

#[test]
#[serial]
fn load_should_merge_environment_overrides() {
    cleanup_all_session_env_vars();
    with_vars(
        vec![
            ("SESSION__TTL_SECS", Some("60")),
            ("SESSION__RETRY_TIME_MS", Some("250")),
        ],
        || {
            let config = SessionStoreConfig::load().unwrap();

            assert_eq!(config.ttl_secs, 60);
            assert_eq!(config.retry_time_ms, 250);
            assert_eq!(config.lock_expiry_ms, 5000);
        },
    );
}

#[test]
#[serial]
fn load_should_read_the_config_path_file() {
    cleanup_all_session_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("session.toml");

    std::fs::write(
        &config_path,
        r#"
        ttl_secs = 1800
        prefix = "app-session:"
        "#,
    )
    .unwrap();

    with_vars(
        vec![("CONFIG_PATH", Some(config_path.to_str().unwrap()))],
        || {
            let config = SessionStoreConfig::load().unwrap();

            assert_eq!(config.ttl_secs, 1800);
            assert_eq!(config.prefix, "app-session:");
            assert_eq!(config.retry_time_ms, 100);
        },
    );
}

#[test]
#[serial]
fn with_override_config_should_merge_file_settings() {
    cleanup_all_session_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("overrides.toml");

    std::fs::write(
        &config_path,
        r#"
        ttl_secs = 60
        lock_expiry_ms = 1000
        "#,
    )
    .unwrap();

    let empty_vars: Vec<(&str, Option<&str>)> = vec![];
    with_vars(empty_vars, || {
        let base = SessionStoreConfig::load().expect("success");
        let config = base
            .with_override_config(config_path.to_str().unwrap())
            .unwrap();

        assert_eq!(config.ttl_secs, 60);
        assert_eq!(config.lock_expiry_ms, 1000);
        assert_eq!(config.retry_time_ms, 100);
    });
}

#[test]
#[serial]
fn environment_should_win_over_the_override_file() {
    cleanup_all_session_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("overrides.toml");

    std::fs::write(&config_path, "ttl_secs = 60").unwrap();

    with_vars(vec![("SESSION__TTL_SECS", Some("90"))], || {
        let config = SessionStoreConfig::load()
            .unwrap()
            .with_override_config(config_path.to_str().unwrap())
            .unwrap();

        assert_eq!(config.ttl_secs, 90);
    });
}

#[test]
fn validation_should_fail_without_a_ttl() {
    assert!(SessionStoreConfig::default().validate().is_err());
}

#[test]
fn validation_should_fail_with_a_zero_lock_expiry() {
    let mut config = SessionStoreConfig::new(60);
    config.lock_expiry_ms = 0;

    assert!(config.validate().is_err());
}

#[test]
fn validation_should_fail_with_a_zero_retry_time() {
    let mut config = SessionStoreConfig::new(60);
    config.retry_time_ms = 0;

    assert!(config.validate().is_err());
}

#[test]
fn validation_should_pass_for_a_complete_config() {
    let config = SessionStoreConfig::new(60).validate().unwrap();

    assert_eq!(config.ttl_secs, 60);
}

#[test]
fn duration_accessors_should_convert_units() {
    let config = SessionStoreConfig::new(60);

    assert_eq!(config.ttl(), std::time::Duration::from_secs(60));
    assert_eq!(config.lock_expiry(), std::time::Duration::from_millis(5000));
    assert_eq!(config.retry_time(), std::time::Duration::from_millis(100));
    assert_eq!(config.delete_expiry(), std::time::Duration::from_secs(5000));
}
