use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use visionguard::config::ClientConfig;
use visionguard::UiMode;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "VISIONGUARD_CONFIG",
        "VISIONGUARD_API_BASE_URL",
        "VISIONGUARD_TIMEOUT_SECS",
        "VISIONGUARD_UI",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "api": {
            "base_url": "http://detector.internal:9000/",
            "timeout_secs": 45
        },
        "ui": { "mode": "plain" }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("VISIONGUARD_CONFIG", file.path());
    std::env::set_var("VISIONGUARD_TIMEOUT_SECS", "10");

    let cfg = ClientConfig::load().expect("load config");
    assert_eq!(cfg.api_base_url, "http://detector.internal:9000");
    assert_eq!(cfg.timeout, Duration::from_secs(10));
    assert_eq!(cfg.ui_mode, UiMode::Plain);

    std::env::set_var("VISIONGUARD_API_BASE_URL", "https://gpu-box:8443");
    std::env::set_var("VISIONGUARD_UI", "pretty");
    let cfg = ClientConfig::load().expect("load config");
    assert_eq!(cfg.api_base_url, "https://gpu-box:8443");
    assert_eq!(cfg.ui_mode, UiMode::Pretty);

    clear_env();
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = ClientConfig::load().expect("load config");
    assert_eq!(cfg.timeout, Duration::from_secs(30));
    assert_eq!(cfg.ui_mode, UiMode::Auto);
    assert_eq!(
        cfg.api_base_url,
        visionguard::config::default_base_url().trim_end_matches('/')
    );
}

#[test]
fn invalid_values_are_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("VISIONGUARD_TIMEOUT_SECS", "soon");
    assert!(ClientConfig::load().is_err());
    clear_env();

    std::env::set_var("VISIONGUARD_API_BASE_URL", "ws://detector:8000");
    assert!(ClientConfig::load().is_err());
    clear_env();

    std::env::set_var("VISIONGUARD_TIMEOUT_SECS", "0");
    assert!(ClientConfig::load().is_err());
    clear_env();

    std::env::set_var("VISIONGUARD_CONFIG", "/no/such/visionguard.json");
    assert!(ClientConfig::load().is_err());
    clear_env();
}
