use nupak_core::config::{dirs_path, GlobalConfig};
use nupak_core::source::PackageSource;

#[test]
fn test_global_config_default_concurrency() {
    let config = GlobalConfig::default();
    assert_eq!(config.resolver.max_concurrent_fetches, 8);
}

#[test]
fn test_global_config_defaults_from_empty_toml() {
    let config: GlobalConfig = toml::from_str("").unwrap();
    assert_eq!(config.resolver.max_concurrent_fetches, 8);
    assert!(!config.lock.strict_default);
    assert!(config.sources.is_empty());
}

#[test]
fn test_default_sources_fall_back_to_nuget_org() {
    let config = GlobalConfig::default();
    assert_eq!(config.default_sources(), vec![PackageSource::nuget_org()]);
}

#[test]
fn test_dirs_path_contains_nupak() {
    let path = dirs_path();
    assert!(path.ends_with(".nupak"));
}

#[test]
fn test_global_config_parse_from_toml() {
    let toml = r#"
[resolver]
max-concurrent-fetches = 2

[sources]
a-internal = "https://nuget.example.com/api/v2/"
b-local = "/srv/packages"

[lock]
strict-default = true
"#;
    let config: GlobalConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.resolver.max_concurrent_fetches, 2);
    assert!(config.lock.strict_default);
    assert_eq!(
        config.default_sources(),
        vec![
            PackageSource::nuget("https://nuget.example.com/api/v2"),
            PackageSource::local("/srv/packages"),
        ]
    );
}

#[test]
fn test_load_from_missing_file_is_default() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = GlobalConfig::load_from(&tmp.path().join("config.toml")).unwrap();
    assert_eq!(config.resolver.max_concurrent_fetches, 8);
}

#[test]
fn test_load_from_invalid_file_errors() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[resolver\n").unwrap();
    let err = GlobalConfig::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Configuration error"), "got: {err}");
}
