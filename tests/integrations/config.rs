use clap::Parser;
use shooter_telemetry::cli::Cli;
use shooter_telemetry::config::Config;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

/// A helper function to run a test with a temporary config file.
fn with_config_file<F>(toml_content: &str, test_fn: F)
where
    F: FnOnce(PathBuf),
{
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", toml_content).unwrap();
    let path = file.path().to_path_buf();
    test_fn(path);
}

#[test]
fn test_load_full_valid_config() {
    let toml_content = r#"
        log_level = "debug"
        [report]
        interval = 5
        url = "http://collector.example:8080/api/report"
        management_ip = "10.0.0.1"
    "#;

    with_config_file(toml_content, |path| {
        let cli =
            Cli::try_parse_from(["shooter-telemetry", "--config", path.to_str().unwrap()]).unwrap();
        let config = Config::load_from_cli(&cli).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.report.effective_interval(), Duration::from_secs(5));
        assert_eq!(
            config.report.destination(),
            Some("http://collector.example:8080/api/report")
        );
        assert_eq!(config.report.management_ip, "10.0.0.1");
    });
}

#[test]
fn test_cli_flags_override_file() {
    let toml_content = r#"
        [report]
        interval = 5
        url = "http://collector.example/api/report"
    "#;

    with_config_file(toml_content, |path| {
        let cli = Cli::try_parse_from([
            "shooter-telemetry",
            "--config",
            path.to_str().unwrap(),
            "--interval",
            "-1",
            "--url",
            "",
            "--management-ip",
            "172.16.1.1",
        ])
        .unwrap();
        let config = Config::load_from_cli(&cli).unwrap();

        assert_eq!(config.report.interval, -1);
        assert_eq!(config.report.effective_interval(), Duration::from_secs(600));
        assert_eq!(config.report.destination(), None);
        assert_eq!(config.report.management_ip, "172.16.1.1");
        assert_eq!(config.log_level, "info");
    });
}

#[test]
fn test_defaults_without_file() {
    let cli = Cli::try_parse_from(["shooter-telemetry"]).unwrap();
    let config = Config::load_from_cli(&cli).unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.report.effective_interval(), Duration::from_secs(600));
    assert_eq!(config.report.destination(), None);
}
