// Config loading and validation tests

use fleetstatus::config::AppConfig;
use std::time::Duration;

const VALID_CONFIG: &str = r#"
[server]
port = 8081
host = "0.0.0.0"

[monitoring]
deadline_ms = 8000
poll_interval_ms = 5000
broadcast_capacity = 16
stats_log_interval_secs = 60

[paths]
data_dir = "/data/traffic-provenance"
"#;

#[test]
fn test_config_loads_from_str_with_defaults() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.monitoring.deadline_ms, 8000);
    assert_eq!(config.monitoring.poll_interval_ms, 5000);
    assert_eq!(config.monitoring.broadcast_capacity, 16);
    assert_eq!(config.probes.file_count_timeout_ms, 5000);
    assert_eq!(config.transfer.mounts.len(), 3);
    assert_eq!(config.transfer.min_mounted, None);
    assert_eq!(config.transfer.required_mounts(), 3);
    assert_eq!(config.storage.warning_percent, 75.0);
    assert_eq!(config.storage.critical_percent, 90.0);
    assert_eq!(config.network.host, "192.168.100.2");
}

#[test]
fn test_deadline_defaults_to_ten_seconds() {
    let without = VALID_CONFIG.replace("deadline_ms = 8000\n", "");
    let config = AppConfig::load_from_str(&without).unwrap();
    assert_eq!(config.monitor_config().deadline, Duration::from_secs(10));
}

#[test]
fn test_monitor_config_carries_sections() {
    let with_sections = format!(
        "{}\n{}",
        VALID_CONFIG,
        r#"
[probes]
reachability_timeout_ms = 1500

[storage]
warning_percent = 60.0
critical_percent = 80.0

[network]
host = "nas.local"
interface = "eth1"

[[transfer.mounts]]
path = "/mnt/backup"
name = "Backup"
"#
    );
    let config = AppConfig::load_from_str(&with_sections).unwrap();
    let monitor = config.monitor_config();
    assert_eq!(monitor.deadline, Duration::from_millis(8000));
    assert_eq!(monitor.timeouts.reachability, Duration::from_millis(1500));
    assert_eq!(monitor.timeouts.process, Duration::from_millis(2000));
    assert_eq!(monitor.data_dir.to_str(), Some("/data/traffic-provenance"));
    assert_eq!(monitor.network.host, "nas.local");
    assert_eq!(monitor.network.interface.as_deref(), Some("eth1"));
    assert_eq!(monitor.transfer.mounts.len(), 1);
    assert_eq!(monitor.transfer.mounts[0].kind, "overflow");
    assert_eq!(monitor.transfer.required_mounts(), 1);

    let thresholds = monitor.thresholds();
    assert_eq!(thresholds.disk_warning_percent, 60.0);
    assert_eq!(thresholds.disk_critical_percent, 80.0);
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 8081", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_zero_deadline() {
    let bad = VALID_CONFIG.replace("deadline_ms = 8000", "deadline_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("monitoring.deadline_ms"));
}

#[test]
fn test_config_validation_rejects_zero_poll_interval() {
    let bad = VALID_CONFIG.replace("poll_interval_ms = 5000", "poll_interval_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("monitoring.poll_interval_ms"));
}

#[test]
fn test_config_validation_rejects_zero_broadcast_capacity() {
    let bad = VALID_CONFIG.replace("broadcast_capacity = 16", "broadcast_capacity = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("monitoring.broadcast_capacity"));
}

#[test]
fn test_config_validation_rejects_zero_probe_timeout() {
    let bad = format!("{}\n[probes]\nmount_timeout_ms = 0\n", VALID_CONFIG);
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("probes.mount_timeout_ms"));
}

#[test]
fn test_config_validation_rejects_empty_data_dir() {
    let bad = VALID_CONFIG.replace("\"/data/traffic-provenance\"", "\"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("paths.data_dir"));
}

#[test]
fn test_config_validation_rejects_bad_recorder_regex() {
    let bad = format!("{}\n[recording]\nprocess_pattern = \"ffmpeg(\"\n", VALID_CONFIG);
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("recording.process_pattern"));
}

#[test]
fn test_config_validation_rejects_inverted_thresholds() {
    let bad = format!(
        "{}\n[storage]\nwarning_percent = 95.0\ncritical_percent = 90.0\n",
        VALID_CONFIG
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("storage thresholds"));
}

#[test]
fn test_config_validation_rejects_reachability_timeout_of_one_second_or_less() {
    for ms in [500, 1000] {
        let bad = format!("{}\n[probes]\nreachability_timeout_ms = {}\n", VALID_CONFIG, ms);
        let err = AppConfig::load_from_str(&bad).unwrap_err();
        assert!(
            err.to_string().contains("probes.reachability_timeout_ms must be > 1000"),
            "{}",
            err
        );
    }
    let ok = format!("{}\n[probes]\nreachability_timeout_ms = 1001\n", VALID_CONFIG);
    assert!(AppConfig::load_from_str(&ok).is_ok());
}

#[test]
fn test_min_mounted_can_relax_the_all_mounts_default() {
    let relaxed = format!("{}\n[transfer]\nmin_mounted = 1\n", VALID_CONFIG);
    let config = AppConfig::load_from_str(&relaxed).unwrap();
    assert_eq!(config.transfer.min_mounted, Some(1));
    assert_eq!(config.transfer.required_mounts(), 1);
    assert_eq!(config.transfer.mounts.len(), 3);
}

#[test]
fn test_config_validation_rejects_min_mounted_above_mounts() {
    let bad = format!("{}\n[transfer]\nmin_mounted = 4\n", VALID_CONFIG);
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("transfer.min_mounted"));
}

#[test]
fn test_config_validation_rejects_empty_network_host() {
    let bad = format!("{}\n[network]\nhost = \"\"\n", VALID_CONFIG);
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("network.host"));
}

#[test]
fn test_config_missing_section_fails_to_parse() {
    let bad = VALID_CONFIG.replace("[paths]\ndata_dir = \"/data/traffic-provenance\"\n", "");
    assert!(AppConfig::load_from_str(&bad).is_err());
}

#[test]
fn test_example_config_is_valid() {
    let example = std::fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/config.example.toml"
    ))
    .expect("config.example.toml");
    let config = AppConfig::load_from_str(&example).expect("example config");
    assert!(!config.transfer.mounts.is_empty());
}
