use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

const DB: (&str, &str) = ("DATABASE_URL", "postgres://localhost/baptender");

#[test]
fn defaults_apply_when_only_database_url_is_set() {
    let config = Config::from_lookup(lookup_from(&[DB])).unwrap();

    assert_eq!(config.database_url, "postgres://localhost/baptender");
    assert_eq!(config.port, 5001);
    assert_eq!(config.flush_period, Duration::from_millis(250));
    assert_eq!(config.decay_period, Duration::from_secs(10));
    assert_eq!(config.db_max_connections, 5);
    assert_eq!(config.static_dir, PathBuf::from("static"));
    assert_eq!(config.session, SessionConfig::default());
}

#[test]
fn missing_database_url_is_fatal() {
    assert_eq!(Config::from_lookup(lookup_from(&[])), Err(ConfigError::Missing("DATABASE_URL")));
    assert_eq!(
        Config::from_lookup(lookup_from(&[("DATABASE_URL", "  ")])),
        Err(ConfigError::Missing("DATABASE_URL"))
    );
}

#[test]
fn explicit_values_override_defaults() {
    let config = Config::from_lookup(lookup_from(&[
        DB,
        ("PORT", "8080"),
        ("WS_SEND_DELAY", "100"),
        ("DECAY_INTERVAL_MS", "2000"),
        ("WS_IDLE_TIMEOUT_SECS", "30"),
        ("WS_WRITE_TIMEOUT_MS", "750"),
        ("WS_OUTBOUND_BUFFER", "8"),
        ("DB_MAX_CONNECTIONS", "12"),
        ("STATIC_DIR", "/srv/www"),
    ]))
    .unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.flush_period, Duration::from_millis(100));
    assert_eq!(config.decay_period, Duration::from_secs(2));
    assert_eq!(config.db_max_connections, 12);
    assert_eq!(config.static_dir, PathBuf::from("/srv/www"));
    assert_eq!(
        config.session,
        SessionConfig {
            idle_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_millis(750),
            outbound_buffer: 8,
        }
    );
}

#[test]
fn zero_or_garbage_send_delay_is_fatal() {
    for bad in ["0", "-5", "fast", "1.5"] {
        let err = Config::from_lookup(lookup_from(&[DB, ("WS_SEND_DELAY", bad)])).unwrap_err();
        assert_eq!(err, ConfigError::NotPositive { var: "WS_SEND_DELAY", value: bad.to_string() });
    }
}

#[test]
fn zero_decay_interval_is_fatal() {
    let err = Config::from_lookup(lookup_from(&[DB, ("DECAY_INTERVAL_MS", "0")])).unwrap_err();
    assert!(matches!(err, ConfigError::NotPositive { var: "DECAY_INTERVAL_MS", .. }));
}

#[test]
fn unparsable_optional_values_fall_back() {
    let config = Config::from_lookup(lookup_from(&[
        DB,
        ("PORT", "not-a-port"),
        ("WS_OUTBOUND_BUFFER", "lots"),
        ("DB_MAX_CONNECTIONS", ""),
    ]))
    .unwrap();

    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.session.outbound_buffer, DEFAULT_OUTBOUND_BUFFER);
    assert_eq!(config.db_max_connections, DEFAULT_DB_MAX_CONNECTIONS);
}

#[test]
fn zero_outbound_buffer_is_raised_to_one() {
    let config = Config::from_lookup(lookup_from(&[DB, ("WS_OUTBOUND_BUFFER", "0")])).unwrap();
    assert_eq!(config.session.outbound_buffer, 1);
}

#[test]
fn zero_websocket_timeouts_are_fatal() {
    for var in ["WS_IDLE_TIMEOUT_SECS", "WS_WRITE_TIMEOUT_MS"] {
        let err = Config::from_lookup(lookup_from(&[DB, (var, "0")])).unwrap_err();
        assert_eq!(err, ConfigError::NotPositive { var, value: "0".to_string() });
    }
    let err = Config::from_lookup(lookup_from(&[DB, ("WS_IDLE_TIMEOUT_SECS", "soon")])).unwrap_err();
    assert!(matches!(err, ConfigError::NotPositive { var: "WS_IDLE_TIMEOUT_SECS", .. }));
}
