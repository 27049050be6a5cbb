use otgw_config::{AppConfig, ConfigError};

const FULL_CONFIG: &str = r#"
# otgw2db.cfg
OTGWaddress = 10.0.0.130:6638
relay_tcp_port = 7686

influxIP = 10.0.0.7       # 数据库主机
influxPort = 8086
influxBucket = otgw
influxUser = user
influxPass = pass

decode_readable = NO
decode_line_protocol = YES

store_boiler_water_temp = YES
store_ch_enabled = yes
store_burner_starts = NO
"#;

#[test]
fn parses_a_complete_config() {
    let config = AppConfig::parse(FULL_CONFIG).expect("config");
    assert_eq!(config.otgw_address, "10.0.0.130:6638");
    assert_eq!(config.relay_tcp_port, 7686);
    assert_eq!(config.influx_host, "10.0.0.7");
    assert_eq!(config.influx_port, 8086);
    assert_eq!(config.influx_bucket, "otgw");
    assert!(!config.decode_readable);
    assert!(config.decode_line_protocol);
}

#[test]
fn defaults_apply_when_keys_are_absent() {
    let config = AppConfig::parse("OTGWaddress = otgw:6638\nrelay_tcp_port = 7686\n").unwrap();
    assert_eq!(config.queue_capacity, 10);
    assert_eq!(config.batch_threshold, 20);
    assert_eq!(config.max_reconnect_delay_secs, 600);
    assert_eq!(config.influx_port, 8086);
    assert!(!config.decode_line_protocol);
}

#[test]
fn store_toggles_gate_individual_fields() {
    let config = AppConfig::parse(FULL_CONFIG).unwrap();
    assert!(config.is_field_enabled("boiler_water_temp"));
    // 小写 yes 也算开
    assert!(config.is_field_enabled("ch_enabled"));
    // 显式 NO 与未配置同样视为关
    assert!(!config.is_field_enabled("burner_starts"));
    assert!(!config.is_field_enabled("dhw_temp"));
    assert_eq!(config.enabled_field_count(), 2);
}

#[test]
fn comments_and_junk_lines_are_ignored() {
    let config = AppConfig::parse(
        "# header\nOTGWaddress = otgw:6638 # inline comment\nrelay_tcp_port = 7686\nnot a kv line\nunknown_key = whatever\n",
    )
    .unwrap();
    assert_eq!(config.otgw_address, "otgw:6638");
}

#[test]
fn missing_gateway_address_is_an_error() {
    let err = AppConfig::parse("relay_tcp_port = 7686\n").unwrap_err();
    assert!(matches!(err, ConfigError::Missing(key) if key == "OTGWaddress"));
}

#[test]
fn influx_keys_are_required_only_when_writing_to_the_database() {
    // 不写库时 Influx 键可缺省
    AppConfig::parse("OTGWaddress = otgw:6638\nrelay_tcp_port = 7686\n").unwrap();

    let err = AppConfig::parse(
        "OTGWaddress = otgw:6638\nrelay_tcp_port = 7686\ndecode_line_protocol = YES\n",
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Missing(key) if key == "influxIP"));
}

#[test]
fn malformed_numbers_are_rejected() {
    let err =
        AppConfig::parse("OTGWaddress = otgw:6638\nrelay_tcp_port = not-a-port\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(key, _) if key == "relay_tcp_port"));
}
