//! 应用运行配置加载。
//!
//! 配置来自一个 `key = value` 文本文件（默认 `otgw2db.cfg`）：
//! `#` 之后到行尾是注释，空行忽略，未识别的键忽略。
//! `store_<字段名> = YES` 开关决定哪些解码字段进入输出。

use std::collections::{HashMap, HashSet};
use std::path::Path;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing required key: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// OTGW 网关地址（host:port）
    pub otgw_address: String,
    /// 中继监听端口
    pub relay_tcp_port: u16,
    /// InfluxDB 主机
    pub influx_host: String,
    /// InfluxDB 端口
    pub influx_port: u16,
    /// InfluxDB 桶
    pub influx_bucket: String,
    /// InfluxDB 用户名
    pub influx_user: String,
    /// InfluxDB 密码
    pub influx_pass: String,
    /// 是否打印可读解码输出
    pub decode_readable: bool,
    /// 是否渲染行协议并写入数据库
    pub decode_line_protocol: bool,
    /// 入站与转发队列容量
    pub queue_capacity: usize,
    /// 批量下发阈值
    pub batch_threshold: usize,
    /// 重连退避上限（秒）
    pub max_reconnect_delay_secs: u64,
    /// 启用入库的字段名集合（store_* 开关）
    enabled_fields: HashSet<String>,
}

impl AppConfig {
    /// 从配置文件加载。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// 从配置文本解析。
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut values: HashMap<String, String> = HashMap::new();
        let mut enabled_fields = HashSet::new();

        for line in content.lines() {
            // 行内 '#' 之后是注释
            let line = match line.find('#') {
                Some(idx) => &line[..idx],
                None => line,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            if let Some(field) = key.strip_prefix("store_") {
                if parse_bool(value) {
                    enabled_fields.insert(field.to_string());
                }
                continue;
            }
            values.insert(key.to_string(), value.to_string());
        }

        let otgw_address = require(&values, "OTGWaddress")?;
        let relay_tcp_port = require(&values, "relay_tcp_port")?
            .parse::<u16>()
            .map_err(|_| invalid(&values, "relay_tcp_port"))?;

        let decode_readable = values.get("decode_readable").is_some_and(|v| parse_bool(v));
        let decode_line_protocol = values
            .get("decode_line_protocol")
            .is_some_and(|v| parse_bool(v));

        // Influx 相关键只在需要写库时才是必填
        let (influx_host, influx_bucket, influx_user, influx_pass) = if decode_line_protocol {
            (
                require(&values, "influxIP")?,
                require(&values, "influxBucket")?,
                require(&values, "influxUser")?,
                require(&values, "influxPass")?,
            )
        } else {
            (
                values.get("influxIP").cloned().unwrap_or_default(),
                values.get("influxBucket").cloned().unwrap_or_default(),
                values.get("influxUser").cloned().unwrap_or_default(),
                values.get("influxPass").cloned().unwrap_or_default(),
            )
        };
        let influx_port = parse_with_default(&values, "influxPort", 8086u16)?;

        let queue_capacity = parse_with_default(&values, "queue_capacity", 10usize)?;
        let batch_threshold = parse_with_default(&values, "batch_threshold", 20usize)?;
        let max_reconnect_delay_secs = parse_with_default(&values, "max_reconnect_delay", 600u64)?;

        Ok(Self {
            otgw_address,
            relay_tcp_port,
            influx_host,
            influx_port,
            influx_bucket,
            influx_user,
            influx_pass,
            decode_readable,
            decode_line_protocol,
            queue_capacity,
            batch_threshold,
            max_reconnect_delay_secs,
            enabled_fields,
        })
    }

    /// 字段是否启用入库。
    pub fn is_field_enabled(&self, name: &str) -> bool {
        self.enabled_fields.contains(name)
    }

    /// 启用的字段数量。
    pub fn enabled_field_count(&self) -> usize {
        self.enabled_fields.len()
    }
}

/// 布尔开关：YES/yes/true/on/1 视为真。
fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "yes" | "true" | "on" | "1"
    )
}

fn require(values: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    values
        .get(key)
        .cloned()
        .ok_or_else(|| ConfigError::Missing(key.to_string()))
}

fn invalid(values: &HashMap<String, String>, key: &str) -> ConfigError {
    ConfigError::Invalid(
        key.to_string(),
        values.get(key).cloned().unwrap_or_default(),
    )
}

fn parse_with_default<T: std::str::FromStr>(
    values: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match values.get(key) {
        Some(raw) => raw.parse::<T>().map_err(|_| invalid(values, key)),
        None => Ok(default),
    }
}
