//! InfluxDB v2 行协议写入器。
//!
//! 把批量累积好的行协议记录 POST 到 `/api/v2/write` 端点，
//! 时间戳精度固定为纳秒。启动时可用空请求体探活，
//! 探活失败说明数据库地址或凭据配置错误，由上层决定退出。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let writer = InfluxWriter::new(&config)?;
//! writer.probe().await?;
//! writer.write_lines("otgw boiler_water_temp=60.20 1756400000000000000").await?;
//! ```

use crate::error::StorageError;
use async_trait::async_trait;
use otgw_pipeline::{LineWriter, PipelineError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// InfluxDB 连接配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxConfig {
    /// 主机名或 IP
    pub host: String,
    /// HTTP 端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 目标桶（v1 数据库名亦可）
    pub bucket: String,
    /// 用户名
    pub username: String,
    /// 密码
    pub password: String,
    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_port() -> u16 {
    8086
}

fn default_request_timeout() -> u64 {
    10
}

impl InfluxConfig {
    /// 从 JSON 配置字符串解析
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        serde_json::from_str(json).map_err(|e| StorageError::ConfigParse(e.to_string()))
    }

    /// 写入端点 URL
    pub fn write_url(&self) -> String {
        format!(
            "http://{}:{}/api/v2/write?bucket={}&precision=ns",
            self.host, self.port, self.bucket
        )
    }

    /// v1 兼容的 Token 鉴权头值（`Token 用户名:密码`）
    pub fn auth_header(&self) -> String {
        format!("Token {}:{}", self.username, self.password)
    }
}

/// InfluxDB 写入器。
pub struct InfluxWriter {
    client: reqwest::Client,
    write_url: String,
    auth_header: String,
}

impl InfluxWriter {
    /// 创建写入器。仅构造 HTTP 客户端，不发起连接。
    pub fn new(config: &InfluxConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            write_url: config.write_url(),
            auth_header: config.auth_header(),
        })
    }

    /// 启动探活：POST 空请求体。
    ///
    /// InfluxDB 对空写入返回 2xx，凭据或地址错误则返回 4xx/5xx 或连接失败。
    pub async fn probe(&self) -> Result<(), StorageError> {
        self.post(String::new()).await
    }

    async fn post(&self, body: String) -> Result<(), StorageError> {
        let response = self
            .client
            .post(&self.write_url)
            .header("Authorization", &self.auth_header)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "influxdb write accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "influxdb write rejected");
        Err(StorageError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl LineWriter for InfluxWriter {
    async fn write_lines(&self, body: &str) -> Result<(), PipelineError> {
        self.post(body.to_string())
            .await
            .map_err(|e| PipelineError::Writer(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn sample_config(host: &str, port: u16) -> InfluxConfig {
        InfluxConfig {
            host: host.to_string(),
            port,
            bucket: "otgw".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            request_timeout_secs: 2,
        }
    }

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "host": "10.0.0.7",
            "bucket": "otgw",
            "username": "user",
            "password": "pass"
        }"#;
        let config = InfluxConfig::from_json(json).unwrap();
        assert_eq!(config.port, 8086);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn write_url_targets_the_v2_endpoint_with_ns_precision() {
        let config = sample_config("10.0.0.7", 8086);
        assert_eq!(
            config.write_url(),
            "http://10.0.0.7:8086/api/v2/write?bucket=otgw&precision=ns"
        );
    }

    #[test]
    fn auth_header_joins_credentials_with_a_colon() {
        let config = sample_config("10.0.0.7", 8086);
        assert_eq!(config.auth_header(), "Token user:pass");
    }

    /// 起一个只应答一次的 HTTP 端点，把收到的请求原文发回测试。
    async fn one_shot_endpoint(
        status_line: &'static str,
    ) -> (SocketAddr, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let response = format!(
                "{status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = tx.send(request);
        });

        (addr, rx)
    }

    #[tokio::test]
    async fn accepted_write_sends_body_and_credentials() {
        let (addr, request) = one_shot_endpoint("HTTP/1.1 204 No Content").await;
        let writer = InfluxWriter::new(&sample_config("127.0.0.1", addr.port())).unwrap();

        writer
            .write_lines("otgw boiler_water_temp=60.20 1756400000000000000")
            .await
            .unwrap();

        let request = request.await.unwrap();
        assert!(request.starts_with("POST /api/v2/write?bucket=otgw&precision=ns"));
        assert!(request.to_lowercase().contains("authorization: token user:pass"));
        assert!(request.contains("boiler_water_temp=60.20"));
    }

    #[tokio::test]
    async fn rejected_write_surfaces_the_status() {
        let (addr, _request) = one_shot_endpoint("HTTP/1.1 500 Internal Server Error").await;
        let writer = InfluxWriter::new(&sample_config("127.0.0.1", addr.port())).unwrap();

        let err = writer.probe().await.unwrap_err();
        assert!(matches!(err, StorageError::Rejected { status: 500, .. }));
    }
}
