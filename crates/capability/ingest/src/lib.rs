//! OTGW 数据接入能力模块。
//!
//! 主动连接 OpenTherm 网关的 TCP 口，按行读取帧并交给处理器。
//! 连接失败按指数退避重连；若从未成功连上且连续失败达到启动预算，
//! 判定网关地址配置错误，向上返回致命错误终止进程。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let config = OtgwSourceConfig {
//!     address: "10.0.0.130:6638".to_string(),
//!     ..Default::default()
//! };
//! let source = OtgwSource::new(config);
//! source.run(handler).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// 采集错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// 从未连上且启动重试预算耗尽（致命，进程应退出）
    #[error("otgw never reachable at {0}, check your settings")]
    StartupUnreachable(String),
    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// 拨号超时
    #[error("dial timeout: {0}")]
    DialTimeout(String),
    /// 配置解析错误
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// 处理器错误
    #[error("handler error: {0}")]
    Handler(String),
}

/// 原始帧行处理器。
///
/// 每条从网关读到的行（含 `\r\n` 终止符）原样交给处理器；
/// 生产实现向丢弃最旧队列入队，永不阻塞接入循环。
#[async_trait]
pub trait RawLineHandler: Send + Sync {
    async fn handle(&self, line: String) -> Result<(), IngestError>;
}

/// OTGW 采集源配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtgwSourceConfig {
    /// 网关地址（host:port）
    pub address: String,
    /// 拨号超时（毫秒）
    #[serde(default = "default_dial_timeout")]
    pub dial_timeout_ms: u64,
    /// 单次读取的截止时间（秒）
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// 启动阶段允许的连续拨号失败次数
    #[serde(default = "default_startup_retry_budget")]
    pub startup_retry_budget: u32,
    /// 重连前允许的连续读错误次数
    #[serde(default = "default_max_read_errors")]
    pub max_read_errors: u32,
    /// 指数退避的上限（秒）
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

fn default_dial_timeout() -> u64 {
    2000
}

fn default_read_timeout() -> u64 {
    10
}

fn default_startup_retry_budget() -> u32 {
    3
}

fn default_max_read_errors() -> u32 {
    5
}

fn default_max_backoff() -> u64 {
    600
}

impl Default for OtgwSourceConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            dial_timeout_ms: default_dial_timeout(),
            read_timeout_secs: default_read_timeout(),
            startup_retry_budget: default_startup_retry_budget(),
            max_read_errors: default_max_read_errors(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

/// 第 n 次连续失败后的退避秒数：`min(2^n, cap)`。
pub fn backoff_delay(retry_count: u32, cap_secs: u64) -> u64 {
    1u64.checked_shl(retry_count)
        .map_or(cap_secs, |delay| delay.min(cap_secs))
}

/// 拨号失败后的动作。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialOutcome {
    /// 启动预算耗尽，终止进程
    Fatal,
    /// 退避后重试
    Backoff(Duration),
}

/// 重连状态机的纯逻辑部分（可单测）。
#[derive(Debug)]
pub struct DialState {
    ever_connected: bool,
    retry_count: u32,
    startup_retry_budget: u32,
    max_backoff_secs: u64,
}

impl DialState {
    pub fn new(startup_retry_budget: u32, max_backoff_secs: u64) -> Self {
        Self {
            ever_connected: false,
            retry_count: 0,
            startup_retry_budget,
            max_backoff_secs,
        }
    }

    /// 记录一次拨号失败。只有「从未成功连接」时才可能致命。
    pub fn record_failure(&mut self) -> DialOutcome {
        self.retry_count += 1;
        if !self.ever_connected && self.retry_count >= self.startup_retry_budget {
            return DialOutcome::Fatal;
        }
        DialOutcome::Backoff(Duration::from_secs(backoff_delay(
            self.retry_count,
            self.max_backoff_secs,
        )))
    }

    /// 记录一次拨号成功：清零重试计数与退避。
    pub fn record_success(&mut self) {
        self.ever_connected = true;
        self.retry_count = 0;
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }
}

/// OTGW TCP 采集源。
pub struct OtgwSource {
    config: OtgwSourceConfig,
}

impl OtgwSource {
    /// 创建新的 OTGW 采集源
    pub fn new(config: OtgwSourceConfig) -> Self {
        Self { config }
    }

    /// 从 JSON 配置字符串解析
    pub fn from_json(json: &str) -> Result<Self, IngestError> {
        let config: OtgwSourceConfig =
            serde_json::from_str(json).map_err(|e| IngestError::ConfigParse(e.to_string()))?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &OtgwSourceConfig {
        &self.config
    }

    /// 运行采集循环。
    ///
    /// 稳态下不返回；唯一的返回路径是启动阶段网关不可达的致命错误。
    pub async fn run(&self, handler: Arc<dyn RawLineHandler>) -> Result<(), IngestError> {
        let addr = &self.config.address;
        let dial_timeout = Duration::from_millis(self.config.dial_timeout_ms);
        let mut dial = DialState::new(self.config.startup_retry_budget, self.config.max_backoff_secs);

        loop {
            info!("connecting to otgw at {}", addr);

            let attempt = match timeout(dial_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => Ok(stream),
                Ok(Err(err)) => Err(IngestError::Io(err)),
                Err(_) => Err(IngestError::DialTimeout(addr.clone())),
            };

            let stream = match attempt {
                Ok(stream) => stream,
                Err(err) => {
                    match dial.record_failure() {
                        DialOutcome::Fatal => {
                            return Err(IngestError::StartupUnreachable(addr.clone()));
                        }
                        DialOutcome::Backoff(delay) => {
                            warn!(
                                attempt = dial.retry_count(),
                                delay_secs = delay.as_secs(),
                                error = %err,
                                "connection to otgw could not be established",
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                }
            };

            dial.record_success();
            info!("successfully connected to otgw at {}", addr);

            self.read_loop(stream, &handler).await;
            // 连接结束（EOF 或连续读错误），外层循环重连
        }
    }

    /// 读取循环：带截止时间逐行读取，EOF 或连续错误超限时返回重连。
    async fn read_loop(&self, stream: TcpStream, handler: &Arc<dyn RawLineHandler>) {
        let read_deadline = Duration::from_secs(self.config.read_timeout_secs);
        let mut reader = BufReader::new(stream);
        let mut read_errors = 0u32;

        loop {
            let mut line = String::new();
            match timeout(read_deadline, reader.read_line(&mut line)).await {
                Ok(Ok(0)) => {
                    warn!("connection closed by otgw");
                    return;
                }
                Ok(Ok(_)) => {
                    read_errors = 0;
                    debug!(line = line.trim_end(), "message from otgw");
                    if let Err(err) = handler.handle(line).await {
                        warn!(error = %err, "raw line handler failed");
                    }
                }
                Ok(Err(err)) => {
                    read_errors += 1;
                    warn!(count = read_errors, error = %err, "error reading from otgw");
                    if read_errors > self.config.max_read_errors {
                        warn!("too many consecutive read errors, reconnecting");
                        return;
                    }
                }
                Err(_) => {
                    read_errors += 1;
                    warn!(count = read_errors, "read deadline exceeded");
                    if read_errors > self.config.max_read_errors {
                        warn!("too many consecutive read errors, reconnecting");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "address": "10.0.0.130:6638",
            "read_timeout_secs": 5
        }"#;
        let source = OtgwSource::from_json(json).unwrap();
        assert_eq!(source.config().address, "10.0.0.130:6638");
        assert_eq!(source.config().read_timeout_secs, 5);
        // 未给出的字段取默认值
        assert_eq!(source.config().dial_timeout_ms, 2000);
        assert_eq!(source.config().max_backoff_secs, 600);
        assert_eq!(source.config().startup_retry_budget, 3);
    }

    #[test]
    fn backoff_is_exponential_and_capped() {
        assert_eq!(backoff_delay(1, 600), 2);
        assert_eq!(backoff_delay(2, 600), 4);
        assert_eq!(backoff_delay(3, 600), 8);
        assert_eq!(backoff_delay(9, 600), 512);
        assert_eq!(backoff_delay(10, 600), 600);
        assert_eq!(backoff_delay(20, 600), 600);
        // 移位溢出也落在上限
        assert_eq!(backoff_delay(64, 600), 600);
        assert_eq!(backoff_delay(200, 600), 600);
    }

    #[test]
    fn dial_state_aborts_only_before_first_success() {
        let mut state = DialState::new(3, 600);
        assert_eq!(
            state.record_failure(),
            DialOutcome::Backoff(Duration::from_secs(2))
        );
        assert_eq!(
            state.record_failure(),
            DialOutcome::Backoff(Duration::from_secs(4))
        );
        assert_eq!(state.record_failure(), DialOutcome::Fatal);
    }

    #[test]
    fn dial_state_never_fatal_after_a_success() {
        let mut state = DialState::new(3, 600);
        state.record_success();
        for attempt in 1..=10u32 {
            match state.record_failure() {
                DialOutcome::Backoff(delay) => {
                    assert_eq!(delay.as_secs(), backoff_delay(attempt, 600));
                }
                DialOutcome::Fatal => panic!("must not abort after a prior success"),
            }
        }
    }

    #[test]
    fn dial_state_resets_counters_on_success() {
        let mut state = DialState::new(3, 600);
        state.record_failure();
        state.record_failure();
        state.record_success();
        assert_eq!(state.retry_count(), 0);
        assert_eq!(
            state.record_failure(),
            DialOutcome::Backoff(Duration::from_secs(2))
        );
    }

    struct ChannelHandler {
        tx: mpsc::UnboundedSender<String>,
    }

    #[async_trait]
    impl RawLineHandler for ChannelHandler {
        async fn handle(&self, line: String) -> Result<(), IngestError> {
            self.tx
                .send(line)
                .map_err(|e| IngestError::Handler(e.to_string()))
        }
    }

    #[tokio::test]
    async fn source_reads_lines_and_keeps_the_terminator() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"B40193C33\r\nT80000200\r\n").await.unwrap();
            socket.flush().await.unwrap();
            // 保持连接直到测试结束
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let source = OtgwSource::new(OtgwSourceConfig {
            address: addr.to_string(),
            ..Default::default()
        });
        let run = tokio::spawn(async move {
            let _ = source.run(Arc::new(ChannelHandler { tx })).await;
        });

        let first = timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert_eq!(first.as_deref(), Some("B40193C33\r\n"));
        let second = timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert_eq!(second.as_deref(), Some("T80000200\r\n"));

        run.abort();
    }

    #[tokio::test]
    async fn unreachable_gateway_is_fatal_at_startup() {
        let (tx, _rx) = mpsc::unbounded_channel();
        // 退避上限设 0，预算内快速失败
        let source = OtgwSource::new(OtgwSourceConfig {
            address: "127.0.0.1:1".to_string(),
            max_backoff_secs: 0,
            ..Default::default()
        });

        let result = timeout(
            Duration::from_secs(10),
            source.run(Arc::new(ChannelHandler { tx })),
        )
        .await
        .expect("fatal abort should be quick");
        assert!(matches!(result, Err(IngestError::StartupUnreachable(_))));
    }
}
