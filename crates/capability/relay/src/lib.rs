//! 原始帧中继能力模块。
//!
//! 监听 TCP 端口，把上游读到的每一行原始帧逐字节转发给所有在线客户端。
//! 接收循环与广播循环分离：接收循环只负责 accept 并经通道移交连接，
//! 客户端集合由广播循环独占持有，无需加锁。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let queue = Arc::new(DropOldestQueue::new(10));
//! let server = RelayServer::bind(config, Arc::clone(&queue)).await?;
//! tokio::spawn(async move { server.run().await });
//! queue.push("B40193C33\r\n".to_string());
//! ```

use otgw_pipeline::queue::DropOldestQueue;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// 中继错误。
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// 配置解析错误
    #[error("config parse error: {0}")]
    ConfigParse(String),
}

/// 中继服务配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// 监听端口
    pub listen_port: u16,
    /// 单个客户端的写截止时间（毫秒）
    #[serde(default = "default_write_timeout")]
    pub write_timeout_ms: u64,
}

fn default_write_timeout() -> u64 {
    1000
}

impl RelayConfig {
    /// 从 JSON 配置字符串解析
    pub fn from_json(json: &str) -> Result<Self, RelayError> {
        serde_json::from_str(json).map_err(|e| RelayError::ConfigParse(e.to_string()))
    }
}

/// 原始帧中继服务。
///
/// 广播循环在「新连接」与「待转发行」之间多路等待；
/// 写失败或超时的客户端直接从集合中剔除，不重试。
pub struct RelayServer {
    config: RelayConfig,
    listener: TcpListener,
    queue: Arc<DropOldestQueue<String>>,
}

impl RelayServer {
    /// 绑定监听端口。端口被占用时直接报错，由上层决定退出。
    pub async fn bind(
        config: RelayConfig,
        queue: Arc<DropOldestQueue<String>>,
    ) -> Result<Self, RelayError> {
        let addr = format!("0.0.0.0:{}", config.listen_port);
        let listener = TcpListener::bind(&addr).await?;
        info!("relay listening on {}", addr);
        Ok(Self {
            config,
            listener,
            queue,
        })
    }

    /// 实际绑定到的地址（端口 0 时由系统分配）
    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.listener.local_addr()?)
    }

    /// 运行中继：接收循环与广播循环一起驱动，正常情况下不返回。
    pub async fn run(self) -> Result<(), RelayError> {
        let (conn_tx, conn_rx) = mpsc::channel::<(TcpStream, SocketAddr)>(16);
        let listener = self.listener;

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, peer_addr)) => {
                        info!("relay client connected from {}", peer_addr);
                        otgw_telemetry::record_relay_client_connected();
                        if conn_tx.send((stream, peer_addr)).await.is_err() {
                            // 广播循环已退出
                            return;
                        }
                    }
                    Err(e) => {
                        error!("failed to accept relay connection: {}", e);
                    }
                }
            }
        });

        Self::broadcast_loop(self.queue, conn_rx, self.config.write_timeout_ms).await;
        Ok(())
    }

    /// 广播循环：独占客户端集合，在连接通道与行队列之间 select。
    async fn broadcast_loop(
        queue: Arc<DropOldestQueue<String>>,
        mut conns: mpsc::Receiver<(TcpStream, SocketAddr)>,
        write_timeout_ms: u64,
    ) {
        let write_deadline = Duration::from_millis(write_timeout_ms);
        let mut clients: Vec<(TcpStream, SocketAddr)> = Vec::new();

        loop {
            tokio::select! {
                conn = conns.recv() => {
                    match conn {
                        Some(client) => clients.push(client),
                        None => {
                            // 接收循环已退出
                            return;
                        }
                    }
                }
                line = queue.pop() => {
                    if clients.is_empty() {
                        continue;
                    }
                    debug!(clients = clients.len(), "relaying raw line");

                    let mut survivors = Vec::with_capacity(clients.len());
                    for (mut stream, peer) in clients.drain(..) {
                        match timeout(write_deadline, stream.write_all(line.as_bytes())).await {
                            Ok(Ok(())) => {
                                otgw_telemetry::record_relay_line_sent();
                                survivors.push((stream, peer));
                            }
                            Ok(Err(e)) => {
                                warn!(peer = %peer, error = %e, "dropping relay client");
                                otgw_telemetry::record_relay_client_evicted();
                            }
                            Err(_) => {
                                warn!(peer = %peer, "relay write deadline exceeded, dropping client");
                                otgw_telemetry::record_relay_client_evicted();
                            }
                        }
                    }
                    clients = survivors;
                }
            }
        }
    }
}
