//! 存储层错误类型

/// 存储错误。
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// HTTP 客户端错误（连接失败、超时等）
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// 服务端拒绝写入（非 2xx 响应）
    #[error("influxdb rejected write: status {status}: {body}")]
    Rejected { status: u16, body: String },
    /// 配置解析错误
    #[error("config parse error: {0}")]
    ConfigParse(String),
}
