//! 编解码错误类型定义

/// 帧解码错误
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// 长度或前缀不符合帧格式
    #[error("invalid frame: {0:?}")]
    InvalidFrame(String),

    /// 消息类别不携带可解码数据
    #[error("message kind is not decodable: {0:?}")]
    Undecodable(domain::MessageKind),

    /// 十六进制负载解析失败
    #[error("invalid hex payload: {0:?}")]
    InvalidHex(String),
}
