//! 协议相关常量与时间辅助

/// 一条 OTGW 帧的总长度（含 `\r\n` 终止符）。
pub const FRAME_LENGTH: usize = 11;

/// 获取当前时间戳（纳秒，行协议时间戳字段）
pub fn now_epoch_nanos() -> i128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i128
}
