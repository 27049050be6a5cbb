//! 追踪初始化与进程级计数器。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 基础指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub raw_lines: u64,
    pub invalid_frames: u64,
    pub undecodable_frames: u64,
    pub unknown_data_ids: u64,
    pub decoded_frames: u64,
    pub inbound_evictions: u64,
    pub relay_evictions: u64,
    pub relay_clients_connected: u64,
    pub relay_clients_evicted: u64,
    pub relay_lines_sent: u64,
    pub batches_flushed: u64,
    pub batch_failures: u64,
    pub points_written: u64,
}

/// 基础指标。
pub struct TelemetryMetrics {
    raw_lines: AtomicU64,
    invalid_frames: AtomicU64,
    undecodable_frames: AtomicU64,
    unknown_data_ids: AtomicU64,
    decoded_frames: AtomicU64,
    inbound_evictions: AtomicU64,
    relay_evictions: AtomicU64,
    relay_clients_connected: AtomicU64,
    relay_clients_evicted: AtomicU64,
    relay_lines_sent: AtomicU64,
    batches_flushed: AtomicU64,
    batch_failures: AtomicU64,
    points_written: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            raw_lines: AtomicU64::new(0),
            invalid_frames: AtomicU64::new(0),
            undecodable_frames: AtomicU64::new(0),
            unknown_data_ids: AtomicU64::new(0),
            decoded_frames: AtomicU64::new(0),
            inbound_evictions: AtomicU64::new(0),
            relay_evictions: AtomicU64::new(0),
            relay_clients_connected: AtomicU64::new(0),
            relay_clients_evicted: AtomicU64::new(0),
            relay_lines_sent: AtomicU64::new(0),
            batches_flushed: AtomicU64::new(0),
            batch_failures: AtomicU64::new(0),
            points_written: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            raw_lines: self.raw_lines.load(Ordering::Relaxed),
            invalid_frames: self.invalid_frames.load(Ordering::Relaxed),
            undecodable_frames: self.undecodable_frames.load(Ordering::Relaxed),
            unknown_data_ids: self.unknown_data_ids.load(Ordering::Relaxed),
            decoded_frames: self.decoded_frames.load(Ordering::Relaxed),
            inbound_evictions: self.inbound_evictions.load(Ordering::Relaxed),
            relay_evictions: self.relay_evictions.load(Ordering::Relaxed),
            relay_clients_connected: self.relay_clients_connected.load(Ordering::Relaxed),
            relay_clients_evicted: self.relay_clients_evicted.load(Ordering::Relaxed),
            relay_lines_sent: self.relay_lines_sent.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            batch_failures: self.batch_failures.load(Ordering::Relaxed),
            points_written: self.points_written.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 记录上游读到的原始行数。
pub fn record_raw_line() {
    metrics().raw_lines.fetch_add(1, Ordering::Relaxed);
}

/// 记录无效帧（长度或前缀不合规）次数。
pub fn record_invalid_frame() {
    metrics().invalid_frames.fetch_add(1, Ordering::Relaxed);
}

/// 记录类别不可解码（非应答）的帧数。
pub fn record_undecodable_frame() {
    metrics().undecodable_frames.fetch_add(1, Ordering::Relaxed);
}

/// 记录 DataID 未收录的帧数。
pub fn record_unknown_data_id() {
    metrics().unknown_data_ids.fetch_add(1, Ordering::Relaxed);
}

/// 记录成功解码的帧数。
pub fn record_decoded_frame() {
    metrics().decoded_frames.fetch_add(1, Ordering::Relaxed);
}

/// 记录入站队列满时被挤掉的行数。
pub fn record_inbound_eviction() {
    metrics().inbound_evictions.fetch_add(1, Ordering::Relaxed);
}

/// 记录转发队列满时被挤掉的行数。
pub fn record_relay_eviction() {
    metrics().relay_evictions.fetch_add(1, Ordering::Relaxed);
}

/// 记录中继客户端接入次数。
pub fn record_relay_client_connected() {
    metrics()
        .relay_clients_connected
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录中继客户端被剔除次数。
pub fn record_relay_client_evicted() {
    metrics()
        .relay_clients_evicted
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录成功转发给单个客户端的行数。
pub fn record_relay_line_sent() {
    metrics().relay_lines_sent.fetch_add(1, Ordering::Relaxed);
}

/// 记录批量下发成功次数与写入点数。
pub fn record_batch_flushed(points: u64) {
    let metrics = metrics();
    metrics.batches_flushed.fetch_add(1, Ordering::Relaxed);
    metrics.points_written.fetch_add(points, Ordering::Relaxed);
}

/// 记录批量下发失败（该批数据被丢弃）次数。
pub fn record_batch_failure() {
    metrics().batch_failures.fetch_add(1, Ordering::Relaxed);
}
