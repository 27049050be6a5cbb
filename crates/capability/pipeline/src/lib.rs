//! 数据流水线能力模块。
//!
//! 两个构件：
//!
//! - [`DropOldestQueue`]：固定容量 FIFO。满时先淘汰最旧项再入队，
//!   生产者永不阻塞、永不感知背压；消费者 `pop().await` 直到有数据。
//!   入站原始帧缓冲与转发缓冲共用这一抽象。
//! - [`BatchSink`]：行协议记录累加器。计数到阈值时通过 [`LineWriter`]
//!   一次性下发；成功与失败都清空缓冲，失败只记日志，不重试、不落盘。

pub mod queue;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub use queue::DropOldestQueue;

/// Pipeline 处理错误。
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("writer error: {0}")]
    Writer(String),
}

/// 行协议批量写入器抽象。
///
/// 约定：接收一个批量请求体，返回成功或失败；任何传输错误
/// 与非成功状态对调用方等价（整批丢弃）。
#[async_trait]
pub trait LineWriter: Send + Sync {
    async fn write_lines(&self, body: &str) -> Result<(), PipelineError>;
}

/// 一次 flush 的结果（测试与日志用途）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// 未达阈值，仅入缓冲
    Buffered,
    /// 批量下发成功
    Flushed(usize),
    /// 批量下发失败，整批已丢弃
    Dropped(usize),
}

/// 行协议批量累加器。
///
/// 由编排循环同步驱动（单消费者），不自带任务。
pub struct BatchSink {
    writer: Arc<dyn LineWriter>,
    threshold: usize,
    buffer: String,
    count: usize,
    total_written: u64,
}

impl BatchSink {
    pub fn new(writer: Arc<dyn LineWriter>, threshold: usize) -> Self {
        Self {
            writer,
            threshold: threshold.max(1),
            buffer: String::new(),
            count: 0,
            total_written: 0,
        }
    }

    /// 当前缓冲的记录数。
    pub fn pending(&self) -> usize {
        self.count
    }

    /// 历史累计成功写入的记录数。
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// 接收一条行协议记录；达到阈值时触发下发。
    ///
    /// 记录以 `\n` 结尾拼入请求体。下发失败时整批丢弃并告警，
    /// 绝不把失败传导回接入侧。
    pub async fn accept(&mut self, record: &str) -> FlushOutcome {
        self.buffer.push_str(record);
        self.buffer.push('\n');
        self.count += 1;
        debug!(pending = self.count, "buffered line protocol record");

        if self.count < self.threshold {
            return FlushOutcome::Buffered;
        }
        self.flush().await
    }

    /// 立即下发当前缓冲（空缓冲为 no-op）。
    pub async fn flush(&mut self) -> FlushOutcome {
        if self.count == 0 {
            return FlushOutcome::Buffered;
        }
        let batch_size = self.count;
        let body = std::mem::take(&mut self.buffer);
        self.count = 0;

        match self.writer.write_lines(&body).await {
            Ok(()) => {
                self.total_written += batch_size as u64;
                otgw_telemetry::record_batch_flushed(batch_size as u64);
                debug!(
                    batch_size,
                    total_written = self.total_written,
                    "submitted batch to sink"
                );
                FlushOutcome::Flushed(batch_size)
            }
            Err(err) => {
                otgw_telemetry::record_batch_failure();
                warn!(batch_size, error = %err, "sink rejected batch, dropping data points");
                FlushOutcome::Dropped(batch_size)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct CountingWriter {
        bodies: Mutex<Vec<String>>,
    }

    #[derive(Default)]
    struct FailingWriter;

    #[async_trait]
    impl LineWriter for CountingWriter {
        async fn write_lines(&self, body: &str) -> Result<(), PipelineError> {
            self.bodies.lock().await.push(body.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl LineWriter for FailingWriter {
        async fn write_lines(&self, _body: &str) -> Result<(), PipelineError> {
            Err(PipelineError::Writer("forced failure".to_string()))
        }
    }

    #[tokio::test]
    async fn sink_flushes_exactly_at_threshold() {
        let writer = Arc::new(CountingWriter::default());
        let mut sink = BatchSink::new(writer.clone(), 3);

        assert_eq!(sink.accept("otgw a=1 1").await, FlushOutcome::Buffered);
        assert_eq!(sink.accept("otgw b=2 2").await, FlushOutcome::Buffered);
        assert_eq!(sink.accept("otgw c=3 3").await, FlushOutcome::Flushed(3));
        assert_eq!(sink.pending(), 0);

        let bodies = writer.bodies.lock().await;
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0], "otgw a=1 1\notgw b=2 2\notgw c=3 3\n");
    }

    #[tokio::test]
    async fn failed_flush_still_resets_accumulator() {
        let mut sink = BatchSink::new(Arc::new(FailingWriter), 2);
        sink.accept("otgw a=1 1").await;
        assert_eq!(sink.accept("otgw b=2 2").await, FlushOutcome::Dropped(2));
        // 失败批不会重投
        assert_eq!(sink.pending(), 0);
        assert_eq!(sink.total_written(), 0);

        // 后续批从空缓冲重新开始
        assert_eq!(sink.accept("otgw c=3 3").await, FlushOutcome::Buffered);
        assert_eq!(sink.pending(), 1);
    }

    #[tokio::test]
    async fn successful_flush_accumulates_total() {
        let writer = Arc::new(CountingWriter::default());
        let mut sink = BatchSink::new(writer, 1);
        sink.accept("otgw a=1 1").await;
        sink.accept("otgw b=2 2").await;
        assert_eq!(sink.total_written(), 2);
    }

    #[tokio::test]
    async fn zero_threshold_is_sanitized() {
        let writer = Arc::new(CountingWriter::default());
        let mut sink = BatchSink::new(writer, 0);
        assert_eq!(sink.accept("otgw a=1 1").await, FlushOutcome::Flushed(1));
    }
}
