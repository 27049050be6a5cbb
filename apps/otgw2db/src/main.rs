//! OTGW 桥接服务入口：接入网关帧流、解码入库、原样转发。

use async_trait::async_trait;
use otgw_config::AppConfig;
use otgw_ingest::{IngestError, OtgwSource, OtgwSourceConfig, RawLineHandler};
use otgw_pipeline::{BatchSink, DropOldestQueue, FlushOutcome};
use otgw_protocol::{classify, decode, is_valid_frame, render_line_protocol, render_readable};
use otgw_relay::{RelayConfig, RelayServer};
use otgw_storage::{InfluxConfig, InfluxWriter};
use otgw_telemetry::init_tracing;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 接入侧的行处理器：只负责入队，队满挤掉最旧的行。
struct QueueHandler {
    queue: Arc<DropOldestQueue<String>>,
}

#[async_trait]
impl RawLineHandler for QueueHandler {
    async fn handle(&self, line: String) -> Result<(), IngestError> {
        if self.queue.push(line).is_some() {
            otgw_telemetry::record_inbound_eviction();
            debug!("inbound queue full, evicted oldest line");
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化结构化日志
    init_tracing();

    // 配置文件路径可用环境变量覆盖
    let config_path =
        std::env::var("OTGW2DB_CONFIG").unwrap_or_else(|_| "otgw2db.cfg".to_string());
    let config = AppConfig::from_file(&config_path)?;
    info!(
        config = %config_path,
        otgw = %config.otgw_address,
        relay_port = config.relay_tcp_port,
        stored_fields = config.enabled_field_count(),
        "otgw2db starting"
    );

    // 写库开启时先探活，数据库不可达属配置错误，直接退出
    let sink = if config.decode_line_protocol {
        let writer = InfluxWriter::new(&InfluxConfig {
            host: config.influx_host.clone(),
            port: config.influx_port,
            bucket: config.influx_bucket.clone(),
            username: config.influx_user.clone(),
            password: config.influx_pass.clone(),
            request_timeout_secs: 10,
        })?;
        writer.probe().await?;
        info!(
            host = %config.influx_host,
            bucket = %config.influx_bucket,
            "influxdb reachable"
        );
        Some(BatchSink::new(Arc::new(writer), config.batch_threshold))
    } else {
        None
    };

    let inbound: Arc<DropOldestQueue<String>> =
        Arc::new(DropOldestQueue::new(config.queue_capacity));
    let relay_queue: Arc<DropOldestQueue<String>> =
        Arc::new(DropOldestQueue::new(config.queue_capacity));

    // 中继：监听失败（端口被占用等）属启动错误
    let relay = RelayServer::bind(
        RelayConfig {
            listen_port: config.relay_tcp_port,
            write_timeout_ms: 1000,
        },
        Arc::clone(&relay_queue),
    )
    .await?;
    tokio::spawn(async move {
        if let Err(err) = relay.run().await {
            error!(error = %err, "relay terminated");
        }
    });

    // 接入：启动阶段网关不可达是致命错误，整个进程退出
    let source = OtgwSource::new(OtgwSourceConfig {
        address: config.otgw_address.clone(),
        max_backoff_secs: config.max_reconnect_delay_secs,
        ..Default::default()
    });
    let handler = Arc::new(QueueHandler {
        queue: Arc::clone(&inbound),
    });
    tokio::spawn(async move {
        if let Err(err) = source.run(handler).await {
            error!(error = %err, "ingestion aborted");
            std::process::exit(1);
        }
    });

    run_bridge(config, inbound, relay_queue, sink).await;
    Ok(())
}

/// 编排循环：逐行出队，先转发后解码。
async fn run_bridge(
    config: AppConfig,
    inbound: Arc<DropOldestQueue<String>>,
    relay_queue: Arc<DropOldestQueue<String>>,
    mut sink: Option<BatchSink>,
) {
    loop {
        let line = inbound.pop().await;
        otgw_telemetry::record_raw_line();

        // 所有原始行无条件进转发队列，与解码结果无关
        if relay_queue.push(line.clone()).is_some() {
            otgw_telemetry::record_relay_eviction();
            debug!("relay queue full, evicted oldest line");
        }

        process_line(&config, &line, &mut sink).await;

        // 限制循环频率以约束 CPU 占用
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// 校验、解码并按配置渲染一行。
async fn process_line(config: &AppConfig, line: &str, sink: &mut Option<BatchSink>) {
    if !is_valid_frame(line) {
        // 网关状态行等非帧输入属预期情形
        otgw_telemetry::record_invalid_frame();
        debug!(line = line.trim_end(), "not an opentherm frame, skipping");
        return;
    }
    let kind = classify(line);
    if !kind.is_decodable() {
        otgw_telemetry::record_undecodable_frame();
        debug!(?kind, "frame kind not decodable, skipping");
        return;
    }

    let frame = match decode(line) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(line = line.trim_end(), error = %err, "frame decode failed");
            return;
        }
    };
    if frame.is_empty() {
        // 应答帧但 DataID 未收录
        otgw_telemetry::record_unknown_data_id();
        return;
    }
    otgw_telemetry::record_decoded_frame();

    if config.decode_readable {
        let readable = render_readable(&frame, |name| config.is_field_enabled(name));
        if !readable.is_empty() {
            println!("{readable}");
        }
    }

    if let Some(sink) = sink {
        let record = render_line_protocol(&frame, |name| config.is_field_enabled(name));
        if !record.is_empty() {
            if let FlushOutcome::Dropped(count) = sink.accept(&record).await {
                warn!(count, "dropped batch after failed write");
            }
        }
    }
}
