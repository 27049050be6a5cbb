//! 解码结果的两种渲染。
//!
//! 行协议：`otgw name=value[,name=value...] <纳秒时间戳>`，供批量下发；
//! 可读文本：每字段一行 `描述: 值`，供运行时人工查看。
//! 两者共用同一份按字段名过滤的启用策略；过滤后无字段时输出为空，
//! 调用方不得下发空结果。

use domain::DecodedFrame;

use crate::types::now_epoch_nanos;

/// 行协议的 measurement 名。
pub const MEASUREMENT: &str = "otgw";

/// 渲染行协议记录。时间戳在渲染时刻采集，而非帧到达时刻。
pub fn render_line_protocol<F>(frame: &DecodedFrame, enabled: F) -> String
where
    F: Fn(&str) -> bool,
{
    let fields: Vec<String> = frame
        .fields
        .iter()
        .filter(|field| enabled(field.name))
        .map(|field| format!("{}={}", field.name, field.value))
        .collect();

    if fields.is_empty() {
        return String::new();
    }

    format!("{} {} {}", MEASUREMENT, fields.join(","), now_epoch_nanos())
}

/// 渲染可读文本：每字段一行，换行连接。
pub fn render_readable<F>(frame: &DecodedFrame, enabled: F) -> String
where
    F: Fn(&str) -> bool,
{
    let lines: Vec<String> = frame
        .fields
        .iter()
        .filter(|field| enabled(field.name))
        .map(|field| format!("{}: {}", field.description, field.value))
        .collect();

    lines.join("\n")
}
