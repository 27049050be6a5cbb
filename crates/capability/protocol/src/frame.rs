//! 帧校验、分类与表驱动解码。
//!
//! 一条帧为 11 字符 ASCII 行：方向字符 + 8 个十六进制位 + `\r\n`。
//! 8 个十六进制位解出 4 字节 `b0 b1 b2 b3`：`b0` 的 6-4 位是消息类别，
//! `b1` 是 DataID，`b2 b3` 是 16 位数据值，解释方式完全由描述符决定。

use domain::{DecodedFrame, FieldData, FieldValue, MessageKind, ScalarType};
use tracing::{debug, warn};

use crate::error::FrameError;
use crate::registry;
use crate::types::FRAME_LENGTH;

/// 帧有效性：长度恰为 11 且以 `T`/`B` 开头。
///
/// 其他前缀是网关自身的状态行，属预期输入，由调用方按 debug 级别记录。
pub fn is_valid_frame(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.len() == FRAME_LENGTH && (bytes[0] == b'T' || bytes[0] == b'B')
}

/// 判定消息类别：解析首个负载字节，取其 6-4 位。
///
/// 十六进制解析失败按 `DataInvalid` 处理（不可解码，帧被丢弃）。
pub fn classify(line: &str) -> MessageKind {
    match parse_hex_byte(line.as_bytes(), 1) {
        Some(b0) => MessageKind::from_bits(b0 >> 4),
        None => MessageKind::DataInvalid,
    }
}

/// 解码一帧为有序字段列表。
///
/// 前置条件：`is_valid_frame` 与 `classify(..).is_decodable()` 均成立。
/// 未收录的 DataID 返回空结果（预期情形，不是错误）。
pub fn decode(line: &str) -> Result<DecodedFrame, FrameError> {
    if !is_valid_frame(line) {
        return Err(FrameError::InvalidFrame(line.to_string()));
    }
    let kind = classify(line);
    if !kind.is_decodable() {
        return Err(FrameError::Undecodable(kind));
    }

    let payload = parse_payload(line)?;
    let data_id = payload[1];
    let descriptor = match registry::descriptor(data_id) {
        Some(descriptor) => descriptor,
        None => {
            debug!(data_id, "no descriptor for data id, skipping frame");
            return Ok(DecodedFrame::default());
        }
    };

    let mut fields = Vec::new();
    // name_offset 跟踪展开字段列表中的当前名槽位置
    let mut name_offset = 0usize;

    for (slot, ty) in [descriptor.high, descriptor.low].into_iter().enumerate() {
        match ty {
            ScalarType::Flag8 => {
                // 标志字节始终取 b2；仅发出 bit 0..6，bit 7 保留不发出，
                // 名槽仍按 8 推进以保持与描述符表对齐
                let byte = payload[2];
                for bit in 0..7u8 {
                    push_field(
                        &mut fields,
                        descriptor,
                        data_id,
                        name_offset + bit as usize,
                        FieldData::Flag(byte & (1 << bit) != 0),
                    );
                }
                name_offset += 8;
            }
            ScalarType::F8_8 => {
                let value = f64::from(payload[2]) + f64::from(payload[3]) / 256.0;
                push_field(
                    &mut fields,
                    descriptor,
                    data_id,
                    name_offset,
                    FieldData::Fixed(value),
                );
            }
            ScalarType::U16 => {
                let value = u16::from_be_bytes([payload[2], payload[3]]);
                push_field(
                    &mut fields,
                    descriptor,
                    data_id,
                    name_offset,
                    FieldData::Unsigned(value),
                );
            }
            ScalarType::S16 => {
                let value = i16::from_be_bytes([payload[2], payload[3]]);
                push_field(
                    &mut fields,
                    descriptor,
                    data_id,
                    name_offset,
                    FieldData::Signed(value),
                );
            }
            ScalarType::U8 => {
                let value = payload[2 + slot];
                push_field(
                    &mut fields,
                    descriptor,
                    data_id,
                    name_offset,
                    FieldData::Unsigned(u16::from(value)),
                );
                name_offset += 1;
            }
            ScalarType::S8 => {
                let value = payload[2 + slot] as i8;
                push_field(
                    &mut fields,
                    descriptor,
                    data_id,
                    name_offset,
                    FieldData::Signed(i16::from(value)),
                );
                name_offset += 1;
            }
            ScalarType::U8Wdt => {
                let byte = payload[2 + slot];
                push_field(
                    &mut fields,
                    descriptor,
                    data_id,
                    name_offset,
                    FieldData::Unsigned(u16::from(byte >> 5)),
                );
                push_field(
                    &mut fields,
                    descriptor,
                    data_id,
                    name_offset + 1,
                    FieldData::Unsigned(u16::from(byte & 0x1f)),
                );
                name_offset += 1;
            }
            ScalarType::None => {}
        }
    }

    Ok(DecodedFrame { fields })
}

/// 名槽越界说明描述符损坏：记录并跳过该值，不让一条坏表项中断解码。
fn push_field(
    fields: &mut Vec<FieldValue>,
    descriptor: &'static registry::FieldDescriptor,
    data_id: u8,
    index: usize,
    value: FieldData,
) {
    match (descriptor.names.get(index), descriptor.descriptions.get(index)) {
        (Some(name), Some(description)) => fields.push(FieldValue {
            name,
            description,
            value,
        }),
        _ => warn!(data_id, index, "descriptor name slot out of range"),
    }
}

/// 解析 8 位十六进制负载为 4 字节。
fn parse_payload(line: &str) -> Result<[u8; 4], FrameError> {
    let bytes = line.as_bytes();
    let mut payload = [0u8; 4];
    for (i, chunk) in payload.iter_mut().enumerate() {
        *chunk = parse_hex_byte(bytes, 1 + i * 2)
            .ok_or_else(|| FrameError::InvalidHex(line.to_string()))?;
    }
    Ok(payload)
}

fn parse_hex_byte(bytes: &[u8], offset: usize) -> Option<u8> {
    let hi = hex_digit(*bytes.get(offset)?)?;
    let lo = hex_digit(*bytes.get(offset + 1)?)?;
    Some(hi << 4 | lo)
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
