//! OpenTherm 帧值模型。
//!
//! 各模块共享的解码结果类型：消息类别、标量类型标签、
//! 以及一次解码产出的有序字段列表。

use std::fmt;

/// 帧的 3-bit 消息类别（`b0` 的 6-4 位）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    ReadData,
    WriteData,
    InvalidData,
    Reserved,
    ReadAck,
    WriteAck,
    DataInvalid,
    UnknownDataId,
}

impl MessageKind {
    /// 从 `(b0 >> 4) & 0x7` 的结果构造消息类别。
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x7 {
            0 => Self::ReadData,
            1 => Self::WriteData,
            2 => Self::InvalidData,
            3 => Self::Reserved,
            4 => Self::ReadAck,
            5 => Self::WriteAck,
            6 => Self::DataInvalid,
            _ => Self::UnknownDataId,
        }
    }

    /// 只有应答帧携带可信数据，其余类别跳过不解码。
    pub fn is_decodable(self) -> bool {
        matches!(self, Self::ReadAck | Self::WriteAck)
    }
}

/// 字段的标量类型标签（封闭枚举，驱动解码器分派）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// 该槽位无值
    None,
    /// 无符号 8 位整数 0..255
    U8,
    /// 高 3 位为星期（1=周一）、低 5 位为小时
    U8Wdt,
    /// 有符号 8 位整数 -128..127（二补码）
    S8,
    /// 定点数：`b2 + b3/256`，渲染保留两位小数
    F8_8,
    /// 无符号 16 位整数（大端）
    U16,
    /// 有符号 16 位整数（大端，二补码）
    S16,
    /// 8 个独立布尔标志位，每位占一个字段名槽
    Flag8,
}

/// 解码后的单个标量值。
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Flag(bool),
    Unsigned(u16),
    Signed(i16),
    Fixed(f64),
}

impl fmt::Display for FieldData {
    /// 行协议与可读输出共用的文本形式：标志位为 `1`/`0`，定点数两位小数。
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(true) => write!(f, "1"),
            Self::Flag(false) => write!(f, "0"),
            Self::Unsigned(v) => write!(f, "{v}"),
            Self::Signed(v) => write!(f, "{v}"),
            Self::Fixed(v) => write!(f, "{v:.2}"),
        }
    }
}

/// 解码产出的一个命名字段。
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub name: &'static str,
    pub description: &'static str,
    pub value: FieldData,
}

/// 一帧的解码结果：保持描述符顺序的字段列表。
///
/// 生命周期仅覆盖一次解码调用，不做持久化。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFrame {
    pub fields: Vec<FieldValue>,
}

impl DecodedFrame {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}
