//! OpenTherm 帧编解码能力模块。
//!
//! 提供三类纯函数能力（无 I/O、无状态）：
//!
//! - 帧有效性校验与消息类别判定（[`frame`]）
//! - 基于静态描述符表的类型驱动解码（[`frame`] + [`registry`]）
//! - 行协议 / 可读文本两种渲染（[`render`]）

pub mod error;
pub mod frame;
pub mod registry;
pub mod render;
pub mod types;

pub use error::FrameError;
pub use frame::{classify, decode, is_valid_frame};
pub use registry::{descriptor, FieldDescriptor};
pub use render::{render_line_protocol, render_readable, MEASUREMENT};
