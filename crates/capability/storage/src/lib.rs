//! 存储能力模块。
//!
//! 通过 InfluxDB v2 兼容的 HTTP 写入端点持久化行协议数据。
//! 写入器实现流水线的 [`LineWriter`](otgw_pipeline::LineWriter) 接口，
//! 由批量下发器在达到阈值时调用。

pub mod error;
pub mod influx;

pub use error::StorageError;
pub use influx::{InfluxConfig, InfluxWriter};
