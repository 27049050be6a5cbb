pub mod frame;

pub use frame::{DecodedFrame, FieldData, FieldValue, MessageKind, ScalarType};
