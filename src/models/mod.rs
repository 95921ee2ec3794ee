//! JSON models of the toncenter HTTP API

pub mod toncenter_v2;

pub use toncenter_v2::{
    StackItemType, StringOrInt, V2RunGetMethodResult, V2StackEntity, stack_from_result,
    stack_to_entities,
};
