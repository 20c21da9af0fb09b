/*
[INPUT]:  Exchange wire names and canonical message requirements
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Data layer - type definitions shared by normalizer and consumers
[UPDATE]: When the canonical format or exchange enumerations change
*/

pub mod enums;
pub mod messages;
pub mod models;

pub use enums::*;
pub use messages::*;
pub use models::PriceLevel;
