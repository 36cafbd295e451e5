pub mod enums;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{OrderSide, OrderType, TimeInForce};
pub use structs::{InstrumentState, MinuteBar, OrderRequest, Quote};
