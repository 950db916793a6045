pub mod de;
pub mod enums;
pub mod error;
pub mod position;
pub mod schedule;

// Re-export the core types to provide a clean public API.
pub use enums::{PositionStatus, Side};
pub use error::CoreError;
pub use position::{sort_chronologically, Position, ProductId};
pub use schedule::decode_schedule;
