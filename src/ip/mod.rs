//! IP address, subnet and port allocation module.
//!
//! This module hands out the next free subnet for a platform, the next free
//! host address inside a platform subnet, and the next free forwarded port
//! for server hosts. Every function is a bounded scan over a fixed sequence
//! and reports exhaustion instead of wrapping around.

pub mod allocator;
pub mod ports;

// Re-export commonly used items
pub use allocator::{gateway_of, is_in_subnet, next_ip, next_subnet, AllocationError};
pub use ports::{next_port, FIRST_PORT};
