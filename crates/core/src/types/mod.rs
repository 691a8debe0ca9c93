//! Core types for Spruce.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod status;

pub use address::{Address, AddressDraft, AddressError};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{CartItem, Order, OrderItem, now_millis};
pub use price::{MinorUnitPrice, OrderPrice};
pub use status::OrderStatus;
