//! Spruce Core - Shared types library.
//!
//! This crate provides the domain types used across the Spruce storefront:
//! identifiers, prices, emails, addresses, order records, and statuses.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no service
//! wiring. All durable state lives in hosted services; these types describe
//! the documents and values exchanged with them.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers and records for ids, prices, emails,
//!   addresses, orders, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
