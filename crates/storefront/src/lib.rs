//! Spruce Storefront library.
//!
//! Client-side storefront logic for a shop whose durable state lives in
//! three hosted services: a per-document database, an auth provider, and a
//! payment processor. This crate owns the pieces that must stay consistent
//! across those services - above all the checkout order-placement workflow
//! and the combined session projection - and exposes the hosted services
//! behind trait seams so a UI host (or a test) supplies the transport.
//!
//! # Architecture
//!
//! - [`documents`] - document store seam plus the hosted REST client
//! - [`auth`] - auth provider seam plus the hosted REST client
//! - [`payments`] - payment gateway seam, card-input signal, price intent
//! - [`cart`] - cart snapshot seam and the local in-memory cart
//! - [`checkout`] - the order-placement workflow (the core)
//! - [`session`] - current-session projection and login policy
//! - [`wishlist`] - wish-list lookup against the products collection
//!
//! Live values are `tokio::sync::watch` channels; component teardown is a
//! `CancellationToken` that suppresses late callbacks.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod documents;
pub mod error;
pub mod payments;
pub mod session;
pub mod state;
pub mod wishlist;
