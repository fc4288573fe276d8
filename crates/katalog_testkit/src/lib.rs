//! # Katalog Testkit
//!
//! Test utilities for Katalog.
//!
//! This crate provides:
//! - Store fixtures that run a test body against both backends
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use katalog_testkit::with_each_store;
//! use katalog_store::StoreExt;
//!
//! with_each_store(|store| {
//!     store
//!         .update(|tx| tx.create_bucket("vol").map(|_| ()))
//!         .unwrap();
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

pub use fixtures::{with_each_store, TestStore};
pub use generators::{entries, key, value};
