//! Core types and trait definitions for the journal store.
//!
//! This crate has no database dependencies. Backends implement
//! [`store::EntryStore`]; the journaling workflow in
//! [`service`] is written against that trait only.

// Traits use native `async fn`; silence the lint about `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod entry;
pub mod error;
pub mod identity;
pub mod service;
pub mod stats;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
