// src/lib.rs

//! Archive sync core: catalog paging, body flattening, full-text cache,
//! month facets and search.

pub mod error;
pub mod models;
pub mod pipeline;
#[cfg(feature = "server")]
pub mod server;
pub mod services;
pub mod store;
