//! Presentation adapters over the inference service.
//!
//! `dto` owns the JSON request/response envelope; `ffi` exposes it over a C ABI.

pub mod dto;
pub mod ffi;

pub use dto::{contract_json, handle_json};
