//! # uplinq-api
//!
//! Async facade over the platform services: bearer-token authentication,
//! wire-level DTOs, and one handler per public operation. The services
//! themselves are synchronous over the store port; this crate is where
//! the async boundary lives.

pub mod dto;
pub mod facade;

pub use dto::{ApiResult, ErrorBody};
pub use facade::{MemberApi, UplinqApi};
