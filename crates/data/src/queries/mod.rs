//! Per-entity aggregation pipelines.
//!
//! Each module owns one entity family: its backend-shaped records, its
//! denormalized view models, and a service that turns the former into the
//! latter by joining record rows with blob lookups. Services hand out
//! [`crate::resource::QueryResource`]s for consumers.
//!
//! Failure policy is per join, not global: required lookups (news author
//! names, member-count sub-queries) abort the whole pipeline, while
//! best-effort lookups (donation images, business logos) degrade to a
//! placeholder or absent value and are only logged.

pub mod businesses;
pub mod committees;
pub mod donations;
pub mod events;
pub mod magazines;
pub mod members;
pub mod news;
