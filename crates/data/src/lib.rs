//! Samaj data-aggregation layer.
//!
//! Query routines for the community-membership app: each fetches a
//! relational record set from a [`store::RecordStore`], resolves
//! associated binary assets (avatars, logos, magazine covers) from a
//! [`store::BlobStore`], computes derived fields, and exposes the result
//! through the uniform [`resource::QueryResource`] contract consumed by UI.

pub mod config;
pub mod dates;
pub mod error;
pub mod queries;
pub mod resource;
pub mod store;

pub use error::{DataError, DataResult};
pub use resource::{QueryResource, ResultState};
