//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Each content type is persisted through its own [`ContentRepository`]
//! implementation. Adapters live under `crate::outbound`.

mod macros;
pub(crate) use macros::define_port_error;

mod content_repository;

pub use content_repository::{
    ContentQuery, ContentRepository, ContentRepositoryError, ContentSort,
    FixtureContentRepository,
};
