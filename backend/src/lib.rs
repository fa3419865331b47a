//! Content engine library: entities, lifecycles, metrics, and analytics for
//! the marketing site's blog posts, case studies, job postings, products, and
//! service offerings.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;
