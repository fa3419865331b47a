//! Outbound adapters implementing domain ports.
//!
//! - **memory**: in-process content repositories, used by the binaries and
//!   the service tests.
//!
//! Adapters translate between domain types and their storage representation.
//! They contain no business logic.

pub mod memory;
