//! License identification for enriched dependencies.
//!
//! - [`spdx`]: the permissive allow-list and the rules picking a dependency's
//!   SPDX identifier from repository metadata, its manifest, or its license file.

pub mod spdx;
