//! Implementations of [`HidProfile`](crate::application::profile::HidProfile).
//!
//! Only the in-process fake lives here; a platform adapter plugs in through
//! the same trait.

pub mod fake;
