//! # Lurk Common
//!
//! Common types, utilities, and shared abstractions for Lurk.
//!
//! This crate provides foundational types used across the Lurk crates:
//! - ID types (EntityId, WayPointId, SleepPointId)
//! - Collision layer masks
//! - Geometry helpers over `glam::Vec3`
//! - Version information for scenario schemas
//! - Common error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod geometry;
pub mod ids;
pub mod layers;
pub mod version;

pub use glam::Vec3;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::geometry::*;
    pub use crate::ids::*;
    pub use crate::layers::*;
    pub use crate::version::*;
    pub use glam::Vec3;
}

pub use prelude::*;
