//! Slide templates for a digital-signage player, built around a timed
//! content-rotation engine.
//!
//! - [`execution`]: one duration timer per activation of a fixed-length slide.
//! - [`scheduler`]: per-entry rotation for paginated slides.
//! - [`feed`]: RSS normalization and fetching.
//! - [`layout`]: horizontal/vertical layout selection.
//! - [`templates`] and [`player`]: wiring of the above to the host contract in [`host`].

pub mod config;
pub mod error;
pub mod execution;
pub mod feed;
pub mod host;
pub mod layout;
pub mod media;
pub mod model;
pub mod player;
pub mod scheduler;
pub mod templates;
pub mod theme;
pub mod timer;
