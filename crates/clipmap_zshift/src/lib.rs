//! # CLIPMAP Z-Shift
//!
//! Detects where stairs and ladders connect stacked planes of a finished
//! [`clipmap_core::CollisionMap`].
//!
//! ## Output
//!
//! A [`ZLinkMap`] of bidirectional [`ZLink`]s per region, exportable with
//! [`encode_links`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use clipmap_zshift::{encode_links, ZShiftDetector};
//!
//! let links = ZShiftDetector::default().detect(&map, &types);
//! for (region, region_links) in links.iter() {
//!     std::fs::write(format!("{region}.links"), encode_links(region_links))?;
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod detector;
pub mod error;
pub mod link;
pub mod shape;

pub use config::{ZShiftConfig, DEFAULT_STAIR_NAMES};
pub use detector::{DetectStats, ZShiftDetector};
pub use error::LinkDecodeError;
pub use link::{decode_links, encode_links, ZLink, ZLinkMap};
pub use shape::StairShape;
