//! # Core Module
//!
//! Fundamental concurrency primitives shared by the terrain pipeline. The
//! driver thread, the worker pool, and detached stage workers all coordinate
//! through the types defined here.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking
//! - `CancellationToken`: Cooperative cancellation flag handed to stage workers
//!
//! ## Usage
//! ```rust
//! use voxel_terrain::core::{CancellationToken, MtResource};
//!
//! let counter = MtResource::new(0);
//! *counter.get_mut() += 1;
//! assert_eq!(*counter.get(), 1);
//!
//! let token = CancellationToken::new();
//! assert!(!token.is_cancelled());
//! token.cancel();
//! assert!(token.is_cancelled());
//! ```

pub mod cancellation;
pub mod mt_resource;

pub use cancellation::CancellationToken;
pub use mt_resource::MtResource;
