//! dvid-volume - DVID volume client
//!
//! A blocking Rust client for reading and writing rectangular subvolumes of
//! N-dimensional, multi-channel volumes served by a DVID server.
//!
//! # Features
//!
//! - Schema parsing into typed metadata (shape, element type, axis order)
//! - Transcoding between `ndarray` arrays and DVID's raw voxel streams
//! - One persistent HTTP/1.1 connection per volume, shared safely by threads
//! - Volume creation and dataset listing through the same connection layer
//!
//! # Connections
//!
//! The default `http-client` feature provides [`HttpConnection`], backed by
//! reqwest. Any other transport can be used by implementing the
//! [`Connection`] trait and handing it to [`VolumeClient::with_connection`].
//!
//! # Example
//!
//! ```rust,no_run
//! use dvid_volume::{HttpVolumeClient, Result};
//! use ndarray::ArrayD;
//!
//! # fn example() -> Result<()> {
//! let client = HttpVolumeClient::open("localhost:8000", "a1b2c3", "grayscale")?;
//!
//! // All channels of a 100x100x1 slab, indexed c, x, y, z
//! let slab: ArrayD<u8> = client.retrieve_subvolume(&[0, 0, 0, 50], &[1, 100, 100, 51])?;
//! client.modify_subvolume(&[0, 0, 0, 51], &[1, 100, 100, 52], &slab)?;
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod codec;
pub mod config;
pub mod error;
pub mod general;
pub mod io;
pub mod layout;
pub mod metadata;
pub mod rest;
pub mod types;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-exports
pub use access::VolumeClient;
#[cfg(feature = "http-client")]
pub use access::HttpVolumeClient;
pub use codec::{VolumeCodec, VOLUME_MIMETYPE};
pub use config::{ClientConfig, DEFAULT_API_ROOT};
pub use error::{DvidError, Result};
pub use general::{list_datasets, DatasetListing};
#[cfg(feature = "http-client")]
pub use io::HttpConnection;
pub use io::{Connection, Request, Response};
pub use layout::Subvolume;
pub use metadata::{AxisOrder, SchemaDocument, VolumeMetadata};
pub use types::{AxisDescriptor, ChannelDescriptor, DataType, Element};

/// Version of the dvid-volume crate
pub const DVID_VOLUME_VERSION: &str = env!("CARGO_PKG_VERSION");
