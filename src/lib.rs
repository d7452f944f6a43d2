//! # `mvt-codec`
//!
//! An encoder and decoder for [Mapbox Vector Tiles](https://github.com/mapbox/vector-tile-spec)
//! working on byte slices, or on [`std::io::Read`] and [`std::io::Write`] (or their respective
//! asynchronous versions [`futures::io::AsyncRead`](https://docs.rs/futures/latest/futures/io/trait.AsyncRead.html)
//! and [`futures::io::AsyncWrite`](https://docs.rs/futures/latest/futures/io/trait.AsyncWrite.html)).
//!
//! Decoding detects zlib and gzip compressed tiles on its own, encoding always
//! produces gzip compressed tiles. Feature attributes are interned per layer:
//! [`Layer::tag`] stores each distinct key and value only once.
//!
//! ## Examples
//!
//! ### A note on the asynchronous versions
//! In the following examples, the synchronous functions are used instead of their respective asynchronous versions.
//!
//! To work with asynchronous readers/writers, enable the `async`-feature and simply replace:
//! - [`Tile::from_reader`] with [`Tile::from_async_reader`]
//! - [`Tile::to_writer`] with [`Tile::to_async_writer`]
//!
//! ### Building a tile from scratch
//! ```rust
//! use mvt_codec::{geometry::GeometryOp, Feature, GeomType, Layer, Tile, Value, DEFAULT_EXTENT};
//!
//! let mut layer = Layer::new("water", DEFAULT_EXTENT);
//!
//! let mut lake = Feature::new(GeomType::Polygon);
//! lake.id = Some(1);
//! lake.geometry = vec![
//!     GeometryOp::move_to(5, 5),
//!     GeometryOp::line_to(10, 5),
//!     GeometryOp::line_to(10, 10),
//!     GeometryOp::close_path(),
//! ];
//! layer.tag(&mut lake, "name", "Lago");
//! layer.tag(&mut lake, "depth", Value::Double(12.5));
//! layer.features.push(lake);
//!
//! let mut tile = Tile::new();
//! tile.layers.push(layer);
//!
//! let bytes = tile.encode().unwrap();
//! ```
//!
//! ### Reading a tile from a file
//! ```rust
//! use std::fs::File;
//! use mvt_codec::Tile;
//!
//! fn main() -> mvt_codec::Result<()> {
//!     // create temp directory
//!     let dir = temp_dir::TempDir::new()?;
//!     let file_path = dir.path().join("0-0-0.mvt");
//!
//!     let mut file = File::create(&file_path)?; // file implements std::io::Write
//!     Tile::new().to_writer(&mut file)?;
//!
//!     let mut file = File::open(&file_path)?; // file implements std::io::Read
//!     let tile = Tile::from_reader(&mut file)?;
//!
//!     for layer in &tile.layers {
//!         for feature in &layer.features {
//!             for (key, value) in layer.properties(feature) {
//!                 println!("{key}: {value:?}");
//!             }
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod error;
mod feature;
mod layer;
mod tile;
mod value;

pub mod geometry;

/// Compression helpers for the zlib and gzip framing of tiles.
pub mod util;

pub mod wire;

pub use error::{EncodeError, Error, FormatError, Result};
pub use feature::{Feature, GeomType};
pub use layer::{Layer, DEFAULT_EXTENT, DEFAULT_VERSION};
pub use tile::Tile;
pub use value::Value;
