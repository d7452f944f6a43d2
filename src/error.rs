use thiserror::Error;

use crate::wire::WireType;

/// Result type used throughout this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while decoding or encoding a vector tile.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The input looked compressed (zlib or gzip magic), but could not be inflated.
    #[error("failed to decompress tile data: {0}")]
    Decompression(#[source] std::io::Error),

    /// The encoded tile could not be deflated.
    #[error("failed to compress tile data: {0}")]
    Compression(#[source] std::io::Error),

    /// The protobuf structure of the tile is malformed.
    #[error("malformed vector tile: {0}")]
    Format(#[from] FormatError),

    /// The tile holds data that cannot be expressed in the wire format.
    #[error("failed to encode tile: {0}")]
    Encode(#[from] EncodeError),

    /// Reading from or writing to the underlying stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Structural problems found while walking the protobuf wire format.
///
/// Unknown field numbers are never reported, those fields are skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
    /// A field, nested message or packed array extends past the end of its enclosing buffer.
    #[error("unexpected end of data at offset {offset}: {needed} more bytes required, {remaining} available")]
    UnexpectedEof {
        /// Offset within the enclosing message.
        offset: usize,
        /// Number of bytes the element needs.
        needed: usize,
        /// Number of bytes left in the enclosing message.
        remaining: usize,
    },

    /// A varint was cut off or longer than ten bytes.
    #[error("invalid varint at offset {offset}")]
    InvalidVarint {
        /// Offset of the first byte of the varint.
        offset: usize,
    },

    /// A field key carried the reserved field number `0` or one that does not fit into 29 bits.
    #[error("invalid field number {0}")]
    InvalidFieldNumber(u64),

    /// A field used one of the deprecated group wire types or an undefined one.
    #[error("field {field} uses unsupported wire type {wire_type}")]
    UnsupportedWireType {
        /// Field number.
        field: u32,
        /// Raw wire type bits.
        wire_type: u8,
    },

    /// A known field was encoded with a wire type that does not match its declared type.
    #[error("field {field} has wire type {actual:?}, expected {expected:?}")]
    WireTypeMismatch {
        /// Field number.
        field: u32,
        /// Wire type required by the vector tile schema.
        expected: WireType,
        /// Wire type found in the data.
        actual: WireType,
    },

    /// A string field did not contain valid UTF-8.
    #[error("field {field} is not valid UTF-8")]
    InvalidUtf8 {
        /// Field number.
        field: u32,
    },
}

/// Tile contents the wire format has no representation for.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncodeError {
    /// Geometry deltas are stored as 32 bit integers. The operation lies too far
    /// away from the previous position of its feature.
    #[error("geometry operation {index} at ({x}, {y}) is out of range of the previous position")]
    DeltaOutOfRange {
        /// Position of the operation within the geometry.
        index: usize,
        /// Horizontal coordinate of the operation.
        x: i64,
        /// Vertical coordinate of the operation.
        y: i64,
    },
}
