//! Protocol Buffers wire primitives used by the tile codec.
//!
//! Only the subset needed for vector tiles is implemented: varints, 32 and 64
//! bit fixed width values, length delimited fields and packed `uint32` arrays.

mod reader;
mod writer;

pub(crate) use reader::*;
pub(crate) use writer::*;

/// The wire type of a protobuf field, stored in the lower three bits of a field key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    /// Base 128 varint (`int32`, `int64`, `uint32`, `uint64`, `sint64`, `bool`, `enum`)
    Varint = 0,

    /// Little endian 64 bit value (`fixed64`, `sfixed64`, `double`)
    Fixed64 = 1,

    /// Length delimited bytes (`string`, `bytes`, embedded messages, packed repeated fields)
    Len = 2,

    /// Little endian 32 bit value (`fixed32`, `sfixed32`, `float`)
    Fixed32 = 5,
}

impl WireType {
    /// Returns the wire type for the lower three bits of a field key,
    /// or [`None`] for the group and reserved wire types.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Varint),
            1 => Some(Self::Fixed64),
            2 => Some(Self::Len),
            5 => Some(Self::Fixed32),
            _ => None,
        }
    }
}

/// Reverses the zigzag mapping of `sint64` fields, which stores small negative
/// and positive values alike in short varints.
#[allow(clippy::cast_possible_wrap)]
pub(crate) const fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wire_type_from_bits() {
        assert_eq!(WireType::from_bits(0), Some(WireType::Varint));
        assert_eq!(WireType::from_bits(1), Some(WireType::Fixed64));
        assert_eq!(WireType::from_bits(2), Some(WireType::Len));
        assert_eq!(WireType::from_bits(3), None);
        assert_eq!(WireType::from_bits(4), None);
        assert_eq!(WireType::from_bits(5), Some(WireType::Fixed32));
        assert_eq!(WireType::from_bits(7), None);
    }

    #[test]
    fn test_zigzag_decode64() {
        assert_eq!(zigzag_decode64(0), 0);
        assert_eq!(zigzag_decode64(1), -1);
        assert_eq!(zigzag_decode64(2), 1);
        assert_eq!(zigzag_decode64(3), -2);
        assert_eq!(zigzag_decode64(u64::MAX), i64::MIN);
        assert_eq!(zigzag_decode64(u64::MAX - 1), i64::MAX);
    }
}
