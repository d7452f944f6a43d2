use integer_encoding::VarInt;

use super::WireType;
use crate::FormatError;

/// Highest field number allowed by the protobuf encoding (29 bits).
const MAX_FIELD_NUMBER: u64 = (1 << 29) - 1;

/// The payload of a single field, already split off the message buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum FieldValue<'a> {
    Varint(u64),
    Fixed64(u64),
    Len(&'a [u8]),
    Fixed32(u32),
}

impl FieldValue<'_> {
    const fn wire_type(&self) -> WireType {
        match self {
            Self::Varint(_) => WireType::Varint,
            Self::Fixed64(_) => WireType::Fixed64,
            Self::Len(_) => WireType::Len,
            Self::Fixed32(_) => WireType::Fixed32,
        }
    }
}

/// A field read from a message: its number and its raw payload.
///
/// The accessors check that the payload has the wire type the caller expects
/// for this field number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Field<'a> {
    pub number: u32,
    pub value: FieldValue<'a>,
}

impl<'a> Field<'a> {
    const fn mismatch(&self, expected: WireType) -> FormatError {
        FormatError::WireTypeMismatch {
            field: self.number,
            expected,
            actual: self.value.wire_type(),
        }
    }

    pub const fn varint(&self) -> Result<u64, FormatError> {
        match self.value {
            FieldValue::Varint(value) => Ok(value),
            _ => Err(self.mismatch(WireType::Varint)),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub const fn uint32(&self) -> Result<u32, FormatError> {
        match self.varint() {
            Ok(value) => Ok(value as u32),
            Err(err) => Err(err),
        }
    }

    pub const fn bytes(&self) -> Result<&'a [u8], FormatError> {
        match self.value {
            FieldValue::Len(bytes) => Ok(bytes),
            _ => Err(self.mismatch(WireType::Len)),
        }
    }

    pub fn string(&self) -> Result<String, FormatError> {
        let bytes = self.bytes()?;

        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| FormatError::InvalidUtf8 { field: self.number })
    }

    pub fn float(&self) -> Result<f32, FormatError> {
        match self.value {
            FieldValue::Fixed32(bits) => Ok(f32::from_bits(bits)),
            _ => Err(self.mismatch(WireType::Fixed32)),
        }
    }

    pub fn double(&self) -> Result<f64, FormatError> {
        match self.value {
            FieldValue::Fixed64(bits) => Ok(f64::from_bits(bits)),
            _ => Err(self.mismatch(WireType::Fixed64)),
        }
    }

    /// Appends the elements of a repeated `uint32` field to `output`.
    ///
    /// Both the packed encoding and a single unpacked element are accepted.
    #[allow(clippy::cast_possible_truncation)]
    pub fn packed_uint32(&self, output: &mut Vec<u32>) -> Result<(), FormatError> {
        match self.value {
            FieldValue::Len(bytes) => {
                let mut reader = MessageReader::new(bytes);

                while !reader.is_empty() {
                    output.push(reader.read_varint()? as u32);
                }

                Ok(())
            }
            FieldValue::Varint(value) => {
                output.push(value as u32);
                Ok(())
            }
            _ => Err(self.mismatch(WireType::Len)),
        }
    }
}

/// Reads the fields of one protobuf message from a byte slice.
///
/// Nested messages are read by creating a new reader over the bytes of a
/// length delimited field.
#[derive(Debug, Clone)]
pub(crate) struct MessageReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> MessageReader<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub const fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    fn read_varint(&mut self) -> Result<u64, FormatError> {
        let (value, length) = u64::decode_var(&self.data[self.offset..]).ok_or(
            FormatError::InvalidVarint {
                offset: self.offset,
            },
        )?;

        self.offset += length;

        Ok(value)
    }

    fn take(&mut self, length: usize) -> Result<&'a [u8], FormatError> {
        let remaining = self.data.len() - self.offset;

        if length > remaining {
            return Err(FormatError::UnexpectedEof {
                offset: self.offset,
                needed: length,
                remaining,
            });
        }

        let bytes = &self.data[self.offset..self.offset + length];
        self.offset += length;

        Ok(bytes)
    }

    /// Reads the next field, returning [`None`] once the message is exhausted.
    pub fn next_field(&mut self) -> Result<Option<Field<'a>>, FormatError> {
        if self.is_empty() {
            return Ok(None);
        }

        let key = self.read_varint()?;

        let number = key >> 3;
        if number == 0 || number > MAX_FIELD_NUMBER {
            return Err(FormatError::InvalidFieldNumber(number));
        }
        #[allow(clippy::cast_possible_truncation)]
        let number = number as u32;

        #[allow(clippy::cast_possible_truncation)]
        let wire_bits = (key & 0x07) as u8;
        let wire_type =
            WireType::from_bits(wire_bits).ok_or(FormatError::UnsupportedWireType {
                field: number,
                wire_type: wire_bits,
            })?;

        let value = match wire_type {
            WireType::Varint => FieldValue::Varint(self.read_varint()?),
            WireType::Fixed64 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(self.take(8)?);
                FieldValue::Fixed64(u64::from_le_bytes(buf))
            }
            WireType::Len => {
                let length = self.read_varint()?;
                let length = usize::try_from(length).unwrap_or(usize::MAX);
                FieldValue::Len(self.take(length)?)
            }
            WireType::Fixed32 => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(self.take(4)?);
                FieldValue::Fixed32(u32::from_le_bytes(buf))
            }
        };

        Ok(Some(Field { number, value }))
    }
}

impl<'a> Iterator for MessageReader<'a> {
    type Item = Result<Field<'a>, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_field() {
            Ok(field) => field.map(Ok),
            Err(err) => {
                // nothing after a broken field can be located reliably
                self.offset = self.data.len();
                Some(Err(err))
            }
        }
    }
}
