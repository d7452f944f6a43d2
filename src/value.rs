use std::cmp::Ordering;
use std::fmt::{self, Write};
use std::hash::{Hash, Hasher};

use duplicate::duplicate_item;

use crate::wire::{zigzag_decode64, MessageReader, MessageWriter};
use crate::FormatError;

/// A single attribute value of a feature.
///
/// Values are stored once per [`Layer`](crate::Layer) and referenced from
/// features by their position in the layer's value table.
///
/// # Equality and ordering
///
/// Two values are compared through their [`dedup_key`](Self::dedup_key), a
/// textual rendering prefixed with a character for the variant. This has two
/// consequences worth knowing about:
/// - values of different variants are never equal, even if they hold the same
///   number (`Float(1.0) != Double(1.0)`)
/// - floating point values are rendered with six decimals, so values which only
///   differ beyond that are considered equal and share one slot in the value table
///
/// ```rust
/// # use mvt_codec::Value;
/// assert_ne!(Value::Float(1.0), Value::Double(1.0));
/// assert_eq!(Value::Double(0.1), Value::Double(0.100_000_01));
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Value {
    #[allow(missing_docs)]
    String(String),

    /// 32 bit floating point number
    Float(f32),

    /// 64 bit floating point number
    Double(f64),

    /// Signed 64 bit integer
    Int(i64),

    /// Unsigned 64 bit integer
    UInt(u64),

    #[allow(missing_docs)]
    Bool(bool),
}

impl Value {
    /// Returns the textual projection used to compare, hash and deduplicate values.
    ///
    /// | Variant | Projection |
    /// |---|---|
    /// | `String("abc")` | `sabc` |
    /// | `Float(1.5)` | `f1.500000` |
    /// | `Double(1.5)` | `d1.500000` |
    /// | `Int(-3)` | `i-3` |
    /// | `UInt(3)` | `u3` |
    /// | `Bool(true)` | `btrue` |
    ///
    /// Non finite floats render as `nan`, `-nan`, `inf` and `-inf`.
    ///
    /// Comparisons do not build this string, it is only provided for inspection.
    pub fn dedup_key(&self) -> String {
        let tag = char::from(self.tag());

        match self {
            Self::String(value) => format!("{tag}{value}"),
            Self::Float(value) => format!("{tag}{}", Fixed6::from(*value)),
            Self::Double(value) => format!("{tag}{}", Fixed6::from(*value)),
            Self::Int(value) => format!("{tag}{value}"),
            Self::UInt(value) => format!("{tag}{value}"),
            Self::Bool(value) => format!("{tag}{value}"),
        }
    }

    /// First character of the projection.
    const fn tag(&self) -> u8 {
        match self {
            Self::String(_) => b's',
            Self::Float(_) => b'f',
            Self::Double(_) => b'd',
            Self::Int(_) => b'i',
            Self::UInt(_) => b'u',
            Self::Bool(_) => b'b',
        }
    }

    /// Returns the string, if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns numeric values converted to `f64`.
    ///
    /// Large integers lose precision, non numeric values return [`None`].
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(f64::from(*value)),
            Self::Double(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            Self::UInt(value) => Some(*value as f64),
            Self::String(_) | Self::Bool(_) => None,
        }
    }

    /// Returns the boolean, if this is a [`Value::Bool`].
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Reads a value message.
    ///
    /// If several value fields are present, the last one wins. A message without
    /// any known value field yields an empty string, so that the positions of the
    /// following values in the layer stay intact.
    pub(crate) fn decode(data: &[u8]) -> Result<Self, FormatError> {
        let mut value = Self::default();

        for field in MessageReader::new(data) {
            let field = field?;

            value = match field.number {
                1 => Self::String(field.string()?),
                2 => Self::Float(field.float()?),
                3 => Self::Double(field.double()?),
                #[allow(clippy::cast_possible_wrap)]
                4 => Self::Int(field.varint()? as i64),
                5 => Self::UInt(field.varint()?),
                6 => Self::Int(zigzag_decode64(field.varint()?)),
                7 => Self::Bool(field.varint()? != 0),
                number => {
                    tracing::trace!(field = number, "skipping unknown value field");
                    continue;
                }
            };
        }

        Ok(value)
    }

    /// Writes the value message. `sint64` (field 6) is never emitted, signed
    /// integers always use the plain `int64` field.
    pub(crate) fn write(&self, writer: &mut MessageWriter) {
        match self {
            Self::String(value) => writer.add_string(1, value),
            Self::Float(value) => writer.add_float(2, *value),
            Self::Double(value) => writer.add_double(3, *value),
            Self::Int(value) => writer.add_int64(4, *value),
            Self::UInt(value) => writer.add_uint64(5, *value),
            Self::Bool(value) => writer.add_bool(7, *value),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => {
                Projection::of(Fixed6::from(*a)) == Projection::of(Fixed6::from(*b))
            }
            (Self::Double(a), Self::Double(b)) => {
                Projection::of(Fixed6::from(*a)) == Projection::of(Fixed6::from(*b))
            }
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    /// Orders like the projections of [`dedup_key`](Self::dedup_key), byte by byte.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Self::Float(a), Self::Float(b)) => {
                Projection::of(Fixed6::from(*a)).cmp(&Projection::of(Fixed6::from(*b)))
            }
            (Self::Double(a), Self::Double(b)) => {
                Projection::of(Fixed6::from(*a)).cmp(&Projection::of(Fixed6::from(*b)))
            }
            (Self::Int(a), Self::Int(b)) => Projection::of(a).cmp(&Projection::of(b)),
            (Self::UInt(a), Self::UInt(b)) => Projection::of(a).cmp(&Projection::of(b)),
            // "false" < "true"
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            _ => self.tag().cmp(&other.tag()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.tag());

        match self {
            Self::String(value) => value.hash(state),
            Self::Float(value) => Projection::of(Fixed6::from(*value)).hash(state),
            Self::Double(value) => Projection::of(Fixed6::from(*value)).hash(state),
            Self::Int(value) => value.hash(state),
            Self::UInt(value) => value.hash(state),
            Self::Bool(value) => value.hash(state),
        }
    }
}

/// A float rendered with six fixed decimals, like C's `%f`.
#[derive(Debug, Clone, Copy)]
struct Fixed6 {
    value: f64,
    negative: bool,
}

impl From<f32> for Fixed6 {
    fn from(value: f32) -> Self {
        Self {
            value: f64::from(value),
            negative: value.is_sign_negative(),
        }
    }
}

impl From<f64> for Fixed6 {
    fn from(value: f64) -> Self {
        Self {
            value,
            negative: value.is_sign_negative(),
        }
    }
}

impl fmt::Display for Fixed6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.negative { "-" } else { "" };

        if self.value.is_nan() {
            write!(f, "{sign}nan")
        } else if self.value.is_infinite() {
            write!(f, "{sign}inf")
        } else {
            write!(f, "{:.6}", self.value)
        }
    }
}

/// Longest projection payload: `-f64::MAX` with six decimals.
const PROJECTION_CAPACITY: usize = 320;

/// Stack buffer holding the text of a numeric projection.
#[derive(Clone, Copy)]
struct Projection {
    buf: [u8; PROJECTION_CAPACITY],
    len: usize,
}

impl Projection {
    fn of(value: impl fmt::Display) -> Self {
        let mut projection = Self {
            buf: [0; PROJECTION_CAPACITY],
            len: 0,
        };

        // only fails if the capacity is exceeded, which the rendered numbers never do
        let _ = write!(projection, "{value}");

        projection
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl fmt::Write for Projection {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        let target = self.buf.get_mut(self.len..end).ok_or(fmt::Error)?;

        target.copy_from_slice(s.as_bytes());
        self.len = end;

        Ok(())
    }
}

impl PartialEq for Projection {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Projection {}

impl PartialOrd for Projection {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Projection {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl Hash for Projection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::String(String::new())
    }
}

#[duplicate_item(
    source_type   variant;
    [String]      [String];
    [f32]         [Float];
    [f64]         [Double];
    [i64]         [Int];
    [u64]         [UInt];
    [bool]        [Bool];
)]
impl From<source_type> for Value {
    fn from(value: source_type) -> Self {
        Self::variant(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}
