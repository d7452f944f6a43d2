//! Conversion between the command stream of a feature's `geometry` field and
//! a flat list of drawing operations with absolute tile coordinates.
//!
//! Every command word packs a repeat count and a command id as
//! `(count << 3) | id`. `MoveTo` and `LineTo` are followed by `count` pairs of
//! zigzag encoded coordinate deltas, `ClosePath` carries no parameters.
//! Deltas are relative to the previous position within the same feature; the
//! cursor starts at `(0, 0)` and is not reset between sub paths.

use tracing::warn;

use crate::EncodeError;

/// Upper bound for the repeat count of a decoded `ClosePath` command.
///
/// Valid tiles always use a count of one; larger counts are honoured up to
/// this limit so that a single hostile command word cannot allocate gigabytes.
pub const MAX_CLOSE_PATH_REPEAT: u32 = 4096;

/// A drawing command of the geometry encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// Starts a new sub path at the given position
    MoveTo = 1,

    /// Draws a line from the current position to the given position
    LineTo = 2,

    /// Closes the current sub path
    ClosePath = 7,
}

impl Command {
    /// Returns the command for the lower three bits of a command word.
    pub const fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Self::MoveTo),
            2 => Some(Self::LineTo),
            7 => Some(Self::ClosePath),
            _ => None,
        }
    }

    /// Returns `true` if the command is followed by a coordinate pair.
    pub const fn has_position(self) -> bool {
        matches!(self, Self::MoveTo | Self::LineTo)
    }
}

/// A single drawing operation with absolute tile coordinates.
///
/// For [`Command::ClosePath`] the coordinates are always `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeometryOp {
    #[allow(missing_docs)]
    pub command: Command,

    /// Horizontal tile coordinate
    pub x: i64,

    /// Vertical tile coordinate
    pub y: i64,
}

impl GeometryOp {
    #[allow(missing_docs)]
    pub const fn move_to(x: i64, y: i64) -> Self {
        Self {
            command: Command::MoveTo,
            x,
            y,
        }
    }

    #[allow(missing_docs)]
    pub const fn line_to(x: i64, y: i64) -> Self {
        Self {
            command: Command::LineTo,
            x,
            y,
        }
    }

    #[allow(missing_docs)]
    pub const fn close_path() -> Self {
        Self {
            command: Command::ClosePath,
            x: 0,
            y: 0,
        }
    }
}

/// Packs a command and its repeat count into a command word.
pub const fn command_integer(command: Command, count: u32) -> u32 {
    (count << 3) | (command as u32 & 0x07)
}

/// Maps a signed coordinate delta onto an unsigned parameter word.
#[allow(clippy::cast_sign_loss)]
pub const fn zigzag_encode(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag_encode`].
#[allow(clippy::cast_possible_wrap)]
pub const fn zigzag_decode(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Decodes a command stream into drawing operations.
///
/// Malformed streams never fail: a command that announces more coordinate
/// pairs than are left only yields the complete pairs, and decoding stops at
/// the first unknown command id.
///
/// # Example
/// ```rust
/// # use mvt_codec::geometry::{decode_geometry, GeometryOp};
/// let ops = decode_geometry(&[9, 50, 34]);
///
/// assert_eq!(ops, vec![GeometryOp::move_to(25, 17)]);
/// ```
pub fn decode_geometry(words: &[u32]) -> Vec<GeometryOp> {
    let mut ops = Vec::<GeometryOp>::new();

    let mut px = 0i64;
    let mut py = 0i64;

    let mut index = 0usize;
    while index < words.len() {
        let word = words[index];
        index += 1;

        let count = word >> 3;
        let Some(command) = Command::from_id(word & 0x07) else {
            warn!(
                command_id = word & 0x07,
                position = index - 1,
                "unknown geometry command, ignoring rest of geometry"
            );
            break;
        };

        if command.has_position() {
            for repetition in 0..count {
                let (Some(&dx), Some(&dy)) = (words.get(index), words.get(index + 1)) else {
                    warn!(
                        ?command,
                        count,
                        decoded = repetition,
                        "geometry command truncated"
                    );
                    break;
                };
                index += 2;

                px += i64::from(zigzag_decode(dx));
                py += i64::from(zigzag_decode(dy));

                ops.push(GeometryOp {
                    command,
                    x: px,
                    y: py,
                });
            }
        } else {
            if count > MAX_CLOSE_PATH_REPEAT {
                warn!(count, "clamping repeat count of close path command");
            }

            for _ in 0..count.min(MAX_CLOSE_PATH_REPEAT) {
                ops.push(GeometryOp::close_path());
            }
        }
    }

    ops
}

/// Encodes drawing operations into a command stream.
///
/// Consecutive operations with the same command share one command word.
/// Coordinate deltas are computed against the previous `MoveTo`/`LineTo`
/// position.
///
/// # Errors
/// Will return [`Err`] if a delta does not fit into 32 bits
/// ([`EncodeError::DeltaOutOfRange`]).
///
/// # Example
/// ```rust
/// # use mvt_codec::geometry::{encode_geometry, GeometryOp};
/// let words = encode_geometry(&[GeometryOp::move_to(25, 17)]).unwrap();
///
/// assert_eq!(words, vec![9, 50, 34]);
/// ```
pub fn encode_geometry(ops: &[GeometryOp]) -> Result<Vec<u32>, EncodeError> {
    let mut words = Vec::<u32>::with_capacity(ops.len() * 2 + 1);

    let mut px = 0i64;
    let mut py = 0i64;

    // command of the open command word, its index in `words` and its repeat count
    let mut open: Option<(Command, usize, u32)> = None;

    for (index, op) in ops.iter().enumerate() {
        match open {
            Some((command, _, _)) if command == op.command => {}
            _ => {
                if let Some((command, word_index, count)) = open {
                    words[word_index] = command_integer(command, count);
                }

                open = Some((op.command, words.len(), 0));
                words.push(0);
            }
        }

        if op.command.has_position() {
            let (Some(dx), Some(dy)) = (delta(op.x, px), delta(op.y, py)) else {
                return Err(EncodeError::DeltaOutOfRange {
                    index,
                    x: op.x,
                    y: op.y,
                });
            };

            words.push(zigzag_encode(dx));
            words.push(zigzag_encode(dy));

            px = op.x;
            py = op.y;
        }

        if let Some((_, _, count)) = open.as_mut() {
            *count += 1;
        }
    }

    if let Some((command, word_index, count)) = open {
        words[word_index] = command_integer(command, count);
    }

    Ok(words)
}

fn delta(to: i64, from: i64) -> Option<i32> {
    i32::try_from(to.checked_sub(from)?).ok()
}
