use std::slice::ChunksExact;

use tracing::{trace, warn};

use crate::geometry::{decode_geometry, encode_geometry, GeometryOp};
use crate::wire::{MessageReader, MessageWriter};
use crate::{EncodeError, FormatError};

/// The type of geometry a feature carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GeomType {
    #[allow(missing_docs)]
    #[default]
    Unknown = 0,

    /// One or multiple points
    Point = 1,

    /// One or multiple line strings
    LineString = 2,

    /// One or multiple polygons
    Polygon = 3,
}

impl From<u64> for GeomType {
    fn from(value: u64) -> Self {
        match value {
            1 => Self::Point,
            2 => Self::LineString,
            3 => Self::Polygon,
            _ => Self::Unknown,
        }
    }
}

/// A single feature of a [`Layer`](crate::Layer).
///
/// The attributes of a feature are stored as `tags`: pairs of positions into the
/// key and value tables of the layer owning the feature. Tags are added with
/// [`Layer::tag`](crate::Layer::tag) and resolved with
/// [`Layer::properties`](crate::Layer::properties).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Feature {
    /// Optional identifier of the feature
    pub id: Option<u64>,

    /// Type of the geometry
    pub geom_type: GeomType,

    /// Drawing operations with absolute tile coordinates
    pub geometry: Vec<GeometryOp>,

    #[cfg_attr(feature = "serde", serde(deserialize_with = "deserialize_tags"))]
    tags: Vec<u32>,
}

impl Feature {
    /// Constructs a new feature without tags and geometry.
    pub const fn new(geom_type: GeomType) -> Self {
        Self {
            id: None,
            geom_type,
            geometry: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Returns the raw tags, alternating key and value positions.
    ///
    /// The length is always even.
    pub fn tags(&self) -> &[u32] {
        &self.tags
    }

    /// Returns an iterator over the `[key, value]` position pairs of the tags.
    pub fn tag_pairs(&self) -> ChunksExact<'_, u32> {
        self.tags.chunks_exact(2)
    }

    pub(crate) fn push_tag(&mut self, key: u32, value: u32) {
        self.tags.push(key);
        self.tags.push(value);
    }

    pub(crate) fn decode(data: &[u8]) -> Result<Self, FormatError> {
        let mut feature = Self::default();
        let mut words = Vec::<u32>::new();

        for field in MessageReader::new(data) {
            let field = field?;

            match field.number {
                1 => feature.id = Some(field.varint()?),
                2 => field.packed_uint32(&mut feature.tags)?,
                3 => feature.geom_type = GeomType::from(field.varint()?),
                4 => field.packed_uint32(&mut words)?,
                number => trace!(field = number, "skipping unknown feature field"),
            }
        }

        if feature.tags.len() % 2 != 0 {
            warn!(
                tags = feature.tags.len(),
                "dropping unpaired trailing tag of feature"
            );
            feature.tags.pop();
        }

        feature.geometry = decode_geometry(&words);

        Ok(feature)
    }

    pub(crate) fn write(&self, writer: &mut MessageWriter) -> Result<(), EncodeError> {
        if let Some(id) = self.id {
            writer.add_uint64(1, id);
        }

        writer.add_uint32(3, self.geom_type as u32);
        writer.add_packed_uint32(2, &self.tags);
        writer.add_packed_uint32(4, &encode_geometry(&self.geometry)?);

        Ok(())
    }
}

#[cfg(feature = "serde")]
fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::{de::Error, Deserialize};

    let tags = Vec::<u32>::deserialize(deserializer)?;

    if tags.len() % 2 != 0 {
        return Err(D::Error::custom("feature tags must have an even length"));
    }

    Ok(tags)
}
