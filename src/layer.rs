use std::collections::HashMap;

use ahash::RandomState;
use tracing::trace;

use crate::wire::{MessageReader, MessageWriter};
use crate::{EncodeError, Feature, FormatError, Value};

/// Size of the tile coordinate space used when a layer does not specify one.
pub const DEFAULT_EXTENT: u32 = 4096;

/// Version of the vector tile specification written into new layers.
pub const DEFAULT_VERSION: u32 = 2;

/// A named layer of a [`Tile`](crate::Tile).
///
/// Besides its features, a layer holds the key and value tables the feature
/// tags point into. Both tables only grow, through [`tag`](Self::tag), which
/// reuses the position of a key or value that was interned before.
///
/// # Example
/// ```rust
/// use mvt_codec::{Feature, GeomType, Layer, Value, geometry::GeometryOp};
///
/// let mut layer = Layer::new("places", 4096);
///
/// let mut feature = Feature::new(GeomType::Point);
/// feature.geometry.push(GeometryOp::move_to(25, 17));
/// layer.tag(&mut feature, "name", "Firenze");
/// layer.tag(&mut feature, "population", Value::UInt(366_927));
///
/// layer.features.push(feature);
///
/// assert_eq!(layer.keys(), &["name", "population"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "LayerParts"))]
pub struct Layer {
    /// Name of the layer, unique within a tile
    pub name: String,

    /// Version of the vector tile specification
    pub version: u32,

    /// Width and height of the tile coordinate space
    pub extent: u32,

    /// Features of this layer
    pub features: Vec<Feature>,

    keys: Vec<String>,

    values: Vec<Value>,

    /// key -> position in `keys`
    #[cfg_attr(feature = "serde", serde(skip))]
    key_index: HashMap<String, usize, RandomState>,

    /// value -> position in `values`
    #[cfg_attr(feature = "serde", serde(skip))]
    value_index: HashMap<Value, usize, RandomState>,
}

impl Layer {
    /// Constructs a new, empty layer of version [`DEFAULT_VERSION`].
    ///
    /// # Arguments
    /// * `name` - Name of the layer
    /// * `extent` - Width and height of the tile coordinate space (usually [`DEFAULT_EXTENT`])
    pub fn new(name: impl Into<String>, extent: u32) -> Self {
        Self {
            name: name.into(),
            version: DEFAULT_VERSION,
            extent,
            features: Vec::new(),
            keys: Vec::new(),
            values: Vec::new(),
            key_index: HashMap::default(),
            value_index: HashMap::default(),
        }
    }

    /// Returns the key table.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Returns the value table.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the position of `key` in the key table.
    pub fn key_position(&self, key: &str) -> Option<usize> {
        self.key_index.get(key).copied()
    }

    /// Returns the position of `value` in the value table.
    ///
    /// Values are matched by their [`dedup_key`](Value::dedup_key).
    pub fn value_position(&self, value: &Value) -> Option<usize> {
        self.value_index.get(value).copied()
    }

    /// Adds a key/value pair to the tags of `feature`.
    ///
    /// The key and the value are appended to the tables of this layer unless
    /// they are already present, in which case their existing positions are used.
    /// Adding the same pair twice adds two identical tags to the feature.
    ///
    /// The feature should be pushed to [`features`](Self::features) of this layer
    /// afterwards, as its tags are only meaningful with this layer's tables.
    pub fn tag(&mut self, feature: &mut Feature, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();

        let key_position = match self.key_index.get(&key) {
            Some(position) => *position,
            None => {
                let position = self.keys.len();
                self.keys.push(key.clone());
                self.key_index.insert(key, position);
                position
            }
        };

        let value_position = match self.value_index.get(&value) {
            Some(position) => *position,
            None => {
                let position = self.values.len();
                self.values.push(value.clone());
                self.value_index.insert(value, position);
                position
            }
        };

        #[allow(clippy::cast_possible_truncation)]
        feature.push_tag(key_position as u32, value_position as u32);
    }

    /// Returns an iterator over the key/value pairs of a feature of this layer.
    ///
    /// Tags pointing outside the key or value table are skipped.
    pub fn properties<'a>(
        &'a self,
        feature: &'a Feature,
    ) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        feature.tag_pairs().filter_map(|pair| {
            let key = self.keys.get(pair[0] as usize)?;
            let value = self.values.get(pair[1] as usize)?;
            Some((key.as_str(), value))
        })
    }

    /// Recreates the key and value index from the tables.
    ///
    /// If a key or value occurs more than once, the index points to its last occurrence.
    fn rebuild_index(&mut self) {
        self.key_index = self
            .keys
            .iter()
            .enumerate()
            .map(|(position, key)| (key.clone(), position))
            .collect();

        self.value_index = self
            .values
            .iter()
            .enumerate()
            .map(|(position, value)| (value.clone(), position))
            .collect();
    }

    pub(crate) fn decode(data: &[u8]) -> Result<Self, FormatError> {
        let mut layer = Self::new(String::new(), DEFAULT_EXTENT);

        for field in MessageReader::new(data) {
            let field = field?;

            match field.number {
                1 => layer.name = field.string()?,
                2 => layer.features.push(Feature::decode(field.bytes()?)?),
                3 => layer.keys.push(field.string()?),
                4 => layer.values.push(Value::decode(field.bytes()?)?),
                5 => layer.extent = field.uint32()?,
                15 => layer.version = field.uint32()?,
                number => trace!(field = number, "skipping unknown layer field"),
            }
        }

        layer.rebuild_index();

        trace!(
            name = %layer.name,
            features = layer.features.len(),
            keys = layer.keys.len(),
            values = layer.values.len(),
            "decoded layer"
        );

        Ok(layer)
    }

    pub(crate) fn write(&self, writer: &mut MessageWriter) -> Result<(), EncodeError> {
        writer.add_uint32(15, self.version);
        writer.add_string(1, &self.name);
        writer.add_uint32(5, self.extent);

        for key in &self.keys {
            writer.add_string(3, key);
        }

        for value in &self.values {
            let mut value_writer = MessageWriter::new();
            value.write(&mut value_writer);
            writer.add_message(4, &value_writer);
        }

        for feature in &self.features {
            let mut feature_writer = MessageWriter::new();
            feature.write(&mut feature_writer)?;
            writer.add_message(2, &feature_writer);
        }

        Ok(())
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new(String::new(), DEFAULT_EXTENT)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct LayerParts {
    name: String,
    version: u32,
    extent: u32,
    features: Vec<Feature>,
    keys: Vec<String>,
    values: Vec<Value>,
}

#[cfg(feature = "serde")]
impl From<LayerParts> for Layer {
    fn from(parts: LayerParts) -> Self {
        let mut layer = Self {
            name: parts.name,
            version: parts.version,
            extent: parts.extent,
            features: parts.features,
            keys: parts.keys,
            values: parts.values,
            key_index: HashMap::default(),
            value_index: HashMap::default(),
        };

        layer.rebuild_index();

        layer
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::GeometryOp;
    use crate::GeomType;

    #[test]
    fn test_new() {
        let layer = Layer::new("roads", 512);

        assert_eq!(layer.name, "roads");
        assert_eq!(layer.extent, 512);
        assert_eq!(layer.version, DEFAULT_VERSION);
        assert!(layer.keys().is_empty());
        assert!(layer.values().is_empty());
        assert!(layer.features.is_empty());
    }

    #[test]
    fn test_tag_interns_keys_and_values() {
        let mut layer = Layer::new("pois", DEFAULT_EXTENT);

        let mut first = Feature::new(GeomType::Point);
        layer.tag(&mut first, "kind", "cafe");
        layer.tag(&mut first, "rank", Value::UInt(3));

        let mut second = Feature::new(GeomType::Point);
        layer.tag(&mut second, "rank", Value::UInt(3));
        layer.tag(&mut second, "kind", "bar");

        assert_eq!(layer.keys(), &["kind", "rank"]);
        assert_eq!(
            layer.values(),
            &[Value::from("cafe"), Value::UInt(3), Value::from("bar")]
        );

        assert_eq!(first.tags(), &[0, 0, 1, 1]);
        assert_eq!(second.tags(), &[1, 1, 0, 2]);

        assert_eq!(layer.key_position("rank"), Some(1));
        assert_eq!(layer.key_position("name"), None);
        assert_eq!(layer.value_position(&Value::from("bar")), Some(2));
    }

    #[test]
    fn test_tag_does_not_dedup_pairs() {
        let mut layer = Layer::default();
        let mut feature = Feature::default();

        layer.tag(&mut feature, "a", true);
        layer.tag(&mut feature, "a", true);

        assert_eq!(feature.tags(), &[0, 0, 0, 0]);
        assert_eq!(layer.keys().len(), 1);
        assert_eq!(layer.values().len(), 1);
    }

    #[test]
    fn test_tag_dedups_by_projection() {
        let mut layer = Layer::default();
        let mut feature = Feature::default();

        layer.tag(&mut feature, "v", Value::Double(1.0));
        layer.tag(&mut feature, "v", Value::Float(1.0));
        layer.tag(&mut feature, "v", Value::Double(1.000_000_1));
        layer.tag(&mut feature, "v", Value::Int(1));
        layer.tag(&mut feature, "v", Value::UInt(1));
        layer.tag(&mut feature, "v", "1");

        assert_eq!(layer.values().len(), 5);
        assert_eq!(feature.tags(), &[0, 0, 0, 1, 0, 0, 0, 2, 0, 3, 0, 4]);
        assert_eq!(feature.tags().len() % 2, 0);
    }

    #[test]
    fn test_properties() {
        let mut layer = Layer::default();
        let mut feature = Feature::default();

        layer.tag(&mut feature, "name", "Elbe");
        layer.tag(&mut feature, "length", Value::UInt(1094));

        let properties = layer.properties(&feature).collect::<Vec<_>>();

        assert_eq!(
            properties,
            vec![
                ("name", &Value::from("Elbe")),
                ("length", &Value::UInt(1094))
            ]
        );
    }

    #[test]
    fn test_properties_skip_dangling_tags() {
        let layer = Layer::default();
        let mut feature = Feature::default();
        feature.push_tag(0, 0);

        assert_eq!(layer.properties(&feature).count(), 0);
    }

    #[test]
    fn test_decode() -> Result<(), FormatError> {
        let bytes: &[u8] = &[
            0x78, 0x02, // version 2
            0x0A, 0x01, b'a', // name
            0x28, 0x80, 0x20, // extent 4096
            0x1A, 0x01, b'k', // key
            0x22, 0x03, 0x0A, 0x01, b'v', // value
            0x12, 0x0B, 0x18, 0x01, 0x12, 0x02, 0x00, 0x00, 0x22, 0x03, 0x09, 0x32, 0x22, // feature
        ];

        let layer = Layer::decode(bytes)?;

        assert_eq!(layer.name, "a");
        assert_eq!(layer.version, 2);
        assert_eq!(layer.extent, 4096);
        assert_eq!(layer.keys(), &["k"]);
        assert_eq!(layer.values(), &[Value::from("v")]);
        assert_eq!(layer.features.len(), 1);
        assert_eq!(layer.features[0].geometry, vec![GeometryOp::move_to(25, 17)]);
        assert_eq!(layer.key_position("k"), Some(0));
        assert_eq!(layer.value_position(&Value::from("v")), Some(0));

        Ok(())
    }

    #[test]
    fn test_decode_defaults() -> Result<(), FormatError> {
        let layer = Layer::decode(&[0x0A, 0x01, b'a'])?;

        assert_eq!(layer.extent, DEFAULT_EXTENT);
        assert_eq!(layer.version, DEFAULT_VERSION);

        Ok(())
    }

    #[test]
    fn test_decode_skips_unknown_fields() -> Result<(), FormatError> {
        let bytes: &[u8] = &[
            0x98, 0x06, 0x01, // field 99, varint
            0x0A, 0x01, b'a', // name
            0x9A, 0x06, 0x02, 0xAA, 0xBB, // field 99, length delimited
        ];

        let layer = Layer::decode(bytes)?;

        assert_eq!(layer.name, "a");

        Ok(())
    }

    #[test]
    fn test_decode_duplicate_keys_index_last() -> Result<(), FormatError> {
        let bytes: &[u8] = &[
            0x1A, 0x01, b'k', //
            0x1A, 0x01, b'j', //
            0x1A, 0x01, b'k',
        ];

        let layer = Layer::decode(bytes)?;

        assert_eq!(layer.keys(), &["k", "j", "k"]);
        assert_eq!(layer.key_position("k"), Some(2));

        Ok(())
    }

    #[test]
    fn test_decode_then_tag_reuses_slots() -> Result<(), FormatError> {
        let mut layer = Layer::decode(&[0x1A, 0x01, b'k', 0x22, 0x02, 0x38, 0x01])?;
        let mut feature = Feature::default();

        layer.tag(&mut feature, "k", true);
        layer.tag(&mut feature, "j", false);

        assert_eq!(feature.tags(), &[0, 0, 1, 1]);
        assert_eq!(layer.keys(), &["k", "j"]);

        Ok(())
    }

    #[test]
    fn test_decode_invalid_name() {
        let res = Layer::decode(&[0x08, 0x01]);

        assert!(matches!(
            res,
            Err(FormatError::WireTypeMismatch { field: 1, .. })
        ));
    }

    #[test]
    fn test_write() -> Result<(), EncodeError> {
        let mut layer = Layer::new("a", 4096);
        let mut feature = Feature::new(GeomType::Point);
        layer.tag(&mut feature, "k", "v");
        feature.geometry.push(GeometryOp::move_to(25, 17));
        layer.features.push(feature);

        let mut writer = MessageWriter::new();
        layer.write(&mut writer)?;

        assert_eq!(
            writer.into_inner(),
            vec![
                0x78, 0x02, 0x0A, 0x01, b'a', 0x28, 0x80, 0x20, 0x1A, 0x01, b'k', 0x22, 0x03,
                0x0A, 0x01, b'v', 0x12, 0x0B, 0x18, 0x01, 0x12, 0x02, 0x00, 0x00, 0x22, 0x03,
                0x09, 0x32, 0x22,
            ]
        );

        Ok(())
    }
}
