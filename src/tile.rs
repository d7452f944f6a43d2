use duplicate::duplicate_item;
use std::io::{Read, Write};
use tracing::{debug, trace};

#[cfg(feature = "async")]
use futures::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::util::{compress_all, decompress_all, is_compressed};
use crate::wire::{MessageReader, MessageWriter};
use crate::{EncodeError, Error, Layer, Result};

/// A vector tile: an ordered list of [`Layer`]s.
///
/// Use [`decode`](Self::decode) and [`encode`](Self::encode) to convert a tile
/// from / to its binary representation, or [`from_reader`](Self::from_reader)
/// and [`to_writer`](Self::to_writer) (and their asynchronous versions
/// [`from_async_reader`](Self::from_async_reader) and
/// [`to_async_writer`](Self::to_async_writer)) to work with streams.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile {
    /// Layers of this tile, in the order they appear in the encoded tile
    pub layers: Vec<Layer>,
}

impl Tile {
    /// Constructs a new, empty tile.
    pub const fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Returns the first layer with the given name.
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    /// Decodes a tile from its binary representation.
    ///
    /// The data may be zlib or gzip compressed, this is detected from its first
    /// two bytes. Fields unknown to this implementation are skipped.
    ///
    /// # Errors
    /// Will return [`Err`] if...
    /// - the data looks compressed, but could not be decompressed ([`Error::Decompression`])
    /// - the protobuf structure of the tile is malformed ([`Error::Format`])
    ///
    /// # Example
    /// ```rust
    /// # use mvt_codec::Tile;
    /// let bytes: &[u8] = &[0x1A, 0x05, 0x0A, 0x03, b'f', b'o', b'o'];
    ///
    /// let tile = Tile::decode(bytes).unwrap();
    ///
    /// assert_eq!(tile.layers[0].name, "foo");
    /// ```
    pub fn decode(data: &[u8]) -> Result<Self> {
        let compressed = is_compressed(data);
        debug!(bytes = data.len(), compressed, "decoding vector tile");

        let tile = if compressed {
            let uncompressed = decompress_all(data).map_err(Error::Decompression)?;
            Self::decode_message(&uncompressed)?
        } else {
            Self::decode_message(data)?
        };

        debug!(layers = tile.layers.len(), "decoded vector tile");

        Ok(tile)
    }

    fn decode_message(data: &[u8]) -> Result<Self> {
        let mut tile = Self::new();

        for field in MessageReader::new(data) {
            let field = field?;

            match field.number {
                3 => tile.layers.push(Layer::decode(field.bytes()?)?),
                number => trace!(field = number, "skipping unknown tile field"),
            }
        }

        Ok(tile)
    }

    /// Encodes the tile into its binary representation.
    ///
    /// The result is always gzip compressed.
    ///
    /// # Errors
    /// Will return [`Err`] if...
    /// - a geometry cannot be expressed with 32 bit coordinate deltas ([`Error::Encode`])
    /// - compressing the encoded tile failed ([`Error::Compression`])
    ///
    /// # Example
    /// ```rust
    /// # use mvt_codec::{Layer, Tile};
    /// let mut tile = Tile::new();
    /// tile.layers.push(Layer::new("foo", 4096));
    ///
    /// let bytes = tile.encode().unwrap();
    ///
    /// assert_eq!(Tile::decode(&bytes).unwrap(), tile);
    /// ```
    pub fn encode(&self) -> Result<Vec<u8>> {
        let message = self.encode_message()?;

        let compressed = compress_all(&message).map_err(Error::Compression)?;

        debug!(
            layers = self.layers.len(),
            bytes = message.len(),
            compressed_bytes = compressed.len(),
            "encoded vector tile"
        );

        Ok(compressed)
    }

    fn encode_message(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = MessageWriter::new();

        for layer in &self.layers {
            let mut layer_writer = MessageWriter::new();
            layer.write(&mut layer_writer)?;
            writer.add_message(3, &layer_writer);
        }

        Ok(writer.into_inner())
    }
}

impl Tile {
    #[duplicate_item(
        fn_name                  cfg_async_filter       input_traits                       read_to_end(reader, buf)         async;
        [from_reader_impl]       [cfg(all())]           [impl Read]                        [reader.read_to_end(buf)]        [];
        [from_async_reader_impl] [cfg(feature="async")] [(impl AsyncRead + Unpin + Send)]  [reader.read_to_end(buf).await] [async];
    )]
    #[cfg_async_filter]
    async fn fn_name(input: &mut input_traits) -> Result<Self> {
        let mut data = Vec::<u8>::new();
        read_to_end([input], [&mut data])?;

        Self::decode(&data)
    }

    #[duplicate_item(
        fn_name                cfg_async_filter       input_traits                       add_await(code) async;
        [to_writer_impl]       [cfg(all())]           [impl Write]                       [code]          [];
        [to_async_writer_impl] [cfg(feature="async")] [(impl AsyncWrite + Unpin + Send)] [code.await]    [async];
    )]
    #[cfg_async_filter]
    async fn fn_name(&self, output: &mut input_traits) -> Result<()> {
        let data = self.encode()?;

        add_await([output.write_all(&data)])?;
        add_await([output.flush()])?;

        Ok(())
    }
}

impl Tile {
    /// Reads a tile from a [`std::io::Read`] until the end of the stream and decodes it.
    ///
    /// # Arguments
    /// * `input` - Reader with the (optionally compressed) tile
    ///
    /// # Errors
    /// Will return [`Err`] if an I/O error occurred while reading from `input`
    /// ([`Error::Io`]) or for any of the reasons listed at [`decode`](Self::decode).
    ///
    /// # Example
    /// ```rust
    /// # use mvt_codec::Tile;
    /// let mut reader = std::io::Cursor::new(vec![0x1A, 0x05, 0x0A, 0x03, b'f', b'o', b'o']);
    ///
    /// let tile = Tile::from_reader(&mut reader).unwrap();
    /// ```
    pub fn from_reader(input: &mut impl Read) -> Result<Self> {
        Self::from_reader_impl(input)
    }

    /// Async version of [`from_reader`](Self::from_reader).
    ///
    /// Reads a tile from a [`futures::io::AsyncRead`](https://docs.rs/futures/latest/futures/io/trait.AsyncRead.html)
    /// until the end of the stream and decodes it.
    ///
    /// # Arguments
    /// * `input` - Reader with the (optionally compressed) tile
    ///
    /// # Errors
    /// Will return [`Err`] if an I/O error occurred while reading from `input`
    /// ([`Error::Io`]) or for any of the reasons listed at [`decode`](Self::decode).
    #[cfg(feature = "async")]
    pub async fn from_async_reader(input: &mut (impl AsyncRead + Unpin + Send)) -> Result<Self> {
        Self::from_async_reader_impl(input).await
    }

    /// Encodes the tile and writes it to a [`std::io::Write`].
    ///
    /// # Arguments
    /// * `output` - Writer to write the gzip compressed tile to
    ///
    /// # Errors
    /// Will return [`Err`] if the tile could not be encoded or an I/O error
    /// occurred while writing to `output`.
    ///
    /// # Example
    /// ```rust
    /// # use mvt_codec::Tile;
    /// let tile = Tile::new();
    ///
    /// let mut output = std::io::Cursor::new(Vec::<u8>::new());
    ///
    /// tile.to_writer(&mut output).unwrap();
    /// ```
    pub fn to_writer(&self, output: &mut impl Write) -> Result<()> {
        self.to_writer_impl(output)
    }

    /// Async version of [`to_writer`](Self::to_writer).
    ///
    /// Encodes the tile and writes it to a [`futures::io::AsyncWrite`](https://docs.rs/futures/latest/futures/io/trait.AsyncWrite.html).
    ///
    /// # Arguments
    /// * `output` - Writer to write the gzip compressed tile to
    ///
    /// # Errors
    /// Will return [`Err`] if the tile could not be encoded or an I/O error
    /// occurred while writing to `output`.
    #[cfg(feature = "async")]
    pub async fn to_async_writer(&self, output: &mut (impl AsyncWrite + Unpin + Send)) -> Result<()> {
        self.to_async_writer_impl(output).await
    }
}
