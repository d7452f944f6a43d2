use flate2::{
    read::{GzDecoder, ZlibDecoder},
    write::GzEncoder,
};

use std::io::{Error, ErrorKind, Read, Result, Write};

const ZLIB_MAGIC: [u8; 2] = [0x78, 0x9C];
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Returns `true` if `data` starts with a zlib (`78 9C`) or gzip (`1F 8B`) header.
///
/// # Example
/// ```rust
/// # use mvt_codec::util::is_compressed;
/// assert!(is_compressed(&[0x1F, 0x8B, 0x08]));
/// assert!(!is_compressed(&[0x1A, 0x00]));
/// ```
pub fn is_compressed(data: &[u8]) -> bool {
    data.starts_with(&ZLIB_MAGIC) || data.starts_with(&GZIP_MAGIC)
}

/// Returns a new instance of [`std::io::Write`] that will emit gzip compressed data,
/// deflated with the highest compression level, to the underlying writer.
///
/// Call [`GzEncoder::finish`] (or drop the encoder) to write the gzip trailer.
///
/// # Arguments
/// * `writer` - Underlying writer to write compressed data to
pub fn compress<W: Write>(writer: W) -> GzEncoder<W> {
    GzEncoder::new(writer, flate2::Compression::best())
}

/// Compresses a byte slice with gzip framing and returns the result as a new [`Vec<u8>`].
///
/// # Arguments
/// * `data` - Data to compress
///
/// # Errors
/// Will return [`Err`] if the deflate stream fails.
///
/// # Example
/// ```rust
/// # use mvt_codec::util::{compress_all, is_compressed};
/// let compressed = compress_all(&[1, 3, 3, 7]).unwrap();
///
/// assert!(is_compressed(&compressed));
/// ```
#[allow(clippy::module_name_repetitions)]
pub fn compress_all(data: &[u8]) -> Result<Vec<u8>> {
    let mut writer = compress(Vec::<u8>::with_capacity(data.len() / 2 + 1024));

    writer.write_all(data)?;

    writer.finish()
}

/// Returns a new instance of [`std::io::Read`] that will emit the inflated data of
/// a zlib or gzip stream. The framing is detected from the first two bytes.
///
/// # Arguments
/// * `compressed_data` - Compressed data, starting with a zlib or gzip header
///
/// # Errors
/// Will return [`Err`] if `compressed_data` starts with neither a zlib nor a gzip header.
pub fn decompress<'a>(compressed_data: &'a [u8]) -> Result<Box<dyn Read + 'a>> {
    if compressed_data.starts_with(&GZIP_MAGIC) {
        Ok(Box::new(GzDecoder::new(compressed_data)))
    } else if compressed_data.starts_with(&ZLIB_MAGIC) {
        Ok(Box::new(ZlibDecoder::new(compressed_data)))
    } else {
        Err(Error::new(
            ErrorKind::InvalidData,
            "data is neither zlib nor gzip compressed",
        ))
    }
}

/// Decompresses a zlib or gzip compressed byte slice and returns the result as a new [`Vec<u8>`].
///
/// # Arguments
/// * `data` - Data to decompress
///
/// # Errors
/// Will return [`Err`] if...
/// - `data` starts with neither a zlib nor a gzip header
/// - `data` is not compressed correctly
///
pub fn decompress_all(data: &[u8]) -> Result<Vec<u8>> {
    let mut reader = decompress(data)?;

    let mut destination = Vec::<u8>::with_capacity(data.len() * 2);

    reader.read_to_end(&mut destination)?;

    Ok(destination)
}

#[cfg(test)]
mod test {
    use super::*;

    use flate2::write::ZlibEncoder;

    const DATA_UNCOMPRESSED: &[u8] = b"{\"layers\":[\"water\",\"roads\",\"water\",\"roads\",\"water\"]}";

    fn zlib(data: &[u8]) -> Result<Vec<u8>> {
        let mut writer = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        writer.write_all(data)?;
        writer.finish()
    }

    #[test]
    fn test_is_compressed() {
        assert!(is_compressed(&[0x78, 0x9C]));
        assert!(is_compressed(&[0x1F, 0x8B, 0x08, 0x00]));

        assert!(!is_compressed(&[]));
        assert!(!is_compressed(&[0x1F]));
        assert!(!is_compressed(&[0x78, 0x01]));
        assert!(!is_compressed(&[0x1A, 0x1D, 0x78, 0x9C]));
    }

    #[test]
    fn test_compress_all_gzip_framing() -> Result<()> {
        let data = compress_all(DATA_UNCOMPRESSED)?;

        assert_eq!(&data[0..2], &GZIP_MAGIC);
        assert!(is_compressed(&data));

        Ok(())
    }

    #[test]
    fn test_compress_all_empty() -> Result<()> {
        let data = compress_all(&[])?;

        assert!(is_compressed(&data));
        assert!(decompress_all(&data)?.is_empty());

        Ok(())
    }

    #[test]
    fn test_decompress_all_gzip() -> Result<()> {
        let data = decompress_all(&compress_all(DATA_UNCOMPRESSED)?)?;
        assert_eq!(data, DATA_UNCOMPRESSED);
        Ok(())
    }

    #[test]
    fn test_decompress_all_zlib() -> Result<()> {
        let compressed = zlib(DATA_UNCOMPRESSED)?;
        assert_eq!(&compressed[0..2], &ZLIB_MAGIC);

        let data = decompress_all(&compressed)?;
        assert_eq!(data, DATA_UNCOMPRESSED);
        Ok(())
    }

    #[test]
    fn test_decompress_all_uncompressed() {
        let res = decompress_all(DATA_UNCOMPRESSED);
        assert!(res.is_err());
    }

    #[test]
    fn test_decompress_all_corrupted() {
        let res = decompress_all(&[0x1F, 0x8B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03]);
        assert!(res.is_err());

        let res = decompress_all(&[0x78, 0x9C, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(res.is_err());
    }

    #[test]
    fn test_compress_streaming() -> Result<()> {
        let mut writer = compress(Vec::new());
        writer.write_all(&DATA_UNCOMPRESSED[..10])?;
        writer.write_all(&DATA_UNCOMPRESSED[10..])?;
        let compressed = writer.finish()?;

        assert_eq!(decompress_all(&compressed)?, DATA_UNCOMPRESSED);

        Ok(())
    }
}
