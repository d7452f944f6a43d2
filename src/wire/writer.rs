use integer_encoding::VarInt;

use super::WireType;

/// Builds one protobuf message in memory.
///
/// Nested messages are built with their own writer and appended with
/// [`add_message`](Self::add_message), which prefixes them with their length.
#[derive(Debug, Default, Clone)]
pub(crate) struct MessageWriter {
    buf: Vec<u8>,
}

impl MessageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    fn push_varint(&mut self, value: u64) {
        let mut scratch = [0u8; 10];
        let length = value.encode_var(&mut scratch);
        self.buf.extend_from_slice(&scratch[..length]);
    }

    fn push_key(&mut self, field: u32, wire_type: WireType) {
        self.push_varint((u64::from(field) << 3) | wire_type as u64);
    }

    pub fn add_uint32(&mut self, field: u32, value: u32) {
        self.add_uint64(field, u64::from(value));
    }

    pub fn add_uint64(&mut self, field: u32, value: u64) {
        self.push_key(field, WireType::Varint);
        self.push_varint(value);
    }

    /// Writes a plain (not zigzag encoded) `int64`, negative values take ten bytes.
    #[allow(clippy::cast_sign_loss)]
    pub fn add_int64(&mut self, field: u32, value: i64) {
        self.add_uint64(field, value as u64);
    }

    pub fn add_bool(&mut self, field: u32, value: bool) {
        self.add_uint64(field, u64::from(value));
    }

    pub fn add_float(&mut self, field: u32, value: f32) {
        self.push_key(field, WireType::Fixed32);
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn add_double(&mut self, field: u32, value: f64) {
        self.push_key(field, WireType::Fixed64);
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn add_bytes(&mut self, field: u32, value: &[u8]) {
        self.push_key(field, WireType::Len);
        self.push_varint(value.len() as u64);
        self.buf.extend_from_slice(value);
    }

    pub fn add_string(&mut self, field: u32, value: &str) {
        self.add_bytes(field, value.as_bytes());
    }

    pub fn add_message(&mut self, field: u32, message: &Self) {
        self.add_bytes(field, &message.buf);
    }

    /// Writes a packed repeated `uint32` field. Nothing is written for an empty slice.
    pub fn add_packed_uint32(&mut self, field: u32, values: &[u32]) {
        if values.is_empty() {
            return;
        }

        let mut payload = Self::new();
        for value in values {
            payload.push_varint(u64::from(*value));
        }

        self.add_message(field, &payload);
    }
}
