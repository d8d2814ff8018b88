//! A borrowing MessagePack cursor.
//!
//! Reads exactly the shapes the codec asks for and structurally skips
//! everything else, so extra or undocumented fields never break decoding.

use rmp::Marker;
use serde_json::{Map, Number, Value};

use super::errors::{CodecError, Result};

/// Nesting limit when rendering a value as JSON.
const MAX_DEPTH: usize = 64;

pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn peek_marker(&self) -> Result<Marker> {
        self.buf
            .get(self.pos)
            .map(|&b| Marker::from_u8(b))
            .ok_or_else(|| CodecError::malformed("unexpected end of frame"))
    }

    fn marker(&mut self) -> Result<Marker> {
        let marker = self.peek_marker()?;
        self.pos += 1;
        Ok(marker)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(CodecError::malformed(format!(
                "value needs {n} bytes but only {} remain",
                self.remaining()
            )));
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn be_u8(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    fn be_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    fn be_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    fn be_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.take_array()?))
    }

    /// Consume a nil if one is next. Optional fields treat nil as absent.
    pub fn nil(&mut self) -> Result<bool> {
        if matches!(self.peek_marker()?, Marker::Null) {
            self.pos += 1;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn optional<T>(&mut self, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<Option<T>> {
        if self.nil()? {
            return Ok(None);
        }
        read(self).map(Some)
    }

    pub fn map_len(&mut self) -> Result<usize> {
        let len = match self.marker()? {
            Marker::FixMap(n) => usize::from(n),
            Marker::Map16 => usize::from(self.be_u16()?),
            Marker::Map32 => self.be_u32()? as usize,
            other => return Err(mismatch("map", other)),
        };
        Ok(len)
    }

    pub fn array_len(&mut self) -> Result<usize> {
        let len = match self.marker()? {
            Marker::FixArray(n) => usize::from(n),
            Marker::Array16 => usize::from(self.be_u16()?),
            Marker::Array32 => self.be_u32()? as usize,
            other => return Err(mismatch("array", other)),
        };
        Ok(len)
    }

    fn str_len(&mut self, marker: Marker) -> Result<Option<usize>> {
        let len = match marker {
            Marker::FixStr(n) => usize::from(n),
            Marker::Str8 => usize::from(self.be_u8()?),
            Marker::Str16 => usize::from(self.be_u16()?),
            Marker::Str32 => self.be_u32()? as usize,
            _ => return Ok(None),
        };
        Ok(Some(len))
    }

    pub fn is_str(&self) -> Result<bool> {
        Ok(matches!(
            self.peek_marker()?,
            Marker::FixStr(_) | Marker::Str8 | Marker::Str16 | Marker::Str32
        ))
    }

    pub fn str(&mut self) -> Result<&'a str> {
        let marker = self.marker()?;
        let len = self.str_len(marker)?.ok_or_else(|| mismatch("string", marker))?;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes).map_err(|_| CodecError::malformed("string is not valid UTF-8"))
    }

    pub fn string(&mut self) -> Result<String> {
        self.str().map(str::to_owned)
    }

    /// Any integer marker. Integral floats are accepted since some servers
    /// emit every number as a double.
    pub fn int(&mut self) -> Result<i64> {
        let marker = self.marker()?;
        let value = match marker {
            Marker::FixPos(n) => i64::from(n),
            Marker::FixNeg(n) => i64::from(n),
            Marker::U8 => i64::from(self.be_u8()?),
            Marker::U16 => i64::from(self.be_u16()?),
            Marker::U32 => i64::from(self.be_u32()?),
            Marker::U64 => i64::try_from(self.be_u64()?)
                .map_err(|_| CodecError::malformed("integer does not fit in i64"))?,
            Marker::I8 => i64::from(self.be_u8()? as i8),
            Marker::I16 => i64::from(self.be_u16()? as i16),
            Marker::I32 => i64::from(self.be_u32()? as i32),
            Marker::I64 => self.be_u64()? as i64,
            Marker::F32 => integral(f64::from(f32::from_bits(self.be_u32()?)))?,
            Marker::F64 => integral(f64::from_bits(self.be_u64()?))?,
            other => return Err(mismatch("integer", other)),
        };
        Ok(value)
    }

    pub fn uint(&mut self) -> Result<u64> {
        let value = self.int()?;
        u64::try_from(value).map_err(|_| CodecError::malformed(format!("expected unsigned integer, found {value}")))
    }

    pub fn index(&mut self) -> Result<usize> {
        let value = self.uint()?;
        usize::try_from(value).map_err(|_| CodecError::malformed(format!("index {value} out of range")))
    }

    /// Booleans, with integers read as `!= 0`.
    pub fn bool(&mut self) -> Result<bool> {
        match self.peek_marker()? {
            Marker::True => {
                self.pos += 1;
                Ok(true)
            }
            Marker::False => {
                self.pos += 1;
                Ok(false)
            }
            _ => self
                .int()
                .map(|v| v != 0)
                .map_err(|_| CodecError::malformed("expected boolean")),
        }
    }

    /// A string, or an integer rendered as a string. Used for identifiers.
    pub fn id(&mut self) -> Result<String> {
        if self.is_str()? {
            self.string()
        } else {
            self.int().map(|v| v.to_string())
        }
    }

    /// Skip one complete value of any shape.
    ///
    /// Walks nested containers with a pending-element counter instead of
    /// recursion. Every element needs at least one byte, so a container
    /// claiming more elements than there are bytes left is rejected up front.
    pub fn skip(&mut self) -> Result<()> {
        let mut pending: usize = 1;
        while pending > 0 {
            pending -= 1;
            let marker = self.marker()?;
            let children = match marker {
                Marker::Null | Marker::True | Marker::False | Marker::FixPos(_) | Marker::FixNeg(_) => 0,
                Marker::U8 | Marker::I8 => {
                    self.take(1)?;
                    0
                }
                Marker::U16 | Marker::I16 => {
                    self.take(2)?;
                    0
                }
                Marker::U32 | Marker::I32 | Marker::F32 => {
                    self.take(4)?;
                    0
                }
                Marker::U64 | Marker::I64 | Marker::F64 => {
                    self.take(8)?;
                    0
                }
                Marker::FixStr(n) => {
                    self.take(usize::from(n))?;
                    0
                }
                Marker::Str8 | Marker::Bin8 => {
                    let len = usize::from(self.be_u8()?);
                    self.take(len)?;
                    0
                }
                Marker::Str16 | Marker::Bin16 => {
                    let len = usize::from(self.be_u16()?);
                    self.take(len)?;
                    0
                }
                Marker::Str32 | Marker::Bin32 => {
                    let len = self.be_u32()? as usize;
                    self.take(len)?;
                    0
                }
                Marker::FixArray(n) => usize::from(n),
                Marker::Array16 => usize::from(self.be_u16()?),
                Marker::Array32 => self.be_u32()? as usize,
                Marker::FixMap(n) => usize::from(n) * 2,
                Marker::Map16 => usize::from(self.be_u16()?) * 2,
                Marker::Map32 => (self.be_u32()? as usize)
                    .checked_mul(2)
                    .ok_or_else(|| CodecError::malformed("map length overflow"))?,
                Marker::FixExt1 => {
                    self.take(2)?;
                    0
                }
                Marker::FixExt2 => {
                    self.take(3)?;
                    0
                }
                Marker::FixExt4 => {
                    self.take(5)?;
                    0
                }
                Marker::FixExt8 => {
                    self.take(9)?;
                    0
                }
                Marker::FixExt16 => {
                    self.take(17)?;
                    0
                }
                Marker::Ext8 => {
                    let len = usize::from(self.be_u8()?);
                    self.take(len + 1)?;
                    0
                }
                Marker::Ext16 => {
                    let len = usize::from(self.be_u16()?);
                    self.take(len + 1)?;
                    0
                }
                Marker::Ext32 => {
                    let len = self.be_u32()? as usize;
                    self.take(len.saturating_add(1))?;
                    0
                }
                Marker::Reserved => return Err(CodecError::malformed("reserved marker 0xc1")),
            };
            pending = pending
                .checked_add(children)
                .filter(|&p| p <= self.remaining())
                .ok_or_else(|| CodecError::malformed("container length exceeds frame size"))?;
        }
        Ok(())
    }

    /// Render one complete value as JSON. Binary blobs become hex strings,
    /// extension values become `{ext_type, data}` objects and non-string map
    /// keys are stringified.
    pub fn json(&mut self) -> Result<Value> {
        self.json_at(0)
    }

    fn json_at(&mut self, depth: usize) -> Result<Value> {
        if depth > MAX_DEPTH {
            return Err(CodecError::malformed("value nested too deeply"));
        }
        let marker = self.peek_marker()?;
        let value = match marker {
            Marker::Null => {
                self.pos += 1;
                Value::Null
            }
            Marker::True | Marker::False => Value::Bool(self.bool()?),
            Marker::FixPos(_) | Marker::U8 | Marker::U16 | Marker::U32 => Value::from(self.int()?),
            Marker::U64 => {
                self.pos += 1;
                Value::from(self.be_u64()?)
            }
            Marker::FixNeg(_) | Marker::I8 | Marker::I16 | Marker::I32 | Marker::I64 => {
                Value::from(self.int()?)
            }
            Marker::F32 => {
                self.pos += 1;
                float(f64::from(f32::from_bits(self.be_u32()?)))
            }
            Marker::F64 => {
                self.pos += 1;
                float(f64::from_bits(self.be_u64()?))
            }
            Marker::FixStr(_) | Marker::Str8 | Marker::Str16 | Marker::Str32 => {
                Value::String(self.string()?)
            }
            Marker::Bin8 | Marker::Bin16 | Marker::Bin32 => {
                self.pos += 1;
                let len = match marker {
                    Marker::Bin8 => usize::from(self.be_u8()?),
                    Marker::Bin16 => usize::from(self.be_u16()?),
                    _ => self.be_u32()? as usize,
                };
                Value::String(hex::encode(self.take(len)?))
            }
            Marker::FixArray(_) | Marker::Array16 | Marker::Array32 => {
                let len = self.array_len()?;
                let mut items = Vec::with_capacity(len.min(self.remaining()));
                for _ in 0..len {
                    items.push(self.json_at(depth + 1)?);
                }
                Value::Array(items)
            }
            Marker::FixMap(_) | Marker::Map16 | Marker::Map32 => {
                let len = self.map_len()?;
                let mut map = Map::new();
                for _ in 0..len {
                    let key = match self.json_at(depth + 1)? {
                        Value::String(key) => key,
                        other => other.to_string(),
                    };
                    map.insert(key, self.json_at(depth + 1)?);
                }
                Value::Object(map)
            }
            Marker::FixExt1
            | Marker::FixExt2
            | Marker::FixExt4
            | Marker::FixExt8
            | Marker::FixExt16
            | Marker::Ext8
            | Marker::Ext16
            | Marker::Ext32 => {
                self.pos += 1;
                let len = match marker {
                    Marker::FixExt1 => 1,
                    Marker::FixExt2 => 2,
                    Marker::FixExt4 => 4,
                    Marker::FixExt8 => 8,
                    Marker::FixExt16 => 16,
                    Marker::Ext8 => usize::from(self.be_u8()?),
                    Marker::Ext16 => usize::from(self.be_u16()?),
                    _ => self.be_u32()? as usize,
                };
                let ext_type = self.be_u8()? as i8;
                let data = hex::encode(self.take(len)?);
                serde_json::json!({ "ext_type": ext_type, "data": data })
            }
            Marker::Reserved => return Err(CodecError::malformed("reserved marker 0xc1")),
        };
        Ok(value)
    }
}

fn mismatch(expected: &str, found: Marker) -> CodecError {
    CodecError::malformed(format!("expected {expected}, found {found:?}"))
}

fn integral(value: f64) -> Result<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e18 {
        Ok(value as i64)
    } else {
        Err(CodecError::malformed(format!("expected integer, found {value}")))
    }
}

fn float(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &serde_json::Value) -> Vec<u8> {
        rmp_serde::to_vec_named(value).unwrap()
    }

    #[test]
    fn reads_scalar_widths() {
        for n in [0i64, 1, 127, 128, 255, 256, 65_535, 65_536, 4_294_967_296, -1, -32, -33, -129, -40_000] {
            let bytes = encode(&serde_json::json!(n));
            assert_eq!(Reader::new(&bytes).int().unwrap(), n, "width for {n}");
        }
    }

    #[test]
    fn reads_integral_floats() {
        let bytes = encode(&serde_json::json!(100.0));
        assert_eq!(Reader::new(&bytes).int().unwrap(), 100);

        let bytes = encode(&serde_json::json!(2.5));
        assert!(Reader::new(&bytes).int().is_err());
    }

    #[test]
    fn skip_walks_nested_values() {
        let value = serde_json::json!({
            "a": [1, 2, {"deep": [true, null, "x", -5, 3.25]}],
            "b": {"c": {"d": "e"}},
            "s": "y".repeat(300),
        });
        let mut bytes = encode(&value);
        bytes.push(0x07);
        let mut reader = Reader::new(&bytes);
        reader.skip().unwrap();
        assert_eq!(reader.int().unwrap(), 7);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn skip_handles_bin_and_ext() {
        // bin8 of 3 bytes, fixext4, ext8 of 2 bytes, then a fixint
        let bytes = [
            0xc4, 0x03, 1, 2, 3, 0xd6, 0x05, 1, 2, 3, 4, 0xc7, 0x02, 0x01, 9, 9, 0x2a,
        ];
        let mut reader = Reader::new(&bytes);
        reader.skip().unwrap();
        reader.skip().unwrap();
        reader.skip().unwrap();
        assert_eq!(reader.int().unwrap(), 42);
    }

    #[test]
    fn skip_rejects_truncated_values() {
        // str8 claiming 10 bytes with only 2 present
        let bytes = [0xd9, 0x0a, b'a', b'b'];
        assert!(matches!(
            Reader::new(&bytes).skip(),
            Err(CodecError::MalformedFrame(_))
        ));
    }

    #[test]
    fn skip_rejects_oversized_containers() {
        // array32 claiming four billion elements
        let bytes = [0xdd, 0xff, 0xff, 0xff, 0xff, 0x01];
        assert!(Reader::new(&bytes).skip().is_err());
    }

    #[test]
    fn skip_rejects_reserved_marker() {
        assert!(Reader::new(&[0xc1]).skip().is_err());
    }

    #[test]
    fn json_renders_bin_as_hex() {
        let bytes = [0x81, 0xa3, b'r', b'a', b'w', 0xc4, 0x02, 0xde, 0xad];
        let value = Reader::new(&bytes).json().unwrap();
        assert_eq!(value, serde_json::json!({"raw": "dead"}));
    }

    #[test]
    fn json_round_trips_documents() {
        let value = serde_json::json!({"type": "game_update", "players": [{"name": "a", "chips": 10}], "pot": null});
        let bytes = encode(&value);
        assert_eq!(Reader::new(&bytes).json().unwrap(), value);
    }

    #[test]
    fn bool_accepts_integers() {
        assert!(Reader::new(&[0x01]).bool().unwrap());
        assert!(!Reader::new(&[0xc2]).bool().unwrap());
        assert!(Reader::new(&[0xa1, b'x']).bool().is_err());
    }

    #[test]
    fn id_accepts_strings_and_integers() {
        let bytes = encode(&serde_json::json!("h-17"));
        assert_eq!(Reader::new(&bytes).id().unwrap(), "h-17");
        let bytes = encode(&serde_json::json!(17));
        assert_eq!(Reader::new(&bytes).id().unwrap(), "17");
    }
}
