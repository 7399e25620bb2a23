//! Canonical, type-tagged encoding of serde values.
//!
//! Every value is written as a one-byte tag followed by a self-delimiting
//! payload, so the concatenation of encodings is prefix-free and two values
//! share an encoding only if they are the same logical value:
//!
//! - integers of any width encode by mathematical value (`3u8 == 3i64`);
//! - floats encode as binary64 bits, with `-0.0` folded into `0.0` and every
//!   NaN folded into one canonical NaN; integers and floats never collide;
//! - map entries are sorted by their encoded bytes, so hash-map iteration
//!   order never leaks into the key;
//! - structs, tuple structs and enum variants carry their names; newtype
//!   structs are transparent.
//!
//! Sequences are encoded in iteration order. A `HashSet` therefore has no
//! canonical encoding: pass a `BTreeSet` (or a sorted `Vec`) instead.

use serde::ser::{
    Serialize, SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant,
    SerializeTuple, SerializeTupleStruct, SerializeTupleVariant, Serializer,
};
use sha2::{Digest, Sha256};

use super::DigestError;

const TAG_UNIT: u8 = 0x00;
const TAG_NONE: u8 = 0x01;
const TAG_SOME: u8 = 0x02;
const TAG_BOOL: u8 = 0x03;
const TAG_INT: u8 = 0x10;
const TAG_BIG_UINT: u8 = 0x11;
const TAG_FLOAT: u8 = 0x20;
const TAG_STR: u8 = 0x30;
const TAG_BYTES: u8 = 0x31;
const TAG_SEQ: u8 = 0x40;
const TAG_TUPLE_STRUCT: u8 = 0x41;
const TAG_MAP: u8 = 0x50;
const TAG_STRUCT: u8 = 0x60;
const TAG_UNIT_STRUCT: u8 = 0x61;
const TAG_VARIANT: u8 = 0x70;
const TAG_END: u8 = 0xFF;

/// Destination of encoded bytes.
pub(crate) trait Sink {
    fn put(&mut self, bytes: &[u8]);
}

impl Sink for Sha256 {
    fn put(&mut self, bytes: &[u8]) {
        self.update(bytes);
    }
}

impl Sink for Vec<u8> {
    fn put(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// Sink that drops everything; used to validate a value without hashing it.
pub(crate) struct Discard;

impl Sink for Discard {
    fn put(&mut self, _bytes: &[u8]) {}
}

/// Streaming canonical encoder.
pub(crate) struct Encoder<W> {
    sink: W,
    depth: usize,
    limit: usize,
    reject_non_finite: bool,
}

impl<W: Sink> Encoder<W> {
    pub(crate) fn new(sink: W, limit: usize) -> Self {
        Self {
            sink,
            depth: 0,
            limit,
            reject_non_finite: false,
        }
    }

    /// Fails on NaN and infinities instead of canonicalizing them.
    pub(crate) fn reject_non_finite(mut self) -> Self {
        self.reject_non_finite = true;
        self
    }

    pub(crate) fn into_sink(self) -> W {
        self.sink
    }

    fn tag(&mut self, tag: u8) {
        self.sink.put(&[tag]);
    }

    fn len(&mut self, len: usize) {
        self.sink.put(&(len as u64).to_le_bytes());
    }

    fn text(&mut self, tag: u8, bytes: &[u8]) {
        self.tag(tag);
        self.len(bytes.len());
        self.sink.put(bytes);
    }

    fn int(&mut self, v: i128) {
        self.tag(TAG_INT);
        self.sink.put(&v.to_le_bytes());
    }

    fn float(&mut self, v: f64) -> Result<(), DigestError> {
        if self.reject_non_finite && !v.is_finite() {
            return Err(DigestError::NonFiniteFloat);
        }
        let v = if v == 0.0 {
            0.0
        } else if v.is_nan() {
            f64::NAN
        } else {
            v
        };
        self.tag(TAG_FLOAT);
        self.sink.put(&v.to_bits().to_le_bytes());
        Ok(())
    }

    fn variant_header(&mut self, name: &str, variant: &str) {
        self.tag(TAG_VARIANT);
        self.text(TAG_STR, name.as_bytes());
        self.text(TAG_STR, variant.as_bytes());
    }

    fn enter(&mut self) -> Result<(), DigestError> {
        self.depth += 1;
        if self.depth > self.limit {
            return Err(DigestError::DepthExceeded {
                depth: self.depth,
                limit: self.limit,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
        self.tag(TAG_END);
    }

    /// Encoder for a map entry, buffered so entries can be sorted.
    fn fork(&self) -> Encoder<Vec<u8>> {
        Encoder {
            sink: Vec::new(),
            depth: self.depth,
            limit: self.limit,
            reject_non_finite: self.reject_non_finite,
        }
    }
}

impl<'a, W: Sink> Serializer for &'a mut Encoder<W> {
    type Ok = ();
    type Error = DigestError;

    type SerializeSeq = Compound<'a, W>;
    type SerializeTuple = Compound<'a, W>;
    type SerializeTupleStruct = Compound<'a, W>;
    type SerializeTupleVariant = Compound<'a, W>;
    type SerializeMap = MapCompound<'a, W>;
    type SerializeStruct = Compound<'a, W>;
    type SerializeStructVariant = Compound<'a, W>;

    fn serialize_bool(self, v: bool) -> Result<(), DigestError> {
        self.tag(TAG_BOOL);
        self.sink.put(&[u8::from(v)]);
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<(), DigestError> {
        self.int(i128::from(v));
        Ok(())
    }

    fn serialize_i16(self, v: i16) -> Result<(), DigestError> {
        self.int(i128::from(v));
        Ok(())
    }

    fn serialize_i32(self, v: i32) -> Result<(), DigestError> {
        self.int(i128::from(v));
        Ok(())
    }

    fn serialize_i64(self, v: i64) -> Result<(), DigestError> {
        self.int(i128::from(v));
        Ok(())
    }

    fn serialize_i128(self, v: i128) -> Result<(), DigestError> {
        self.int(v);
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<(), DigestError> {
        self.int(i128::from(v));
        Ok(())
    }

    fn serialize_u16(self, v: u16) -> Result<(), DigestError> {
        self.int(i128::from(v));
        Ok(())
    }

    fn serialize_u32(self, v: u32) -> Result<(), DigestError> {
        self.int(i128::from(v));
        Ok(())
    }

    fn serialize_u64(self, v: u64) -> Result<(), DigestError> {
        self.int(i128::from(v));
        Ok(())
    }

    fn serialize_u128(self, v: u128) -> Result<(), DigestError> {
        match i128::try_from(v) {
            Ok(v) => self.int(v),
            Err(_) => {
                self.tag(TAG_BIG_UINT);
                self.sink.put(&v.to_le_bytes());
            }
        }
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<(), DigestError> {
        self.float(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<(), DigestError> {
        self.float(v)
    }

    fn serialize_char(self, v: char) -> Result<(), DigestError> {
        let mut buf = [0u8; 4];
        self.text(TAG_STR, v.encode_utf8(&mut buf).as_bytes());
        Ok(())
    }

    fn serialize_str(self, v: &str) -> Result<(), DigestError> {
        self.text(TAG_STR, v.as_bytes());
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<(), DigestError> {
        self.text(TAG_BYTES, v);
        Ok(())
    }

    fn serialize_none(self) -> Result<(), DigestError> {
        self.tag(TAG_NONE);
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), DigestError> {
        self.tag(TAG_SOME);
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), DigestError> {
        self.tag(TAG_UNIT);
        Ok(())
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<(), DigestError> {
        self.text(TAG_UNIT_STRUCT, name.as_bytes());
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<(), DigestError> {
        self.variant_header(name, variant);
        self.tag(TAG_UNIT);
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), DigestError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<(), DigestError> {
        self.variant_header(name, variant);
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Compound<'a, W>, DigestError> {
        self.enter()?;
        self.tag(TAG_SEQ);
        Ok(Compound { enc: self })
    }

    fn serialize_tuple(self, len: usize) -> Result<Compound<'a, W>, DigestError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Compound<'a, W>, DigestError> {
        self.enter()?;
        self.text(TAG_TUPLE_STRUCT, name.as_bytes());
        Ok(Compound { enc: self })
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a, W>, DigestError> {
        self.variant_header(name, variant);
        self.enter()?;
        self.tag(TAG_SEQ);
        Ok(Compound { enc: self })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapCompound<'a, W>, DigestError> {
        self.enter()?;
        Ok(MapCompound {
            enc: self,
            entries: Vec::new(),
            pending: None,
        })
    }

    fn serialize_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Compound<'a, W>, DigestError> {
        self.enter()?;
        self.text(TAG_STRUCT, name.as_bytes());
        Ok(Compound { enc: self })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a, W>, DigestError> {
        self.variant_header(name, variant);
        self.enter()?;
        self.text(TAG_STRUCT, b"");
        Ok(Compound { enc: self })
    }
}

/// Sequence-like and struct-like values, written in order.
pub(crate) struct Compound<'a, W> {
    enc: &'a mut Encoder<W>,
}

impl<W: Sink> Compound<'_, W> {
    fn element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), DigestError> {
        value.serialize(&mut *self.enc)
    }

    fn field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), DigestError> {
        self.enc.text(TAG_STR, key.as_bytes());
        value.serialize(&mut *self.enc)
    }
}

impl<W: Sink> SerializeSeq for Compound<'_, W> {
    type Ok = ();
    type Error = DigestError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), DigestError> {
        self.element(value)
    }

    fn end(self) -> Result<(), DigestError> {
        self.enc.leave();
        Ok(())
    }
}

impl<W: Sink> SerializeTuple for Compound<'_, W> {
    type Ok = ();
    type Error = DigestError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), DigestError> {
        self.element(value)
    }

    fn end(self) -> Result<(), DigestError> {
        self.enc.leave();
        Ok(())
    }
}

impl<W: Sink> SerializeTupleStruct for Compound<'_, W> {
    type Ok = ();
    type Error = DigestError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), DigestError> {
        self.element(value)
    }

    fn end(self) -> Result<(), DigestError> {
        self.enc.leave();
        Ok(())
    }
}

impl<W: Sink> SerializeTupleVariant for Compound<'_, W> {
    type Ok = ();
    type Error = DigestError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), DigestError> {
        self.element(value)
    }

    fn end(self) -> Result<(), DigestError> {
        self.enc.leave();
        Ok(())
    }
}

impl<W: Sink> SerializeStruct for Compound<'_, W> {
    type Ok = ();
    type Error = DigestError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), DigestError> {
        self.field(key, value)
    }

    fn end(self) -> Result<(), DigestError> {
        self.enc.leave();
        Ok(())
    }
}

impl<W: Sink> SerializeStructVariant for Compound<'_, W> {
    type Ok = ();
    type Error = DigestError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), DigestError> {
        self.field(key, value)
    }

    fn end(self) -> Result<(), DigestError> {
        self.enc.leave();
        Ok(())
    }
}

/// Map entries are buffered and written sorted on `end`.
pub(crate) struct MapCompound<'a, W> {
    enc: &'a mut Encoder<W>,
    entries: Vec<Vec<u8>>,
    pending: Option<Encoder<Vec<u8>>>,
}

impl<W: Sink> SerializeMap for MapCompound<'_, W> {
    type Ok = ();
    type Error = DigestError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), DigestError> {
        let mut entry = self.enc.fork();
        key.serialize(&mut entry)?;
        self.pending = Some(entry);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), DigestError> {
        let mut entry = self
            .pending
            .take()
            .ok_or_else(|| DigestError::Unsupported("map value without a key".to_string()))?;
        value.serialize(&mut entry)?;
        self.entries.push(entry.into_sink());
        Ok(())
    }

    fn end(mut self) -> Result<(), DigestError> {
        self.entries.sort_unstable();
        self.enc.tag(TAG_MAP);
        self.enc.len(self.entries.len());
        for entry in &self.entries {
            self.enc.sink.put(entry);
        }
        self.enc.leave();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::{BTreeMap, HashMap};

    fn encode<T: Serialize>(value: &T) -> Vec<u8> {
        let mut enc = Encoder::new(Vec::new(), 128);
        value.serialize(&mut enc).unwrap();
        enc.into_sink()
    }

    #[test]
    fn test_integer_widths_collapse() {
        assert_eq!(encode(&3u8), encode(&3i64));
        assert_eq!(encode(&3u128), encode(&3i16));
        assert_ne!(encode(&u128::MAX), encode(&-1i128));
    }

    #[test]
    fn test_integer_and_float_differ() {
        assert_ne!(encode(&3i32), encode(&3.0f64));
    }

    #[test]
    fn test_float_canonicalization() {
        assert_eq!(encode(&0.0f64), encode(&-0.0f64));
        assert_eq!(encode(&f64::NAN), encode(&-f64::NAN));
        assert_eq!(encode(&1.5f32), encode(&1.5f64));
    }

    #[test]
    fn test_strings_are_length_prefixed() {
        assert_ne!(encode(&("ab", "c")), encode(&("a", "bc")));
        assert_eq!(encode(&'x'), encode(&"x"));
        assert_ne!(encode(&"x"), encode(&serde_bytes_like(b"x")));
    }

    fn serde_bytes_like(bytes: &'static [u8]) -> impl Serialize {
        struct Bytes(&'static [u8]);
        impl Serialize for Bytes {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_bytes(self.0)
            }
        }
        Bytes(bytes)
    }

    #[test]
    fn test_nesting_is_unambiguous() {
        assert_ne!(encode(&vec![vec![1], vec![2]]), encode(&vec![vec![1, 2]]));
        assert_ne!(encode(&vec![Vec::<i32>::new()]), encode(&Vec::<Vec<i32>>::new()));
    }

    #[test]
    fn test_option_and_unit_are_distinct() {
        assert_ne!(encode(&None::<()>), encode(&()));
        assert_ne!(encode(&Some(())), encode(&()));
        assert_ne!(encode(&Some(1)), encode(&1));
    }

    #[test]
    fn test_map_order_does_not_matter() {
        let mut a = HashMap::new();
        let mut b = HashMap::new();
        for i in 0..64 {
            a.insert(format!("k{i}"), i);
        }
        for i in (0..64).rev() {
            b.insert(format!("k{i}"), i);
        }
        let sorted: BTreeMap<_, _> = a.clone().into_iter().collect();

        assert_eq!(encode(&a), encode(&b));
        assert_eq!(encode(&a), encode(&sorted));
    }

    #[test]
    fn test_struct_names_matter() {
        #[derive(Serialize)]
        struct Point {
            x: i32,
            y: i32,
        }
        #[derive(Serialize)]
        struct Size {
            x: i32,
            y: i32,
        }

        assert_ne!(encode(&Point { x: 1, y: 2 }), encode(&Size { x: 1, y: 2 }));
    }

    #[test]
    fn test_enum_variants_are_distinct() {
        #[derive(Serialize)]
        enum Shape {
            Dot,
            Circle(f64),
            Rect { w: f64, h: f64 },
            Line(f64, f64),
        }

        let encodings = [
            encode(&Shape::Dot),
            encode(&Shape::Circle(1.0)),
            encode(&Shape::Rect { w: 1.0, h: 1.0 }),
            encode(&Shape::Line(1.0, 1.0)),
        ];
        for (i, a) in encodings.iter().enumerate() {
            for b in &encodings[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_newtype_struct_is_transparent() {
        #[derive(Serialize)]
        struct Meters(u32);

        assert_eq!(encode(&Meters(7)), encode(&7u32));
    }

    #[test]
    fn test_depth_limit() {
        let nested = vec![vec![vec![1]]];
        let mut enc = Encoder::new(Discard, 2);
        let err = nested.serialize(&mut enc).unwrap_err();

        assert_eq!(err, DigestError::DepthExceeded { depth: 3, limit: 2 });
    }

    #[test]
    fn test_reject_non_finite() {
        let mut enc = Encoder::new(Discard, 8).reject_non_finite();
        assert_eq!(
            vec![1.0, f64::INFINITY].serialize(&mut enc),
            Err(DigestError::NonFiniteFloat)
        );
    }
}
