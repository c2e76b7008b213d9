// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Thrift compact-protocol encoding and decoding, plus the serialize /
//! deserialize surface used for metadata objects that may be encrypted
//! in line.
//!
//! Only the subset of the [compact protocol] exercised by the Parquet IDL is
//! implemented: structs, unions, lists, binary/string, bools, zig-zag varints
//! and doubles. Maps and sets do not occur in Parquet metadata.
//!
//! [compact protocol]: https://github.com/apache/thrift/blob/master/doc/specs/thrift-compact-protocol.md

use std::io::Write;

use crate::encryption::{Decryptor, Encryptor};
use crate::errors::{ParquetError, Result};

/// Thrift compact protocol types for struct fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum FieldType {
    Stop = 0,
    BooleanTrue = 1,
    BooleanFalse = 2,
    Byte = 3,
    I16 = 4,
    I32 = 5,
    I64 = 6,
    Double = 7,
    Binary = 8,
    List = 9,
    Set = 10,
    Map = 11,
    Struct = 12,
}

impl TryFrom<u8> for FieldType {
    type Error = ParquetError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Stop),
            1 => Ok(Self::BooleanTrue),
            2 => Ok(Self::BooleanFalse),
            3 => Ok(Self::Byte),
            4 => Ok(Self::I16),
            5 => Ok(Self::I32),
            6 => Ok(Self::I64),
            7 => Ok(Self::Double),
            8 => Ok(Self::Binary),
            9 => Ok(Self::List),
            10 => Ok(Self::Set),
            11 => Ok(Self::Map),
            12 => Ok(Self::Struct),
            _ => Err(ParquetError::DeserializeFailed(format!(
                "unexpected field type {value}"
            ))),
        }
    }
}

// Compact type codes used for list elements when writing.
pub(crate) const ELEM_BOOL: u8 = 2;
pub(crate) const ELEM_I32: u8 = 5;
pub(crate) const ELEM_I64: u8 = 6;
pub(crate) const ELEM_BINARY: u8 = 8;
pub(crate) const ELEM_STRUCT: u8 = 12;

/// Identifies a decoded struct field: its compact type, its id, and the
/// payload for booleans (which encode their value in the type nibble).
pub(crate) struct FieldIdentifier {
    pub(crate) field_type: FieldType,
    pub(crate) id: i16,
    pub(crate) bool_val: Option<bool>,
}

/// Header of a thrift list: element type code and length.
pub(crate) struct ListIdentifier {
    pub(crate) element_type: u8,
    pub(crate) size: i32,
}

/// Decoder for the thrift compact protocol, reading from a byte slice.
pub(crate) struct ThriftSliceInputProtocol<'a> {
    buf: &'a [u8],
}

impl<'a> ThriftSliceInputProtocol<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Remaining unread bytes.
    pub(crate) fn as_slice(&self) -> &'a [u8] {
        self.buf
    }

    #[inline]
    pub(crate) fn read_byte(&mut self) -> Result<u8> {
        let ret = *self
            .buf
            .first()
            .ok_or_else(|| eof_err!("unexpected end of thrift input"))?;
        self.buf = &self.buf[1..];
        Ok(ret)
    }

    pub(crate) fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_vlq()? as usize;
        let ret = self
            .buf
            .get(..len)
            .ok_or_else(|| eof_err!("unexpected end of thrift input"))?;
        self.buf = &self.buf[len..];
        Ok(ret)
    }

    fn skip_bytes(&mut self, n: usize) -> Result<()> {
        if self.buf.len() < n {
            return Err(eof_err!("unexpected end of thrift input"));
        }
        self.buf = &self.buf[n..];
        Ok(())
    }

    /// Read a ULEB128 encoded unsigned varint.
    pub(crate) fn read_vlq(&mut self) -> Result<u64> {
        let mut in_progress = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_byte()?;
            in_progress |= ((byte & 0x7f) as u64).wrapping_shl(shift);
            if byte & 0x80 == 0 {
                return Ok(in_progress);
            }
            shift += 7;
        }
    }

    /// Read a zig-zag encoded signed varint.
    pub(crate) fn read_zig_zag(&mut self) -> Result<i64> {
        let val = self.read_vlq()?;
        Ok((val >> 1) as i64 ^ -((val & 1) as i64))
    }

    pub(crate) fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_zig_zag()? as _)
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_zig_zag()? as _)
    }

    pub(crate) fn read_i64(&mut self) -> Result<i64> {
        self.read_zig_zag()
    }

    pub(crate) fn read_double(&mut self) -> Result<f64> {
        let slice = self
            .buf
            .get(..8)
            .ok_or_else(|| eof_err!("unexpected end of thrift input"))?;
        self.buf = &self.buf[8..];
        Ok(f64::from_le_bytes(slice.try_into().unwrap()))
    }

    /// Read a boolean list element. Struct fields carry the value in the
    /// [`FieldIdentifier`] instead.
    pub(crate) fn read_bool(&mut self) -> Result<bool> {
        match self.read_byte()? {
            0x01 => Ok(true),
            0x00 | 0x02 => Ok(false),
            b => Err(ParquetError::DeserializeFailed(format!(
                "cannot convert {b} into bool"
            ))),
        }
    }

    pub(crate) fn read_string(&mut self) -> Result<String> {
        Ok(std::str::from_utf8(self.read_bytes()?)
            .map_err(|_| ParquetError::DeserializeFailed("invalid utf8".to_owned()))?
            .to_owned())
    }

    /// Read the header of a thrift encoded list.
    pub(crate) fn read_list_begin(&mut self) -> Result<ListIdentifier> {
        let header = self.read_byte()?;
        // some writers emit element type 0 for an empty list
        if header == 0 {
            return Ok(ListIdentifier {
                element_type: 0,
                size: 0,
            });
        }
        let element_type = header & 0x0f;
        let short_size = (header & 0xf0) >> 4;
        let size = if short_size != 15 {
            short_size as i32
        } else {
            self.read_vlq()? as i32
        };
        Ok(ListIdentifier { element_type, size })
    }

    /// Read a struct field header, resolving the field-id delta against
    /// `last_field_id`.
    pub(crate) fn read_field_begin(&mut self, last_field_id: i16) -> Result<FieldIdentifier> {
        let byte = self.read_byte()?;
        let field_delta = (byte & 0xf0) >> 4;
        let field_type = FieldType::try_from(byte & 0x0f)?;
        if field_type == FieldType::Stop {
            return Ok(FieldIdentifier {
                field_type,
                id: 0,
                bool_val: None,
            });
        }
        let bool_val = match field_type {
            FieldType::BooleanTrue => Some(true),
            FieldType::BooleanFalse => Some(false),
            _ => None,
        };
        let id = if field_delta != 0 {
            last_field_id
                .checked_add(field_delta as i16)
                .ok_or_else(|| {
                    ParquetError::DeserializeFailed(format!(
                        "field id delta {field_delta} overflows {last_field_id}"
                    ))
                })?
        } else {
            self.read_i16()?
        };
        Ok(FieldIdentifier {
            field_type,
            id,
            bool_val,
        })
    }

    /// Empty structs in unions are a single stop byte. Consumes it, erroring
    /// when the struct unexpectedly has fields.
    pub(crate) fn skip_empty_struct(&mut self) -> Result<()> {
        if self.read_byte()? != 0 {
            return Err(ParquetError::DeserializeFailed(
                "empty union struct has fields".to_owned(),
            ));
        }
        Ok(())
    }

    /// Skip a field of the given type, recursing at most `MAX_SKIP_DEPTH`
    /// levels through nested structs and lists.
    pub(crate) fn skip(&mut self, field_type: FieldType) -> Result<()> {
        const MAX_SKIP_DEPTH: i8 = 64;
        self.skip_till_depth(field_type, MAX_SKIP_DEPTH)
    }

    fn skip_till_depth(&mut self, field_type: FieldType, depth: i8) -> Result<()> {
        if depth == 0 {
            return Err(ParquetError::DeserializeFailed(format!(
                "cannot parse past {field_type:?}"
            )));
        }
        match field_type {
            FieldType::BooleanTrue | FieldType::BooleanFalse => Ok(()),
            FieldType::Byte => self.read_byte().map(|_| ()),
            FieldType::I16 | FieldType::I32 | FieldType::I64 => self.read_vlq().map(|_| ()),
            FieldType::Double => self.skip_bytes(8),
            FieldType::Binary => {
                let len = self.read_vlq()? as usize;
                self.skip_bytes(len)
            }
            FieldType::Struct => {
                let mut last_field_id = 0i16;
                loop {
                    let field_ident = self.read_field_begin(last_field_id)?;
                    if field_ident.field_type == FieldType::Stop {
                        return Ok(());
                    }
                    self.skip_till_depth(field_ident.field_type, depth - 1)?;
                    last_field_id = field_ident.id;
                }
            }
            FieldType::List => {
                let list_ident = self.read_list_begin()?;
                let element_type = match list_ident.element_type {
                    1 | 2 => FieldType::BooleanTrue,
                    other => FieldType::try_from(other)?,
                };
                for _ in 0..list_ident.size {
                    self.skip_till_depth(element_type, depth - 1)?;
                }
                Ok(())
            }
            other => Err(ParquetError::DeserializeFailed(format!(
                "cannot skip field type {other:?}"
            ))),
        }
    }
}

/// Trait implemented by objects decodable from a thrift input stream.
pub(crate) trait ReadThrift: Sized {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self>;
}

impl ReadThrift for bool {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        prot.read_bool()
    }
}

impl ReadThrift for i16 {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        prot.read_i16()
    }
}

impl ReadThrift for i32 {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        prot.read_i32()
    }
}

impl ReadThrift for i64 {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        prot.read_i64()
    }
}

impl ReadThrift for String {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        prot.read_string()
    }
}

impl ReadThrift for Vec<u8> {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        Ok(prot.read_bytes()?.to_vec())
    }
}

/// Read a thrift encoded list of `T`.
pub(crate) fn read_thrift_vec<T: ReadThrift>(
    prot: &mut ThriftSliceInputProtocol<'_>,
) -> Result<Vec<T>> {
    let list_ident = prot.read_list_begin()?;
    let mut res = Vec::with_capacity(list_ident.size.max(0) as usize);
    for _ in 0..list_ident.size {
        res.push(T::read_thrift(prot)?);
    }
    Ok(res)
}

// ----------------------------------------------------------------------
// compact output

/// Encoder for the thrift compact protocol, wrapping a [`Write`].
pub(crate) struct ThriftCompactOutputProtocol<W: Write> {
    writer: W,
}

impl<W: Write> ThriftCompactOutputProtocol<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_byte(&mut self, b: u8) -> Result<()> {
        self.writer.write_all(&[b])?;
        Ok(())
    }

    fn write_vlq(&mut self, val: u64) -> Result<()> {
        let mut v = val;
        while v > 0x7f {
            self.write_byte(v as u8 | 0x80)?;
            v >>= 7;
        }
        self.write_byte(v as u8)
    }

    fn write_zig_zag(&mut self, val: i64) -> Result<()> {
        let s = (val < 0) as i64;
        self.write_vlq((((val ^ -s) << 1) + s) as u64)
    }

    /// Mark the start of a struct field, encoding the id as a delta against
    /// `last_field_id` when it fits a nibble.
    pub(crate) fn write_field_begin(
        &mut self,
        field_type: FieldType,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<()> {
        let delta = field_id.wrapping_sub(last_field_id);
        if delta > 0 && delta <= 0xf {
            self.write_byte((delta as u8) << 4 | field_type as u8)
        } else {
            self.write_byte(field_type as u8)?;
            self.write_i16(field_id)
        }
    }

    pub(crate) fn write_list_begin(&mut self, element_type: u8, len: usize) -> Result<()> {
        if len < 15 {
            self.write_byte((len as u8) << 4 | element_type)
        } else {
            self.write_byte(0xf0 | element_type)?;
            self.write_vlq(len as u64)
        }
    }

    /// Must be called once all fields of a struct have been written.
    pub(crate) fn write_struct_end(&mut self) -> Result<()> {
        self.write_byte(0)
    }

    /// Encode a field holding an empty struct (thrift unions with unit
    /// variants). Returns `field_id` for use as the next `last_field_id`.
    pub(crate) fn write_empty_struct(&mut self, field_id: i16, last_field_id: i16) -> Result<i16> {
        self.write_field_begin(FieldType::Struct, field_id, last_field_id)?;
        self.write_struct_end()?;
        Ok(field_id)
    }

    pub(crate) fn write_bytes(&mut self, val: &[u8]) -> Result<()> {
        self.write_vlq(val.len() as u64)?;
        self.writer.write_all(val)?;
        Ok(())
    }

    pub(crate) fn write_i16(&mut self, val: i16) -> Result<()> {
        self.write_zig_zag(val as _)
    }

    pub(crate) fn write_i32(&mut self, val: i32) -> Result<()> {
        self.write_zig_zag(val as _)
    }

    pub(crate) fn write_i64(&mut self, val: i64) -> Result<()> {
        self.write_zig_zag(val)
    }

    pub(crate) fn write_double(&mut self, val: f64) -> Result<()> {
        self.writer.write_all(&val.to_le_bytes())?;
        Ok(())
    }
}

/// Trait implemented by objects serializable to the compact protocol.
pub(crate) trait WriteThrift {
    /// Compact type code used when a list of this object is written.
    const ELEMENT_TYPE: u8;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()>;
}

impl WriteThrift for i32 {
    const ELEMENT_TYPE: u8 = ELEM_I32;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        writer.write_i32(*self)
    }
}

impl WriteThrift for i64 {
    const ELEMENT_TYPE: u8 = ELEM_I64;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        writer.write_i64(*self)
    }
}

impl WriteThrift for String {
    const ELEMENT_TYPE: u8 = ELEM_BINARY;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        writer.write_bytes(self.as_bytes())
    }
}

impl<T: WriteThrift> WriteThrift for Vec<T> {
    const ELEMENT_TYPE: u8 = 9; // list

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        writer.write_list_begin(T::ELEMENT_TYPE, self.len())?;
        for item in self {
            item.write_thrift(writer)?;
        }
        Ok(())
    }
}

/// Trait for objects written as struct fields.
pub(crate) trait WriteThriftField {
    /// Write the field header for `field_id` followed by the value, and
    /// return `field_id` to be chained into the next call.
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16>;
}

impl WriteThriftField for bool {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        // booleans carry their value in the field header
        let field_type = if *self {
            FieldType::BooleanTrue
        } else {
            FieldType::BooleanFalse
        };
        writer.write_field_begin(field_type, field_id, last_field_id)?;
        Ok(field_id)
    }
}

impl WriteThriftField for i16 {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::I16, field_id, last_field_id)?;
        writer.write_i16(*self)?;
        Ok(field_id)
    }
}

impl WriteThriftField for i32 {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::I32, field_id, last_field_id)?;
        writer.write_i32(*self)?;
        Ok(field_id)
    }
}

impl WriteThriftField for i64 {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::I64, field_id, last_field_id)?;
        writer.write_i64(*self)?;
        Ok(field_id)
    }
}

impl WriteThriftField for String {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::Binary, field_id, last_field_id)?;
        writer.write_bytes(self.as_bytes())?;
        Ok(field_id)
    }
}

impl WriteThriftField for [u8] {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::Binary, field_id, last_field_id)?;
        writer.write_bytes(self)?;
        Ok(field_id)
    }
}

impl<T: WriteThrift> WriteThriftField for Vec<T> {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::List, field_id, last_field_id)?;
        self.write_thrift(writer)?;
        Ok(field_id)
    }
}

// ----------------------------------------------------------------------
// serialize / deserialize with optional inline encryption

/// Serialize `obj` into a fresh buffer.
pub(crate) fn serialize_thrift_object<T: WriteThrift>(obj: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(1024);
    let mut protocol = ThriftCompactOutputProtocol::new(&mut buf);
    obj.write_thrift(&mut protocol)?;
    Ok(buf)
}

/// Serialize `obj` into `sink`. When `encryptor` is given, the object is
/// serialized into a scratch buffer, encrypted under `aad` (framed as
/// `len || nonce || ciphertext || tag`), and the frame is written instead.
/// Returns the number of bytes written to `sink`.
pub(crate) fn write_thrift_object<T: WriteThrift, W: Write>(
    obj: &T,
    sink: &mut W,
    encryptor: Option<&Encryptor>,
    aad: &[u8],
) -> Result<usize> {
    match encryptor {
        None => {
            let buf = serialize_thrift_object(obj)?;
            sink.write_all(&buf)?;
            Ok(buf.len())
        }
        Some(encryptor) => {
            let plaintext = serialize_thrift_object(obj)?;
            let ciphertext = encryptor.encrypt(&plaintext, aad)?;
            debug_assert_eq!(
                ciphertext.len(),
                plaintext.len() + encryptor.ciphertext_size_delta()
            );
            sink.write_all(&ciphertext)?;
            Ok(ciphertext.len())
        }
    }
}

/// Deserialize an object of type `T` from `buf`. When `decryptor` is given,
/// `buf` must start with an encrypted module frame, which is decrypted under
/// `aad` before the plaintext is deserialized. Returns the object along with
/// the number of bytes of `buf` consumed.
pub(crate) fn read_thrift_object<T: ReadThrift>(
    buf: &[u8],
    decryptor: Option<&Decryptor>,
    aad: &[u8],
) -> Result<(T, usize)> {
    match decryptor {
        None => {
            let mut prot = ThriftSliceInputProtocol::new(buf);
            let obj = T::read_thrift(&mut prot)?;
            Ok((obj, buf.len() - prot.as_slice().len()))
        }
        Some(decryptor) => {
            if buf.len() < 4 {
                return Err(ParquetError::DecryptFailed(
                    "module too short for ciphertext framing".to_owned(),
                ));
            }
            let ciphertext_len = u32::from_le_bytes(buf[..4].try_into().unwrap()) as usize;
            let frame_len = 4 + ciphertext_len;
            let frame = buf.get(..frame_len).ok_or_else(|| {
                ParquetError::DecryptFailed("ciphertext length exceeds module".to_owned())
            })?;
            let plaintext = decryptor.decrypt(frame, aad)?;
            if plaintext.is_empty() {
                return Err(ParquetError::DecryptFailed(
                    "decrypted module is empty".to_owned(),
                ));
            }
            let (obj, _) = read_thrift_object::<T>(&plaintext, None, aad)?;
            Ok((obj, frame_len))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_i64(val: i64) {
        let mut buf = Vec::new();
        {
            let mut prot = ThriftCompactOutputProtocol::new(&mut buf);
            prot.write_i64(val).unwrap();
        }
        let mut prot = ThriftSliceInputProtocol::new(&buf);
        assert_eq!(prot.read_i64().unwrap(), val);
    }

    #[test]
    fn test_zig_zag_roundtrip() {
        for val in [0, 1, -1, 63, -64, 64, i64::MAX, i64::MIN, 123456789] {
            roundtrip_i64(val);
        }
    }

    #[test]
    fn test_field_delta_encoding() {
        let mut buf = Vec::new();
        {
            let mut prot = ThriftCompactOutputProtocol::new(&mut buf);
            let mut last = 0i16;
            last = 7i32.write_thrift_field(&mut prot, 1, last).unwrap();
            last = 9i64.write_thrift_field(&mut prot, 3, last).unwrap();
            // force a long-form header
            11i32.write_thrift_field(&mut prot, 100, last).unwrap();
            prot.write_struct_end().unwrap();
        }
        let mut prot = ThriftSliceInputProtocol::new(&buf);
        let f = prot.read_field_begin(0).unwrap();
        assert_eq!((f.id, f.field_type), (1, FieldType::I32));
        assert_eq!(prot.read_i32().unwrap(), 7);
        let f = prot.read_field_begin(f.id).unwrap();
        assert_eq!((f.id, f.field_type), (3, FieldType::I64));
        assert_eq!(prot.read_i64().unwrap(), 9);
        let f = prot.read_field_begin(f.id).unwrap();
        assert_eq!((f.id, f.field_type), (100, FieldType::I32));
        assert_eq!(prot.read_i32().unwrap(), 11);
        let f = prot.read_field_begin(f.id).unwrap();
        assert_eq!(f.field_type, FieldType::Stop);
    }

    #[test]
    fn test_decode_empty_list() {
        let data = [0u8];
        let mut prot = ThriftSliceInputProtocol::new(&data);
        let header = prot.read_list_begin().unwrap();
        assert_eq!(header.size, 0);
    }

    #[test]
    fn test_skip_nested_struct() {
        // struct { 1: i32 = 5, 2: struct { 1: binary "abc" } }
        let mut buf = Vec::new();
        {
            let mut prot = ThriftCompactOutputProtocol::new(&mut buf);
            let mut last = 0i16;
            last = 5i32.write_thrift_field(&mut prot, 1, last).unwrap();
            prot.write_field_begin(FieldType::Struct, 2, last).unwrap();
            b"abc"[..].write_thrift_field(&mut prot, 1, 0).unwrap();
            prot.write_struct_end().unwrap();
            prot.write_struct_end().unwrap();
        }
        let mut prot = ThriftSliceInputProtocol::new(&buf);
        prot.skip(FieldType::Struct).unwrap();
        assert!(prot.as_slice().is_empty());
    }
}
