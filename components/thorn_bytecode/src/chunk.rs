//! Binary chunk format
//!
//! Layout (all integers big-endian):
//!
//! ```text
//! header    ESC 'L' 'u' 'a'  version(0x32)  number-size(8)  test-number(f64)
//! body      '#' function  '$'
//! function  line_defined:u16  source:string  code-len:u32 code
//!           local-count:u16 { line:u16 name:string }
//!           constant-count:u16 { 'N' f64 | 'S' string | 'F' function }
//! string    len:u32 (includes trailing NUL, 0 for none) bytes
//! ```

use std::rc::Rc;

use tracing::debug;

use crate::error::BytecodeError;
use crate::prototype::{Constant, LocalVar, Prototype, MAX_NESTING};

/// Leading bytes of every binary chunk
pub const SIGNATURE: &[u8; 4] = b"\x1bLua";

/// Chunk format version
pub const VERSION: u8 = 0x32;

const NUMBER_SIZE: u8 = 8;
const TEST_NUMBER: f64 = 3.141_592_653_589_793_238_46E8;

const TAG_FUNCTION: u8 = b'#';
const TAG_END: u8 = b'$';
const TAG_NUMBER: u8 = b'N';
const TAG_STRING: u8 = b'S';
const TAG_NESTED: u8 = b'F';

/// Whether `bytes` starts with the binary chunk signature
pub fn has_chunk_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(SIGNATURE)
}

impl Prototype {
    /// Serialize this prototype as a binary chunk.
    ///
    /// Fails with [`BytecodeError::FieldOverflow`] when a line number, count
    /// or length does not fit its on-disk width.
    pub fn to_bytes(&self) -> Result<Vec<u8>, BytecodeError> {
        let mut out = Vec::new();
        out.extend_from_slice(SIGNATURE);
        out.push(VERSION);
        out.push(NUMBER_SIZE);
        out.extend_from_slice(&TEST_NUMBER.to_be_bytes());
        out.push(TAG_FUNCTION);
        write_function(&mut out, self)?;
        out.push(TAG_END);
        Ok(out)
    }

    /// Load a binary chunk.
    ///
    /// Only the structure of the chunk is checked here; call
    /// [`Prototype::verify`] before executing the result.
    pub fn from_bytes(bytes: &[u8]) -> Result<Prototype, BytecodeError> {
        let mut reader = Reader {
            bytes,
            pos: 0,
            depth: 0,
        };
        if reader.take(SIGNATURE.len())? != SIGNATURE {
            return Err(BytecodeError::BadSignature);
        }
        let version = reader.u8()?;
        if version != VERSION {
            return Err(BytecodeError::UnsupportedVersion(version));
        }
        if reader.u8()? != NUMBER_SIZE || reader.f64()? != TEST_NUMBER {
            return Err(BytecodeError::NumberFormatMismatch);
        }
        reader.expect(TAG_FUNCTION)?;
        let proto = reader.function()?;
        reader.expect(TAG_END)?;
        debug!(
            source = %proto.source,
            bytes = bytes.len(),
            constants = proto.constants.len(),
            "loaded binary chunk"
        );
        Ok(proto)
    }
}

fn field_u16(field: &'static str, value: usize) -> Result<[u8; 2], BytecodeError> {
    u16::try_from(value)
        .map(u16::to_be_bytes)
        .map_err(|_| BytecodeError::FieldOverflow { field, value })
}

fn field_u32(field: &'static str, value: usize) -> Result<[u8; 4], BytecodeError> {
    u32::try_from(value)
        .map(u32::to_be_bytes)
        .map_err(|_| BytecodeError::FieldOverflow { field, value })
}

fn write_function(out: &mut Vec<u8>, proto: &Prototype) -> Result<(), BytecodeError> {
    out.extend_from_slice(&field_u16("line_defined", proto.line_defined as usize)?);
    write_string(out, Some(&proto.source))?;
    out.extend_from_slice(&field_u32("code length", proto.code.len())?);
    out.extend_from_slice(&proto.code);

    out.extend_from_slice(&field_u16("local count", proto.locals.len())?);
    for local in &proto.locals {
        out.extend_from_slice(&field_u16("local line", local.line as usize)?);
        write_string(out, Some(&local.name))?;
    }

    out.extend_from_slice(&field_u16("constant count", proto.constants.len())?);
    for constant in &proto.constants {
        match constant {
            Constant::Number(n) => {
                out.push(TAG_NUMBER);
                out.extend_from_slice(&n.to_be_bytes());
            }
            Constant::String(s) => {
                out.push(TAG_STRING);
                write_string(out, Some(s))?;
            }
            Constant::Prototype(p) => {
                out.push(TAG_NESTED);
                write_function(out, p)?;
            }
        }
    }
    Ok(())
}

fn write_string(out: &mut Vec<u8>, s: Option<&str>) -> Result<(), BytecodeError> {
    match s {
        Some(s) => {
            out.extend_from_slice(&field_u32("string length", s.len() + 1)?);
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }
        None => out.extend_from_slice(&0u32.to_be_bytes()),
    }
    Ok(())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], BytecodeError> {
        let slice = self
            .bytes
            .get(self.pos..self.pos.saturating_add(n))
            .ok_or(BytecodeError::Truncated { offset: self.pos })?;
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, BytecodeError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, BytecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, BytecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f64(&mut self) -> Result<f64, BytecodeError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(f64::from_be_bytes(buf))
    }

    fn expect(&mut self, tag: u8) -> Result<(), BytecodeError> {
        let offset = self.pos;
        let found = self.u8()?;
        if found != tag {
            return Err(BytecodeError::UnexpectedTag { tag: found, offset });
        }
        Ok(())
    }

    fn string(&mut self) -> Result<Option<String>, BytecodeError> {
        let len = self.u32()? as usize;
        if len == 0 {
            return Ok(None);
        }
        let raw = self.take(len)?;
        let text = raw.strip_suffix(&[0]).unwrap_or(raw);
        std::str::from_utf8(text)
            .map(|s| Some(s.to_owned()))
            .map_err(|_| BytecodeError::InvalidUtf8)
    }

    fn function(&mut self) -> Result<Prototype, BytecodeError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(BytecodeError::NestingTooDeep { limit: MAX_NESTING });
        }
        let proto = self.function_body()?;
        self.depth -= 1;
        Ok(proto)
    }

    fn function_body(&mut self) -> Result<Prototype, BytecodeError> {
        let line_defined = self.u16()? as u32;
        let source = self.string()?.unwrap_or_else(|| String::from("?"));
        let code_len = self.u32()? as usize;
        let code = self.take(code_len)?.to_vec();

        let local_count = self.u16()?;
        let mut locals = Vec::with_capacity(local_count as usize);
        for _ in 0..local_count {
            let line = self.u16()? as u32;
            let name = self.string()?.unwrap_or_default();
            locals.push(LocalVar { name, line });
        }

        let constant_count = self.u16()?;
        let mut constants = Vec::with_capacity(constant_count as usize);
        for _ in 0..constant_count {
            let offset = self.pos;
            let constant = match self.u8()? {
                TAG_NUMBER => Constant::Number(self.f64()?),
                TAG_STRING => Constant::String(Rc::from(self.string()?.unwrap_or_default())),
                TAG_NESTED => Constant::Prototype(Rc::new(self.function()?)),
                tag => return Err(BytecodeError::UnexpectedTag { tag, offset }),
            };
            constants.push(constant);
        }

        Ok(Prototype {
            code,
            constants,
            source,
            line_defined,
            locals,
        })
    }
}
