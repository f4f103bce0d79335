//! Native messaging framing
//!
//! Each message is a 32-bit length in native byte order followed by that
//! many bytes of UTF-8 JSON.

use crate::{DeliveryError, DeliveryResult};
use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};
use serde::{de::DeserializeOwned, Serialize};
use std::io::{self, Read, Write};

/// Largest message the browser will send
pub const INBOUND_LIMIT: usize = 64 * 1024 * 1024;

/// Largest message the browser accepts from the host
pub const OUTBOUND_LIMIT: usize = 1024 * 1024;

/// Read one message body; `None` when the peer closed the stream
pub fn read_message<R: Read>(reader: &mut R) -> DeliveryResult<Option<Vec<u8>>> {
    let length = match reader.read_u32::<NativeEndian>() {
        Ok(length) => length as usize,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if length > INBOUND_LIMIT {
        return Err(DeliveryError::TransportTooLarge {
            size: length,
            limit: INBOUND_LIMIT,
        });
    }

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body)?;
    Ok(Some(body))
}

/// Write one message body and flush
pub fn write_message<W: Write>(writer: &mut W, body: &[u8]) -> DeliveryResult<()> {
    if body.len() > OUTBOUND_LIMIT {
        return Err(DeliveryError::TransportTooLarge {
            size: body.len(),
            limit: OUTBOUND_LIMIT,
        });
    }

    writer.write_u32::<NativeEndian>(body.len() as u32)?;
    writer.write_all(body)?;
    writer.flush()?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned, R: Read>(reader: &mut R) -> DeliveryResult<Option<T>> {
    match read_message(reader)? {
        Some(body) => Ok(Some(serde_json::from_slice(&body)?)),
        None => Ok(None),
    }
}

pub fn write_json<T: Serialize, W: Write>(writer: &mut W, value: &T) -> DeliveryResult<()> {
    let body = serde_json::to_vec(value)?;
    write_message(writer, &body)
}
