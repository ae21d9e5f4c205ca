//! Types and codecs generated from `schema/commands.tsp` at build time.

#[allow(dead_code)]
pub mod protocol {
    include!(concat!(env!("OUT_DIR"), "/protocol.rs"));
}

pub use protocol::*;

/// Wrap a payload in a `ProtocolHeader` carrying its command id and length.
pub fn frame<T: WireModel>(command_id: u8, sequence_id: u32, payload: &T) -> Result<Vec<u8>, WireError> {
    let body = payload.serialize()?;
    let header = ProtocolHeader {
        magic: MAGIC,
        version: 1,
        command_id,
        payload_length: body.len() as u32,
        sequence_id,
        checksum: checksum(&body),
    };
    let mut message = header.serialize()?;
    message.extend_from_slice(&body);
    Ok(message)
}

/// Split a framed message into its header and payload bytes.
pub fn unframe(message: &[u8]) -> Result<(ProtocolHeader, &[u8]), WireError> {
    let header_size = ProtocolHeader::FIXED_SIZE.unwrap_or_default();
    if message.len() < header_size {
        return Err(WireError::BufferUnderflow {
            needed: header_size,
            available: message.len(),
        });
    }
    let header = ProtocolHeader::deserialize(&message[..header_size])?;
    let body = &message[header_size..];
    let len = header.payload_length as usize;
    if body.len() < len {
        return Err(WireError::BufferUnderflow {
            needed: len,
            available: body.len(),
        });
    }
    Ok((header, &body[..len]))
}

pub const MAGIC: u16 = 0xB1_75;

/// Sum of all payload bytes, wrapping at 16 bits.
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0u16, |acc, &b| acc.wrapping_add(b as u16))
}
