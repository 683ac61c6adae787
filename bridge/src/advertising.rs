//! # Advertising Payload Construction
//!
//! Builds the legacy advertising blob announced between connections: AD
//! flags, the complete local name, and the complete 128-bit service UUID
//! list. The payload is computed once at bridge construction and reused for
//! every advertising restart.

use heapless::Vec;

use crate::traits::RadioError;

/// Legacy advertising payloads are capped at 31 octets
pub const ADV_MAX_LEN: usize = 31;

const AD_TYPE_FLAGS: u8 = 0x01;
const AD_TYPE_UUID128_COMPLETE: u8 = 0x07;
const AD_TYPE_COMPLETE_NAME: u8 = 0x09;

const FLAG_GENERAL_DISCOVERABLE: u8 = 0x02;
const FLAG_BREDR_NOT_SUPPORTED: u8 = 0x04;

/// Build an advertising payload carrying `name` and one 128-bit service UUID.
///
/// The UUID is emitted little-endian per the Bluetooth core spec. Returns
/// [`RadioError::PayloadTooLong`] if the structures do not fit in 31 bytes
/// (a 16-byte UUID list leaves at most 8 bytes of name).
pub fn advertising_payload(
    name: &str,
    service_uuid: u128,
) -> Result<Vec<u8, ADV_MAX_LEN>, RadioError> {
    let mut payload = Vec::new();
    append(
        &mut payload,
        AD_TYPE_FLAGS,
        &[FLAG_GENERAL_DISCOVERABLE | FLAG_BREDR_NOT_SUPPORTED],
    )?;
    append(&mut payload, AD_TYPE_COMPLETE_NAME, name.as_bytes())?;
    append(
        &mut payload,
        AD_TYPE_UUID128_COMPLETE,
        &service_uuid.to_le_bytes(),
    )?;
    Ok(payload)
}

/// Append one AD structure: length, type, value
fn append(
    payload: &mut Vec<u8, ADV_MAX_LEN>,
    ad_type: u8,
    value: &[u8],
) -> Result<(), RadioError> {
    payload
        .push((value.len() + 1) as u8)
        .map_err(|_| RadioError::PayloadTooLong)?;
    payload
        .push(ad_type)
        .map_err(|_| RadioError::PayloadTooLong)?;
    payload
        .extend_from_slice(value)
        .map_err(|_| RadioError::PayloadTooLong)?;
    Ok(())
}
