//! Address codec for the lahka ledger.
//!
//! Addresses are 20-byte payloads encoded with Bech32 under the human
//! readable part `lakha`. Ported from the reference `address.py` codec:
//! payloads are not public keys, just opaque identifiers derived by the
//! ledger (genesis accounts, contract addresses, validator addresses all
//! share this format).

use bech32::{FromBase32, ToBase32, Variant};
use sha2::{Digest, Sha256};

pub const HRP: &str = "lakha";
pub const PAYLOAD_LEN: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("bech32 encoding failed: {0}")]
    Bech32(#[from] bech32::Error),
    #[error("wrong human-readable part: expected {HRP}, got {0}")]
    WrongHrp(String),
    #[error("decoded payload has {0} bytes, expected {PAYLOAD_LEN}")]
    WrongLength(usize),
    #[error("not a bech32 or hex address: {0}")]
    Unrecognized(String),
    #[error("invalid hex address: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Encodes a 20-byte payload as a bech32 `lakha1...` address.
pub fn encode_address(payload: &[u8; PAYLOAD_LEN]) -> String {
    bech32::encode(HRP, payload.to_base32(), Variant::Bech32)
        .expect("fixed-length payload always encodes")
}

/// Encodes a 20-byte payload using the plain ASCII-hex fallback format
/// (`lakha` + hex), used when a bech32 decoder isn't available on the
/// receiving end. Kept as an alternate, always-decodable representation.
pub fn encode_address_hex(payload: &[u8; PAYLOAD_LEN]) -> String {
    format!("{HRP}{}", hex::encode(payload))
}

/// Decodes either representation back into a 20-byte payload.
pub fn decode_address(address: &str) -> Result<[u8; PAYLOAD_LEN], AddressError> {
    if let Some(hex_part) = address.strip_prefix(HRP) {
        if let Ok(bytes) = hex::decode(hex_part) {
            if bytes.len() == PAYLOAD_LEN {
                let mut out = [0u8; PAYLOAD_LEN];
                out.copy_from_slice(&bytes);
                return Ok(out);
            }
        }
    }

    let (hrp, data, variant) = bech32::decode(address)?;
    if hrp != HRP {
        return Err(AddressError::WrongHrp(hrp));
    }
    if variant != Variant::Bech32 {
        return Err(AddressError::Unrecognized(address.to_string()));
    }
    let bytes = Vec::<u8>::from_base32(&data)?;
    if bytes.len() != PAYLOAD_LEN {
        return Err(AddressError::WrongLength(bytes.len()));
    }
    let mut out = [0u8; PAYLOAD_LEN];
    out.copy_from_slice(&bytes);
    Ok(out)
}

pub fn is_valid_address(address: &str) -> bool {
    decode_address(address).is_ok()
}

/// Derives a 20-byte payload deterministically from arbitrary seed bytes
/// (used for genesis accounts and derived addresses that don't come from
/// a keypair).
pub fn derive_payload(seed: &[u8]) -> [u8; PAYLOAD_LEN] {
    let digest = Sha256::digest(seed);
    let mut out = [0u8; PAYLOAD_LEN];
    out.copy_from_slice(&digest[..PAYLOAD_LEN]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_bech32() {
        let payload = derive_payload(b"alice");
        let addr = encode_address(&payload);
        assert!(addr.starts_with("lakha1"));
        assert_eq!(decode_address(&addr).unwrap(), payload);
        assert!(is_valid_address(&addr));
    }

    #[test]
    fn round_trips_hex_fallback() {
        let payload = derive_payload(b"bob");
        let addr = encode_address_hex(&payload);
        assert!(addr.starts_with("lakha"));
        assert_eq!(decode_address(&addr).unwrap(), payload);
    }

    #[test]
    fn rejects_garbage() {
        assert!(!is_valid_address("not-an-address"));
        assert!(!is_valid_address("lakha1invalidchecksum"));
    }

    #[test]
    fn rejects_wrong_hrp() {
        let payload = [7u8; PAYLOAD_LEN];
        let wrong = bech32::encode("other", payload.to_base32(), Variant::Bech32).unwrap();
        assert!(matches!(decode_address(&wrong), Err(AddressError::WrongHrp(_))));
    }
}
