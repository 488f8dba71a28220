//! DES keys and the 16-round key schedule.

use std::fmt;

use crate::error::{DesError, Result};
use crate::tables::{tables, Tables, KEY_SHIFTS};

pub const KEY_LEN: usize = 8;
pub const ROUNDS: usize = 16;

/// Length of a ground-station MAC address in bytes.
pub const MAC_LEN: usize = 6;

const HALF_MASK: u64 = 0x0fff_ffff;

/// A raw 64-bit DES key. Parity bits are kept as given and ignored by PC-1.
#[derive(Clone, PartialEq, Eq)]
pub struct Key([u8; KEY_LEN]);

impl Key {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Key(bytes)
    }

    /// Parses 16 hex digits, optionally prefixed with `0x`.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| DesError::InvalidKey(e.to_string()))?;
        Key::try_from(bytes.as_slice())
    }

    /// Builds the key-message key from a ground-station MAC address:
    /// the six MAC bytes followed by two zero bytes.
    pub fn from_mac(mac: &str) -> Result<Self> {
        let digits: String = mac
            .trim()
            .chars()
            .filter(|c| *c != ':' && *c != '-')
            .collect();
        let bytes = hex::decode(&digits).map_err(|e| DesError::InvalidKey(e.to_string()))?;
        if bytes.len() != MAC_LEN {
            return Err(DesError::InvalidKey(format!(
                "MAC address must be {} bytes, got {}",
                MAC_LEN,
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_LEN];
        key[..MAC_LEN].copy_from_slice(&bytes);
        Ok(Key(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    fn to_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

impl From<[u8; KEY_LEN]> for Key {
    fn from(bytes: [u8; KEY_LEN]) -> Self {
        Key(bytes)
    }
}

impl TryFrom<&[u8]> for Key {
    type Error = DesError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            DesError::InvalidKey(format!("expected {} bytes, got {}", KEY_LEN, bytes.len()))
        })?;
        Ok(Key(key))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(..)")
    }
}

/// The 16 48-bit subkeys K1..K16, in encryption order.
#[derive(Clone, PartialEq, Eq)]
pub struct RoundKeys([u64; ROUNDS]);

impl RoundKeys {
    /// Runs the DES key schedule: PC-1, per-round rotation of C and D, PC-2.
    pub fn derive(key: &Key) -> Result<Self> {
        Ok(Self::derive_with(key, tables()?))
    }

    pub(crate) fn derive_with(key: &Key, tables: &Tables) -> Self {
        let cd = tables.pc1.apply(key.to_u64());
        let mut c = cd >> 28;
        let mut d = cd & HALF_MASK;

        let mut subkeys = [0u64; ROUNDS];
        for (subkey, &shift) in subkeys.iter_mut().zip(KEY_SHIFTS.iter()) {
            c = rotate_half(c, shift);
            d = rotate_half(d, shift);
            *subkey = tables.pc2.apply((c << 28) | d);
        }
        RoundKeys(subkeys)
    }

    /// Subkey for `round` in `1..=16`.
    pub fn round(&self, round: usize) -> u64 {
        self.0[round - 1]
    }

    pub fn as_slice(&self) -> &[u64; ROUNDS] {
        &self.0
    }
}

// Subkeys are key material too
impl fmt::Debug for RoundKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RoundKeys(..)")
    }
}

/// Left-rotates a 28-bit half.
fn rotate_half(v: u64, shift: u32) -> u64 {
    ((v << shift) | (v >> (28 - shift))) & HALF_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_hex(s: &str) -> Key {
        Key::from_hex(s).unwrap()
    }

    #[test]
    fn test_known_subkeys() {
        // Worked example key from the classic DES walkthrough
        let keys = RoundKeys::derive(&key_hex("133457799BBCDFF1")).unwrap();
        assert_eq!(keys.round(1), 0x1b02_effc_7072);
        assert_eq!(keys.round(16), 0xcb3d_8b0e_17f5);
    }

    #[test]
    fn test_subkeys_are_48_bits() {
        let keys = RoundKeys::derive(&key_hex("0123456789abcdef")).unwrap();
        for &k in keys.as_slice() {
            assert_eq!(k >> 48, 0);
        }
    }

    #[test]
    fn test_derive_is_deterministic() {
        let key = key_hex("0e329232ea6d0d73");
        assert_eq!(RoundKeys::derive(&key).unwrap(), RoundKeys::derive(&key).unwrap());
    }

    #[test]
    fn test_parity_bits_are_ignored() {
        // Flip the low bit of every byte
        let a = key_hex("133457799BBCDFF1");
        let b = key_hex("123556789ABDDEF0");
        assert_eq!(RoundKeys::derive(&a).unwrap(), RoundKeys::derive(&b).unwrap());
    }

    #[test]
    fn test_non_parity_bit_changes_schedule() {
        let a = key_hex("133457799BBCDFF1");
        for byte in 0..KEY_LEN {
            for bit in 1..8 {
                let mut bytes = *a.as_bytes();
                bytes[byte] ^= 1 << bit;
                let b = Key::new(bytes);
                assert_ne!(
                    RoundKeys::derive(&a).unwrap(),
                    RoundKeys::derive(&b).unwrap(),
                    "byte {} bit {}",
                    byte,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_weak_key_has_identical_subkeys() {
        let keys = RoundKeys::derive(&key_hex("0101010101010101")).unwrap();
        assert!(keys.as_slice().iter().all(|&k| k == keys.round(1)));
    }

    #[test]
    fn test_rotate_half() {
        assert_eq!(rotate_half(0x800_0000, 1), 0x000_0001);
        assert_eq!(rotate_half(0xc00_0000, 2), 0x000_0003);
        assert_eq!(rotate_half(0x000_0001, 2), 0x000_0004);
    }

    #[test]
    fn test_key_from_hex() {
        let key = key_hex("0x133457799bbcdff1");
        assert_eq!(key.as_bytes(), &[0x13, 0x34, 0x57, 0x79, 0x9b, 0xbc, 0xdf, 0xf1]);
        assert!(Key::from_hex("1334577").is_err());
        assert!(Key::from_hex("133457799bbcdff1ff").is_err());
        assert!(Key::from_hex("zz3457799bbcdff1").is_err());
    }

    #[test]
    fn test_key_from_raw_bytes() {
        let key = Key::try_from(&b"8bytekey"[..]).unwrap();
        assert_eq!(key.as_bytes(), b"8bytekey");
        assert!(matches!(
            Key::try_from(&b"short"[..]),
            Err(DesError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_key_from_mac() {
        let key = Key::from_mac("00:1a:2B-3c:4d:5e").unwrap();
        assert_eq!(key.as_bytes(), &[0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e, 0x00, 0x00]);
        assert!(Key::from_mac("001a2b3c4d").is_err());
    }

    #[test]
    fn test_debug_hides_key_material() {
        let key = key_hex("133457799BBCDFF1");
        assert_eq!(format!("{:?}", key), "Key(..)");
        let keys = RoundKeys::derive(&key).unwrap();
        assert_eq!(format!("{:?}", keys), "RoundKeys(..)");
    }
}
