//! KMA encryption key messages
//!
//! A key message carries the 30 DES keys used to encrypt xRIT data fields,
//! each one encrypted under a key derived from the receiving ground
//! station's MAC address (see [`Key::from_mac`]).
//!
//! Layout:
//! - header[8]: application time, BCD (year[2] month day hour minute millis[2])
//! - data[540]: 30 x (index[2] + encrypted key[16])
//! - crc[2]: last two bytes of the file
//!
//! Decrypted output: count[2] = 0x001E, then 30 x (index[2] + key[8]).

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::block::{Decryptor, BLOCK_LEN};
use crate::error::{DesError, Result};
use crate::key::{Key, KEY_LEN};
use crate::stream::write_atomic;
use crate::xrit::output_path;

pub const HEADER_LEN: usize = 8;
pub const KEY_COUNT: usize = 30;
pub const INDEX_LEN: usize = 2;
pub const ENCRYPTED_KEY_LEN: usize = 2 * BLOCK_LEN;
pub const ENTRY_LEN: usize = INDEX_LEN + ENCRYPTED_KEY_LEN; // 18
pub const DATA_LEN: usize = KEY_COUNT * ENTRY_LEN; // 540
pub const CRC_LEN: usize = 2;
pub const MESSAGE_LEN: usize = HEADER_LEN + DATA_LEN + CRC_LEN; // 550

const KIND: &str = "key message";

/// Application time from the key message header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplicationTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub millis: u16,
}

impl ApplicationTime {
    fn parse(header: &[u8; HEADER_LEN]) -> Result<Self> {
        Ok(ApplicationTime {
            year: bcd(&header[0..2])?,
            month: bcd(&header[2..3])? as u8,
            day: bcd(&header[3..4])? as u8,
            hour: bcd(&header[4..5])? as u8,
            minute: bcd(&header[5..6])? as u8,
            millis: bcd(&header[6..8])?,
        })
    }

    /// Whole seconds, rounded half up.
    pub fn seconds(&self) -> u16 {
        (self.millis + 500) / 1000
    }
}

impl fmt::Display for ApplicationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}/{:02}/{:04} {:02}:{:02}:{:02}",
            self.day,
            self.month,
            self.year,
            self.hour,
            self.minute,
            self.seconds()
        )
    }
}

/// Decodes packed BCD, two digits per byte.
fn bcd(bytes: &[u8]) -> Result<u16> {
    bytes.iter().try_fold(0u16, |acc, &b| {
        let (hi, lo) = (b >> 4, b & 0x0f);
        if hi > 9 || lo > 9 {
            return Err(DesError::malformed(
                KIND,
                format!("invalid BCD byte {:#04x} in header", b),
            ));
        }
        Ok(acc * 100 + (hi * 10 + lo) as u16)
    })
}

/// One encrypted entry as it appears in the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEntry {
    pub index: u16,
    pub encrypted: [u8; ENCRYPTED_KEY_LEN],
}

/// One recovered xRIT key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    pub index: u16,
    pub key: Key,
}

#[derive(Debug, Clone)]
pub struct KeyMessage {
    pub header: [u8; HEADER_LEN],
    pub entries: Vec<EncryptedEntry>,
    pub crc: [u8; CRC_LEN],
}

impl KeyMessage {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < MESSAGE_LEN {
            return Err(DesError::malformed(
                KIND,
                format!("{} bytes, expected {}", data.len(), MESSAGE_LEN),
            ));
        }
        if data.len() > MESSAGE_LEN {
            log::warn!(
                "key message is {} bytes, {} expected; reading CRC from the end",
                data.len(),
                MESSAGE_LEN
            );
        }

        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&data[..HEADER_LEN]);

        let entries = data[HEADER_LEN..HEADER_LEN + DATA_LEN]
            .chunks_exact(ENTRY_LEN)
            .map(|entry| {
                let mut encrypted = [0u8; ENCRYPTED_KEY_LEN];
                encrypted.copy_from_slice(&entry[INDEX_LEN..]);
                EncryptedEntry {
                    index: u16::from_be_bytes([entry[0], entry[1]]),
                    encrypted,
                }
            })
            .collect();

        let mut crc = [0u8; CRC_LEN];
        crc.copy_from_slice(&data[data.len() - CRC_LEN..]);

        Ok(KeyMessage {
            header,
            entries,
            crc,
        })
    }

    pub fn application_time(&self) -> Result<ApplicationTime> {
        ApplicationTime::parse(&self.header)
    }

    /// Decrypts every entry with the station key. Each encrypted key is two
    /// blocks; the xRIT key is the first eight plaintext bytes.
    pub fn decrypt(&self, station_key: &Key) -> Result<Vec<KeyEntry>> {
        let decryptor = Decryptor::new(station_key)?.parallel(false);
        self.entries
            .iter()
            .map(|entry| -> Result<KeyEntry> {
                let mut plain = entry.encrypted;
                decryptor.decrypt_blocks(&mut plain)?;
                let key = Key::try_from(&plain[..KEY_LEN])?;
                Ok(KeyEntry {
                    index: entry.index,
                    key,
                })
            })
            .collect()
    }
}

/// Serialises recovered keys: a big-endian count, then index and key per entry.
pub fn encode_keys(keys: &[KeyEntry]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + keys.len() * (INDEX_LEN + KEY_LEN));
    out.extend_from_slice(&(keys.len() as u16).to_be_bytes());
    for entry in keys {
        out.extend_from_slice(&entry.index.to_be_bytes());
        out.extend_from_slice(entry.key.as_bytes());
    }
    out
}

/// Decrypts the key message at `path` with `station_key`, writing the
/// recovered keys to `<path>.dec`.
pub fn decrypt_key_message_file(path: &Path, station_key: &Key) -> Result<(PathBuf, Vec<KeyEntry>)> {
    let data = fs::read(path)?;
    let message = KeyMessage::parse(&data)?;
    match message.application_time() {
        Ok(time) => log::info!("key message application time {}", time),
        Err(e) => log::warn!("{}", e),
    }

    let keys = message.decrypt(station_key)?;
    let out = output_path(path);
    write_atomic(&out, &encode_keys(&keys))?;
    log::info!("{} keys -> {}", keys.len(), out.display());
    Ok((out, keys))
}
