//! xRIT (LRIT/HRIT) file decryption
//!
//! An xRIT file is a chain of headers followed by a data field. Only the data
//! field is encrypted; the headers are copied through unchanged. The 16-byte
//! primary header at the front gives the total header length and the data
//! field length.
//!
//! Primary header layout (big-endian):
//! - header type[1] = 0, header record length[2] = 16
//! - file type[1]
//! - total header length[4], in bytes
//! - data field length[8], in bits

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::block::{Decryptor, BLOCK_LEN};
use crate::error::{DesError, Result};
use crate::stream::write_atomic;

pub const PRIMARY_HEADER_LEN: usize = 16;
const PRIMARY_HEADER_PREFIX: [u8; 3] = [0x00, 0x00, 0x10];

const KIND: &str = "xRIT file";

/// Extensions picked up when decrypting a whole directory.
pub const XRIT_EXTENSIONS: [&str; 2] = ["lrit", "hrit"];
pub const DECRYPTED_SUFFIX: &str = "dec";

/// COMS-1 file types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Image,
    GtsMessage,
    AlphanumericText,
    KeyMessage,
    Cmdps,
    Nwp,
    Goci,
    Typhoon,
    Other(u8),
}

impl From<u8> for FileType {
    fn from(code: u8) -> Self {
        match code {
            0 => FileType::Image,
            1 => FileType::GtsMessage,
            2 => FileType::AlphanumericText,
            3 => FileType::KeyMessage,
            128 => FileType::Cmdps,
            129 => FileType::Nwp,
            130 => FileType::Goci,
            131 => FileType::Typhoon,
            other => FileType::Other(other),
        }
    }
}

impl From<FileType> for u8 {
    fn from(t: FileType) -> u8 {
        match t {
            FileType::Image => 0,
            FileType::GtsMessage => 1,
            FileType::AlphanumericText => 2,
            FileType::KeyMessage => 3,
            FileType::Cmdps => 128,
            FileType::Nwp => 129,
            FileType::Goci => 130,
            FileType::Typhoon => 131,
            FileType::Other(code) => code,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Image => f.write_str("Image data (IMG)"),
            FileType::GtsMessage => f.write_str("Global Telecommunication System (GTS) message"),
            FileType::AlphanumericText => f.write_str("Alpha-numeric text (ANT)"),
            FileType::KeyMessage => f.write_str("Encryption key message"),
            FileType::Cmdps => f.write_str("COMS Meteorological Data Processing System (CMDPS) analysis data"),
            FileType::Nwp => f.write_str("Numerical Weather Prediction (NWP) data"),
            FileType::Goci => f.write_str("Geostationary Ocean Color Imager (GOCI) data"),
            FileType::Typhoon => f.write_str("KMA typhoon information"),
            FileType::Other(code) => write!(f, "Unknown file type {}", code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryHeader {
    pub file_type: FileType,
    pub total_header_len: u32,
    pub data_field_bits: u64,
}

impl PrimaryHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < PRIMARY_HEADER_LEN {
            return Err(DesError::malformed(
                KIND,
                format!("{} bytes is too short for a primary header", data.len()),
            ));
        }
        if data[..3] != PRIMARY_HEADER_PREFIX {
            return Err(DesError::malformed(
                KIND,
                format!("bad primary header prefix {}", hex::encode(&data[..3])),
            ));
        }

        let mut total = [0u8; 4];
        total.copy_from_slice(&data[4..8]);
        let mut bits = [0u8; 8];
        bits.copy_from_slice(&data[8..16]);

        Ok(PrimaryHeader {
            file_type: FileType::from(data[3]),
            total_header_len: u32::from_be_bytes(total),
            data_field_bits: u64::from_be_bytes(bits),
        })
    }

    pub fn to_bytes(&self) -> [u8; PRIMARY_HEADER_LEN] {
        let mut out = [0u8; PRIMARY_HEADER_LEN];
        out[..3].copy_from_slice(&PRIMARY_HEADER_PREFIX);
        out[3] = self.file_type.into();
        out[4..8].copy_from_slice(&self.total_header_len.to_be_bytes());
        out[8..16].copy_from_slice(&self.data_field_bits.to_be_bytes());
        out
    }

    /// Data field length in whole bytes.
    pub fn data_field_len(&self) -> u64 {
        self.data_field_bits.div_ceil(8)
    }
}

/// Decrypts an in-memory xRIT file.
///
/// The data field is zero-filled up to the next block boundary, decrypted
/// as independent blocks with no padding removal, and cut back to its
/// declared length. Bytes after the data field are dropped.
pub fn decrypt_xrit(data: &[u8], decryptor: &Decryptor) -> Result<Vec<u8>> {
    let header = PrimaryHeader::parse(data)?;
    log::debug!(
        "xRIT {}: header {} bytes, data field {} bits",
        header.file_type,
        header.total_header_len,
        header.data_field_bits
    );

    let header_len = header.total_header_len as usize;
    if header_len < PRIMARY_HEADER_LEN {
        return Err(DesError::malformed(
            KIND,
            format!("total header length {} is shorter than the primary header", header_len),
        ));
    }

    let field_len = usize::try_from(header.data_field_len())
        .map_err(|_| DesError::malformed(KIND, "data field length does not fit in memory"))?;
    let end = header_len
        .checked_add(field_len)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            DesError::malformed(
                KIND,
                format!(
                    "file is {} bytes, headers and data field need {} + {}",
                    data.len(),
                    header_len,
                    field_len
                ),
            )
        })?;
    if end < data.len() {
        log::warn!("ignoring {} bytes after the data field", data.len() - end);
    }

    let mut field = data[header_len..end].to_vec();
    let fill = (BLOCK_LEN - field_len % BLOCK_LEN) % BLOCK_LEN;
    if fill > 0 {
        log::debug!("zero-filling {} bytes to complete the last block", fill);
        field.resize(field_len + fill, 0);
    }
    decryptor.decrypt_blocks(&mut field)?;
    field.truncate(field_len);

    let mut out = Vec::with_capacity(end);
    out.extend_from_slice(&data[..header_len]);
    out.extend_from_slice(&field);
    Ok(out)
}

/// `<path>.dec`
pub fn output_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(DECRYPTED_SUFFIX);
    PathBuf::from(name)
}

pub fn is_decrypted(path: &Path) -> bool {
    output_path(path).exists()
}

/// Decrypts the xRIT file at `path` into `<path>.dec` and returns that path.
pub fn decrypt_xrit_file(path: &Path, decryptor: &Decryptor) -> Result<PathBuf> {
    let data = fs::read(path)?;
    let plain = decrypt_xrit(&data, decryptor)?;
    let out = output_path(path);
    write_atomic(&out, &plain)?;
    log::info!("{} -> {}", path.display(), out.display());
    Ok(out)
}

/// Lists the `.lrit` and `.hrit` files directly inside `dir`, sorted by name.
pub fn find_xrit_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_xrit = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| XRIT_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
            .unwrap_or(false);
        if is_xrit && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
