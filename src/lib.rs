//! COMS-1 desdec - single-layer DES decryption for xRIT downlink files
//!
//! This crate implements classical DES decryption (FIPS 46-3) over
//! independent 64-bit blocks, the way COMS-1 encrypts xRIT data fields:
//! - `decrypt_file` / `Decryptor::decrypt_stream`: PKCS#5-padded ciphertext
//! - `xrit`: in-place decryption of an LRIT/HRIT data field
//! - `keymsg`: recovery of the xRIT keys from a KMA key message
//!
//! Encryption, Triple-DES and chaining modes are deliberately absent.

pub mod block;
pub mod error;
pub mod feistel;
pub mod key;
pub mod keymsg;
pub mod logger;
pub mod padding;
pub mod permute;
pub mod stream;
pub mod tables;
pub mod xrit;

// Re-export main types
pub use block::{Block, Decryptor, BLOCK_LEN};
pub use error::{DesError, Result, TableError};
pub use key::{Key, RoundKeys};
pub use padding::strip_padding;
pub use stream::{decrypt_file, decrypt_file_with};
