//! PKCS#5 padding removal for the final plaintext block.
//!
//! A valid last block ends in `n` copies of the byte `n`, with `n` in `1..=8`.
//! The check doubles as the only integrity signal ECB gives us: a wrong key
//! decrypts to noise that almost never ends in well-formed padding.

use crate::block::{Block, BLOCK_LEN};
use crate::error::{DesError, Result};

/// Returns the unpadded prefix of `block`.
pub fn strip_padding(block: &Block) -> Result<&[u8]> {
    let n = block[BLOCK_LEN - 1] as usize;
    if n == 0 || n > BLOCK_LEN {
        return Err(DesError::Padding);
    }
    let (data, pad) = block.split_at(BLOCK_LEN - n);
    if pad.iter().any(|&b| b as usize != n) {
        return Err(DesError::Padding);
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_each_valid_length() {
        for n in 1..=BLOCK_LEN {
            let mut block = [0xaau8; BLOCK_LEN];
            block[BLOCK_LEN - n..].fill(n as u8);
            let data = strip_padding(&block).unwrap();
            assert_eq!(data.len(), BLOCK_LEN - n);
            assert!(data.iter().all(|&b| b == 0xaa));
        }
    }

    #[test]
    fn test_full_padding_block_yields_nothing() {
        assert!(strip_padding(&[8; BLOCK_LEN]).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_zero() {
        let block = [1, 2, 3, 4, 5, 6, 7, 0];
        assert!(matches!(strip_padding(&block), Err(DesError::Padding)));
    }

    #[test]
    fn test_rejects_values_above_block_length() {
        for last in 9..=255u8 {
            let block = [last; BLOCK_LEN];
            assert!(
                matches!(strip_padding(&block), Err(DesError::Padding)),
                "accepted final byte {:#04x}",
                last
            );
        }
    }

    #[test]
    fn test_rejects_inconsistent_pad_bytes() {
        assert!(matches!(
            strip_padding(&[0, 0, 0, 0, 0, 2, 3, 3]),
            Err(DesError::Padding)
        ));
        assert!(matches!(
            strip_padding(&[7, 8, 8, 8, 8, 8, 8, 8]),
            Err(DesError::Padding)
        ));
    }
}
