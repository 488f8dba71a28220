//! Single-block DES decryption and the per-key decryption session.

use rayon::prelude::*;

use crate::error::{DesError, Result};
use crate::feistel::round_function;
use crate::key::{Key, RoundKeys, ROUNDS};
use crate::tables::{tables, Tables};

pub const BLOCK_LEN: usize = 8;

pub type Block = [u8; BLOCK_LEN];

/// A decryption session: the round keys for one key plus the shared tables.
///
/// Immutable once built, so one `Decryptor` can serve any number of threads.
pub struct Decryptor {
    tables: &'static Tables,
    keys: RoundKeys,
    parallel: bool,
}

impl Decryptor {
    pub fn new(key: &Key) -> Result<Self> {
        let tables = tables()?;
        let keys = RoundKeys::derive_with(key, tables);
        log::debug!("DES key schedule derived");
        Ok(Self {
            tables,
            keys,
            parallel: true,
        })
    }

    /// Enables or disables decrypting the blocks of a buffer across threads.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn round_keys(&self) -> &RoundKeys {
        &self.keys
    }

    /// Decrypts one 64-bit block.
    pub fn decrypt_block(&self, block: &Block) -> Block {
        decrypt_block(self.tables, &self.keys, block)
    }

    /// Decrypts a block-aligned buffer in place, ECB, without touching padding.
    pub fn decrypt_blocks(&self, data: &mut [u8]) -> Result<()> {
        if data.len() % BLOCK_LEN != 0 {
            return Err(DesError::InputFormat {
                len: data.len() as u64,
            });
        }
        if self.parallel {
            data.par_chunks_exact_mut(BLOCK_LEN)
                .for_each(|chunk| self.decrypt_in_place(chunk));
        } else {
            data.chunks_exact_mut(BLOCK_LEN)
                .for_each(|chunk| self.decrypt_in_place(chunk));
        }
        Ok(())
    }

    fn decrypt_in_place(&self, chunk: &mut [u8]) {
        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(chunk);
        chunk.copy_from_slice(&self.decrypt_block(&block));
    }
}

/// IP, 16 Feistel rounds with K16..K1, swap, IP^-1.
pub fn decrypt_block(tables: &Tables, keys: &RoundKeys, block: &Block) -> Block {
    let permuted = tables.ip.apply(u64::from_be_bytes(*block));
    let mut left = (permuted >> 32) as u32;
    let mut right = permuted as u32;

    for round in (1..=ROUNDS).rev() {
        let next = left ^ round_function(tables, right, keys.round(round));
        left = right;
        right = next;
    }

    let preoutput = ((right as u64) << 32) | left as u64;
    tables.fp.apply(preoutput).to_be_bytes()
}

/// Forward DES, used only to build fixtures for the decryption tests.
#[cfg(test)]
pub(crate) fn encrypt_block(tables: &Tables, keys: &RoundKeys, block: &Block) -> Block {
    let permuted = tables.ip.apply(u64::from_be_bytes(*block));
    let mut left = (permuted >> 32) as u32;
    let mut right = permuted as u32;

    for round in 1..=ROUNDS {
        let next = left ^ round_function(tables, right, keys.round(round));
        left = right;
        right = next;
    }

    let preoutput = ((right as u64) << 32) | left as u64;
    tables.fp.apply(preoutput).to_be_bytes()
}
