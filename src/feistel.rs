//! The DES round function f(R, K).

use crate::tables::Tables;

/// Expands `half` through E, mixes in the 48-bit `subkey`, substitutes
/// through S1..S8 and permutes the 32-bit result through P.
pub fn round_function(tables: &Tables, half: u32, subkey: u64) -> u32 {
    let mixed = tables.e.apply(half as u64) ^ subkey;
    tables.p.apply(substitute(tables, mixed) as u64) as u32
}

/// Runs the eight 6-bit groups of `mixed` through their S-boxes.
///
/// Group `j` counts from the most significant end. Its outer bits pick the
/// row and its inner four bits the column.
fn substitute(tables: &Tables, mixed: u64) -> u32 {
    tables
        .sbox
        .iter()
        .enumerate()
        .fold(0u32, |out, (j, sbox)| {
            let group = (mixed >> (42 - 6 * j)) & 0x3f;
            let row = (((group >> 4) & 0b10) | (group & 1)) as usize;
            let col = ((group >> 1) & 0x0f) as usize;
            (out << 4) | sbox[row][col] as u32
        })
}
