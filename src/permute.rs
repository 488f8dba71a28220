//! Bit-level permutation over fixed-width values.
//!
//! Values are held right-aligned in a `u64`, bit 0 being the leftmost
//! (most significant) bit of the `width`-bit value, which is how the DES
//! tables number their positions. Tables are written 1-based in `tables`
//! and converted to 0-based here, once.

use crate::error::TableError;

const MAX_WIDTH: usize = 64;

/// A validated permutation: output bit `i` is input bit `indices[i]`.
#[derive(Debug, Clone)]
pub struct PermutationTable {
    name: &'static str,
    in_width: u32,
    indices: Box<[u8]>,
}

impl PermutationTable {
    /// Builds a table from classical 1-based positions.
    ///
    /// Every entry must lie in `1..=in_width`, and neither width may exceed 64.
    pub fn from_one_based(
        name: &'static str,
        in_width: u32,
        positions: &[u8],
    ) -> Result<Self, TableError> {
        if in_width as usize > MAX_WIDTH || in_width == 0 {
            return Err(TableError {
                table: name,
                value: in_width as usize,
                bound: MAX_WIDTH,
            });
        }
        if positions.len() > MAX_WIDTH {
            return Err(TableError {
                table: name,
                value: positions.len(),
                bound: MAX_WIDTH,
            });
        }

        let indices = positions
            .iter()
            .map(|&p| {
                if p == 0 || p as u32 > in_width {
                    Err(TableError {
                        table: name,
                        value: p as usize,
                        bound: in_width as usize,
                    })
                } else {
                    Ok(p - 1)
                }
            })
            .collect::<Result<Vec<u8>, _>>()?;

        Ok(Self {
            name,
            in_width,
            indices: indices.into_boxed_slice(),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn in_width(&self) -> u32 {
        self.in_width
    }

    pub fn out_width(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Permutes the low `in_width` bits of `input` into an `out_width`-bit value.
    #[inline]
    pub fn apply(&self, input: u64) -> u64 {
        let top = self.in_width - 1;
        self.indices.iter().fold(0u64, |out, &src| {
            (out << 1) | ((input >> (top - src as u32)) & 1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let positions: Vec<u8> = (1..=8).collect();
        let table = PermutationTable::from_one_based("ID8", 8, &positions).unwrap();
        for v in [0x00u64, 0x01, 0x80, 0xa5, 0xff] {
            assert_eq!(table.apply(v), v);
        }
    }

    #[test]
    fn test_reverse() {
        let positions: Vec<u8> = (1..=8).rev().collect();
        let table = PermutationTable::from_one_based("REV8", 8, &positions).unwrap();
        assert_eq!(table.apply(0b1000_0000), 0b0000_0001);
        assert_eq!(table.apply(0b1100_1010), 0b0101_0011);
    }

    #[test]
    fn test_expanding_and_compressing_widths() {
        // 4 -> 6, duplicating the outer bits like the E table does
        let expand = PermutationTable::from_one_based("EXP", 4, &[4, 1, 2, 3, 4, 1]).unwrap();
        assert_eq!(expand.out_width(), 6);
        assert_eq!(expand.apply(0b1001), 0b110011);

        // 6 -> 2, dropping bits
        let pick = PermutationTable::from_one_based("PICK", 6, &[1, 6]).unwrap();
        assert_eq!(pick.out_width(), 2);
        assert_eq!(pick.apply(0b100000), 0b10);
        assert_eq!(pick.apply(0b000001), 0b01);
    }

    #[test]
    fn test_full_width_64() {
        let positions: Vec<u8> = (1..=64).collect();
        let table = PermutationTable::from_one_based("ID64", 64, &positions).unwrap();
        assert_eq!(table.apply(0x0123_4567_89ab_cdef), 0x0123_4567_89ab_cdef);
    }

    #[test]
    fn test_out_of_range_entry_is_rejected() {
        let err = PermutationTable::from_one_based("BAD", 8, &[1, 2, 9]).unwrap_err();
        assert_eq!(err.table, "BAD");
        assert_eq!(err.value, 9);
        assert_eq!(err.bound, 8);
    }

    #[test]
    fn test_zero_entry_is_rejected() {
        // Tables are 1-based; a zero means the table was written 0-based by mistake
        let err = PermutationTable::from_one_based("ZERO", 8, &[0, 1]).unwrap_err();
        assert_eq!(err.value, 0);
    }

    #[test]
    fn test_oversized_width_is_rejected() {
        assert!(PermutationTable::from_one_based("WIDE", 65, &[1]).is_err());
        let long = vec![1u8; 65];
        assert!(PermutationTable::from_one_based("LONG", 8, &long).is_err());
    }
}
