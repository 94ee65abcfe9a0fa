//! Wire layout of one slot.
//!
//! ```text
//! byte 0         slot index
//! bytes 1+4k..   register k, big-endian, registers in set order
//! ```

use core::fmt;

use crate::registers::{Register, REGISTER_SET, REG_COUNT};
use crate::DecodeError;

const WORD: usize = core::mem::size_of::<u32>();

/// Encoded snapshot, ready for the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct WireFrame<const REGS: usize = REG_COUNT> {
    slot: u8,
    registers: [[u8; WORD]; REGS],
}

impl<const REGS: usize> WireFrame<REGS> {
    pub const LEN: usize = {
        // Byte-aligned fields, so no padding anywhere.
        assert!(core::mem::size_of::<Self>() == 1 + WORD * REGS);
        1 + WORD * REGS
    };

    pub fn new(slot: u8, values: &[u32; REGS]) -> Self {
        Self {
            slot,
            registers: (*values).map(u32::to_be_bytes),
        }
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: `Self` is repr(C) and built only from u8 and u8 arrays, so it
        // is LEN initialised bytes with alignment 1 (checked in LEN).
        unsafe { core::slice::from_raw_parts((self as *const Self).cast::<u8>(), Self::LEN) }
    }
}

/// A frame decoded on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFrame<const REGS: usize = REG_COUNT> {
    slot: u8,
    values: [u32; REGS],
}

impl<const REGS: usize> RegisterFrame<REGS> {
    pub const LEN: usize = 1 + WORD * REGS;

    /// Decode a frame payload. The length must match exactly.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != Self::LEN {
            return Err(DecodeError::Length {
                expected: Self::LEN,
                actual: bytes.len(),
            });
        }

        let mut values = [0u32; REGS];
        for (value, word) in values.iter_mut().zip(bytes[1..].chunks_exact(WORD)) {
            *value = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
        }

        Ok(Self {
            slot: bytes[0],
            values,
        })
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn get(&self, index: usize) -> Result<u32, DecodeError> {
        self.values
            .get(index)
            .copied()
            .ok_or(DecodeError::RegisterOutOfRange {
                index,
                count: REGS,
            })
    }

    pub fn values(&self) -> &[u32; REGS] {
        &self.values
    }
}

impl RegisterFrame<REG_COUNT> {
    pub fn register(&self, reg: Register) -> u32 {
        self.values[reg.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Register, u32)> + '_ {
        REGISTER_SET.iter().copied().zip(self.values.iter().copied())
    }
}

impl<const REGS: usize> fmt::Display for RegisterFrame<REGS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Registers (slot {}):", self.slot)?;
        for (i, value) in self.values.iter().enumerate() {
            // Frames with a foreign register count print without names.
            let name = if REGS == REG_COUNT {
                REGISTER_SET[i].name()
            } else {
                ""
            };
            writeln!(f, "  {:02} {:<3} : {:#010x}", i, name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_frame_layout() {
        let frame = WireFrame::<2>::new(0, &[0x1234_5678, 0x0000_000A]);
        assert_eq!(WireFrame::<2>::LEN, 9);
        assert_eq!(
            frame.as_bytes(),
            &[0x00, 0x12, 0x34, 0x56, 0x78, 0x00, 0x00, 0x00, 0x0A]
        );
    }

    #[test]
    fn test_default_frame_len() {
        assert_eq!(WireFrame::<REG_COUNT>::LEN, 57);
        assert_eq!(RegisterFrame::<REG_COUNT>::LEN, 57);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let err = RegisterFrame::<REG_COUNT>::decode(&[0u8; 56]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Length {
                expected: 57,
                actual: 56
            }
        );
        assert!(RegisterFrame::<REG_COUNT>::decode(&[0u8; 58]).is_err());
    }

    #[test]
    fn test_decode_big_endian() {
        let frame = RegisterFrame::<2>::decode(&[1, 0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 1, 0]).unwrap();
        assert_eq!(frame.slot(), 1);
        assert_eq!(frame.get(0), Ok(0xDEAD_BEEF));
        assert_eq!(frame.get(1), Ok(0x100));
        assert_eq!(
            frame.get(2),
            Err(DecodeError::RegisterOutOfRange { index: 2, count: 2 })
        );
    }

    #[test]
    fn test_display_names_registers() {
        let mut bytes = [0u8; 57];
        bytes[0] = 1;
        bytes[53..57].copy_from_slice(&0x2000_1FF0u32.to_be_bytes());
        let frame = RegisterFrame::<REG_COUNT>::decode(&bytes).unwrap();
        assert_eq!(frame.register(Register::Sp), 0x2000_1FF0);

        let text = std::format!("{}", frame);
        assert!(text.starts_with("Registers (slot 1):"));
        assert!(text.contains("  13 sp  : 0x20001ff0"));
        assert!(text.contains("  00 r0  : 0x00000000"));
    }
}
