use crate::registers::{Register, REG_COUNT};

/// Something whose registers can be snapshotted.
///
/// Implementations write every register of the set into `dst`, in set
/// order, as one flat sequence of reads and stores: no loops, no calls and
/// nothing that moves the stack pointer between reads.
pub trait RegisterSource<const REGS: usize> {
    fn capture(&mut self, dst: &mut [u32; REGS]);
}

/// Fixed values, replayed as-is.
impl<const N: usize> RegisterSource<N> for [u32; N] {
    #[inline(always)]
    fn capture(&mut self, dst: &mut [u32; N]) {
        *dst = *self;
    }
}

/// The live core registers of an ARMv7-M (Thumb-2) CPU.
///
/// r0-r12 go out with a single `stm` and sp with one `str`, both addressed
/// through lr. lr is outside the captured set, so every captured register
/// keeps its value up to the store.
#[cfg(target_arch = "arm")]
#[derive(Debug, Default, Clone, Copy)]
pub struct CortexM;

#[cfg(target_arch = "arm")]
impl RegisterSource<REG_COUNT> for CortexM {
    #[inline(always)]
    fn capture(&mut self, dst: &mut [u32; REG_COUNT]) {
        // SAFETY: `dst` is an exclusive, word-aligned buffer of REG_COUNT words
        // and the stores below stay within it (13 words at 0, one at 52). No
        // other memory, flags or stack are touched.
        unsafe {
            core::arch::asm!(
                "stm lr, {{r0-r12}}",
                "str sp, [lr, #52]",
                in("lr") dst.as_mut_ptr(),
                options(nostack, preserves_flags),
            );
        }
    }
}

/// A register file held in memory, for simulated targets and host tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFile {
    pub r0: u32,
    pub r1: u32,
    pub r2: u32,
    pub r3: u32,
    pub r4: u32,
    pub r5: u32,
    pub r6: u32,
    pub r7: u32,
    pub r8: u32,
    pub r9: u32,
    pub r10: u32,
    pub r11: u32,
    pub r12: u32,
    pub sp: u32, // R13
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, reg: Register) -> u32 {
        match reg {
            Register::R0 => self.r0,
            Register::R1 => self.r1,
            Register::R2 => self.r2,
            Register::R3 => self.r3,
            Register::R4 => self.r4,
            Register::R5 => self.r5,
            Register::R6 => self.r6,
            Register::R7 => self.r7,
            Register::R8 => self.r8,
            Register::R9 => self.r9,
            Register::R10 => self.r10,
            Register::R11 => self.r11,
            Register::R12 => self.r12,
            Register::Sp => self.sp,
        }
    }

    pub fn write(&mut self, reg: Register, value: u32) {
        match reg {
            Register::R0 => self.r0 = value,
            Register::R1 => self.r1 = value,
            Register::R2 => self.r2 = value,
            Register::R3 => self.r3 = value,
            Register::R4 => self.r4 = value,
            Register::R5 => self.r5 = value,
            Register::R6 => self.r6 = value,
            Register::R7 => self.r7 = value,
            Register::R8 => self.r8 = value,
            Register::R9 => self.r9 = value,
            Register::R10 => self.r10 = value,
            Register::R11 => self.r11 = value,
            Register::R12 => self.r12 = value,
            Register::Sp => self.sp = value,
        }
    }
}

impl RegisterSource<REG_COUNT> for RegisterFile {
    #[inline(always)]
    fn capture(&mut self, dst: &mut [u32; REG_COUNT]) {
        *dst = [
            self.r0, self.r1, self.r2, self.r3, self.r4, self.r5, self.r6, self.r7, self.r8,
            self.r9, self.r10, self.r11, self.r12, self.sp,
        ];
    }
}
