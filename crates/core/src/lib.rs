//! Register snapshots for side-channel and fault-injection targets.
//!
//! Firmware captures the core registers into a slot of a [`SnapshotStore`]
//! at the instant of interest and later ships that slot to the host as a
//! tagged [`WireFrame`]. The host turns frames back into values with
//! [`RegisterFrame`].

#![cfg_attr(not(feature = "std"), no_std)]

pub mod capture;
pub mod frame;
pub mod registers;
pub mod simpleserial;
pub mod store;


pub use capture::{RegisterFile, RegisterSource};
#[cfg(target_arch = "arm")]
pub use capture::CortexM;
pub use frame::{RegisterFrame, WireFrame};
pub use registers::{Register, REGISTER_SET, REG_COUNT};
pub use store::{SlotIndex, SnapshotStore, NUM_BUFFERS};

/// Command tag register frames are sent under.
pub const FRAME_TAG: u8 = b'r';

/// A slot index outside `0..slots`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("slot {index} out of range, store has {slots} slots")]
pub struct InvalidSlot {
    pub index: usize,
    pub slots: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum TransmitError<E> {
    #[error(transparent)]
    InvalidSlot(#[from] InvalidSlot),
    #[error("transport failed: {0}")]
    Transport(E),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("frame is {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },
    #[error("register {index} does not exist, frame holds {count}")]
    RegisterOutOfRange { index: usize, count: usize },
}

/// The link that carries frames to the host.
///
/// `send` is synchronous from the caller's point of view; acknowledgement
/// and any outer envelope belong to the implementation.
pub trait Transport {
    type Error;

    fn send(&mut self, tag: u8, payload: &[u8]) -> Result<(), Self::Error>;
}
