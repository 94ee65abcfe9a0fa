use crate::capture::RegisterSource;
use crate::frame::WireFrame;
use crate::registers::REG_COUNT;
use crate::{InvalidSlot, TransmitError, Transport, FRAME_TAG};

/// Default number of slots.
pub const NUM_BUFFERS: usize = 2;

/// A slot index known to lie in `0..SLOTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex<const SLOTS: usize = NUM_BUFFERS>(usize);

impl<const SLOTS: usize> SlotIndex<SLOTS> {
    pub const fn new(index: usize) -> Result<Self, InvalidSlot> {
        if index < SLOTS {
            Ok(Self(index))
        } else {
            Err(InvalidSlot {
                index,
                slots: SLOTS,
            })
        }
    }

    /// Index checked at compile time: `SlotIndex::<2>::at::<2>()` does not build.
    pub const fn at<const I: usize>() -> Self {
        const { assert!(I < SLOTS, "slot index out of range") };
        Self(I)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl<const SLOTS: usize> TryFrom<usize> for SlotIndex<SLOTS> {
    type Error = InvalidSlot;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::new(index)
    }
}

/// Fixed set of register snapshots.
///
/// Every slot starts zeroed and is only ever replaced as a whole by
/// [`SnapshotStore::capture`]. Encoding and transmitting never mutate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore<const SLOTS: usize = NUM_BUFFERS, const REGS: usize = REG_COUNT> {
    slots: [[u32; REGS]; SLOTS],
}

impl<const SLOTS: usize, const REGS: usize> SnapshotStore<SLOTS, REGS> {
    // The frame header carries the slot in a single byte.
    const SLOTS_FIT_HEADER: () = assert!(SLOTS >= 1 && SLOTS <= 256, "1..=256 slots supported");

    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::SLOTS_FIT_HEADER;
        Self {
            slots: [[0; REGS]; SLOTS],
        }
    }

    pub const fn capacity(&self) -> usize {
        SLOTS
    }

    pub fn slot(&self, index: SlotIndex<SLOTS>) -> &[u32; REGS] {
        &self.slots[index.get()]
    }

    pub fn slots(&self) -> &[[u32; REGS]; SLOTS] {
        &self.slots
    }

    /// Snapshot `source` into `index`.
    ///
    /// Inlined into the caller so the only work between the caller's code and
    /// the register reads is the source's own read sequence. Interrupts that
    /// could touch the captured registers must be masked by the caller.
    #[inline(always)]
    pub fn capture<S: RegisterSource<REGS>>(&mut self, source: &mut S, index: SlotIndex<SLOTS>) {
        source.capture(&mut self.slots[index.get()]);
    }

    /// [`capture`](Self::capture) with the index checked first.
    #[inline(always)]
    pub fn capture_checked<S: RegisterSource<REGS>>(
        &mut self,
        source: &mut S,
        index: usize,
    ) -> Result<(), InvalidSlot> {
        let index = SlotIndex::new(index)?;
        self.capture(source, index);
        Ok(())
    }

    /// Serialize a slot into its wire frame.
    pub fn encode(&self, index: SlotIndex<SLOTS>) -> WireFrame<REGS> {
        // SLOTS <= 256, so the index always fits the header byte.
        let frame = WireFrame::new(index.get() as u8, self.slot(index));
        #[cfg(feature = "std")]
        tracing::trace!(slot = index.get(), len = WireFrame::<REGS>::LEN, "encoded frame");
        frame
    }

    /// Encode a slot and hand it to `transport` under [`FRAME_TAG`].
    pub fn transmit<T: Transport>(
        &self,
        transport: &mut T,
        index: SlotIndex<SLOTS>,
    ) -> Result<(), TransmitError<T::Error>> {
        let frame = self.encode(index);
        transport
            .send(FRAME_TAG, frame.as_bytes())
            .map_err(TransmitError::Transport)
    }

    pub fn transmit_checked<T: Transport>(
        &self,
        transport: &mut T,
        index: usize,
    ) -> Result<(), TransmitError<T::Error>> {
        let index = SlotIndex::new(index).inspect_err(|_e| {
            #[cfg(feature = "std")]
            tracing::debug!("rejected transmit: {}", _e);
        })?;
        self.transmit(transport, index)
    }
}

impl<const SLOTS: usize, const REGS: usize> Default for SnapshotStore<SLOTS, REGS> {
    fn default() -> Self {
        Self::new()
    }
}
