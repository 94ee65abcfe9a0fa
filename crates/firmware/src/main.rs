#![no_main]
#![no_std]

use core::convert::Infallible;
use core::ptr::{read_volatile, write_volatile};

use cortex_m_rt::entry;
use cwregs_core::simpleserial::{SerialWrite, SimpleSerial};
use cwregs_core::{CortexM, SlotIndex, SnapshotStore};
use panic_halt as _;

// STM32F303 register map
const RCC_AHBENR: *mut u32 = 0x4002_1014 as *mut u32;
const RCC_APB2ENR: *mut u32 = 0x4002_1018 as *mut u32;
const GPIOA_MODER: *mut u32 = 0x4800_0000 as *mut u32;
const GPIOA_AFRH: *mut u32 = 0x4800_0024 as *mut u32;
const USART1_CR1: *mut u32 = 0x4001_3800 as *mut u32;
const USART1_BRR: *mut u32 = 0x4001_380C as *mut u32;
const USART1_ISR: *const u32 = 0x4001_381C as *const u32;
const USART1_TDR: *mut u32 = 0x4001_3828 as *mut u32;

const ISR_TXE: u32 = 1 << 7;

// Reset clock is the 8 MHz HSI.
const CLOCK_HZ: u32 = 8_000_000;
const BAUD: u32 = 38_400;

const BEFORE: SlotIndex = SlotIndex::at::<0>();
const AFTER: SlotIndex = SlotIndex::at::<1>();

/// USART1 on PA9/PA10, transmit only, polled.
struct Usart1;

impl Usart1 {
    fn init() -> Self {
        unsafe {
            // IOPAEN, USART1EN
            write_volatile(RCC_AHBENR, read_volatile(RCC_AHBENR) | (1 << 17));
            write_volatile(RCC_APB2ENR, read_volatile(RCC_APB2ENR) | (1 << 14));

            // PA9/PA10 -> AF7
            let moder = read_volatile(GPIOA_MODER) & !(0b1111 << 18);
            write_volatile(GPIOA_MODER, moder | (0b1010 << 18));
            let afrh = read_volatile(GPIOA_AFRH) & !(0xFF << 4);
            write_volatile(GPIOA_AFRH, afrh | (0x77 << 4));

            write_volatile(USART1_BRR, CLOCK_HZ / BAUD);
            // UE | RE | TE
            write_volatile(USART1_CR1, (1 << 0) | (1 << 2) | (1 << 3));
        }
        Self
    }
}

impl SerialWrite for Usart1 {
    type Error = Infallible;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        unsafe {
            while read_volatile(USART1_ISR) & ISR_TXE == 0 {}
            write_volatile(USART1_TDR, u32::from(byte));
        }
        Ok(())
    }
}

/// Stand-in for the code under measurement.
#[inline(never)]
fn target_operation(seed: u32) -> u32 {
    let mut acc = core::hint::black_box(seed);
    for i in 0..16u32 {
        acc = acc.rotate_left(5) ^ i.wrapping_mul(0x9E37_79B9);
    }
    acc
}

#[entry]
fn main() -> ! {
    let mut link = SimpleSerial::new(Usart1::init());
    let mut store: SnapshotStore = SnapshotStore::new();
    let mut cpu = CortexM;
    let mut seed = 0u32;

    loop {
        // Nothing may run between the captures and the code they bracket.
        cortex_m::interrupt::free(|_| {
            store.capture(&mut cpu, BEFORE);
            seed = target_operation(seed);
            store.capture(&mut cpu, AFTER);
        });

        for slot in [BEFORE, AFTER] {
            store
                .transmit(&mut link, slot)
                .expect("register frame fits a SimpleSerial packet");
        }

        cortex_m::asm::delay(CLOCK_HZ);
    }
}
