//! SimpleSerial v1 framing.
//!
//! A packet is the command tag as one ASCII character, each payload byte as
//! two upper-case hex digits, and a terminating `'\n'`.

use crate::Transport;

/// Longest payload a v1 packet can announce.
pub const MAX_PAYLOAD: usize = 255;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Byte-at-a-time output, usually a polled UART.
pub trait SerialWrite {
    type Error;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;
}

#[cfg(feature = "std")]
impl SerialWrite for std::vec::Vec<u8> {
    type Error = core::convert::Infallible;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.push(byte);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SimpleSerialError<E> {
    #[error("payload of {0} bytes exceeds the 255 byte limit")]
    PayloadTooLong(usize),
    #[error("serial port error: {0:?}")]
    Port(E),
}

/// [`Transport`] that writes SimpleSerial v1 packets to a port.
#[derive(Debug)]
pub struct SimpleSerial<W> {
    port: W,
}

impl<W: SerialWrite> SimpleSerial<W> {
    pub fn new(port: W) -> Self {
        Self { port }
    }

    pub fn port(&self) -> &W {
        &self.port
    }

    pub fn into_inner(self) -> W {
        self.port
    }
}

impl<W: SerialWrite> Transport for SimpleSerial<W> {
    type Error = SimpleSerialError<W::Error>;

    fn send(&mut self, tag: u8, payload: &[u8]) -> Result<(), Self::Error> {
        if payload.len() > MAX_PAYLOAD {
            return Err(SimpleSerialError::PayloadTooLong(payload.len()));
        }

        self.port.write_byte(tag).map_err(SimpleSerialError::Port)?;
        for &byte in payload {
            self.port
                .write_byte(HEX[usize::from(byte >> 4)])
                .map_err(SimpleSerialError::Port)?;
            self.port
                .write_byte(HEX[usize::from(byte & 0x0F)])
                .map_err(SimpleSerialError::Port)?;
        }
        self.port.write_byte(b'\n').map_err(SimpleSerialError::Port)
    }
}

#[cfg(feature = "std")]
pub use host::{parse_line, Packet, PacketError};

#[cfg(feature = "std")]
mod host {
    use std::vec::Vec;

    /// A packet read back from a capture log.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Packet {
        pub tag: u8,
        pub data: Vec<u8>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    pub enum PacketError {
        #[error("empty line")]
        Empty,
        #[error("tag {0:?} is not a printable ASCII character")]
        BadTag(char),
        #[error("odd number of hex digits ({0})")]
        OddLength(usize),
        #[error("invalid hex digit {0:?}")]
        BadDigit(char),
    }

    /// Parse one line of SimpleSerial v1 output.
    ///
    /// Hex digits are accepted in either case and the line terminator is
    /// optional.
    pub fn parse_line(line: &str) -> Result<Packet, PacketError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut chars = line.chars();
        let tag = chars.next().ok_or(PacketError::Empty)?;
        if !tag.is_ascii_graphic() {
            return Err(PacketError::BadTag(tag));
        }

        let digits = chars.as_str();
        if let Some(c) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(PacketError::BadDigit(c));
        }
        // All ASCII from here on, so bytes and digits coincide.
        if digits.len() % 2 != 0 {
            return Err(PacketError::OddLength(digits.len()));
        }

        let nibble = |b: u8| (b as char).to_digit(16).unwrap_or(0);
        let data = digits
            .as_bytes()
            .chunks_exact(2)
            .map(|pair| ((nibble(pair[0]) << 4) | nibble(pair[1])) as u8)
            .collect();

        Ok(Packet {
            tag: tag as u8,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_hex_encodes_payload() {
        let mut serial = SimpleSerial::new(Vec::new());
        serial.send(b'r', &[0x00, 0x12, 0xAB, 0xFF]).unwrap();
        assert_eq!(serial.port().as_slice(), b"r0012ABFF\n");
    }

    #[test]
    fn test_send_rejects_oversized_payload() {
        let mut serial = SimpleSerial::new(Vec::new());
        let err = serial.send(b'r', &[0u8; MAX_PAYLOAD + 1]).unwrap_err();
        assert_eq!(err, SimpleSerialError::PayloadTooLong(256));
        assert!(serial.into_inner().is_empty());
    }

    #[test]
    fn test_port_error_propagates() {
        struct Broken;
        impl SerialWrite for Broken {
            type Error = &'static str;
            fn write_byte(&mut self, _byte: u8) -> Result<(), Self::Error> {
                Err("tx stuck")
            }
        }

        let mut serial = SimpleSerial::new(Broken);
        assert_eq!(
            serial.send(b'r', &[1]),
            Err(SimpleSerialError::Port("tx stuck"))
        );
    }

    #[test]
    fn test_parse_line() {
        let packet = parse_line("r0012abFF\r\n").unwrap();
        assert_eq!(packet.tag, b'r');
        assert_eq!(packet.data, vec![0x00, 0x12, 0xAB, 0xFF]);

        assert_eq!(parse_line("z00").unwrap().data, vec![0]);
        assert_eq!(parse_line("r").unwrap().data, Vec::<u8>::new());
        assert_eq!(parse_line(""), Err(PacketError::Empty));
        assert_eq!(parse_line("r001"), Err(PacketError::OddLength(3)));
        assert_eq!(parse_line("r0G"), Err(PacketError::BadDigit('G')));
    }

    #[test]
    fn test_parse_line_rejects_non_ascii() {
        assert_eq!(parse_line("ré"), Err(PacketError::BadDigit('é')));
        assert_eq!(parse_line("r00é"), Err(PacketError::BadDigit('é')));
        assert_eq!(parse_line("r0é0"), Err(PacketError::BadDigit('é')));
        assert_eq!(parse_line("r00 11"), Err(PacketError::BadDigit(' ')));
    }
}
