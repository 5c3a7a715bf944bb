//! Framing over a [`Transport`].

use super::{decode_byte, encode_byte, hex_value, Checksum, ACK, FRAME_END, FRAME_START};
use crate::transport::Transport;

/// The stub's end of the link: a transport plus the frame-level primitives
/// built on top of it.
///
/// Inbound checksums are consumed but never checked; integrity is left to the
/// remote debugger.
pub struct Link<T> {
    transport: T,
}

impl<T: Transport> Link<T> {
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    pub(crate) fn put(&mut self, byte: u8) -> Result<(), T::Error> {
        self.transport.send_byte(byte)
    }

    pub(crate) fn get(&mut self) -> Result<u8, T::Error> {
        self.transport.receive_byte()
    }

    /// Receive one byte encoded as a hex pair.
    pub fn read_byte(&mut self) -> Result<u8, T::Error> {
        let hi = self.get()?;
        let lo = self.get()?;
        Ok(decode_byte([hi, lo]))
    }

    /// Decode `dst.len()` hex pairs into `dst`.
    pub fn recv_block(&mut self, dst: &mut [u8]) -> Result<(), T::Error> {
        for slot in dst.iter_mut() {
            *slot = self.read_byte()?;
        }
        Ok(())
    }

    /// Decode `len` hex pairs, handing each byte and its offset to `sink`.
    ///
    /// The destination is whatever `sink` writes to; nothing here bounds it.
    pub fn recv_block_with(
        &mut self,
        len: u32,
        mut sink: impl FnMut(u32, u8),
    ) -> Result<(), T::Error> {
        for offset in 0..len {
            let byte = self.read_byte()?;
            sink(offset, byte);
        }
        Ok(())
    }

    /// Accumulate hex digits into a word until `terminator` is read.
    ///
    /// The terminator is consumed. Digits beyond the eighth shift older ones out.
    pub fn read_variable_word(&mut self, terminator: u8) -> Result<u32, T::Error> {
        let mut value: u32 = 0;
        loop {
            let c = self.get()?;
            if c == terminator {
                return Ok(value);
            }
            value = (value << 4) | u32::from(hex_value(c));
        }
    }

    /// Discard bytes up to and including `terminator`.
    pub fn skip_until(&mut self, terminator: u8) -> Result<(), T::Error> {
        while self.get()? != terminator {}
        Ok(())
    }

    /// Finish an inbound frame: skip to `#`, drop the checksum, send `+`.
    pub fn acknowledge(&mut self) -> Result<(), T::Error> {
        self.skip_until(FRAME_END)?;
        self.acknowledge_trailer()
    }

    /// Like [`Link::acknowledge`] for frames whose `#` was already consumed
    /// as a field terminator.
    pub fn acknowledge_trailer(&mut self) -> Result<(), T::Error> {
        self.get()?;
        self.get()?;
        self.put(ACK)
    }

    /// Open an outbound frame.
    pub fn packet(&mut self) -> Result<PacketWriter<'_, T>, T::Error> {
        self.put(FRAME_START)?;
        Ok(PacketWriter {
            link: self,
            sum: Checksum::new(),
            len: 0,
        })
    }

    /// Send a frame carrying a literal payload (`OK`, `E01`, empty).
    pub fn send_payload(&mut self, payload: &[u8]) -> Result<(), T::Error> {
        let mut packet = self.packet()?;
        packet.raw(payload)?;
        packet.finish()
    }

    /// Send a frame whose payload is the hex encoding of `data`.
    pub fn send_block(&mut self, data: &[u8]) -> Result<(), T::Error> {
        let mut packet = self.packet()?;
        for &byte in data {
            packet.hex_byte(byte)?;
        }
        packet.finish()
    }

    /// Send a frame of `len` hex-encoded bytes pulled from `source` by offset.
    pub fn send_block_with(
        &mut self,
        len: u32,
        mut source: impl FnMut(u32) -> u8,
    ) -> Result<(), T::Error> {
        let mut packet = self.packet()?;
        for offset in 0..len {
            packet.hex_byte(source(offset))?;
        }
        packet.finish()
    }

    /// Send the `S<sig>` stop report.
    pub fn send_stop_report(&mut self, signal: u8) -> Result<(), T::Error> {
        let mut packet = self.packet()?;
        packet.raw(b"S")?;
        packet.hex_byte(signal)?;
        packet.finish()
    }
}

/// An open outbound frame. The checksum covers every character written
/// between the `$` and [`PacketWriter::finish`].
pub struct PacketWriter<'a, T> {
    link: &'a mut Link<T>,
    sum: Checksum,
    len: usize,
}

impl<T: Transport> PacketWriter<'_, T> {
    /// Write characters as-is.
    pub fn raw(&mut self, chars: &[u8]) -> Result<(), T::Error> {
        for &c in chars {
            self.link.put(c)?;
            self.sum.push(c);
        }
        self.len += chars.len();
        Ok(())
    }

    /// Write one byte as a hex pair.
    pub fn hex_byte(&mut self, byte: u8) -> Result<(), T::Error> {
        self.raw(&encode_byte(byte))
    }

    /// Payload characters written so far.
    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Close the frame with `#` and the checksum.
    pub fn finish(self) -> Result<(), T::Error> {
        let sum = self.sum.value();
        self.link.put(FRAME_END)?;
        for c in encode_byte(sum) {
            self.link.put(c)?;
        }
        log::trace!("sent frame, {} payload chars, checksum {sum:02x}", self.len);
        Ok(())
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::transport::{ScriptError, ScriptedTransport};

    fn link(input: &[u8]) -> Link<ScriptedTransport> {
        Link::new(ScriptedTransport::new(input))
    }

    #[test]
    fn test_send_block_frames_and_checksums_ascii() {
        let mut link = link(b"");
        link.send_block(&[0x01, 0xab]).unwrap();
        // '0'+'1'+'a'+'b' = 0x30+0x31+0x61+0x62 = 0x124 -> 0x24
        assert_eq!(link.transport().output(), b"$01ab#24");
    }

    #[test]
    fn test_canned_payloads() {
        let mut link = link(b"");
        link.send_payload(b"OK").unwrap();
        link.send_payload(b"").unwrap();
        link.send_payload(b"E01").unwrap();
        assert_eq!(link.transport().output(), b"$OK#9a$#00$E01#a6");
    }

    #[test]
    fn test_packet_writer_counts_payload_chars() {
        let mut link = link(b"");
        let mut packet = link.packet().unwrap();
        assert!(packet.is_empty());
        packet.raw(b"S").unwrap();
        packet.hex_byte(0x05).unwrap();
        assert_eq!(packet.len(), 3);
        packet.finish().unwrap();
        assert_eq!(link.transport().output(), b"$S05#b8");
    }

    #[test]
    fn test_stop_report() {
        let mut link = link(b"");
        link.send_stop_report(0x05).unwrap();
        assert_eq!(link.transport().output(), b"$S05#b8");
    }

    #[test]
    fn test_recv_block_reproduces_sent_payload() {
        let data = [0x00, 0x7f, 0x80, 0xff, 0x12, 0xef];
        let mut tx = link(b"");
        tx.send_block(&data).unwrap();
        let framed = tx.into_inner().take_output();
        let payload = &framed[1..framed.len() - 3];

        let mut rx = link(payload);
        let mut out = [0u8; 6];
        rx.recv_block(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_read_variable_word() {
        let mut link = link(b"1000,4#8,deadbeef:");
        assert_eq!(link.read_variable_word(b','), Ok(0x1000));
        assert_eq!(link.read_variable_word(b'#'), Ok(4));
        assert_eq!(link.read_variable_word(b','), Ok(8));
        assert_eq!(link.read_variable_word(b':'), Ok(0xdead_beef));
        assert_eq!(link.transport().remaining(), 0);
    }

    #[test]
    fn test_read_variable_word_keeps_low_eight_digits() {
        let mut link = link(b"123456789#");
        assert_eq!(link.read_variable_word(b'#'), Ok(0x2345_6789));
    }

    #[test]
    fn test_read_variable_word_empty_field_is_zero() {
        let mut link = link(b"#");
        assert_eq!(link.read_variable_word(b'#'), Ok(0));
    }

    #[test]
    fn test_acknowledge_skips_unchecked_checksum() {
        let mut link = link(b"junk#zz$");
        link.acknowledge().unwrap();
        assert_eq!(link.transport().output(), b"+");
        assert_eq!(link.transport().remaining(), 1);
    }

    #[test]
    fn test_skip_until_reports_exhausted_link() {
        let mut link = link(b"+++");
        assert_eq!(link.skip_until(b'$'), Err(ScriptError));
    }

    #[test]
    fn test_recv_block_with_offsets() {
        let mut link = link(b"0a0B");
        let mut seen = Vec::new();
        link.recv_block_with(2, |offset, byte| seen.push((offset, byte)))
            .unwrap();
        assert_eq!(seen, vec![(0, 0x0a), (1, 0x0b)]);
    }
}
