//! Minimal debugger-side client for scripting and tests.
//!
//! Unlike the stub, the client checks every reply checksum.

use std::io::{self, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use tether_core::codec::{checksum, ACK, FRAME_END, FRAME_START};
use tether_core::transport::BREAK_CHAR;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("stub closed the connection")]
    Closed,
    #[error("expected acknowledge, got 0x{0:02X}")]
    NoAck(u8),
    #[error("reply checksum mismatch: computed {computed:02x}, received {received:02x}")]
    Checksum { computed: u8, received: u8 },
    #[error("malformed reply {0:?}")]
    Malformed(String),
    #[error("invalid hex in reply: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Connection to a running stub.
pub struct StubClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    initial_stop: String,
}

impl StubClient {
    /// Connect and consume the stop report the stub sends on attach.
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let writer = TcpStream::connect(addr)?;
        writer.set_nodelay(true)?;
        let reader = BufReader::new(writer.try_clone()?);
        let mut client = Self {
            reader,
            writer,
            initial_stop: String::new(),
        };
        client.initial_stop = client.read_frame()?;
        Ok(client)
    }

    /// The stop report received on connect, e.g. `S05`.
    pub fn initial_stop(&self) -> &str {
        &self.initial_stop
    }

    /// Send a command and return its reply payload.
    pub fn request(&mut self, payload: &str) -> Result<String, ClientError> {
        self.send_frame(payload)?;
        self.expect_ack()?;
        self.read_frame()
    }

    /// Send `c` or `s`; the stub replies only when the target halts again.
    pub fn send_resume(&mut self, payload: &str) -> Result<(), ClientError> {
        self.send_frame(payload)?;
        self.expect_ack()
    }

    /// Wait for the next stop report.
    pub fn wait_stop(&mut self) -> Result<String, ClientError> {
        self.read_frame()
    }

    /// Interrupt a running target.
    pub fn interrupt(&mut self) -> Result<(), ClientError> {
        self.writer.write_all(&[BREAK_CHAR])?;
        Ok(())
    }

    pub fn read_memory(&mut self, address: u32, length: u32) -> Result<Vec<u8>, ClientError> {
        let reply = self.request(&format!("m{address:x},{length:x}"))?;
        Ok(hex::decode(reply)?)
    }

    pub fn write_memory(&mut self, address: u32, data: &[u8]) -> Result<(), ClientError> {
        let payload = format!("M{address:x},{:x}:{}", data.len(), hex::encode(data));
        self.expect_ok(&payload)
    }

    /// Raw register snapshot, little-endian words.
    pub fn read_registers(&mut self) -> Result<Vec<u32>, ClientError> {
        let bytes = hex::decode(self.request("g")?)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    pub fn write_register(&mut self, index: u32, value: u32) -> Result<(), ClientError> {
        let wire = hex::encode(value.to_le_bytes());
        self.expect_ok(&format!("P{index:x}={wire}"))
    }

    /// Returns `false` when the stub refused the breakpoint.
    pub fn set_breakpoint(&mut self, address: u32) -> Result<bool, ClientError> {
        match self.request(&format!("Z0,{address:x},4"))?.as_str() {
            "OK" => Ok(true),
            "E01" => Ok(false),
            other => Err(ClientError::Malformed(other.to_string())),
        }
    }

    pub fn clear_breakpoint(&mut self, address: u32) -> Result<(), ClientError> {
        self.expect_ok(&format!("z0,{address:x},4"))
    }

    fn expect_ok(&mut self, payload: &str) -> Result<(), ClientError> {
        match self.request(payload)?.as_str() {
            "OK" => Ok(()),
            other => Err(ClientError::Malformed(other.to_string())),
        }
    }

    fn send_frame(&mut self, payload: &str) -> Result<(), ClientError> {
        let frame = format!("${payload}#{:02x}", checksum(payload.as_bytes()));
        self.writer.write_all(frame.as_bytes())?;
        log::trace!("-> {payload}");
        Ok(())
    }

    fn next_byte(&mut self) -> Result<u8, ClientError> {
        let mut byte = [0u8; 1];
        match self.reader.read(&mut byte)? {
            0 => Err(ClientError::Closed),
            _ => Ok(byte[0]),
        }
    }

    fn expect_ack(&mut self) -> Result<(), ClientError> {
        match self.next_byte()? {
            ACK => Ok(()),
            other => Err(ClientError::NoAck(other)),
        }
    }

    fn read_frame(&mut self) -> Result<String, ClientError> {
        while self.next_byte()? != FRAME_START {}
        let mut payload = Vec::new();
        loop {
            match self.next_byte()? {
                FRAME_END => break,
                c => payload.push(c),
            }
        }
        let digits = [self.next_byte()?, self.next_byte()?];
        let digits = std::str::from_utf8(&digits)
            .map_err(|_| ClientError::Malformed(String::from_utf8_lossy(&payload).into_owned()))?;
        let received = u8::from_str_radix(digits, 16)
            .map_err(|_| ClientError::Malformed(digits.to_string()))?;
        let computed = checksum(&payload);
        if computed != received {
            return Err(ClientError::Checksum { computed, received });
        }
        self.writer.write_all(&[ACK])?;

        let payload = String::from_utf8(payload)
            .map_err(|e| ClientError::Malformed(String::from_utf8_lossy(e.as_bytes()).into_owned()))?;
        log::trace!("<- {payload}");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned conversation and return what the client sent.
    fn fake_stub(script: &'static [u8], expect: usize) -> (std::net::SocketAddr, thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(script).unwrap();
            let mut received = vec![0u8; expect];
            stream.read_exact(&mut received).unwrap();
            received
        });
        (addr, handle)
    }

    #[test]
    fn test_request_round_trip() {
        let (addr, handle) = fake_stub(b"$S05#b8+$OK#9a", b"+$D#44+".len());
        let mut client = StubClient::connect(addr).unwrap();
        assert_eq!(client.initial_stop(), "S05");
        assert_eq!(client.request("D").unwrap(), "OK");
        assert_eq!(handle.join().unwrap(), b"+$D#44+");
    }

    #[test]
    fn test_bad_checksum_is_rejected() {
        let (addr, _handle) = fake_stub(b"$S05#00", 0);
        assert!(matches!(
            StubClient::connect(addr),
            Err(ClientError::Checksum {
                computed: 0xb8,
                received: 0x00
            })
        ));
    }

    #[test]
    fn test_table_full_reply() {
        let (addr, handle) = fake_stub(b"$S05#b8+$E01#a6", b"+$Z0,8000,4#00+".len());
        let mut client = StubClient::connect(addr).unwrap();
        assert!(!client.set_breakpoint(0x8000).unwrap());
        assert!(handle.join().unwrap().starts_with(b"+$Z0,8000,4#"));
    }
}
