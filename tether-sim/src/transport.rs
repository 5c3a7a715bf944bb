//! TCP link to the debugger.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::io::{self, BufWriter, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::thread;
use tether_core::transport::BREAK_CHAR;
use tether_core::Transport;

use crate::cpu::BreakPoll;

/// Transport over a TCP connection.
///
/// A reader thread feeds received bytes into a channel, which lets the
/// simulated CPU poll for the break character without blocking. Output is
/// buffered and flushed whenever the stub waits for input or resumes.
pub struct TcpTransport {
    writer: BufWriter<TcpStream>,
    rx: Receiver<u8>,
    break_armed: bool,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        stream.set_nodelay(true)?;
        let reader = stream.try_clone()?;
        let (tx, rx) = crossbeam_channel::unbounded();
        thread::Builder::new()
            .name("tether-link-rx".to_string())
            .spawn(move || pump(reader, &tx))?;

        Ok(Self {
            writer: BufWriter::new(stream),
            rx,
            break_armed: false,
        })
    }

    fn flush_quietly(&mut self) {
        if let Err(e) = self.writer.flush() {
            log::warn!("Failed to flush link: {e}");
        }
    }
}

fn disconnected() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "debugger disconnected")
}

fn pump(mut stream: TcpStream, tx: &Sender<u8>) {
    let mut buf = [0u8; 512];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                for &byte in &buf[..n] {
                    if tx.send(byte).is_err() {
                        return;
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                log::debug!("Link read failed: {e}");
                break;
            }
        }
    }
    log::debug!("Link reader finished");
}

impl Transport for TcpTransport {
    type Error = io::Error;

    fn send_byte(&mut self, byte: u8) -> io::Result<()> {
        self.writer.write_all(&[byte])
    }

    fn receive_byte(&mut self) -> io::Result<u8> {
        self.writer.flush()?;
        self.rx.recv().map_err(|_| disconnected())
    }

    fn enable_break_detection(&mut self) {
        self.flush_quietly();
        self.break_armed = true;
    }

    fn disable_break_detection(&mut self) {
        self.break_armed = false;
    }
}

impl BreakPoll for TcpTransport {
    fn poll_break(&mut self) -> io::Result<bool> {
        if !self.break_armed {
            return Ok(false);
        }
        loop {
            match self.rx.try_recv() {
                Ok(BREAK_CHAR) => return Ok(true),
                Ok(other) => log::trace!("Dropping 0x{other:02X} received while running"),
                Err(TryRecvError::Empty) => return Ok(false),
                Err(TryRecvError::Disconnected) => return Err(disconnected()),
            }
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.flush_quietly();
        let _ = self.writer.get_ref().shutdown(Shutdown::Both);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn pair() -> (TcpTransport, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let peer = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (stream, _) = listener.accept().unwrap();
        (TcpTransport::new(stream).unwrap(), peer)
    }

    #[test]
    fn test_bytes_flow_both_ways() {
        let (mut link, mut peer) = pair();
        peer.write_all(b"$?").unwrap();
        assert_eq!(link.receive_byte().unwrap(), b'$');
        assert_eq!(link.receive_byte().unwrap(), b'?');

        link.send_byte(b'+').unwrap();
        // Output is flushed when the stub next waits for input.
        peer.write_all(b"x").unwrap();
        assert_eq!(link.receive_byte().unwrap(), b'x');
        let mut ack = [0u8; 1];
        peer.read_exact(&mut ack).unwrap();
        assert_eq!(&ack, b"+");
    }

    #[test]
    fn test_break_only_seen_when_armed() {
        let (mut link, mut peer) = pair();
        peer.write_all(&[b'+', BREAK_CHAR]).unwrap();
        assert!(!link.poll_break().unwrap());

        link.enable_break_detection();
        let mut seen = false;
        for _ in 0..200 {
            if link.poll_break().unwrap() {
                seen = true;
                break;
            }
            thread::sleep(std::time::Duration::from_millis(5));
        }
        assert!(seen);
    }

    #[test]
    fn test_peer_close_is_an_error() {
        let (mut link, peer) = pair();
        drop(peer);
        assert!(link.receive_byte().is_err());
    }
}
