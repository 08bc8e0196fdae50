//! One live TCP connection carrying array messages in both directions.
//!
//! The session splits into a sender and a receiver over clones of the same
//! socket, so one thread can own the write direction while another owns the
//! read direction without sharing either.

use std::io::{BufReader, BufWriter, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use tracing::debug;

use crate::array::ArrayMessage;
use crate::codec::{read_message, write_message};
use crate::error::WireError;

const STREAM_BUFFER_BYTES: usize = 64 * 1024;

/// An established connection, not yet split into its two directions.
pub struct ArraySession {
    stream: TcpStream,
}

impl ArraySession {
    /// Connect to a listening peer.
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, WireError> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        debug!(peer = %stream.peer_addr()?, "connected");
        Ok(ArraySession { stream })
    }

    /// Wrap an accepted connection.
    pub fn from_stream(stream: TcpStream) -> Result<Self, WireError> {
        stream.set_nodelay(true)?;
        Ok(ArraySession { stream })
    }

    pub fn peer_addr(&self) -> Result<SocketAddr, WireError> {
        Ok(self.stream.peer_addr()?)
    }

    /// Split into the write half and the read half. Each half owns its own
    /// clone of the socket; the connection closes once both are dropped.
    pub fn split(self) -> Result<(ArraySender, ArrayReceiver), WireError> {
        let read_stream = self.stream.try_clone()?;
        Ok((
            ArraySender {
                writer: BufWriter::with_capacity(STREAM_BUFFER_BYTES, self.stream),
            },
            ArrayReceiver {
                reader: BufReader::with_capacity(STREAM_BUFFER_BYTES, read_stream),
            },
        ))
    }
}

/// Write half of a session. One thread at a time.
pub struct ArraySender {
    writer: BufWriter<TcpStream>,
}

impl ArraySender {
    /// Queue one message. Call [`flush`](Self::flush) once the logical group
    /// (frame pair, result quadruple) is complete.
    pub fn send(&mut self, message: &ArrayMessage) -> Result<(), WireError> {
        write_message(&mut self.writer, message)
    }

    pub fn flush(&mut self) -> Result<(), WireError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Read half of a session. One thread at a time.
pub struct ArrayReceiver {
    reader: BufReader<TcpStream>,
}

impl ArrayReceiver {
    /// Block until the next complete message arrives.
    pub fn receive(&mut self) -> Result<ArrayMessage, WireError> {
        read_message(&mut self.reader)
    }
}
