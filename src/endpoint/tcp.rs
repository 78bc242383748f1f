//! TCP relay framing
//!
//! Outbound frames bundle the authentication greeting, the CONNECT request
//! and the first length-prefixed payload chunk into one write. Inbound
//! parsing consumes the method selection, the reply header and the
//! length-prefixed payload from a stream that may deliver bytes in
//! arbitrarily small fragments.

use bytes::{BufMut, Bytes, BytesMut};
use log::trace;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::socks5::{consts, Error, Reply};

use super::Socks5Endpoint;

/// Greeting (3) + request VER/CMD/RSV (3) + payload length prefix (2)
const TCP_WRAP_OVERHEAD: usize = 8;

impl Socks5Endpoint {
    /// Build the combined greeting + CONNECT request + length-prefixed
    /// payload frame
    ///
    /// ```plain
    /// +----+----------+--------+----+-----+-----+------+-----+---------+
    /// |VER | NMETHODS | METHOD |VER | CMD | RSV | DST  | LEN | PAYLOAD |
    /// +----+----------+--------+----+-----+-----+------+-----+---------+
    /// | 1  |    1     |   1    | 1  |  1  |  1  | Var. |  2  |   LEN   |
    /// +----+----------+--------+----+-----+-----+------+-----+---------+
    /// ```
    ///
    /// The payload length must fit the 2-byte prefix, so payloads of 65536
    /// bytes or more fail with [`Error::PayloadTooLarge`].
    pub fn tcp_wrap(&self, payload: &[u8]) -> Result<Bytes, Error> {
        if payload.len() >= 0x1_0000 {
            return Err(Error::PayloadTooLarge(payload.len()));
        }

        let mut buf = BytesMut::with_capacity(TCP_WRAP_OVERHEAD + self.dest.len() + payload.len());
        buf.put_slice(&[
            consts::SOCKS5_VERSION,
            0x01, // nmethods
            consts::SOCKS5_AUTH_METHOD_NONE,
        ]);
        buf.put_slice(&[consts::SOCKS5_VERSION, consts::SOCKS5_CMD_TCP_CONNECT, 0x00]);
        buf.put_slice(&self.dest);
        buf.put_u16(payload.len() as u16);
        buf.put_slice(payload);
        Ok(buf.freeze())
    }

    /// Parse the method selection, reply header and length-prefixed payload
    /// from `stream`, returning exactly the payload bytes
    ///
    /// `size` is the maximum payload length the caller is prepared to
    /// accept; a server declaring more fails with [`Error::BufferTooSmall`].
    ///
    /// The parse suspends whenever the next required byte has not arrived
    /// yet and resumes where it left off, so fragment boundaries anywhere
    /// in the frame are handled uniformly. A stream that ends early fails
    /// with [`Error::UnexpectedEof`].
    pub async fn tcp_unwrap<R>(&self, stream: &mut R, size: usize) -> Result<Bytes, Error>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = self.tcp_receive_buffer(size);

        // VER METHOD of the method selection message
        read_until(stream, &mut buf, 2).await?;
        if buf[0] != consts::SOCKS5_VERSION {
            return Err(Error::ProtocolVersionMismatch(buf[0]));
        }
        if buf[1] != consts::SOCKS5_AUTH_METHOD_NONE {
            return Err(Error::UnsupportedAuthMethod(buf[1]));
        }

        // VER REP RSV ATYP of the reply header
        read_until(stream, &mut buf, 6).await?;
        if buf[2] != consts::SOCKS5_VERSION {
            return Err(Error::ProtocolVersionMismatch(buf[2]));
        }
        if buf[3] != consts::SOCKS5_REPLY_SUCCEEDED {
            return Err(Error::ServerRejected(Reply::from_u8(buf[3])));
        }

        // BND.ADDR length, the domain form carries its own length byte
        let addr_len = match buf[5] {
            consts::SOCKS5_ADDR_TYPE_IPV4 => 4,
            consts::SOCKS5_ADDR_TYPE_IPV6 => 16,
            consts::SOCKS5_ADDR_TYPE_DOMAIN_NAME => {
                read_until(stream, &mut buf, 7).await?;
                1 + buf[6] as usize
            }
            atyp => return Err(Error::UnsupportedAddressType(atyp)),
        };

        // method selection (2) + VER REP RSV ATYP (4) + BND.ADDR + BND.PORT (2)
        let data_offset = 6 + addr_len + 2;
        read_until(stream, &mut buf, data_offset + 2).await?;

        let data_length = u16::from_be_bytes([buf[data_offset], buf[data_offset + 1]]) as usize;
        if data_length > size {
            return Err(Error::BufferTooSmall {
                payload: data_length,
                capacity: size,
            });
        }

        // The payload read must stop at the frame boundary, bytes after it
        // belong to the next frame
        let data_end = data_offset + 2 + data_length;
        if buf.len() < data_end {
            let mut remaining = stream.take((data_end - buf.len()) as u64);
            read_until(&mut remaining, &mut buf, data_end).await?;
        }

        trace!(
            "unwrapped TCP response, atyp {:#x}, payload {} bytes",
            buf[5],
            data_length
        );

        let mut frame = buf.freeze();
        let _ = frame.split_to(data_offset + 2);
        frame.truncate(data_length);
        Ok(frame)
    }
}

/// Read from `stream` until at least `till` bytes are buffered
///
/// Bytes already buffered are never touched again; each pass appends
/// whatever the stream has ready and suspends in `read_buf` when nothing
/// is available yet.
async fn read_until<R>(stream: &mut R, buf: &mut BytesMut, till: usize) -> Result<(), Error>
where
    R: AsyncRead + Unpin,
{
    while buf.len() < till {
        if stream.read_buf(buf).await? == 0 {
            return Err(Error::UnexpectedEof);
        }
    }
    Ok(())
}
