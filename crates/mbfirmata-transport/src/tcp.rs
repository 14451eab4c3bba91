use std::net::TcpStream;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::BoardStream;

/// Connect to a TCP serial bridge (e.g. `ser2net`) exposing the board's UART.
pub fn connect_tcp(addr: &str) -> Result<BoardStream> {
    let stream = TcpStream::connect(addr).map_err(|source| TransportError::Connect {
        addr: addr.to_string(),
        source,
    })?;
    stream.set_nodelay(true)?;
    debug!(addr, "connected to tcp serial bridge");
    Ok(BoardStream::from_tcp(stream))
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::Duration;

    use super::*;

    #[test]
    fn roundtrip_over_loopback_bridge() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = std::thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut buf = [0u8; 3];
            conn.read_exact(&mut buf).unwrap();
            conn.write_all(&[0xF9, 0x02, 0x06]).unwrap();
            buf
        });

        let mut stream = connect_tcp(&addr).unwrap();
        assert_eq!(stream.transport_name(), "tcp");
        stream.set_timeout(Duration::from_secs(2)).unwrap();
        stream.write_all(&[0xF0, 0x79, 0xF7]).unwrap();

        let mut reply = [0u8; 3];
        stream.read_exact(&mut reply).unwrap();
        assert_eq!(reply, [0xF9, 0x02, 0x06]);
        assert_eq!(server.join().unwrap(), [0xF0, 0x79, 0xF7]);
    }

    #[test]
    fn cloned_stream_shares_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = std::thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1];
            conn.read_exact(&mut buf).unwrap();
            buf[0]
        });

        let stream = connect_tcp(&addr).unwrap();
        let mut writer = stream.try_clone().unwrap();
        writer.write_all(&[0xFF]).unwrap();
        assert_eq!(server.join().unwrap(), 0xFF);
        assert!(format!("{stream:?}").contains("tcp"));
    }

    #[test]
    fn refused_connection_reports_address() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = connect_tcp(&addr).unwrap_err();
        assert!(matches!(err, TransportError::Connect { addr: a, .. } if a == addr));
    }
}
