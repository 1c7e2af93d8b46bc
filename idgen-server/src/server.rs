use std::io::{self, BufReader, ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use idgen_proto::engine::Registry;
use idgen_proto::protocol::{read_request, ProtocolError};

use crate::dispatch::dispatch;

/// Binds `addr` and serves connections until the listener itself fails.
/// A transient accept error is logged and retried after a second, mirroring
/// the original engine's back-off; anything else is fatal and returned to
/// the caller.
pub fn serve(addr: SocketAddr, idle_timeout: Duration, registry: Arc<Registry>) -> io::Result<()> {
    let listener = TcpListener::bind(addr)?;

    loop {
        match listener.accept() {
            Ok((stream, peer)) => {
                log::info!("accepted connection from {peer}");
                let registry = Arc::clone(&registry);
                thread::spawn(move || handle_connection(stream, idle_timeout, &registry));
            }
            Err(e) if is_temporary(&e) => {
                log::warn!("temporary accept error: {e}");
                thread::sleep(Duration::from_secs(1));
            }
            Err(e) => return Err(e),
        }
    }
}

/// Services one connection until the peer disconnects, sends a framing error
/// a reply can't recover from, or an I/O error other than a read timeout
/// occurs. The read deadline is refreshed before every request so an idle
/// peer is dropped after `idle_timeout`, not after `idle_timeout` measured
/// from connection start.
fn handle_connection(stream: TcpStream, idle_timeout: Duration, registry: &Registry) {
    let peer = stream.peer_addr().ok();
    let mut writer = match stream.try_clone() {
        Ok(w) => w,
        Err(e) => {
            log::warn!("failed to clone connection for {peer:?}: {e}");
            return;
        }
    };
    let mut reader = BufReader::new(stream);

    loop {
        if let Err(e) = reader.get_ref().set_read_timeout(Some(idle_timeout)) {
            log::warn!("failed to set read timeout for {peer:?}: {e}");
            return;
        }

        let request = match read_request(&mut reader) {
            Ok(request) => request,
            Err(ProtocolError::Format) => {
                log::debug!("framing error from {peer:?}, dropping malformed request");
                continue;
            }
            Err(ProtocolError::Io(e)) if is_timeout(&e) => continue,
            Err(ProtocolError::Io(e)) => {
                log::debug!("connection from {peer:?} closed: {e}");
                return;
            }
        };

        if request.is_empty() {
            log::debug!("empty request from {peer:?}, closing connection");
            return;
        }

        let reply = dispatch(registry, &request).encode();
        if let Err(e) = writer.write_all(&reply) {
            log::debug!("failed to write reply to {peer:?}: {e}");
            return;
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

fn is_temporary(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionRefused | ErrorKind::ConnectionAborted | ErrorKind::Interrupted
    )
}
