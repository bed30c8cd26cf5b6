use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Binds the server socket.
///
/// `*` listens on every interface: IPv6 dual-stack when available, otherwise
/// IPv4 only.
pub async fn create_listener(host: &str, port: u16) -> std::io::Result<(String, TcpListener)> {
    if host != "*" {
        let addr = format!("{}:{}", host, port);
        info!("Attempting to bind server to {}...", addr);
        let listener = TcpListener::bind(&addr).await?;
        return Ok((addr, listener));
    }

    let v6 = SocketAddr::from((Ipv6Addr::UNSPECIFIED, port));
    info!("Attempting to bind server to {}... (IPv6 + IPv4 dual-stack)", v6);
    match bind_wildcard(v6) {
        Ok(listener) => Ok((v6.to_string(), listener)),
        Err(e) => {
            warn!("Failed to bind IPv6 listener: {}. Attempting IPv4 only.", e);
            let v4 = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
            info!("Attempting to bind server to {}... (IPv4)", v4);
            Ok((v4.to_string(), bind_wildcard(v4)?))
        }
    }
}

fn bind_wildcard(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;

    if addr.is_ipv6() {
        // Some systems refuse dual-stack but still serve IPv6
        if let Err(e) = socket.set_only_v6(false) {
            warn!("Failed to enable dual-stack mode: {}. Continuing anyway.", e);
        }
    }

    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;

    TcpListener::from_std(socket.into())
}
