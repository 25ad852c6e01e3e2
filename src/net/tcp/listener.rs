use anyhow::Result;
use socket2::{Domain, Socket, Type};
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Listener wrapping a manually configured socket so `SO_REUSEADDR` and an
/// explicit backlog (`--backlog`, default 12 per the configuration) can be
/// set before the socket is handed to Tokio's reactor — `TcpListener::bind`
/// doesn't expose either knob.
pub struct ProxyTcpListener {
    inner: TcpListener,
}

impl ProxyTcpListener {
    pub async fn bind(addr: SocketAddr, backlog: i32) -> Result<ProxyTcpListener> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, None)?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.listen(backlog)?;
        socket.set_nonblocking(true)?;

        let inner = TcpListener::from_std(socket.into())?;
        Ok(ProxyTcpListener { inner })
    }

    pub async fn accept(&self) -> std::io::Result<(tokio::net::TcpStream, SocketAddr)> {
        self.inner.accept().await
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr().expect("listener always has a local address once bound")
    }
}
