pub mod listener;

use anyhow::Result;
use socket2::{SockRef, TcpKeepalive};
use std::time::Duration;
use tokio::net::{TcpStream, ToSocketAddrs};

/// Options applied to a freshly connected destination socket.
pub struct TcpConnectionOptions {
    keep_alive: Option<TcpKeepalive>,
}

impl TcpConnectionOptions {
    pub fn new() -> TcpConnectionOptions {
        TcpConnectionOptions { keep_alive: None }
    }

    pub fn set_keepalive(&mut self, keep_alive: TcpKeepalive) -> &mut TcpConnectionOptions {
        self.keep_alive = Some(keep_alive);
        self
    }

    pub fn apply_to(&self, tcp_stream: &mut TcpStream) -> Result<()> {
        let sock_ref = SockRef::from(&tcp_stream);
        if let Some(keep_alive) = &self.keep_alive {
            sock_ref.set_tcp_keepalive(keep_alive)?;
        }
        Ok(())
    }
}

impl Default for TcpConnectionOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Connects to `addr` and applies `tcp_opts` to the new socket. The caller
/// is responsible for timing the connect out, if desired.
pub async fn connect_with_opts(addr: impl ToSocketAddrs, tcp_opts: &TcpConnectionOptions) -> std::io::Result<TcpStream> {
    let mut tcp_stream = TcpStream::connect(addr).await?;
    tcp_opts.apply_to(&mut tcp_stream).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    Ok(tcp_stream)
}

/// Connects to `addr` with the default destination keepalive settings.
pub async fn connect(addr: impl ToSocketAddrs) -> std::io::Result<TcpStream> {
    let mut opts = TcpConnectionOptions::new();
    opts.set_keepalive(TcpKeepalive::new().with_time(Duration::from_secs(150)).with_interval(Duration::from_secs(30)).with_retries(5));
    connect_with_opts(addr, &opts).await
}
