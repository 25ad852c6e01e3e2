use super::{consts, AuthMethod, Command};
use crate::{common::error::ProxyError, net::SocksAddress};
use std::collections::HashSet;
use tokio::io::AsyncReadExt;

// +----+----------+----------+
// |VER | NMETHODS | METHODS  |
// +----+----------+----------+
// | 1  |    1     | 1 to 255 |
// +----+----------+----------+

#[derive(Debug)]
pub struct HandshakeRequest {
    auth_methods: HashSet<AuthMethod>,
}

impl HandshakeRequest {
    #[cfg(test)]
    pub fn new(auth_methods: HashSet<AuthMethod>) -> HandshakeRequest {
        HandshakeRequest { auth_methods }
    }

    pub fn auth_methods(&self) -> &HashSet<AuthMethod> {
        &self.auth_methods
    }

    /// `NMETHODS == 0` is rejected immediately, matching the original's
    /// `auth_count == 0 -> goto invalid_auth` — there is nothing to read and
    /// nothing could ever be selected.
    pub async fn read_from<T: AsyncReadExt + Unpin>(stream: &mut T) -> Result<HandshakeRequest, ProxyError> {
        let mut header = [0u8; 2];
        stream.read_exact(&mut header).await?;
        let (version, nmethods) = (header[0], header[1]);

        if version != consts::SOCKS5_VERSION {
            return Err(ProxyError::InvalidVersion(version));
        }
        if nmethods == 0 {
            return Err(ProxyError::InvalidAuth);
        }

        let mut raw_methods = vec![0u8; nmethods.into()];
        stream.read_exact(&mut raw_methods).await?;

        // Unknown methods are dropped, not treated as a parse error — the
        // client may legally offer methods this proxy has never heard of.
        let auth_methods = raw_methods.iter().filter_map(|&m| AuthMethod::from_wire(m)).collect();

        Ok(HandshakeRequest { auth_methods })
    }
}

// +----+-----+-------+------+----------+----------+
// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
// +----+-----+-------+------+----------+----------+
// | 1  |  1  | X'00' |  1   | Variable |    2     |
// +----+-----+-------+------+----------+----------+

#[derive(Debug)]
pub struct RelayRequest {
    command: Command,
    target_addr: SocksAddress,
}

impl RelayRequest {
    pub fn command(&self) -> Command {
        self.command
    }

    pub fn target_addr(&self) -> &SocksAddress {
        &self.target_addr
    }

    /// The reserved byte is read but, like the original, never validated —
    /// `socks5.c` never checks it against `0x00` either. `CMD` is checked
    /// against `Connect` before `DST.ADDR` is ever read, matching
    /// `socks_establish_connection`'s precedence: a BIND/UDP-ASSOCIATE
    /// request is rejected for its command, never for whatever `ATYP` it
    /// happens to carry.
    pub async fn read_from<T: AsyncReadExt + Unpin>(stream: &mut T) -> Result<RelayRequest, ProxyError> {
        let mut header = [0u8; 3];
        stream.read_exact(&mut header).await?;
        let (version, cmd, _reserved) = (header[0], header[1], header[2]);

        if version != consts::SOCKS5_VERSION {
            return Err(ProxyError::InvalidVersion(version));
        }

        let command = Command::try_from(cmd)?;
        if command != Command::Connect {
            return Err(ProxyError::InvalidCommand(cmd));
        }

        let target_addr = SocksAddress::read_from(stream).await?;

        Ok(RelayRequest { command, target_addr })
    }
}
