use super::{consts, AuthMethod, ReplyStatus};
use anyhow::Result;
use bytes::{BufMut, BytesMut};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::io::AsyncWriteExt;

// +----+--------+
// |VER | METHOD |
// +----+--------+
// | 1  |   1    |
// +----+--------+

#[derive(Debug, PartialEq)]
pub struct HandshakeResponse {
    selected_method: Option<AuthMethod>,
}

impl HandshakeResponse {
    pub fn new(selected_method: Option<AuthMethod>) -> HandshakeResponse {
        HandshakeResponse { selected_method }
    }

    pub async fn write_to<T: AsyncWriteExt + Unpin>(&self, stream: &mut T) -> Result<()> {
        let method = self.selected_method.map_or(consts::auth::SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE, |m| m as u8);
        stream.write_all(&[consts::SOCKS5_VERSION, method]).await?;
        Ok(())
    }
}

// +----+-----+-------+------+----------+----------+
// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
// +----+-----+-------+------+----------+----------+
// | 1  |  1  | X'00' |  1   | Variable |    2     |
// +----+-----+-------+------+----------+----------+

/// The `BND.ADDR`/`BND.PORT` pair is always `0.0.0.0:0` — a deliberate
/// simplification, never the destination's actual bound address.
const ZERO_BOUND_ADDR: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));

#[derive(Debug)]
pub struct RelayResponse {
    status: ReplyStatus,
}

impl RelayResponse {
    pub fn builder() -> RelayResponseBuilder {
        RelayResponseBuilder { status: None }
    }

    pub async fn write_to<T: AsyncWriteExt + Unpin>(&self, stream: &mut T) -> Result<()> {
        let mut bytes = BytesMut::with_capacity(10);
        bytes.put_slice(&[consts::SOCKS5_VERSION, self.status.as_u8(), 0x00]);
        crate::net::SocksAddress::Ip(ZERO_BOUND_ADDR).write_to(&mut bytes);
        debug_assert_eq!(10, bytes.len());
        stream.write_all(&bytes).await?;
        Ok(())
    }
}

pub struct RelayResponseBuilder {
    status: Option<ReplyStatus>,
}

impl RelayResponseBuilder {
    pub fn with_success(mut self) -> Self {
        self.status = Some(ReplyStatus::Succeeded);
        self
    }

    pub fn with_status(mut self, status: ReplyStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn build(self) -> RelayResponse {
        RelayResponse { status: self.status.expect("reply status must be set") }
    }
}
