//! SOCKS5 protocol implementation details.
//!
//! RFC 1928: <https://datatracker.ietf.org/doc/html/rfc1928>

use crate::common::error::ProxyError;
use crate::net::SocksAddress;
use anyhow::Result;
use bytes::BufMut;
use std::net::SocketAddr;
use tokio::io::AsyncReadExt;

pub mod request;
pub mod response;

#[cfg(test)]
mod test;

#[rustfmt::skip]
pub mod consts {
    pub const SOCKS5_VERSION: u8 = 0x05;

    pub mod auth {
        pub const SOCKS5_AUTH_METHOD_NONE: u8 = 0x00;
        pub const SOCKS5_AUTH_METHOD_GSSAPI: u8 = 0x01;
        pub const SOCKS5_AUTH_METHOD_PASSWORD: u8 = 0x02;
        pub const SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE: u8 = 0xff;
    }

    pub mod command {
        pub const SOCKS5_CMD_CONNECT: u8 = 0x01;
        pub const SOCKS5_CMD_BIND: u8 = 0x02;
        pub const SOCKS5_CMD_UDP_ASSOCIATE: u8 = 0x03;
    }

    pub mod address {
        pub const SOCKS5_ADDR_TYPE_IPV4: u8 = 0x01;
        pub const SOCKS5_ADDR_TYPE_DOMAIN_NAME: u8 = 0x03;
        pub const SOCKS5_ADDR_TYPE_IPV6: u8 = 0x04;
    }

    pub mod reply {
        pub const SOCKS5_REPLY_SUCCEEDED: u8 = 0x00;
        pub const SOCKS5_REPLY_GENERAL_FAILURE: u8 = 0x01;
        pub const SOCKS5_REPLY_CONNECTION_NOT_ALLOWED: u8 = 0x02;
        pub const SOCKS5_REPLY_NETWORK_UNREACHABLE: u8 = 0x03;
        pub const SOCKS5_REPLY_HOST_UNREACHABLE: u8 = 0x04;
        pub const SOCKS5_REPLY_CONNECTION_REFUSED: u8 = 0x05;
        pub const SOCKS5_REPLY_TTL_EXPIRED: u8 = 0x06;
        pub const SOCKS5_REPLY_COMMAND_NOT_SUPPORTED: u8 = 0x07;
        pub const SOCKS5_REPLY_ADDRESS_TYPE_NOT_SUPPORTED: u8 = 0x08;
    }
}

/// The only authentication method this proxy ever offers or accepts.
/// `GssApi`/`Password` are retained so method-selection bytes from real
/// clients parse instead of aborting the handshake outright; neither is
/// ever the negotiated method.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum AuthMethod {
    None = consts::auth::SOCKS5_AUTH_METHOD_NONE,
    GssApi = consts::auth::SOCKS5_AUTH_METHOD_GSSAPI,
    Password = consts::auth::SOCKS5_AUTH_METHOD_PASSWORD,
}

impl AuthMethod {
    pub fn from_wire(value: u8) -> Option<AuthMethod> {
        use consts::auth::*;
        match value {
            SOCKS5_AUTH_METHOD_NONE => Some(AuthMethod::None),
            SOCKS5_AUTH_METHOD_GSSAPI => Some(AuthMethod::GssApi),
            SOCKS5_AUTH_METHOD_PASSWORD => Some(AuthMethod::Password),
            _ => None,
        }
    }
}

#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Command {
    Connect = consts::command::SOCKS5_CMD_CONNECT,
    Bind = consts::command::SOCKS5_CMD_BIND,
    UdpAssociate = consts::command::SOCKS5_CMD_UDP_ASSOCIATE,
}

impl TryFrom<u8> for Command {
    type Error = ProxyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use consts::command::*;
        match value {
            SOCKS5_CMD_CONNECT => Ok(Command::Connect),
            SOCKS5_CMD_BIND => Ok(Command::Bind),
            SOCKS5_CMD_UDP_ASSOCIATE => Ok(Command::UdpAssociate),
            _ => Err(ProxyError::InvalidCommand(value)),
        }
    }
}

impl SocksAddress {
    /// Reads a `DST.ADDR`/`BND.ADDR` field. `ATYP == 0x04` (IPv6) is
    /// rejected immediately with [`ProxyError::InvalidAddressType`] without
    /// consuming the remaining 18 bytes — the connection is closed either
    /// way, so there is nothing to keep in sync.
    pub async fn read_from<T: AsyncReadExt + Unpin>(stream: &mut T) -> Result<SocksAddress, ProxyError> {
        use consts::address::*;
        let address_type = stream.read_u8().await?;

        match address_type {
            SOCKS5_ADDR_TYPE_IPV4 => SocksAddress::read_ipv4(stream).await,
            SOCKS5_ADDR_TYPE_DOMAIN_NAME => {
                let len = stream.read_u8().await?;
                SocksAddress::read_domain_name(stream, len).await
            }
            _ => Err(ProxyError::InvalidAddressType(address_type)),
        }
    }

    /// Always writes an IPv4 ATYP, hardcoded to `0.0.0.0:0` by every caller
    /// (see `RelayResponseBuilder`) — the proxy never reports a meaningful
    /// `BND.ADDR`.
    pub fn write_to<T: BufMut>(&self, buf: &mut T) {
        match self {
            SocksAddress::Ip(SocketAddr::V4(addr)) => {
                buf.put_u8(consts::address::SOCKS5_ADDR_TYPE_IPV4);
                SocksAddress::write_ipv4(buf, addr);
            }
            SocksAddress::Ip(SocketAddr::V6(_)) => unreachable!("IPv6 bound addresses are never constructed"),
            SocksAddress::Domain(..) => unreachable!("domain names are never written as a bound address"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplyStatus {
    Succeeded,
    GeneralFailure,
    ConnectionNotAllowed,
    NetworkUnreachable,
    HostUnreachable,
    ConnectionRefused,
    TtlExpired,
    CommandNotSupported,
    AddressTypeNotSupported,
}

impl ReplyStatus {
    #[rustfmt::skip]
    pub fn as_u8(self) -> u8 {
        match self {
            ReplyStatus::Succeeded               => consts::reply::SOCKS5_REPLY_SUCCEEDED,
            ReplyStatus::GeneralFailure          => consts::reply::SOCKS5_REPLY_GENERAL_FAILURE,
            ReplyStatus::ConnectionNotAllowed    => consts::reply::SOCKS5_REPLY_CONNECTION_NOT_ALLOWED,
            ReplyStatus::NetworkUnreachable      => consts::reply::SOCKS5_REPLY_NETWORK_UNREACHABLE,
            ReplyStatus::HostUnreachable         => consts::reply::SOCKS5_REPLY_HOST_UNREACHABLE,
            ReplyStatus::ConnectionRefused       => consts::reply::SOCKS5_REPLY_CONNECTION_REFUSED,
            ReplyStatus::TtlExpired              => consts::reply::SOCKS5_REPLY_TTL_EXPIRED,
            ReplyStatus::CommandNotSupported     => consts::reply::SOCKS5_REPLY_COMMAND_NOT_SUPPORTED,
            ReplyStatus::AddressTypeNotSupported => consts::reply::SOCKS5_REPLY_ADDRESS_TYPE_NOT_SUPPORTED,
        }
    }
}

/// Maps the error table in the handshake design doc onto a wire reply code.
/// Only reached for errors raised while handling the relay request — errors
/// from the greeting phase never produce a 10-byte reply.
impl From<&ProxyError> for ReplyStatus {
    fn from(err: &ProxyError) -> Self {
        match err {
            ProxyError::InvalidVersion(_) => ReplyStatus::GeneralFailure,
            ProxyError::InvalidCommand(_) => ReplyStatus::CommandNotSupported,
            ProxyError::InvalidAddressType(_) => ReplyStatus::AddressTypeNotSupported,
            ProxyError::NetworkUnreachable(_) => ReplyStatus::NetworkUnreachable,
            ProxyError::HostUnreachable(_) => ReplyStatus::HostUnreachable,
            ProxyError::ConnectionRefused(_) => ReplyStatus::ConnectionRefused,
            _ => ReplyStatus::GeneralFailure,
        }
    }
}
