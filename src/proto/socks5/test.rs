use crate::{
    common::error::ProxyError,
    net::{ipv4_socket_address, SocksAddress},
    proto::socks5::{
        consts::*,
        request::{HandshakeRequest, RelayRequest},
        response::{HandshakeResponse, RelayResponse},
        AuthMethod, Command, ReplyStatus,
    },
};
use pretty_assertions::assert_eq;
use std::{collections::HashSet, net::Ipv4Addr};

#[tokio::test]
#[rustfmt::skip]
async fn rw_handshake_messages() {
    let mut read_stream = tokio_test::io::Builder::new()
        .read(&[
            SOCKS5_VERSION, 3,
            auth::SOCKS5_AUTH_METHOD_PASSWORD, auth::SOCKS5_AUTH_METHOD_GSSAPI, auth::SOCKS5_AUTH_METHOD_NONE,
        ])
        .read(&[SOCKS5_VERSION, 0]) // NMETHODS == 0
        .build();

    let request = HandshakeRequest::read_from(&mut read_stream).await.expect("handshake request should parse");
    assert_eq!(
        &HashSet::from([AuthMethod::Password, AuthMethod::GssApi, AuthMethod::None]),
        request.auth_methods(),
    );

    match HandshakeRequest::read_from(&mut read_stream).await {
        Err(ProxyError::InvalidAuth) => {}
        other => panic!("expected InvalidAuth for NMETHODS == 0, got {other:?}"),
    }

    let mut write_stream = tokio_test::io::Builder::new()
        .write(&[SOCKS5_VERSION, auth::SOCKS5_AUTH_METHOD_NONE])
        .write(&[SOCKS5_VERSION, auth::SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE])
        .build();

    HandshakeResponse::new(Some(AuthMethod::None)).write_to(&mut write_stream).await.expect("should write");
    HandshakeResponse::new(None).write_to(&mut write_stream).await.expect("should write");
}

#[tokio::test]
#[rustfmt::skip]
async fn handshake_unknown_methods_are_dropped_not_rejected() {
    let mut stream = tokio_test::io::Builder::new()
        .read(&[SOCKS5_VERSION, 1, 0x7f]) // unrecognized method byte
        .build();

    let request = HandshakeRequest::read_from(&mut stream).await.expect("should still parse");
    assert!(request.auth_methods().is_empty());
}

#[tokio::test]
#[rustfmt::skip]
async fn rw_relay_messages() {
    let mut read_stream = tokio_test::io::Builder::new()
        .read(&[
            SOCKS5_VERSION, command::SOCKS5_CMD_CONNECT, 0x00, address::SOCKS5_ADDR_TYPE_IPV4,
            127, 0, 0, 1, 10, 10,
        ])
        .read(&[SOCKS5_VERSION, 0xff, 0x00]) // unsupported command
        .build();

    let request = RelayRequest::read_from(&mut read_stream).await.expect("relay request should parse");
    assert_eq!(Command::Connect, request.command());
    assert_eq!(&ipv4_socket_address!(Ipv4Addr::new(127, 0, 0, 1), 2570), request.target_addr());

    match RelayRequest::read_from(&mut read_stream).await {
        Err(ProxyError::InvalidCommand(0xff)) => {}
        other => panic!("expected InvalidCommand(0xff), got {other:?}"),
    }

    let mut write_stream = tokio_test::io::Builder::new()
        .write(&[SOCKS5_VERSION, reply::SOCKS5_REPLY_SUCCEEDED, 0x00, address::SOCKS5_ADDR_TYPE_IPV4, 0, 0, 0, 0, 0, 0])
        .build();

    RelayResponse::builder().with_success().build().write_to(&mut write_stream).await.expect("should write");
}

/// `CMD` must be checked before `ATYP`: a BIND request carrying an IPv6
/// address is rejected for its command, never for its address type, so the
/// 18 trailing IPv6 address/port bytes are never read off the stream.
#[tokio::test]
#[rustfmt::skip]
async fn command_is_rejected_before_address_type_is_inspected() {
    let mut read_stream = tokio_test::io::Builder::new()
        .read(&[SOCKS5_VERSION, command::SOCKS5_CMD_BIND, 0x00])
        .build();

    match RelayRequest::read_from(&mut read_stream).await {
        Err(ProxyError::InvalidCommand(cmd)) if cmd == command::SOCKS5_CMD_BIND => {}
        other => panic!("expected InvalidCommand(SOCKS5_CMD_BIND), got {other:?}"),
    }
}

#[tokio::test]
#[rustfmt::skip]
async fn relay_reply_is_always_ten_bytes_with_zero_bound_addr() {
    for status in [
        ReplyStatus::GeneralFailure,
        ReplyStatus::HostUnreachable,
        ReplyStatus::ConnectionRefused,
        ReplyStatus::CommandNotSupported,
        ReplyStatus::AddressTypeNotSupported,
    ] {
        let response = RelayResponse::builder().with_status(status).build();
        let mut buf = Vec::new();
        response.write_to(&mut buf).await.expect("should write");
        assert_eq!(10, buf.len());
        assert_eq!([SOCKS5_VERSION, status.as_u8(), 0x00, address::SOCKS5_ADDR_TYPE_IPV4, 0, 0, 0, 0, 0, 0], buf.as_slice());
    }
}

#[tokio::test]
#[rustfmt::skip]
async fn rw_address() {
    let mut mock = tokio_test::io::Builder::new()
        .read(&[address::SOCKS5_ADDR_TYPE_IPV4, 127, 0, 0, 1, 10, 10])
        .read(&[address::SOCKS5_ADDR_TYPE_IPV6]) // rejected without reading the remaining 18 bytes
        .build();

    let addr = SocksAddress::read_from(&mut mock).await.expect("IPv4 should parse");
    assert_eq!(addr, ipv4_socket_address!(Ipv4Addr::new(127, 0, 0, 1), 2570));

    match SocksAddress::read_from(&mut mock).await {
        Err(ProxyError::InvalidAddressType(address::SOCKS5_ADDR_TYPE_IPV6)) => {}
        other => panic!("expected InvalidAddressType(0x04), got {other:?}"),
    }

    let addr_to_write = ipv4_socket_address!(Ipv4Addr::new(127, 0, 0, 1), 2570);
    let mut written = vec![];
    addr_to_write.write_to(&mut written);
    assert_eq!(vec![address::SOCKS5_ADDR_TYPE_IPV4, 127, 0, 0, 1, 10, 10], written);
}

#[test]
fn error_to_reply_status_mapping() {
    assert_eq!(ReplyStatus::CommandNotSupported, ReplyStatus::from(&ProxyError::InvalidCommand(0x02)));
    assert_eq!(ReplyStatus::AddressTypeNotSupported, ReplyStatus::from(&ProxyError::InvalidAddressType(0x04)));
    assert_eq!(ReplyStatus::GeneralFailure, ReplyStatus::from(&ProxyError::InvalidVersion(0x04)));
    assert_eq!(ReplyStatus::HostUnreachable, ReplyStatus::from(&ProxyError::HostUnreachable("boom".into())));
    assert_eq!(ReplyStatus::ConnectionRefused, ReplyStatus::from(&ProxyError::ConnectionRefused("boom".into())));
}
