use crate::{
    auth::ProxyAuthenticator,
    common::error::{classify_destination_error, ProxyError},
    net::tcp,
    proto::socks5::{
        request::{HandshakeRequest, RelayRequest},
        response::{HandshakeResponse, RelayResponse},
        ReplyStatus,
    },
};
use std::{future::Future, time::Duration};
use tokio::{net::TcpStream, time::timeout};

/// Runs the server side of RFC 1928 (`spec.md` §4.2) against a freshly
/// accepted client socket: greeting, method selection, relay request,
/// destination resolution and connect. On success the TCP stream already
/// connected to the requested destination is returned; `client` has
/// already received the `0x00 Succeeded` reply. On failure, the reply
/// bytes dictated by the error table in `spec.md` §4.2/§7 have already
/// been written to `client` (when the table calls for one) and the error
/// is returned so the caller can log and close both sockets.
pub async fn perform(mut client: TcpStream, step_timeout: Duration) -> Result<(TcpStream, TcpStream), ProxyError> {
    negotiate_method(&mut client, step_timeout).await?;

    let request = match with_step_timeout(RelayRequest::read_from(&mut client), step_timeout).await {
        Ok(request) => request,
        Err(err @ (ProxyError::InvalidVersion(_) | ProxyError::InvalidCommand(_) | ProxyError::InvalidAddressType(_))) => {
            reply_with(&mut client, ReplyStatus::from(&err)).await;
            return Err(err);
        }
        Err(err) => return Err(err),
    };

    let target_addr = match request.target_addr().to_socket_addr().await {
        Ok(addr) => addr,
        Err(err) => {
            reply_with(&mut client, ReplyStatus::from(&err)).await;
            return Err(err);
        }
    };

    let destination = match timeout(step_timeout, tcp::connect(target_addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(io_err)) => {
            let err = classify_destination_error(&io_err);
            reply_with(&mut client, ReplyStatus::from(&err)).await;
            return Err(err);
        }
        Err(_elapsed) => {
            let err = ProxyError::HostUnreachable("connect timed out".to_string());
            reply_with(&mut client, ReplyStatus::from(&err)).await;
            return Err(err);
        }
    };

    RelayResponse::builder().with_success().build().write_to(&mut client).await.map_err(|_| ProxyError::ConnectionTerminated)?;

    Ok((client, destination))
}

/// Greeting + method selection. Both an unsupported version and a client
/// offering no acceptable method get the same 2-byte `{VER, 0xFF}` shape —
/// the relay-response 10-byte format doesn't exist yet at this point in the
/// handshake, matching `socks_establish_connection`'s `invalid_version`/
/// `invalid_auth` labels in the reference C implementation.
async fn negotiate_method(client: &mut TcpStream, step_timeout: Duration) -> Result<(), ProxyError> {
    let mut authenticator = ProxyAuthenticator::new();

    let greeting = match with_step_timeout(HandshakeRequest::read_from(client), step_timeout).await {
        Ok(greeting) => greeting,
        Err(err @ (ProxyError::InvalidVersion(_) | ProxyError::InvalidAuth)) => {
            let _ = HandshakeResponse::new(None).write_to(client).await;
            return Err(err);
        }
        Err(err) => return Err(err),
    };

    match authenticator.select_auth_method(greeting.auth_methods()) {
        Some(method) => {
            HandshakeResponse::new(Some(method)).write_to(client).await.map_err(|_| ProxyError::ConnectionTerminated)?;
            Ok(())
        }
        None => {
            let _ = HandshakeResponse::new(None).write_to(client).await;
            Err(ProxyError::InvalidAuth)
        }
    }
}

async fn reply_with(client: &mut TcpStream, status: ReplyStatus) {
    let _ = RelayResponse::builder().with_status(status).build().write_to(client).await;
}

/// Transport-level failures (`ConnectionTerminated`, a signal-equivalent
/// cancellation) and a bare timeout never get a SOCKS reply written — the
/// reference implementation's `recvn` returns those straight out of
/// `socks_establish_connection` without touching any of the `goto` reply
/// labels, since there's nothing useful to say to a peer that's already
/// gone quiet.
async fn with_step_timeout<T, F>(fut: F, step_timeout: Duration) -> Result<T, ProxyError>
where
    F: Future<Output = Result<T, ProxyError>>,
{
    match timeout(step_timeout, fut).await {
        Ok(result) => result,
        Err(_elapsed) => Err(ProxyError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::socks5::consts::*;
    use pretty_assertions::assert_eq;
    use tokio::{io::AsyncWriteExt, net::TcpListener};

    const STEP_TIMEOUT: Duration = Duration::from_millis(300);

    async fn loopback_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connect = TcpStream::connect(addr);
        let (accepted, connected) = tokio::join!(listener.accept(), connect);
        (accepted.unwrap().0, connected.unwrap())
    }

    #[tokio::test]
    async fn rejects_wrong_version_with_two_byte_reply() {
        let (server_side, mut client_side) = loopback_pair().await;

        let client_task = tokio::spawn(async move {
            client_side.write_all(&[0x04, 0x01, 0x00]).await.unwrap();
            let mut reply = [0u8; 2];
            tokio::io::AsyncReadExt::read_exact(&mut client_side, &mut reply).await.unwrap();
            reply
        });

        match perform(server_side, STEP_TIMEOUT).await {
            Err(ProxyError::InvalidVersion(0x04)) => {}
            other => panic!("expected InvalidVersion(0x04), got {other:?}"),
        }

        assert_eq!([SOCKS5_VERSION, auth::SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE], client_task.await.unwrap());
    }

    #[tokio::test]
    async fn rejects_unsupported_command_with_ten_byte_reply() {
        let (server_side, mut client_side) = loopback_pair().await;

        let client_task = tokio::spawn(async move {
            client_side.write_all(&[SOCKS5_VERSION, 1, auth::SOCKS5_AUTH_METHOD_NONE]).await.unwrap();
            let mut greeting_reply = [0u8; 2];
            tokio::io::AsyncReadExt::read_exact(&mut client_side, &mut greeting_reply).await.unwrap();

            client_side
                .write_all(&[SOCKS5_VERSION, command::SOCKS5_CMD_BIND, 0x00, address::SOCKS5_ADDR_TYPE_IPV4, 127, 0, 0, 1, 0, 80])
                .await
                .unwrap();
            let mut relay_reply = [0u8; 10];
            tokio::io::AsyncReadExt::read_exact(&mut client_side, &mut relay_reply).await.unwrap();
            relay_reply
        });

        match perform(server_side, STEP_TIMEOUT).await {
            Err(ProxyError::InvalidCommand(_)) => {}
            other => panic!("expected InvalidCommand, got {other:?}"),
        }

        let reply = client_task.await.unwrap();
        assert_eq!(10, reply.len());
        assert_eq!(reply::SOCKS5_REPLY_COMMAND_NOT_SUPPORTED, reply[1]);
    }
}
