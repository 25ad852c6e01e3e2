use crate::{
    common::{error::ProxyError, logging},
    editor::EditorGateway,
    http::framer,
};
use human_bytes::human_bytes;
use log::{error, info, trace, warn};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::TcpStream,
};

/// Runs the message-relay phase for one already-handshaked
/// `{client, destination}` pair until either side hangs up or a
/// framing/forward error retires the session. Mirrors the reference pollfd
/// loop's per-tick contract — "read one complete message, forward it, never
/// interleave a partial message from the other side" — with `tokio::select!`
/// driving the two directions instead of manual poll-array bookkeeping.
pub struct Session {
    client_addr: SocketAddr,
    destination_addr: SocketAddr,
    editor: Arc<EditorGateway>,
    message_timeout: Duration,
}

impl Session {
    pub fn new(client_addr: SocketAddr, destination_addr: SocketAddr, editor: Arc<EditorGateway>, message_timeout: Duration) -> Session {
        Session { client_addr, destination_addr, editor, message_timeout }
    }

    pub async fn run(&self, client: TcpStream, destination: TcpStream) {
        logging::log_session_opened!(self.client_addr, self.destination_addr);

        let (client_read, mut client_write) = client.into_split();
        let (destination_read, mut destination_write) = destination.into_split();
        let mut client_reader = BufReader::new(client_read);
        let mut destination_reader = BufReader::new(destination_read);

        let mut client_to_dest: u64 = 0;
        let mut dest_to_client: u64 = 0;

        let outcome: ProxyError = loop {
            tokio::select! {
                biased;

                read = framer::read_message(&mut client_reader, self.message_timeout) => {
                    match read {
                        Ok(message) => {
                            let original_len = message.len();
                            let message = match self.editor.edit(message).await {
                                Ok(edited) => edited,
                                Err(err) => {
                                    logging::log_editor_failed!(err);
                                    break ProxyError::ConnectionTerminated;
                                }
                            };
                            trace!("[{}] editor round trip: {} -> {} bytes", self.client_addr, original_len, message.len());

                            if let Err(err) = destination_write.write_all(message.as_slice()).await {
                                break err.into();
                            }
                            client_to_dest += message.len() as u64;
                        }
                        Err(err) => break self.log_and_classify(err),
                    }
                }

                read = framer::read_message(&mut destination_reader, self.message_timeout) => {
                    match read {
                        Ok(message) => {
                            if let Err(err) = client_write.write_all(message.as_slice()).await {
                                break err.into();
                            }
                            dest_to_client += message.len() as u64;
                        }
                        Err(err) => break self.log_and_classify(err),
                    }
                }
            }
        };

        match outcome {
            ProxyError::ConnectionTerminated => {
                logging::log_session_closed!(self.client_addr, self.destination_addr, client_to_dest, dest_to_client);
            }
            err => {
                logging::log_session_closed_with_error!(self.client_addr, self.destination_addr, err);
            }
        }
    }

    /// Hangup is the expected, quiet end of a session; every other error is
    /// worth a `warn!` naming the cause before the pair is retired, matching
    /// `spec.md` §6's "invalid message cause" logging requirement.
    fn log_and_classify(&self, err: ProxyError) -> ProxyError {
        if !matches!(err, ProxyError::ConnectionTerminated) {
            logging::log_invalid_message!(self.client_addr, err);
        }
        ProxyError::ConnectionTerminated
    }
}
