use crate::{common::logging, config::ProxyConfig, editor::EditorGateway, net::tcp::listener::ProxyTcpListener};
use anyhow::Result;
use async_listen::is_transient_error;
use log::{info, warn};
use session::Session;
use stats::ProxyServerStats;
use std::{
    net::{SocketAddr, SocketAddrV4},
    sync::Arc,
    time::Duration,
};
use tokio::{signal, sync::Semaphore, time::sleep};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

mod handshake;
mod session;

pub mod stats;

/// Runs the accept loop and, for each accepted client, drives it through
/// [`handshake::perform`] into a [`Session`]. Concurrency is bounded by a
/// semaphore sized to `--max-sessions`: a permit is acquired *before*
/// `accept()` is even called, so the proxy stops pulling new connections
/// off the listen backlog once the session cap is hit rather than
/// accepting and then immediately rejecting them.
pub struct ProxyServer {
    bind_addr: SocketAddr,
    backlog: i32,
    handshake_step_timeout: Duration,
    http_message_timeout: Duration,
    editor: Arc<EditorGateway>,
    session_permits: Arc<Semaphore>,
    stats: Arc<ProxyServerStats>,
    task_tracker: TaskTracker,
    task_cancellation_token: CancellationToken,
}

impl ProxyServer {
    /// Delay after a non-transient accept failure, e.g. file descriptor
    /// exhaustion, before trying again.
    const DELAY_AFTER_ACCEPT_ERROR_MILLIS: u64 = 500;

    pub fn new(config: &ProxyConfig) -> ProxyServer {
        let bind_addr = SocketAddr::V4(SocketAddrV4::new(config.bind(), config.port()));
        let editor = EditorGateway::new(config.editor_program().clone(), config.editor_args().to_vec());

        ProxyServer {
            bind_addr,
            backlog: config.backlog(),
            handshake_step_timeout: ProxyConfig::HANDSHAKE_STEP_TIMEOUT,
            http_message_timeout: ProxyConfig::HTTP_MESSAGE_TIMEOUT,
            editor: Arc::new(editor),
            session_permits: Arc::new(Semaphore::new(config.max_sessions())),
            stats: Arc::new(ProxyServerStats::new()),
            task_tracker: TaskTracker::new(),
            task_cancellation_token: CancellationToken::new(),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let listener = ProxyTcpListener::bind(self.bind_addr, self.backlog).await?;
        info!("proxy listening on {}", self.bind_addr);

        self.stats.on_server_started();

        loop {
            let permit = tokio::select! {
                permit = Arc::clone(&self.session_permits).acquire_owned() => {
                    permit.expect("session semaphore is never closed while the accept loop runs")
                }
                _ = signal::ctrl_c() => {
                    info!("received Ctrl+C, gracefully tearing down");
                    self.on_shutdown_requested();
                    break;
                }
            };

            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => self.on_client_accepted(stream, peer_addr, permit),
                    Err(err) => {
                        drop(permit);
                        self.on_accept_error(&err).await;
                    }
                },
                _ = signal::ctrl_c() => {
                    drop(permit);
                    info!("received Ctrl+C, gracefully tearing down");
                    self.on_shutdown_requested();
                    break;
                }
            }
        }

        self.stats.on_server_finished();
        self.task_tracker.wait().await;

        Ok(())
    }

    async fn on_accept_error(&self, err: &std::io::Error) {
        logging::log_accept_error!(err);
        if !is_transient_error(err) {
            sleep(Duration::from_millis(ProxyServer::DELAY_AFTER_ACCEPT_ERROR_MILLIS)).await;
        }
    }

    fn on_client_accepted(&self, stream: tokio::net::TcpStream, peer_addr: SocketAddr, permit: tokio::sync::OwnedSemaphorePermit) {
        let editor = Arc::clone(&self.editor);
        let handshake_step_timeout = self.handshake_step_timeout;
        let http_message_timeout = self.http_message_timeout;
        let token = self.task_cancellation_token.clone();

        self.task_tracker.spawn(async move {
            let _permit = permit;

            tokio::select! {
                result = handshake::perform(stream, handshake_step_timeout) => {
                    match result {
                        Ok((client, destination)) => {
                            let destination_addr = match destination.peer_addr() {
                                Ok(addr) => addr,
                                Err(_) => return,
                            };
                            let session = Session::new(peer_addr, destination_addr, editor, http_message_timeout);
                            tokio::select! {
                                _ = session.run(client, destination) => {}
                                _ = token.cancelled() => {}
                            }
                        }
                        Err(err) => logging::log_handshake_failed!(peer_addr, err),
                    }
                }
                _ = token.cancelled() => {}
            }
        });
    }

    pub fn get_stats(&self) -> Arc<ProxyServerStats> {
        Arc::clone(&self.stats)
    }

    fn on_shutdown_requested(&self) {
        self.task_tracker.close();
        self.task_cancellation_token.cancel();
    }
}
