use anyhow::Result;
use clap::Parser;
use log::debug;
use std::{future::Future, net::SocketAddr};
use tapsocks::{config::ProxyConfig, server::ProxyServer};
use tokio::task::{yield_now, JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

#[allow(unused_macros)]
macro_rules! cancel_listener {
    ($l:expr) => {
        $l.cancel().await.expect("Failed to cancel async task");
    };
}

#[allow(unused_imports)]
pub(crate) use cancel_listener;

pub trait AsyncListener {
    fn name(&self) -> &'static str;

    fn listen(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn run(self) -> impl Future<Output = AsyncListenerTask> + Send
    where
        Self: Send + Sized + 'static,
    {
        AsyncListenerTask::spawn(self)
    }
}

pub struct AsyncListenerTask {
    handle: JoinHandle<()>,
    token: CancellationToken,
}

impl AsyncListenerTask {
    /// Spawn listener through tokio::spawn with graceful cancellation ability.
    async fn spawn<T>(mut listener: T) -> AsyncListenerTask
    where
        T: AsyncListener + Send + 'static,
    {
        let token = CancellationToken::new();
        let token_clone = token.clone();

        let failure_msg = format!("[AsyncListenerTask] Failure occured while running {} listener", listener.name());

        let handle = tokio::spawn(async move {
            tokio::select! {
                res = listener.listen() => res.expect(&failure_msg),
                _ = token_clone.cancelled() => {
                    debug!(
                        "[AsyncListenerTask] {} listener has been cancelled. Shutting down the task ...",
                        listener.name()
                    );
                }
            }
        });

        yield_now().await;

        AsyncListenerTask { handle, token }
    }

    /// Cancel task and wait for it's termination.
    pub async fn cancel(self) -> Result<(), JoinError> {
        self.token.cancel();
        self.handle.await
    }
}

/*
 * Proxy server listener
 */

pub struct ProxyServerListener {
    server: ProxyServer,
}

impl ProxyServerListener {
    /// Builds a proxy bound to `addr` with a passthrough editor collaborator
    /// (`sh -c true <path>`, which leaves the temp file untouched) so
    /// integration tests exercise the relay loop without depending on a
    /// real editor binary being installed on the test host.
    pub fn new(addr: SocketAddr) -> ProxyServerListener {
        let config = ProxyConfig::parse_from([
            "tapsocks",
            "--bind",
            &addr.ip().to_string(),
            "--port",
            &addr.port().to_string(),
            "--editor",
            "/bin/sh",
            "--editor-arg",
            "-c",
            "--editor-arg",
            "true",
        ]);

        ProxyServerListener { server: ProxyServer::new(&config) }
    }
}

impl AsyncListener for ProxyServerListener {
    fn listen(&mut self) -> impl Future<Output = Result<()>> + Send {
        self.server.run()
    }

    fn name(&self) -> &'static str {
        "proxy server"
    }
}
