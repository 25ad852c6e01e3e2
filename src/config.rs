use clap::Parser;
use std::{net::Ipv4Addr, path::PathBuf, time::Duration};

pub const DEFAULT_LOG4RS_CONFIG_FILE_PATH: &str = "log4rs.yaml";

/// The default reference editor collaborator, as named in `spec.md` §6.
const DEFAULT_EDITOR_PROGRAM: &str = "/bin/nvim";

#[derive(Parser, Debug)]
#[clap(about = "Intercepting SOCKS5/HTTP proxy", version)]
pub struct ProxyConfig {
    /// TCP port to listen on
    #[clap(short, long, default_value_t = 9050)]
    port: u16,

    /// IPv4 address to bind the listener to
    #[clap(short, long, default_value = "0.0.0.0")]
    bind: Ipv4Addr,

    /// Maximum number of concurrent client<->destination sessions
    #[clap(long, default_value_t = 12)]
    max_sessions: usize,

    /// Listener backlog passed to `listen(2)`
    #[clap(long, default_value_t = 12)]
    backlog: i32,

    /// Path to the editor collaborator executable invoked on every
    /// client-originated HTTP message before it is forwarded
    #[clap(long, default_value = DEFAULT_EDITOR_PROGRAM)]
    editor: PathBuf,

    /// Extra argument passed to the editor before the temp-file path.
    /// May be repeated. Defaults to the reference collaborator's
    /// `nvim -c ":set fileformat=dos"` invocation.
    #[clap(long = "editor-arg", default_values_t = vec![String::from("-c"), String::from(":set fileformat=dos")])]
    editor_args: Vec<String>,

    /// Path to the log4rs YAML configuration file
    #[clap(long, default_value = DEFAULT_LOG4RS_CONFIG_FILE_PATH)]
    log_config: PathBuf,
}

impl ProxyConfig {
    /// Per-step timeout within the SOCKS5 handshake (greeting, auth, request).
    pub const HANDSHAKE_STEP_TIMEOUT: Duration = Duration::from_millis(300);

    /// Budget for reading one complete HTTP message off either socket.
    pub const HTTP_MESSAGE_TIMEOUT: Duration = Duration::from_millis(60_000);

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn bind(&self) -> Ipv4Addr {
        self.bind
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    pub fn backlog(&self) -> i32 {
        self.backlog
    }

    pub fn editor_program(&self) -> &PathBuf {
        &self.editor
    }

    pub fn editor_args(&self) -> &[String] {
        &self.editor_args
    }

    pub fn log_config(&self) -> &PathBuf {
        &self.log_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_match_spec() {
        let config = ProxyConfig::parse_from(["tapsocks"]);
        assert_eq!(9050, config.port());
        assert_eq!(12, config.max_sessions());
        assert_eq!(12, config.backlog());
    }
}
