use log::LevelFilter;
use log4rs_test_utils::test_logging::init_logging_once_for;
use std::{
    net::SocketAddr,
    sync::atomic::{AtomicUsize, Ordering},
};

pub mod listeners;

pub fn init_logging() {
    init_logging_once_for(None, LevelFilter::Debug, "{h({({l}):5.5})} [{M}] {f}:{L}: {m}{n}");
}

pub fn next_available_address() -> SocketAddr {
    static PORT: AtomicUsize = AtomicUsize::new(32000);

    format!("127.0.0.1:{}", PORT.fetch_add(1, Ordering::AcqRel)).parse().unwrap()
}

pub fn socks5_proxy(addr: SocketAddr) -> reqwest::Proxy {
    reqwest::Proxy::http(format!("socks5://{}", addr)).unwrap()
}

pub mod utils {

    pub mod http {

        use reqwest::{Client, ClientBuilder, Proxy};

        pub fn create_http_client_with_proxy(proxy: Proxy) -> Client {
            ClientBuilder::new().proxy(proxy).build().expect("unable to build HTTP client")
        }
    }
}
