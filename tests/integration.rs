mod common;

mod socks5_proxy {

    use crate::common::{
        self,
        listeners::{self, cancel_listener, AsyncListener},
        next_available_address, utils,
    };
    use futures::{stream::FuturesUnordered, StreamExt};
    use httptest::{matchers::request::method_path, responders::status_code, Expectation, ServerBuilder};
    use log::info;

    #[tokio::test]
    async fn single_client() {
        common::init_logging();

        let proxy_addr = next_available_address();
        let http_server_addr = next_available_address();

        let proxy = listeners::ProxyServerListener::new(proxy_addr);
        let proxy = proxy.run().await;

        let http_server = ServerBuilder::new().bind_addr(http_server_addr).run().expect("unable to bind HTTP server");

        http_server.expect(Expectation::matching(method_path("GET", "/hello_world")).respond_with(status_code(200)));

        let response = utils::http::create_http_client_with_proxy(common::socks5_proxy(proxy_addr))
            .get(http_server.url_str("/hello_world").to_string())
            .send()
            .await
            .expect("unable to send GET request to HTTP server through proxy");

        assert_eq!(200, response.status());

        cancel_listener!(proxy);
    }

    /// Drives several clients through the same proxy instance concurrently,
    /// each sending its own HTTP request. Exercises the accept loop's
    /// session semaphore and the per-session relay task spawning under
    /// concurrent load rather than a single request at a time.
    #[tokio::test]
    async fn concurrent_clients() {
        common::init_logging();

        let num_clients = 8;
        let proxy_addr = next_available_address();
        let http_server_addr = next_available_address();

        let proxy = listeners::ProxyServerListener::new(proxy_addr);
        let proxy = proxy.run().await;

        let http_server = ServerBuilder::new().bind_addr(http_server_addr).run().expect("unable to bind HTTP server");

        for i in 0..num_clients {
            http_server.expect(Expectation::matching(method_path("GET", format!("/client_{i}"))).respond_with(status_code(200)));
        }

        let client_tasks: FuturesUnordered<_> = (0..num_clients)
            .map(|i| {
                let url = http_server.url_str(&format!("/client_{i}")).to_string();
                let client = utils::http::create_http_client_with_proxy(common::socks5_proxy(proxy_addr));
                async move {
                    info!("started client #{i}");
                    let response = client.get(url).send().await.expect("unable to send GET request through proxy");
                    assert_eq!(200, response.status());
                    info!("finished client #{i}");
                }
            })
            .collect();

        client_tasks.collect::<()>().await;

        cancel_listener!(proxy);
    }
}
