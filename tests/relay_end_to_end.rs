use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use site_relay::config::{AppState, Config};
use site_relay::handler::pages::PageLoader;
use site_relay::relay::{run_receiver, DatagramListener, RelaySender};
use site_relay::server::{create_tcp_listener, start_server_loop, SignalHandler};
use site_relay::store::MergeStore;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn write_site(root: &Path) {
    std::fs::create_dir_all(root).unwrap();
    std::fs::write(root.join("index.html"), "<h1>Home</h1>").unwrap();
    std::fs::write(root.join("contact.html"), "<form method=post></form>").unwrap();
    std::fs::write(root.join("message.html"), "<p>Thanks!</p>").unwrap();
    std::fs::write(root.join("error404.html"), "<h1>Lost</h1>").unwrap();
}

fn test_config(dir: &Path) -> Config {
    let mut cfg = Config::load_from(dir.join("no-config").to_str().unwrap()).unwrap();
    cfg.site.root = dir.join("site").to_string_lossy().into_owned();
    cfg.storage.data_file = dir.join("data/data.json").to_string_lossy().into_owned();
    cfg.logging.access_log = false;
    cfg
}

async fn send_raw(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("server did not close the connection")
        .unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

async fn wait_for_records(store: &MergeStore, count: usize) -> usize {
    for _ in 0..100 {
        let len = store.load().await.map(|d| d.len()).unwrap_or(0);
        if len >= count {
            return len;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    store.load().await.map(|d| d.len()).unwrap_or(0)
}

#[tokio::test]
async fn contact_post_is_relayed_and_stored() {
    let dir = tempfile::tempdir().unwrap();
    write_site(&dir.path().join("site"));
    let cfg = test_config(dir.path());

    let store = Arc::new(MergeStore::open(&cfg.storage.data_file).await.unwrap());
    let datagram_listener = DatagramListener::bind("127.0.0.1:0".parse().unwrap(), 1024).unwrap();
    let relay_sender = RelaySender::bind(datagram_listener.local_addr().unwrap())
        .await
        .unwrap();
    let http_listener = create_tcp_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let http_addr = http_listener.local_addr().unwrap();
    let shutdown = Arc::new(SignalHandler::new());

    let receiver = tokio::spawn(run_receiver(
        datagram_listener,
        Arc::clone(&store),
        Arc::clone(&shutdown),
    ));

    let pages = PageLoader::new(&cfg.site);
    let state = Arc::new(AppState::new(cfg, pages, relay_sender));

    let local = tokio::task::LocalSet::new();
    let server_shutdown = Arc::clone(&shutdown);
    let server_store = Arc::clone(&store);
    local
        .run_until(async move {
            let server = tokio::task::spawn_local(start_server_loop(
                http_listener,
                state,
                Arc::new(AtomicUsize::new(0)),
                Arc::clone(&server_shutdown),
            ));

            let body = "name=Jane&message=Hi+there";
            let response = send_raw(
                http_addr,
                &format!(
                    "POST /contact HTTP/1.1\r\nHost: localhost\r\n\
                     Content-Type: application/x-www-form-urlencoded\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                ),
            )
            .await;
            assert!(response.starts_with("HTTP/1.1 302"), "{response}");
            assert!(response
                .to_ascii_lowercase()
                .contains("location: /message.html"));

            // Malformed submission: still redirected, never stored
            let broken = "name=Jane&broken";
            let response = send_raw(
                http_addr,
                &format!(
                    "POST /contact HTTP/1.1\r\nHost: localhost\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{broken}",
                    broken.len()
                ),
            )
            .await;
            assert!(response.starts_with("HTTP/1.1 302"), "{response}");

            let response = send_raw(
                http_addr,
                "GET /message.html HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            )
            .await;
            assert!(response.starts_with("HTTP/1.1 200"), "{response}");
            assert!(response.ends_with("<p>Thanks!</p>"));

            assert_eq!(wait_for_records(&server_store, 1).await, 1);
            server_shutdown.request_shutdown();
            tokio::time::timeout(Duration::from_secs(5), server)
                .await
                .expect("server loop did not stop")
                .unwrap();
        })
        .await;

    tokio::time::timeout(Duration::from_secs(5), receiver)
        .await
        .expect("receiver did not stop")
        .unwrap();

    let document = store.load().await.unwrap();
    let record = document.values().next().unwrap();
    assert_eq!(record, &json!({"name": "Jane", "message": "Hi there"}));
}

#[tokio::test]
async fn rejected_requests_get_client_errors() {
    let dir = tempfile::tempdir().unwrap();
    write_site(&dir.path().join("site"));
    let mut cfg = test_config(dir.path());
    cfg.http.max_body_size = 16;

    // Nothing listens on the relay address; sends may fail and are only logged
    let relay_sender = RelaySender::bind("127.0.0.1:9".parse().unwrap())
        .await
        .unwrap();
    let http_listener = create_tcp_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let http_addr = http_listener.local_addr().unwrap();
    let shutdown = Arc::new(SignalHandler::new());

    let pages = PageLoader::new(&cfg.site);
    let state = Arc::new(AppState::new(cfg, pages, relay_sender));

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async move {
            let server = tokio::task::spawn_local(start_server_loop(
                http_listener,
                state,
                Arc::new(AtomicUsize::new(0)),
                Arc::clone(&shutdown),
            ));

            let response = send_raw(
                http_addr,
                "POST /contact HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            )
            .await;
            assert!(response.starts_with("HTTP/1.1 411"), "{response}");

            let body = "name=Jane&message=far+too+long";
            let response = send_raw(
                http_addr,
                &format!(
                    "POST /contact HTTP/1.1\r\nHost: localhost\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                ),
            )
            .await;
            assert!(response.starts_with("HTTP/1.1 413"), "{response}");

            let response = send_raw(
                http_addr,
                "POST /elsewhere HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            )
            .await;
            assert!(response.starts_with("HTTP/1.1 405"), "{response}");

            let response = send_raw(
                http_addr,
                "GET /no/such/file.css HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            )
            .await;
            assert!(response.starts_with("HTTP/1.1 404"), "{response}");
            assert!(response.ends_with("<h1>Lost</h1>"));

            // Delivery failures never change the redirect
            let response = send_raw(
                http_addr,
                "POST /contact HTTP/1.1\r\nHost: localhost\r\nContent-Length: 9\r\nConnection: close\r\n\r\nname=Jane",
            )
            .await;
            assert!(response.starts_with("HTTP/1.1 302"), "{response}");

            shutdown.request_shutdown();
            tokio::time::timeout(Duration::from_secs(5), server)
                .await
                .expect("server loop did not stop")
                .unwrap();
        })
        .await;
}
