use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use site_relay::config::{self, AppState, Config};
use site_relay::handler::pages::PageLoader;
use site_relay::logger;
use site_relay::relay::{self, DatagramListener, RelaySender};
use site_relay::server::{self, SignalHandler};
use site_relay::store::MergeStore;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Worker thread count comes from config, defaulting to CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let http_addr = cfg.get_socket_addr()?;
    let relay_addr = cfg.get_relay_addr()?;

    let store = Arc::new(MergeStore::open(&cfg.storage.data_file).await?);

    // A receiver that cannot bind is fatal; nothing would ever be stored
    let datagram_listener = DatagramListener::bind(relay_addr, cfg.relay.buffer_size)?;
    let relay_sender = RelaySender::bind(relay_addr).await?;
    let http_listener = server::create_tcp_listener(http_addr)?;

    let shutdown = Arc::new(SignalHandler::new());
    server::start_signal_handler(Arc::clone(&shutdown))?;

    // The receiver runs on its own task, concurrently with the HTTP loop
    let receiver = tokio::spawn(relay::run_receiver(
        datagram_listener,
        Arc::clone(&store),
        Arc::clone(&shutdown),
    ));

    logger::log_server_start(&http_addr, &relay_addr, &cfg);

    let pages = PageLoader::new(&cfg.site);
    let state = Arc::new(AppState::new(cfg, pages, relay_sender));
    let active_connections = Arc::new(AtomicUsize::new(0));

    // LocalSet for spawn_local connection tasks
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(
            http_listener,
            state,
            active_connections,
            Arc::clone(&shutdown),
        ))
        .await;

    if let Err(e) = receiver.await {
        logger::log_error(&format!("Relay receiver task failed: {e}"));
    }

    Ok(())
}
