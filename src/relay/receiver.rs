// Relay receiver module
// Long-running loop: receive datagram -> decode -> merge into the store

use std::sync::Arc;

use super::decoder::decode;
use super::transport::{Datagram, DatagramListener};
use crate::error::Result;
use crate::logger;
use crate::server::signal::SignalHandler;
use crate::store::MergeStore;

/// Decode one datagram and merge it into the store.
///
/// Returns the key of the stored record. Decode and store failures are
/// returned to the caller; nothing is retried.
pub async fn process_datagram(store: &MergeStore, datagram: &Datagram) -> Result<String> {
    let record = decode(&datagram.payload)?;
    if record.is_empty() {
        logger::log_warning(&format!(
            "[RELAY] Empty submission from {}, storing a record with no fields",
            datagram.source
        ));
    }

    let key = store.merge_one(&record).await?;
    logger::log_record_stored(&key, record.len());
    Ok(key)
}

/// Run the receiver until shutdown is requested.
///
/// A bad datagram, a failed merge or a failed receive is logged and the
/// loop moves on to the next datagram. On shutdown the socket is closed
/// before returning.
pub async fn run_receiver(
    listener: DatagramListener,
    store: Arc<MergeStore>,
    shutdown: Arc<SignalHandler>,
) {
    if let Ok(addr) = listener.local_addr() {
        logger::log_receiver_started(&addr, listener.buffer_size());
    }

    loop {
        tokio::select! {
            received = listener.receive() => {
                match received {
                    Ok(datagram) => {
                        if let Err(e) = process_datagram(&store, &datagram).await {
                            if e.is_store_error() {
                                logger::log_store_error(&e);
                            } else {
                                logger::log_relay_error(&e);
                            }
                        }
                    }
                    Err(e) => logger::log_relay_error(&e),
                }
            }

            () = shutdown.wait_for_shutdown() => break,
        }
    }

    drop(listener);
    logger::log_receiver_stopped();
}
