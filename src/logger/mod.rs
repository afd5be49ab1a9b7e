//! Logger module
//!
//! Logging helpers for the site server and the relay:
//! - Server and relay lifecycle logging
//! - Access logging with multiple formats
//! - Error, warning and debug logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use crate::error::RelayError;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
        config.is_debug(),
    )
}

fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(http_addr: &SocketAddr, relay_addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Site server started successfully");
    write_info(&format!("Listening on: http://{http_addr}"));
    write_info(&format!("Relay destination: udp://{relay_addr}"));
    write_info(&format!("Site root: {}", config.site.root));
    write_info(&format!("Data file: {}", config.storage.data_file));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_server_stopped() {
    write_info("[INFO] HTTP server stopped");
}

pub fn log_info(message: &str) {
    write_info(&format!("[INFO] {message}"));
}

pub fn log_debug(message: &str) {
    if writer::get().is_some_and(writer::LogWriter::debug_enabled) {
        write_info(&format!("[DEBUG] {message}"));
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_receiver_started(addr: &SocketAddr, buffer_size: usize) {
    write_info(&format!(
        "[RELAY] Receiver listening on udp://{addr} (buffer {buffer_size} bytes)"
    ));
}

pub fn log_receiver_stopped() {
    write_info("[RELAY] Relay receiver stopped");
}

pub fn log_datagram_relayed(destination: &SocketAddr, size: usize) {
    log_debug(&format!("[RELAY] Forwarded {size} bytes to {destination}"));
}

pub fn log_datagram_truncated(source: &SocketAddr, kept: usize) {
    log_warning(&format!(
        "[RELAY] Datagram from {source} exceeded buffer, truncated to {kept} bytes"
    ));
}

pub fn log_record_stored(key: &str, fields: usize) {
    write_info(&format!("[STORE] Stored submission {key} ({fields} fields)"));
}

pub fn log_relay_error(err: &RelayError) {
    write_error(&format!("[RELAY ERROR] {err}"));
}

pub fn log_store_error(err: &RelayError) {
    write_error(&format!("[STORE ERROR] {err}"));
}
