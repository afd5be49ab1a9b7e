// Server module entry point
// HTTP listener, connection handling, accept loop and shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module gets a different name
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_tcp_listener;
pub use server_loop::start_server_loop;
pub use signal::{start_signal_handler, SignalHandler};
