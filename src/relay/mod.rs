//! Contact form relay
//!
//! The HTTP side forwards raw POST bodies as UDP datagrams; the receiver
//! decodes them and merges each one into the store. The two halves share
//! nothing but the datagram channel, so every datagram may be lost,
//! duplicated or malformed.

pub mod decoder;
pub mod receiver;
pub mod transport;

pub use decoder::{decode, SubmissionRecord};
pub use receiver::{process_datagram, run_receiver};
pub use transport::{Datagram, DatagramListener, RelaySender};
