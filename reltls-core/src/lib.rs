//! # reltls Core
//!
//! TLS record layer implementation: the sub-protocol that frames,
//! fragments, protects, and reassembles the byte streams flowing between
//! two TLS peers. It sits above a reliable transport and below the
//! handshake and application layers, which are out of scope here.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Caller (handshake, app)          │
//! └─────────────────┬───────────────────────┘
//!                   │ send_record / receive_record
//! ┌─────────────────▼───────────────────────┐
//! │      reltls-core (this crate)           │
//! │  ┌──────────────────────────────────┐   │
//! │  │   RecordLayer orchestrator       │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   TLS 1.2 / 1.3 protection       │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   Framing codec + reassembly     │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   Replay window, padding guards  │   │
//! │  └──────────────────────────────────┘   │
//! └────────┬─────────────────────┬──────────┘
//!          │                     │
//! ┌────────▼─────────┐  ┌────────▼──────────┐
//! │ Transport trait  │  │ reltls-crypto     │
//! │ (TCP, in-memory) │  │ (provider traits) │
//! └──────────────────┘  └───────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! A [`RecordLayer`] is single-threaded per connection. Sequence numbers and
//! the receive buffer admit no useful concurrency within one direction;
//! callers that share a connection serialize access.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    unused_qualifications
)]
#![forbid(unsafe_code)]

// Re-export crypto interface
pub use reltls_crypto;

// Core modules
pub mod cipher;
pub mod cipher_state;
pub mod error;
pub mod padding;
pub mod protocol;
pub mod record;
pub mod record_layer;
pub mod record_protection;
pub mod replay;
pub mod tls12;
pub mod transport;

// Re-exports
pub use cipher::CipherSuite;
pub use cipher_state::CipherState;
pub use error::{Error, Result};
pub use protocol::{ContentType, ProtocolVersion};
pub use record::TlsRecord;
pub use record_layer::RecordLayer;
pub use replay::ReplayWindow;
pub use transport::{MemoryTransport, TcpTransport, Transport};
