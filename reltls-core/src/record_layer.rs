//! Record layer orchestration.
//!
//! [`RecordLayer`] ties the pieces together: it fragments outgoing data,
//! reassembles incoming records from arbitrary transport read boundaries,
//! applies the version-specific protection transform once a cipher spec is
//! installed, and runs the anti-replay window on the read side.
//!
//! Each direction is an independent two-state machine:
//!
//! ```text
//! Plain --change_cipher_spec--> Encrypted --change_cipher_spec--> Encrypted (rekey)
//! ```
//!
//! There is no transition back to plaintext. A `RecordLayer` is
//! single-threaded per connection; callers serialize access.

use std::sync::Arc;

use bytes::BytesMut;
use reltls_crypto::CryptoProvider;
use tracing::{debug, trace};

use crate::cipher_state::CipherState;
use crate::error::{Error, Result};
use crate::padding::{
    apply_split_record_mitigation, select_protection_strategy, ProtectionStrategy,
};
use crate::protocol::{ContentType, ProtocolVersion};
use crate::record::{
    parse_record, TlsRecord, MAX_CIPHERTEXT_SIZE, MAX_FRAGMENT_SIZE, MIN_FRAGMENT_LENGTH,
    RECORD_HEADER_SIZE,
};
use crate::record_protection::Tls13RecordProtection;
use crate::replay::ReplayWindow;
use crate::tls12::Tls12RecordProtection;
use crate::transport::Transport;

/// Default maximum fragment length (the protocol maximum, 2^14).
pub const DEFAULT_MAX_FRAGMENT_LENGTH: usize = MAX_FRAGMENT_SIZE;

/// Receive-buffer cap: two maximum records plus headers. Appends beyond
/// this fail rather than letting a peer balloon memory with a stream of
/// headers announcing data that never arrives.
const RECEIVE_BUFFER_CAP: usize = 2 * (MAX_CIPHERTEXT_SIZE + RECORD_HEADER_SIZE);

/// Version-specific protection transform, fixed at construction.
#[derive(Debug)]
enum ProtectionCodec {
    Tls12(Tls12RecordProtection),
    Tls13(Tls13RecordProtection),
}

impl ProtectionCodec {
    fn for_version(version: ProtocolVersion) -> Self {
        match version {
            ProtocolVersion::Tls13 => ProtectionCodec::Tls13(Tls13RecordProtection),
            _ => ProtectionCodec::Tls12(Tls12RecordProtection),
        }
    }

    fn encrypt(
        &self,
        provider: &dyn CryptoProvider,
        state: &mut CipherState,
        content_type: ContentType,
        fragment: &[u8],
    ) -> Result<TlsRecord> {
        match self {
            ProtectionCodec::Tls12(p) => p.encrypt(provider, state, content_type, fragment),
            ProtectionCodec::Tls13(p) => p.encrypt(provider, state, content_type, fragment),
        }
    }

    fn decrypt(
        &self,
        provider: &dyn CryptoProvider,
        state: &mut CipherState,
        record: &TlsRecord,
    ) -> Result<(Vec<u8>, ContentType)> {
        match self {
            ProtectionCodec::Tls12(p) => p.decrypt(provider, state, record),
            ProtectionCodec::Tls13(p) => p.decrypt(provider, state, record),
        }
    }
}

/// One direction of the connection: plaintext until the first cipher-spec
/// change, protected afterwards.
#[derive(Debug)]
enum Direction {
    Plain,
    Encrypted(CipherState),
}

impl Direction {
    fn is_encrypted(&self) -> bool {
        matches!(self, Direction::Encrypted(_))
    }
}

/// TLS record layer for a single connection.
///
/// Owns the transport, the receive buffer, and both direction states. The
/// protection transform (TLS 1.2 or TLS 1.3) is chosen at construction and
/// never re-selected.
pub struct RecordLayer<T: Transport> {
    version: ProtocolVersion,
    transport: T,
    provider: Arc<dyn CryptoProvider>,
    codec: ProtectionCodec,
    max_fragment_length: usize,
    write: Direction,
    read: Direction,
    receive_buffer: BytesMut,
    replay_window: ReplayWindow,
    replay_protection: bool,
}

impl<T: Transport> RecordLayer<T> {
    /// Create a record layer for a negotiated protocol version.
    ///
    /// Both directions start in the plaintext state with no cipher
    /// material and replay protection enabled.
    pub fn new(version: ProtocolVersion, transport: T, provider: Arc<dyn CryptoProvider>) -> Self {
        let codec = ProtectionCodec::for_version(version);
        Self {
            version,
            transport,
            provider,
            codec,
            max_fragment_length: DEFAULT_MAX_FRAGMENT_LENGTH,
            write: Direction::Plain,
            read: Direction::Plain,
            receive_buffer: BytesMut::new(),
            replay_window: ReplayWindow::new(),
            replay_protection: true,
        }
    }

    /// Create a record layer from a raw wire version.
    ///
    /// Accepts 0x0301 through 0x0304; everything else, including SSL 3.0
    /// (0x0300), fails with [`Error::UnsupportedVersion`]. The TLS 1.3
    /// transform is selected for 0x0304, the TLS 1.2 transform otherwise.
    pub fn for_wire_version(
        version: u16,
        transport: T,
        provider: Arc<dyn CryptoProvider>,
    ) -> Result<Self> {
        let version = ProtocolVersion::try_from_u16(version)?;
        Ok(Self::new(version, transport, provider))
    }

    /// Get the negotiated protocol version.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Set the maximum plaintext fragment length, in `64..=16384`.
    pub fn set_max_fragment_length(&mut self, length: usize) -> Result<()> {
        if !(MIN_FRAGMENT_LENGTH..=MAX_FRAGMENT_SIZE).contains(&length) {
            return Err(Error::InvalidParameter(format!(
                "max fragment length {} out of range {}..={}",
                length, MIN_FRAGMENT_LENGTH, MAX_FRAGMENT_SIZE
            )));
        }
        self.max_fragment_length = length;
        Ok(())
    }

    /// Get the current maximum fragment length.
    pub fn max_fragment_length(&self) -> usize {
        self.max_fragment_length
    }

    /// Enable or disable replay protection. Enabling resets the window.
    pub fn set_replay_protection(&mut self, enabled: bool) {
        if enabled {
            self.replay_window.reset();
        }
        self.replay_protection = enabled;
    }

    /// Check whether replay protection is enabled.
    pub fn is_replay_protection_enabled(&self) -> bool {
        self.replay_protection
    }

    /// Check whether the write direction is protected.
    pub fn is_write_encrypted(&self) -> bool {
        self.write.is_encrypted()
    }

    /// Check whether the read direction is protected.
    pub fn is_read_encrypted(&self) -> bool {
        self.read.is_encrypted()
    }

    /// Install a new write cipher state and flip the direction to encrypted.
    ///
    /// Repeated calls rekey the direction; there is no way back to
    /// plaintext.
    pub fn change_write_cipher_spec(&mut self, state: CipherState) -> Result<()> {
        self.check_cipher_state(&state)?;
        debug!(suite = state.cipher_suite().name(), "write cipher spec changed");
        self.write = Direction::Encrypted(state);
        Ok(())
    }

    /// Install a new read cipher state and flip the direction to encrypted.
    ///
    /// Also resets the replay window: sequence numbers restart at zero
    /// under the new keys.
    pub fn change_read_cipher_spec(&mut self, state: CipherState) -> Result<()> {
        self.check_cipher_state(&state)?;
        debug!(suite = state.cipher_suite().name(), "read cipher spec changed");
        self.read = Direction::Encrypted(state);
        self.replay_window.reset();
        Ok(())
    }

    fn check_cipher_state(&self, state: &CipherState) -> Result<()> {
        if state.tls_version() != self.version {
            return Err(Error::InvalidParameter(format!(
                "cipher state derived for {}, connection is {}",
                state.tls_version().name(),
                self.version.name()
            )));
        }
        let suite = state.cipher_suite();
        if (self.version == ProtocolVersion::Tls13) != suite.is_valid_for_tls13() {
            return Err(Error::InvalidParameter(format!(
                "suite {} is not usable with {}",
                suite.name(),
                self.version.name()
            )));
        }
        Ok(())
    }

    /// Fragment `data` and write it as one or more records.
    ///
    /// Fragments are at most the configured maximum length, in order, the
    /// last possibly shorter. Empty input produces no records. When the
    /// write direction is protected, each fragment is encrypted with the
    /// version's transform; under TLS 1.0 CBC suites, application data
    /// additionally gets the 1/n-1 BEAST split.
    pub fn send_record(&mut self, content_type: ContentType, data: &[u8]) -> Result<()> {
        let split_records = match &self.write {
            Direction::Encrypted(state) => {
                content_type == ContentType::ApplicationData
                    && select_protection_strategy(self.version, state.cipher_suite())
                        == ProtectionStrategy::SplitRecords
            },
            Direction::Plain => false,
        };

        let mut records_sent = 0usize;
        for chunk in data.chunks(self.max_fragment_length) {
            let pieces = if split_records {
                apply_split_record_mitigation(chunk)
            } else {
                vec![chunk.to_vec()]
            };
            for piece in pieces {
                self.write_one_record(content_type, &piece)?;
                records_sent += 1;
            }
        }
        trace!(
            content_type = content_type.to_u8(),
            bytes = data.len(),
            records = records_sent,
            "records sent"
        );
        Ok(())
    }

    fn write_one_record(&mut self, content_type: ContentType, fragment: &[u8]) -> Result<()> {
        let record = match &mut self.write {
            Direction::Encrypted(state) => {
                self.codec
                    .encrypt(self.provider.as_ref(), state, content_type, fragment)?
            },
            Direction::Plain => TlsRecord::new(
                content_type,
                self.version.wire_version(),
                fragment.to_vec(),
            ),
        };

        let bytes = record.encode()?;
        let written = self.transport.send(&bytes)?;
        if written != bytes.len() {
            return Err(Error::IncompleteSend {
                written,
                expected: bytes.len(),
            });
        }
        Ok(())
    }

    /// Receive the next record, blocking on the transport as needed.
    ///
    /// Partial reads are buffered until a whole record is available;
    /// coalesced reads yield records one at a time. When the read direction
    /// is protected, the record is decrypted, checked against the replay
    /// window (if enabled), and returned with its true content type.
    pub fn receive_record(&mut self) -> Result<TlsRecord> {
        let record = self.read_framed_record()?;

        let (codec, provider) = (&self.codec, self.provider.as_ref());
        match &mut self.read {
            Direction::Plain => Ok(record),
            Direction::Encrypted(state) => {
                let sequence = state.sequence_number();
                if self.replay_protection && self.replay_window.is_replay(sequence) {
                    return Err(Error::ReplayDetected(sequence));
                }

                let (plaintext, content_type) = codec.decrypt(provider, state, &record)?;

                if self.replay_protection {
                    self.replay_window.mark_as_processed(sequence);
                }
                trace!(sequence, content_type = content_type.to_u8(), "record decrypted");
                Ok(TlsRecord::new(content_type, self.version, plaintext))
            },
        }
    }

    /// Drain the transport until one complete record can be parsed.
    fn read_framed_record(&mut self) -> Result<TlsRecord> {
        loop {
            match parse_record(&mut self.receive_buffer) {
                Ok(Some(record)) => return Ok(record),
                Ok(None) => {},
                Err(e) => {
                    // Malformed framing: drop everything buffered so a
                    // garbage stream cannot pin memory.
                    self.receive_buffer.clear();
                    return Err(e);
                },
            }

            let chunk = self.transport.receive(DEFAULT_MAX_FRAGMENT_LENGTH)?;
            if chunk.is_empty() {
                return Err(Error::TransportClosed);
            }
            if self.receive_buffer.len() + chunk.len() > RECEIVE_BUFFER_CAP {
                self.receive_buffer.clear();
                return Err(Error::RecordOverflow);
            }
            self.receive_buffer.extend_from_slice(&chunk);
        }
    }

    /// Close the underlying transport.
    pub fn close(&mut self) -> Result<()> {
        self.transport.close()
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: Transport> std::fmt::Debug for RecordLayer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordLayer")
            .field("version", &self.version.name())
            .field("max_fragment_length", &self.max_fragment_length)
            .field("write_encrypted", &self.write.is_encrypted())
            .field("read_encrypted", &self.read.is_encrypted())
            .field("buffered", &self.receive_buffer.len())
            .field("replay_protection", &self.replay_protection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::CipherSuite;
    use crate::transport::MemoryTransport;
    use reltls_crypto_rustcrypto::RustCryptoProvider;

    fn plain_layer(version: ProtocolVersion) -> RecordLayer<MemoryTransport> {
        RecordLayer::new(
            version,
            MemoryTransport::new(),
            Arc::new(RustCryptoProvider::new()),
        )
    }

    fn tls13_state() -> CipherState {
        CipherState::new(
            CipherSuite::Aes128GcmSha256,
            ProtocolVersion::Tls13,
            vec![1u8; 16],
            vec![2u8; 12],
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_factory_rejects_ssl3() {
        let result = RecordLayer::for_wire_version(
            0x0300,
            MemoryTransport::new(),
            Arc::new(RustCryptoProvider::new()),
        );
        assert!(matches!(result, Err(Error::UnsupportedVersion(0x0300))));
    }

    #[test]
    fn test_factory_accepts_all_tls_versions() {
        for raw in [0x0301u16, 0x0302, 0x0303, 0x0304] {
            let layer = RecordLayer::for_wire_version(
                raw,
                MemoryTransport::new(),
                Arc::new(RustCryptoProvider::new()),
            )
            .unwrap();
            assert_eq!(layer.version().to_u16(), raw);
        }
    }

    #[test]
    fn test_max_fragment_length_bounds() {
        let mut layer = plain_layer(ProtocolVersion::Tls12);
        assert!(matches!(
            layer.set_max_fragment_length(63),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            layer.set_max_fragment_length(16385),
            Err(Error::InvalidParameter(_))
        ));
        layer.set_max_fragment_length(64).unwrap();
        assert_eq!(layer.max_fragment_length(), 64);
        layer.set_max_fragment_length(16384).unwrap();
    }

    #[test]
    fn test_empty_send_produces_no_records() {
        let mut layer = plain_layer(ProtocolVersion::Tls12);
        layer.send_record(ContentType::ApplicationData, b"").unwrap();
        assert!(layer.transport().sent().is_empty());
    }

    #[test]
    fn test_short_write_is_an_error() {
        let mut layer = plain_layer(ProtocolVersion::Tls12);
        layer.transport_mut().set_write_limit(Some(4));
        let result = layer.send_record(ContentType::Handshake, b"hello");
        assert_eq!(
            result,
            Err(Error::IncompleteSend {
                written: 4,
                expected: 10
            })
        );
    }

    #[test]
    fn test_cipher_spec_version_mismatch_rejected() {
        let mut layer = plain_layer(ProtocolVersion::Tls12);
        // State derived for TLS 1.3 cannot be installed on a 1.2 connection.
        assert!(matches!(
            layer.change_write_cipher_spec(tls13_state()),
            Err(Error::InvalidParameter(_))
        ));
        assert!(!layer.is_write_encrypted());
    }

    #[test]
    fn test_cipher_spec_suite_mismatch_rejected() {
        let mut layer = plain_layer(ProtocolVersion::Tls13);
        let state = CipherState::new(
            CipherSuite::EcdheRsaWithAes128GcmSha256,
            ProtocolVersion::Tls13,
            vec![1u8; 16],
            vec![2u8; 12],
            Vec::new(),
        )
        .unwrap();
        assert!(matches!(
            layer.change_read_cipher_spec(state),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_direction_states_are_independent() {
        let mut layer = plain_layer(ProtocolVersion::Tls13);
        layer.change_write_cipher_spec(tls13_state()).unwrap();
        assert!(layer.is_write_encrypted());
        assert!(!layer.is_read_encrypted());
    }

    #[test]
    fn test_replay_window_rejects_before_decryption() {
        // In-order TLS over TCP never revisits a sequence number, so the
        // window path is exercised by seeding it as an out-of-order
        // receiver would: the incoming record's sequence number is already
        // marked.
        let provider = Arc::new(RustCryptoProvider::new());
        let mut sender = RecordLayer::new(
            ProtocolVersion::Tls13,
            MemoryTransport::new(),
            provider.clone(),
        );
        sender.change_write_cipher_spec(tls13_state()).unwrap();
        sender
            .send_record(ContentType::ApplicationData, b"fresh")
            .unwrap();
        let wire = sender.transport().sent().to_vec();

        let mut receiver =
            RecordLayer::new(ProtocolVersion::Tls13, MemoryTransport::new(), provider);
        receiver.change_read_cipher_spec(tls13_state()).unwrap();
        receiver.replay_window.mark_as_processed(0);
        receiver.transport_mut().push_incoming(wire);

        assert_eq!(receiver.receive_record(), Err(Error::ReplayDetected(0)));
    }

    #[test]
    fn test_closed_transport_surfaces() {
        let mut layer = plain_layer(ProtocolVersion::Tls12);
        assert_eq!(layer.receive_record(), Err(Error::TransportClosed));
    }

    #[test]
    fn test_decode_error_clears_buffer() {
        let mut layer = plain_layer(ProtocolVersion::Tls12);
        // Unknown content type 99, plus trailing garbage that must not survive.
        layer
            .transport_mut()
            .push_incoming(vec![99, 3, 3, 0, 1, 0xAA, 0xBB]);
        let result = layer.receive_record();
        assert!(matches!(result, Err(Error::InvalidMessage(_))));
        assert!(layer.receive_buffer.is_empty());
    }

    #[test]
    fn test_receive_buffer_cap_enforced() {
        // A transport that ignores `max_len` and floods far more data than
        // requested. The buffer cap keeps it from pinning memory.
        struct GreedyTransport;
        impl Transport for GreedyTransport {
            fn send(&mut self, data: &[u8]) -> crate::Result<usize> {
                Ok(data.len())
            }
            fn receive(&mut self, _max_len: usize) -> crate::Result<Vec<u8>> {
                // A truncated-record prefix followed by filler: never parseable.
                let mut chunk = vec![23, 3, 3, 0x40, 0x00];
                chunk.resize(40_000, 0);
                Ok(chunk)
            }
            fn has_data_available(&mut self, _t: std::time::Duration) -> crate::Result<bool> {
                Ok(true)
            }
            fn close(&mut self) -> crate::Result<()> {
                Ok(())
            }
        }

        let mut layer = RecordLayer::new(
            ProtocolVersion::Tls12,
            GreedyTransport,
            Arc::new(RustCryptoProvider::new()),
        );
        assert_eq!(layer.receive_record(), Err(Error::RecordOverflow));
        assert!(layer.receive_buffer.is_empty());
    }
}
