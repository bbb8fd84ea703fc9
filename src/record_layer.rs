use std::collections::VecDeque;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::alert::{Alert, AlertDescription, AlertLevel};
use crate::buffer::{Buf, BufferPool};
use crate::context::CryptoContext;
use crate::crypto::HandshakeHashes;
use crate::incoming::RecordReader;
use crate::outgoing::RecordWriter;
use crate::record::{fragment, fragment_split_first, Defragmenter, Message};
use crate::record::{ReceivedMessage, RecordHeader};
use crate::types::{ContentType, HandshakeType, ProtocolVersion};
use crate::{Config, Error};

/// Outcome of an operation on a possibly non-blocking socket.
///
/// `WantRead` and `WantWrite` mean the socket blocked. Calling the same
/// operation again continues where it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress<T> {
    Ready(T),
    WantRead,
    WantWrite,
}

impl<T> Progress<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Progress::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Progress::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Progress<U> {
        match self {
            Progress::Ready(v) => Progress::Ready(f(v)),
            Progress::WantRead => Progress::WantRead,
            Progress::WantWrite => Progress::WantWrite,
        }
    }
}

/// What [`RecordLayer::get_message`] should accept.
#[derive(Debug, Clone, Copy)]
pub enum Expect<'a> {
    /// Any message.
    Any,
    /// Any message of one of these content types.
    Content(&'a [ContentType]),
    /// A handshake message of one of these types. Empty means any type.
    Handshake(&'a [HandshakeType]),
}

impl Expect<'_> {
    fn accepts(&self, msg: &ReceivedMessage) -> bool {
        match self {
            Expect::Any => true,
            Expect::Content(types) => types.contains(&msg.content_type()),
            Expect::Handshake(types) => {
                msg.content_type() == ContentType::Handshake
                    && (types.is_empty()
                        || msg
                            .handshake_type()
                            .map(|t| types.contains(&t))
                            .unwrap_or(false))
            }
        }
    }
}

/// One endpoint of a TLS connection at the record level.
///
/// Owns the socket, the four cipher states and the reassembly and transcript
/// state. Every operation touching the socket returns [`Progress`].
pub struct RecordLayer<S> {
    socket: S,
    config: Arc<Config>,
    is_client: bool,

    /// Version written in outgoing headers and fed to the MAC.
    version: ProtocolVersion,

    closed: bool,
    abrupt: bool,
    close_notify_received: bool,
    close_notify_sent: bool,

    crypto: CryptoContext,
    defragmenter: Defragmenter,
    transcript: HandshakeHashes,

    reader: RecordReader,
    writer: RecordWriter,

    /// Messages completed by a record but not yet handed out.
    received: VecDeque<ReceivedMessage>,

    buffers_free: BufferPool,
}

impl<S: Read + Write> RecordLayer<S> {
    pub fn new(socket: S, config: Arc<Config>, is_client: bool) -> Self {
        let crypto = CryptoContext::new(config.rng_seed());
        let defragmenter = Defragmenter::new(config.max_handshake_len());
        let transcript = HandshakeHashes::new(config.crypto_provider());

        RecordLayer {
            socket,
            config,
            is_client,
            version: ProtocolVersion::default(),
            closed: false,
            abrupt: false,
            close_notify_received: false,
            close_notify_sent: false,
            crypto,
            defragmenter,
            transcript,
            reader: RecordReader::new(),
            writer: RecordWriter::new(),
            received: VecDeque::new(),
            buffers_free: BufferPool::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_client(&self) -> bool {
        self.is_client
    }

    pub fn socket(&self) -> &S {
        &self.socket
    }

    pub fn socket_mut(&mut self) -> &mut S {
        &mut self.socket
    }

    pub fn into_inner(self) -> S {
        self.socket
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Set the negotiated version used for outgoing records and MACs.
    pub fn set_version(&mut self, version: ProtocolVersion) {
        debug!("Record version set to {}", version);
        self.version = version;
    }

    /// Human readable name of the current version, e.g. "TLS 1.2".
    pub fn version_name(&self) -> String {
        self.version.to_string()
    }

    /// Bulk cipher of the current write state: "aes128", "aes256" or `None`.
    pub fn cipher_name(&self) -> Option<&'static str> {
        self.crypto
            .write
            .current
            .suite()
            .and_then(|s| s.bulk_cipher())
            .and_then(|b| b.name())
    }

    /// Provider behind the current write state, `None` before encryption.
    pub fn cipher_implementation(&self) -> Option<&'static str> {
        self.crypto.write.current.implementation()
    }

    pub fn handshake_hashes(&self) -> &HandshakeHashes {
        &self.transcript
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether the session may be resumed, i.e. no abrupt close happened.
    pub fn is_resumable(&self) -> bool {
        !self.abrupt
    }

    /// Derive keys for `suite_id` into the pending read and write states.
    pub fn calc_pending_states(
        &mut self,
        suite_id: u16,
        master_secret: &[u8],
        client_random: &[u8],
        server_random: &[u8],
    ) -> Result<(), Error> {
        self.crypto.calc_pending_states(
            self.config.crypto_provider(),
            self.version,
            self.is_client,
            suite_id,
            master_secret,
            client_random,
            server_random,
        )
    }

    /// Make the pending read state current. Called on receiving ChangeCipherSpec.
    pub fn change_read_state(&mut self) -> Result<(), Error> {
        self.crypto.read.activate()?;
        debug!("Read state activated: {:?}", self.crypto.read.current);
        Ok(())
    }

    /// Make the pending write state current. Called after sending ChangeCipherSpec.
    pub fn change_write_state(&mut self) -> Result<(), Error> {
        self.crypto.write.activate()?;
        debug!("Write state activated: {:?}", self.crypto.write.current);
        Ok(())
    }

    /// Send one message, flushing as far as the socket allows.
    ///
    /// On `WantWrite` the message is already queued; resume with [`flush`](Self::flush).
    pub fn send_message(&mut self, msg: &Message) -> Result<Progress<()>, Error> {
        self.send_messages(std::slice::from_ref(msg))
    }

    /// Queue several messages and flush once.
    pub fn send_messages(&mut self, msgs: &[Message]) -> Result<Progress<()>, Error> {
        self.ensure_open()?;
        for msg in msgs {
            if let Err(e) = self.queue_message(msg) {
                return Err(self.fail(e));
            }
        }
        self.flush()
    }

    /// Continue writing queued records.
    pub fn flush(&mut self) -> Result<Progress<()>, Error> {
        self.ensure_open()?;
        match self
            .writer
            .poll_flush(&mut self.socket, &mut self.buffers_free)
        {
            Ok(p) => Ok(p),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Send application data.
    pub fn write(&mut self, data: &[u8]) -> Result<Progress<()>, Error> {
        if data.is_empty() {
            return self.flush();
        }
        self.send_message(&Message::application_data(data))
    }

    /// Receive the next application data message.
    pub fn read(&mut self) -> Result<Progress<Buf>, Error> {
        Ok(self
            .get_message(Expect::Content(&[ContentType::ApplicationData]))?
            .map(ReceivedMessage::into_bytes))
    }

    /// Send any alert. Shutting down afterwards is up to the caller.
    pub fn send_alert(&mut self, alert: Alert) -> Result<Progress<()>, Error> {
        self.send_message(&Message::alert(alert))
    }

    /// Send close_notify and shut down cleanly once it is written.
    pub fn close(&mut self) -> Result<Progress<()>, Error> {
        if !self.close_notify_sent {
            self.ensure_open()?;
            if let Err(e) = self.queue_message(&Message::alert(Alert::close_notify())) {
                return Err(self.fail(e));
            }
            self.close_notify_sent = true;
        }

        match self
            .writer
            .poll_flush(&mut self.socket, &mut self.buffers_free)
        {
            Ok(Progress::Ready(())) => {
                if !self.closed {
                    self.shutdown(true);
                }
                Ok(Progress::Ready(()))
            }
            Ok(p) => Ok(p),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Close the connection and drop all cipher states.
    ///
    /// Without a received close_notify and with `resumable` false the close
    /// counts as abrupt and the session is not resumable.
    pub fn shutdown(&mut self, resumable: bool) {
        self.closed = true;
        self.crypto.reset();
        if !self.close_notify_received && !resumable {
            self.abrupt = true;
        }
        debug!(
            "Connection shut down (resumable: {})",
            self.is_resumable()
        );
    }

    /// Receive the next complete message of any type, alerts included.
    pub fn recv_message(&mut self) -> Result<Progress<ReceivedMessage>, Error> {
        self.ensure_open()?;

        loop {
            if let Some(msg) = self.received.pop_front() {
                return Ok(Progress::Ready(msg));
            }

            let polled = self
                .reader
                .poll_read(&mut self.socket, &mut self.buffers_free);
            let (header, mut payload) = match polled {
                Ok(Progress::Ready(record)) => record,
                Ok(Progress::WantRead) => return Ok(Progress::WantRead),
                Ok(Progress::WantWrite) => return Ok(Progress::WantWrite),
                Err(e) => return Err(self.fail(e)),
            };

            let res = self.process_record(&header, &mut payload);
            self.buffers_free.push(payload);
            if let Err(e) = res {
                return Err(self.fail(e));
            }
        }
    }

    /// Receive the next message matching `expect`.
    ///
    /// Alerts close the connection and surface as [`Error::RemoteAlert`].
    /// A renegotiation attempt (HelloRequest to a client, ClientHello to a
    /// server) is refused with a `no_renegotiation` warning and heartbeats
    /// are skipped. Anything else unexpected is fatal.
    pub fn get_message(&mut self, expect: Expect<'_>) -> Result<Progress<ReceivedMessage>, Error> {
        loop {
            let msg = match self.recv_message()? {
                Progress::Ready(msg) => msg,
                Progress::WantRead => return Ok(Progress::WantRead),
                Progress::WantWrite => return Ok(Progress::WantWrite),
            };

            if msg.content_type() == ContentType::Alert {
                self.handle_alert(&msg)?;
                continue;
            }

            if expect.accepts(&msg) {
                return Ok(Progress::Ready(msg));
            }

            match msg.content_type() {
                ContentType::Handshake if self.is_renegotiation(&msg) => {
                    debug!("Refusing renegotiation");
                    let refusal = Message::alert(Alert::warning(AlertDescription::NoRenegotiation));
                    if let Err(e) = self.queue_message(&refusal) {
                        return Err(self.fail(e));
                    }
                    // A blocked write stays queued for the next flush.
                    if let Err(e) = self
                        .writer
                        .poll_flush(&mut self.socket, &mut self.buffers_free)
                    {
                        return Err(self.fail(e));
                    }
                }
                ContentType::Heartbeat => {
                    debug!("Ignoring heartbeat of {} bytes", msg.bytes().len());
                }
                _ => {
                    let err = Error::UnexpectedMessage(format!(
                        "expected {:?}, got {} {:?}",
                        expect,
                        msg.content_type(),
                        msg.handshake_type()
                    ));
                    return Err(self.fail(err));
                }
            }
        }
    }

    /// A renegotiation attempt from the peer: HelloRequest sent to a client
    /// or ClientHello sent to a server.
    fn is_renegotiation(&self, msg: &ReceivedMessage) -> bool {
        let refused = if self.is_client {
            HandshakeType::HelloRequest
        } else {
            HandshakeType::ClientHello
        };
        msg.handshake_type() == Some(refused)
    }

    fn handle_alert(&mut self, msg: &ReceivedMessage) -> Result<(), Error> {
        let alert = match Alert::parse(msg.bytes()) {
            Ok((_, alert)) => alert,
            Err(e) => return Err(self.fail(e.into())),
        };

        if alert.is_fatal() && !alert.is_close_notify() {
            warn!("Received fatal alert: {}", alert);
            self.shutdown(false);
            return Err(Error::RemoteAlert(alert));
        }

        // Every other alert ends the connection with a close_notify reply.
        let reply = Message::alert(Alert::close_notify());
        if !self.close_notify_sent && self.queue_message(&reply).is_ok() {
            self.close_notify_sent = true;
            // The peer may already be gone.
            let _ = self
                .writer
                .poll_flush(&mut self.socket, &mut self.buffers_free);
        }

        if alert.is_close_notify() {
            debug!("Received close_notify");
            self.close_notify_received = true;
            self.shutdown(true);
        } else {
            warn!("Received warning alert: {}", alert);
            self.shutdown(false);
        }
        Err(Error::RemoteAlert(alert))
    }

    fn process_record(&mut self, header: &RecordHeader, payload: &mut [u8]) -> Result<(), Error> {
        if self.config.version_check() && !header.ssl2 && header.version != self.version {
            return Err(Error::ProtocolVersion(header.version));
        }

        let plaintext = self
            .crypto
            .unprotect(self.version, header.content_type, payload)?;

        trace!(
            "Received {} record, {} bytes plaintext",
            header.content_type,
            plaintext.len()
        );

        for msg in self.defragmenter.absorb(header, plaintext)? {
            if is_hashed(msg.content_type(), msg.handshake_type()) {
                self.transcript.update(msg.bytes());
            }
            self.received.push_back(msg);
        }

        Ok(())
    }

    fn queue_message(&mut self, msg: &Message) -> Result<(), Error> {
        let content_type = msg.content_type();
        if is_hashed(content_type, msg.handshake_type()) {
            self.transcript.update(msg.bytes());
        }

        let max_len = self.config.max_fragment_len();
        let split = content_type == ContentType::ApplicationData
            && self.config.split_first_record()
            && self.version <= ProtocolVersion::TLS1_0
            && self.crypto.write.current.is_cbc();

        let chunks = if split {
            fragment_split_first(msg.bytes(), max_len)
        } else {
            fragment(msg.bytes(), max_len)
        };

        for chunk in chunks {
            self.queue_record(content_type, chunk)?;
        }
        Ok(())
    }

    fn queue_record(&mut self, content_type: ContentType, plaintext: &[u8]) -> Result<(), Error> {
        let mut payload = self.buffers_free.pop();
        let res = self
            .crypto
            .protect(self.version, content_type, plaintext, &mut payload);
        if let Err(e) = res {
            self.buffers_free.push(payload);
            return Err(e);
        }

        let mut record = self.buffers_free.pop();
        RecordHeader::new(content_type, self.version, payload.len() as u16).serialize(&mut record);
        record.extend_from_slice(&payload);
        self.buffers_free.push(payload);

        trace!(
            "Queued {} record, {} bytes plaintext, {} on the wire",
            content_type,
            plaintext.len(),
            record.len()
        );
        self.writer.push(record);
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if !self.closed {
            Ok(())
        } else if self.abrupt {
            Err(Error::AbruptClose)
        } else {
            Err(Error::ClosedConnection)
        }
    }

    /// Turn a local failure into a closed connection.
    ///
    /// Errors with an alert send it best effort before shutting down.
    /// Transport errors shut down without an alert. Usage errors pass through.
    fn fail(&mut self, err: Error) -> Error {
        if self.closed {
            return err;
        }

        if err.is_transport() {
            debug!("Transport failure: {}", err);
            self.shutdown(false);
            return err;
        }

        if let Some(description) = err.alert() {
            warn!("Sending fatal alert {:?}: {}", description, err);
            let alert = Message::alert(Alert::fatal(description));
            if self.queue_message(&alert).is_ok() {
                let _ = self
                    .writer
                    .poll_flush(&mut self.socket, &mut self.buffers_free);
            }
            self.shutdown(false);
        }

        err
    }
}

fn is_hashed(content_type: ContentType, handshake_type: Option<HandshakeType>) -> bool {
    content_type == ContentType::Handshake && handshake_type.map(|t| t.is_hashed()).unwrap_or(false)
}

impl<S> fmt::Debug for RecordLayer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordLayer")
            .field("is_client", &self.is_client)
            .field("version", &self.version)
            .field("closed", &self.closed)
            .field("abrupt", &self.abrupt)
            .field("crypto", &self.crypto)
            .field("reader", &self.reader)
            .field("writer", &self.writer)
            .field("received", &self.received.len())
            .finish()
    }
}
