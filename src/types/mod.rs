//! Protocol enums and identifiers used by the record layer.

mod cipher_suite;
pub use cipher_suite::{BulkCipher, CipherSuite, MacAlgorithm};

mod ctype;
pub use ctype::ContentType;

mod handshake;
pub use handshake::HandshakeType;

mod hash;
pub use hash::HashAlgorithm;

mod version;
pub use version::ProtocolVersion;
