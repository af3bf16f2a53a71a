//! Symmetric encryption of serialized messages into a transport envelope.
//!
//! The ciphertext is AES-256-CBC with zero padding and a random IV per message.
//! The IV travels base64-encoded in the envelope properties under [`KEY_SALT`].
//! Zero padding (rather than PKCS#7) is kept for compatibility with messages
//! produced by existing senders.

mod envelope;
mod error;

pub use envelope::{
    decrypt_message, encrypt_message, generate_key, Envelope, IV_SIZE, KEY_SALT, KEY_SIZE,
    ORIGIN_APPLICATION, SESSION_ID,
};
pub use error::{EncryptionError, KeyError};
