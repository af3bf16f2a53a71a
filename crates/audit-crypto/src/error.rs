use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Any failure while encrypting or decrypting a message. Always carries its cause.
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("invalid key: {0}")]
    InvalidKey(#[source] KeyError),

    #[error("could not encrypt message: {0}")]
    Encrypt(#[source] BoxError),

    #[error("could not decrypt message: {0}")]
    Decrypt(#[source] BoxError),
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key is not valid base64")]
    Base64(#[from] base64::DecodeError),

    #[error("wrong key size, key must be 256 bits; key provided was {0} bits")]
    WrongSize(usize),
}
