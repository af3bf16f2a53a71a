//! Envelope encryption of serialized messages.

use crate::{EncryptionError, KeyError};
use aes::cipher::{block_padding::ZeroPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::{rngs::OsRng, RngCore};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use zeroize::Zeroizing;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Size of the message key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of the CBC initialization vector in bytes.
pub const IV_SIZE: usize = 16;

/// Envelope property holding the base64 IV. Shared with every decrypting consumer.
pub const KEY_SALT: &str = "KeySalt";

/// Envelope property holding the event session id.
pub const SESSION_ID: &str = "SessionId";

/// Envelope property holding the sending application's name.
pub const ORIGIN_APPLICATION: &str = "OriginApplication";

/// Encrypted transport wrapper: base64 ciphertext plus string metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope {
    pub body: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Envelope {
    pub fn salt(&self) -> Option<&str> {
        self.property(KEY_SALT)
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// Generate a random base64-encoded 256-bit key.
pub fn generate_key() -> String {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    OsRng.fill_bytes(key.as_mut());
    STANDARD.encode(key.as_slice())
}

fn generate_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);
    iv
}

fn decode_key(key: &str) -> Result<Zeroizing<Vec<u8>>, EncryptionError> {
    let bytes = Zeroizing::new(
        STANDARD
            .decode(key.trim())
            .map_err(|e| EncryptionError::InvalidKey(KeyError::Base64(e)))?,
    );
    if bytes.len() != KEY_SIZE {
        return Err(EncryptionError::InvalidKey(KeyError::WrongSize(
            bytes.len() * 8,
        )));
    }
    Ok(bytes)
}

/// Serialize `message` to JSON and encrypt it under `key` (base64, 32 bytes).
pub fn encrypt_message<T>(message: &T, key: &str) -> Result<Envelope, EncryptionError>
where
    T: Serialize + ?Sized,
{
    let key = decode_key(key)?;
    let json = Zeroizing::new(
        serde_json::to_vec(message).map_err(|e| EncryptionError::Encrypt(Box::new(e)))?,
    );

    let iv = generate_iv();
    let cipher = Aes256CbcEnc::new_from_slices(&key, &iv)
        .map_err(|e| EncryptionError::Encrypt(e.to_string().into()))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<ZeroPadding>(&json);

    Ok(Envelope {
        body: STANDARD.encode(ciphertext),
        properties: BTreeMap::from([(KEY_SALT.to_string(), STANDARD.encode(iv))]),
    })
}

/// Decrypt an envelope produced by [`encrypt_message`] and parse the JSON body.
///
/// Trailing NUL bytes left by zero padding are stripped before parsing.
pub fn decrypt_message<T>(envelope: &Envelope, key: &str) -> Result<T, EncryptionError>
where
    T: DeserializeOwned,
{
    let key = decode_key(key)?;
    let ciphertext = STANDARD
        .decode(envelope.body.trim())
        .map_err(|e| EncryptionError::Decrypt(Box::new(e)))?;
    let salt = envelope
        .salt()
        .ok_or_else(|| EncryptionError::Decrypt(format!("missing {} property", KEY_SALT).into()))?;
    let iv = STANDARD
        .decode(salt.trim())
        .map_err(|e| EncryptionError::Decrypt(Box::new(e)))?;
    if iv.len() != IV_SIZE {
        return Err(EncryptionError::Decrypt(
            format!("IV must be {} bytes, got {}", IV_SIZE, iv.len()).into(),
        ));
    }

    let cipher = Aes256CbcDec::new_from_slices(&key, &iv)
        .map_err(|e| EncryptionError::Decrypt(e.to_string().into()))?;
    let plaintext = Zeroizing::new(
        cipher
            .decrypt_padded_vec_mut::<ZeroPadding>(&ciphertext)
            .map_err(|e| EncryptionError::Decrypt(e.to_string().into()))?,
    );

    let end = plaintext
        .iter()
        .rposition(|b| *b != 0)
        .map_or(0, |i| i + 1);
    serde_json::from_slice(&plaintext[..end]).map_err(|e| EncryptionError::Decrypt(Box::new(e)))
}
