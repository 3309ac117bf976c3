use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Suffix of the companion cookie holding a signature.
pub const SIGNATURE_SUFFIX: &str = ".sig";

/// Ordered list of HMAC-SHA256 keys.
///
/// New signatures use the first key; verification accepts any key, so a key
/// can be rotated in at the front while old cookies stay valid.
#[derive(Clone, Default)]
pub struct SigningKeys {
    keys: Vec<Vec<u8>>,
}

impl std::fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeys")
            .field("len", &self.keys.len())
            .finish()
    }
}

impl SigningKeys {
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        SigningKeys {
            keys: keys.into_iter().map(|k| k.as_ref().to_vec()).collect(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn mac(key: &[u8], name: &str, value: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
        mac.update(name.as_bytes());
        mac.update(b"=");
        mac.update(value.as_bytes());
        mac
    }

    /// Signature of `name=value` with the primary key, `None` without keys.
    pub fn sign(&self, name: &str, value: &str) -> Option<String> {
        let key = self.keys.first()?;
        let tag = Self::mac(key, name, value).finalize().into_bytes();
        Some(URL_SAFE_NO_PAD.encode(tag))
    }

    pub fn verify(&self, name: &str, value: &str, signature: &str) -> bool {
        let Ok(tag) = URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };
        self.keys
            .iter()
            .any(|key| Self::mac(key, name, value).verify_slice(&tag).is_ok())
    }
}
