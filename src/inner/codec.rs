//! Wire encoding of session values.
//!
//! A value is serialized to JSON and then to unpadded URL-safe base64, so the
//! result is always a legal cookie value. Encoding passes through
//! [`serde_json::Value`] first: its object map is key-sorted, which makes the
//! output byte-identical for semantically equal values even when the source
//! type keeps its keys in a `HashMap`. Change detection on save relies on it.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{DecodeError, Result, SessionError};

pub fn encode<T>(value: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    let canonical = serde_json::to_value(value).map_err(SessionError::Encoding)?;
    let bytes = serde_json::to_vec(&canonical).map_err(SessionError::Encoding)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

pub fn decode<T>(encoded: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(DecodeError::from)?;
    let value = serde_json::from_slice(&bytes).map_err(DecodeError::from)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde::{Deserialize, Serializer};
    use std::collections::HashMap;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Profile {
        user_id: String,
        authed: i64,
        tags: HashMap<String, u32>,
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cannot serialize a handle"))
        }
    }

    #[rstest]
    fn test_round_trip_typed_value() {
        let profile = Profile {
            user_id: "user123".into(),
            authed: 1_700_000_000,
            tags: HashMap::from([("a".into(), 1), ("b".into(), 2)]),
        };

        let encoded = encode(&profile).unwrap();
        let decoded: Profile = decode(&encoded).unwrap();

        assert_eq!(decoded, profile);
    }

    #[rstest]
    fn test_output_is_cookie_safe() {
        let encoded = encode(&"~~~ needs <escaping> ???").unwrap();

        assert!(
            encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[rstest]
    fn test_encoding_is_independent_of_map_order() {
        let mut first = HashMap::new();
        let mut second = HashMap::new();
        for i in 0..64u32 {
            first.insert(format!("key-{i}"), i);
        }
        for i in (0..64u32).rev() {
            second.insert(format!("key-{i}"), i);
        }

        assert_eq!(encode(&first).unwrap(), encode(&second).unwrap());
    }

    #[rstest]
    fn test_encode_rejects_unserializable_value() {
        let err = encode(&Unserializable).unwrap_err();

        assert!(matches!(err, SessionError::Encoding(_)));
    }

    #[rstest]
    fn test_encode_rejects_non_string_map_keys() {
        let value = HashMap::from([(vec![1u8, 2], 3)]);

        assert!(matches!(encode(&value), Err(SessionError::Encoding(_))));
    }

    #[rstest]
    #[case::not_base64("xx*&^")]
    #[case::truncated("eyJ1c2VyX2lkIjoi")]
    #[case::wrong_shape("WzEsMiwzXQ")]
    fn test_decode_failures(#[case] input: &str) {
        let err = decode::<Profile>(input).unwrap_err();

        assert!(err.is_decoding());
    }
}
