//! Body encoding and response decoding strategies.
//!
//! Encoders turn a flat parameter map into body bytes and decoders turn
//! response bytes into the endpoint's response type. Both are chosen when an
//! endpoint is constructed and held behind `Arc<dyn ...>`, so nothing here
//! inspects types at runtime.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ApiError, Result};

/// Flat parameter map resolved from an endpoint's query or body source.
///
/// Backed by an insertion-ordered map so the order parameters were given in
/// is the order they are encoded in.
pub type Parameters = Map<String, Value>;

/// Strategy that encodes resolved body parameters.
pub trait BodyEncoder: Send + Sync {
    /// Encode `parameters`. `None` means the encoder produced nothing, which
    /// leaves the request body empty without failing the request.
    fn encode(&self, parameters: &Parameters) -> Option<Vec<u8>>;
}

/// Serializes the parameter map as a JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyEncoder;

impl BodyEncoder for JsonBodyEncoder {
    fn encode(&self, parameters: &Parameters) -> Option<Vec<u8>> {
        serde_json::to_vec(parameters)
            .map_err(|e| tracing::warn!(error = %e, "JSON body encoding produced no bytes"))
            .ok()
    }
}

/// Serializes the parameter map as `key=value` pairs joined by `&`.
///
/// Keys and values are percent-encoded outside the unreserved set, so a space
/// becomes `%20`. The joined string is then reduced to 7-bit ASCII; anything
/// that survives encoding outside that range is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiBodyEncoder;

impl BodyEncoder for AsciiBodyEncoder {
    fn encode(&self, parameters: &Parameters) -> Option<Vec<u8>> {
        let joined = parameters
            .iter()
            .filter_map(|(key, value)| {
                parameter_string(value).map(|value| {
                    format!("{}={}", urlencoding::encode(key), urlencoding::encode(&value))
                })
            })
            .collect::<Vec<_>>()
            .join("&");
        Some(joined.chars().filter(char::is_ascii).collect::<String>().into_bytes())
    }
}

/// Render a parameter value the way it appears in a query string or form.
///
/// Strings are used verbatim, other scalars by their JSON text, nested values
/// as compact JSON. `null` has no rendering and the pair is skipped.
pub(crate) fn parameter_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Strategy that decodes response bytes into `R`.
pub trait ResponseDecoder<R>: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<R>;
}

/// Deserializes a JSON payload into `R`.
pub struct JsonResponseDecoder<R> {
    _marker: PhantomData<fn() -> R>,
}

impl<R> JsonResponseDecoder<R> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<R> Default for JsonResponseDecoder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: DeserializeOwned> ResponseDecoder<R> for JsonResponseDecoder<R> {
    fn decode(&self, bytes: &[u8]) -> Result<R> {
        serde_json::from_slice(bytes).map_err(|e| ApiError::DecodingFailed(e.to_string()))
    }
}

/// Hands the response bytes back untouched, for binary endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawResponseDecoder;

impl ResponseDecoder<Vec<u8>> for RawResponseDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn params(value: Value) -> Parameters {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn json_encoder_output_decodes_to_same_map() {
        let input = params(json!({"q": "batman", "page": 1}));
        let bytes = JsonBodyEncoder.encode(&input).unwrap();
        let back: Parameters = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn json_encoder_accepts_heterogeneous_values() {
        let input = params(json!({
            "flag": true,
            "ratio": 0.5,
            "tags": ["a", "b"],
            "nested": {"k": null}
        }));
        let bytes = JsonBodyEncoder.encode(&input).unwrap();
        let back: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back["tags"][1], "b");
        assert!(back["nested"]["k"].is_null());
    }

    #[test]
    fn form_encoder_percent_encodes_space() {
        let input = params(json!({"a": "1", "b": "two words"}));
        let bytes = AsciiBodyEncoder.encode(&input).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "a=1&b=two%20words");
    }

    #[test]
    fn form_encoder_output_is_seven_bit() {
        let input = params(json!({"title": "Amélie", "n": 3, "skip": null}));
        let bytes = AsciiBodyEncoder.encode(&input).unwrap();
        assert!(bytes.iter().all(u8::is_ascii));
        assert_eq!(String::from_utf8(bytes).unwrap(), "title=Am%C3%A9lie&n=3");
    }

    #[test]
    fn form_encoder_escapes_reserved_characters() {
        let input = params(json!({"q": "a&b=c"}));
        let bytes = AsciiBodyEncoder.encode(&input).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "q=a%26b%3Dc");
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        id: u32,
    }

    #[test]
    fn json_decoder_reports_malformed_payload() {
        let decoder = JsonResponseDecoder::<Sample>::new();
        assert_eq!(decoder.decode(br#"{"id":7}"#).unwrap(), Sample { id: 7 });
        let err = decoder.decode(b"not json").unwrap_err();
        assert!(matches!(err, ApiError::DecodingFailed(_)));
    }

    #[test]
    fn raw_decoder_passes_bytes_through() {
        assert_eq!(RawResponseDecoder.decode(&[0, 159, 255]).unwrap(), vec![0, 159, 255]);
    }
}
