//! Declarative description of one HTTP endpoint.
//!
//! # Design
//! `Endpoint<R>` is an immutable value describing the shape of a request and
//! the type `R` its response decodes into. It is assembled with consuming
//! `with_*` methods and handed to the request builder, which composes it with
//! a `NetworkConfiguration` into an `HttpRequest`.
//!
//! Query and body parameters can each be given as a structured value (any
//! `Serialize` type flattening to a JSON object) or as a free-form map. The
//! two are collapsed into one `ParameterSource` per axis when the request is
//! built: a structured value, when present, is the only source consulted.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::encoding::{BodyEncoder, JsonBodyEncoder, JsonResponseDecoder, Parameters, ResponseDecoder};
use crate::error::Result;
use crate::http::{merge_headers, Headers, HttpMethod};

type Flatten = dyn Fn() -> std::result::Result<Value, String> + Send + Sync;

/// A `Serialize` value captured for flattening at build time.
#[derive(Clone)]
pub struct StructuredParameters {
    flatten: Arc<Flatten>,
}

impl StructuredParameters {
    pub fn new<T>(value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Self {
            flatten: Arc::new(move || serde_json::to_value(&value).map_err(|e| e.to_string())),
        }
    }

    /// Serialize the captured value into a flat key/value map.
    ///
    /// Anything that does not serialize to a JSON object is an error.
    pub fn to_parameters(&self) -> std::result::Result<Parameters, String> {
        match (self.flatten)()? {
            Value::Object(map) => Ok(map),
            other => Err(format!("expected a key/value object, got {}", json_kind(&other))),
        }
    }
}

impl fmt::Debug for StructuredParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StructuredParameters(..)")
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The one parameter source consulted for an axis (query or body).
#[derive(Debug)]
pub enum ParameterSource<'a> {
    Structured(&'a StructuredParameters),
    Raw(&'a Parameters),
}

impl ParameterSource<'_> {
    pub fn resolve(&self) -> std::result::Result<Parameters, String> {
        match self {
            ParameterSource::Structured(structured) => structured.to_parameters(),
            ParameterSource::Raw(map) => Ok((*map).clone()),
        }
    }
}

/// Shape of one request and the decoder for its `R` response.
///
/// Defaults: relative path, no headers, empty parameters on both axes, JSON
/// body encoding. Clones share the encoder and decoder behind `Arc`.
pub struct Endpoint<R> {
    path: String,
    is_full_path: bool,
    method: HttpMethod,
    header_parameters: Headers,
    query_parameters_structured: Option<StructuredParameters>,
    query_parameters: Parameters,
    body_parameters_structured: Option<StructuredParameters>,
    body_parameters: Parameters,
    body_encoder: Arc<dyn BodyEncoder>,
    response_decoder: Arc<dyn ResponseDecoder<R>>,
}

impl<R: DeserializeOwned + 'static> Endpoint<R> {
    /// Endpoint relative to the configured base URL, decoding JSON into `R`.
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self::with_decoder(path, method, JsonResponseDecoder::<R>::new())
    }
}

impl<R> Endpoint<R> {
    /// Endpoint with an explicit response decoder.
    pub fn with_decoder<D>(path: impl Into<String>, method: HttpMethod, decoder: D) -> Self
    where
        D: ResponseDecoder<R> + 'static,
    {
        Self {
            path: path.into(),
            is_full_path: false,
            method,
            header_parameters: Vec::new(),
            query_parameters_structured: None,
            query_parameters: Parameters::new(),
            body_parameters_structured: None,
            body_parameters: Parameters::new(),
            body_encoder: Arc::new(JsonBodyEncoder),
            response_decoder: Arc::new(decoder),
        }
    }

    /// Use `path` verbatim as the endpoint instead of joining it to the base URL.
    pub fn with_full_path(mut self, is_full_path: bool) -> Self {
        self.is_full_path = is_full_path;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.header_parameters = merge_headers(&self.header_parameters, &[(key.into(), value.into())]);
        self
    }

    pub fn with_query_structured<T>(mut self, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.query_parameters_structured = Some(StructuredParameters::new(value));
        self
    }

    pub fn with_query_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query_parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_body_structured<T>(mut self, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.body_parameters_structured = Some(StructuredParameters::new(value));
        self
    }

    pub fn with_body_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body_parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_body_encoder<E>(mut self, encoder: E) -> Self
    where
        E: BodyEncoder + 'static,
    {
        self.body_encoder = Arc::new(encoder);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_full_path(&self) -> bool {
        self.is_full_path
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn header_parameters(&self) -> &[(String, String)] {
        &self.header_parameters
    }

    pub fn query_source(&self) -> ParameterSource<'_> {
        match &self.query_parameters_structured {
            Some(structured) => ParameterSource::Structured(structured),
            None => ParameterSource::Raw(&self.query_parameters),
        }
    }

    pub fn body_source(&self) -> ParameterSource<'_> {
        match &self.body_parameters_structured {
            Some(structured) => ParameterSource::Structured(structured),
            None => ParameterSource::Raw(&self.body_parameters),
        }
    }

    pub fn body_encoder(&self) -> &dyn BodyEncoder {
        self.body_encoder.as_ref()
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<R> {
        self.response_decoder.decode(bytes)
    }
}

impl<R> Clone for Endpoint<R> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            is_full_path: self.is_full_path,
            method: self.method,
            header_parameters: self.header_parameters.clone(),
            query_parameters_structured: self.query_parameters_structured.clone(),
            query_parameters: self.query_parameters.clone(),
            body_parameters_structured: self.body_parameters_structured.clone(),
            body_parameters: self.body_parameters.clone(),
            body_encoder: Arc::clone(&self.body_encoder),
            response_decoder: Arc::clone(&self.response_decoder),
        }
    }
}

impl<R> fmt::Debug for Endpoint<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("is_full_path", &self.is_full_path)
            .field("header_parameters", &self.header_parameters)
            .field("query_parameters", &self.query_source())
            .field("body_parameters", &self.body_source())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Filter {
        query: String,
        page: u32,
    }

    #[test]
    fn structured_source_takes_precedence() {
        let endpoint = Endpoint::<Value>::new("search", HttpMethod::Get)
            .with_query_parameter("ignored", "yes")
            .with_query_structured(Filter {
                query: "batman".to_string(),
                page: 2,
            });
        let resolved = endpoint.query_source().resolve().unwrap();
        assert_eq!(resolved.get("query"), Some(&json!("batman")));
        assert_eq!(resolved.get("page"), Some(&json!(2)));
        assert!(resolved.get("ignored").is_none());
    }

    #[test]
    fn raw_source_used_without_structured_value() {
        let endpoint = Endpoint::<Value>::new("items", HttpMethod::Post)
            .with_body_parameter("title", "Heat")
            .with_body_parameter("year", 1995);
        match endpoint.body_source() {
            ParameterSource::Raw(map) => assert_eq!(map.len(), 2),
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn structured_value_must_be_an_object() {
        let endpoint = Endpoint::<Value>::new("search", HttpMethod::Get).with_query_structured(vec![1, 2, 3]);
        let err = endpoint.query_source().resolve().unwrap_err();
        assert!(err.contains("an array"), "{err}");
    }

    #[test]
    fn structured_serialization_failure_is_reported() {
        use std::collections::HashMap;
        // Non-string map keys cannot become JSON object keys.
        let mut bad = HashMap::new();
        bad.insert((1, 2), "x");
        let endpoint = Endpoint::<Value>::new("search", HttpMethod::Get).with_body_structured(bad);
        assert!(endpoint.body_source().resolve().is_err());
    }

    #[test]
    fn repeated_header_keeps_latest_value() {
        let endpoint = Endpoint::<Value>::new("search", HttpMethod::Get)
            .with_header("X-Key", "a")
            .with_header("X-Key", "b");
        assert_eq!(endpoint.header_parameters(), &[("X-Key".to_string(), "b".to_string())]);
    }
}
