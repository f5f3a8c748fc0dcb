//! Per-request state shared by a handler chain.
//!
//! # Responsibilities
//! - Expose the matched request (method, path, params, buffered body)
//! - Collect the response written by handlers
//! - Carry typed values from earlier handlers to later ones
//!
//! # Design Decisions
//! - Body is buffered before the chain starts, so handlers stay synchronous
//! - The last write wins; handlers may overwrite an earlier response
//! - Aborting stops the chain but keeps whatever was written

use std::collections::HashMap;

use axum::body::{Body, Bytes};
use axum::http::{
    header, request, Extensions, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri,
};
use axum::response::Response;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::http::response::ErrorBody;

pub struct Context {
    request: request::Parts,
    params: HashMap<String, String>,
    body: Bytes,
    status: StatusCode,
    headers: HeaderMap,
    response: Bytes,
    values: Extensions,
    aborted: bool,
}

impl Context {
    pub fn new(request: request::Parts, params: HashMap<String, String>, body: Bytes) -> Self {
        Self {
            request,
            params,
            body,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            response: Bytes::new(),
            values: Extensions::new(),
            aborted: false,
        }
    }

    pub fn method(&self) -> &Method {
        &self.request.method
    }

    pub fn uri(&self) -> &Uri {
        &self.request.uri
    }

    pub fn path(&self) -> &str {
        self.request.uri.path()
    }

    pub fn request_headers(&self) -> &HeaderMap {
        &self.request.headers
    }

    /// Value of a path parameter captured by the engine.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decode the request body as JSON.
    pub fn bind_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Store a value for handlers later in the chain.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.values.insert(value);
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get::<T>()
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Write `value` as a JSON response.
    pub fn json<T: Serialize>(&mut self, status: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.write(status, "application/json", bytes);
            }
            Err(e) => {
                tracing::error!(error = %e, path = %self.path(), "Failed to serialize response");
                self.write(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "text/plain; charset=utf-8",
                    "failed to serialize response",
                );
            }
        }
    }

    /// Write a plain text response.
    pub fn string(&mut self, status: StatusCode, body: impl Into<String>) {
        self.write(status, "text/plain; charset=utf-8", body.into());
    }

    /// Write the standard JSON error envelope and stop the chain.
    pub fn error_json(&mut self, status: StatusCode, message: &str, error: impl ToString) {
        let body = ErrorBody::new(status, message, error);
        self.json(status, &body);
        self.abort();
    }

    /// Stop the chain after the current handler.
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    pub fn abort_with_status(&mut self, status: StatusCode) {
        self.status = status;
        self.abort();
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn response_status(&self) -> StatusCode {
        self.status
    }

    pub fn response_body(&self) -> &Bytes {
        &self.response
    }

    fn write(&mut self, status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) {
        self.status = status;
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.response = body.into();
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.response));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
