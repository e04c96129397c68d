// Copyright 2024. The Tessera Project Contributors
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! §4.7: a small client that forwards local command invocations to the node's HTTP API. It joins
//! the API base path with request path segments, encodes options as query parameters, streams
//! the request body as an opaque octet stream, and decodes the response either as a raw stream
//! or a structured JSON value depending on the response's content-type. A missing content-type
//! header is treated as a raw stream. Status codes >= 400 are decoded as a typed error carrying a
//! numeric code and a message.

use multiaddr::{Multiaddr, Protocol};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// The fixed base path every request is rooted under, matching the original host's `ApiPath`.
pub const API_PATH: &str = "/api/v0";

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("API address '{0}' has no resolvable host/port")]
    InvalidAddress(String),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },
}

/// One option value. The original client passed an untyped string map; §9's design note on a
/// "dynamic options map" resolves that into this small closed set instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Opt {
    Str(String),
    Bool(bool),
    Int(i64),
}

impl Opt {
    fn to_query_value(&self) -> String {
        match self {
            Opt::Str(s) => s.clone(),
            Opt::Bool(b) => b.to_string(),
            Opt::Int(i) => i.to_string(),
        }
    }
}

impl From<&str> for Opt {
    fn from(s: &str) -> Self {
        Opt::Str(s.to_string())
    }
}

impl From<String> for Opt {
    fn from(s: String) -> Self {
        Opt::Str(s)
    }
}

impl From<bool> for Opt {
    fn from(b: bool) -> Self {
        Opt::Bool(b)
    }
}

impl From<i64> for Opt {
    fn from(i: i64) -> Self {
        Opt::Int(i)
    }
}

/// An ordered set of request options, serialized to query parameters in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Options(Vec<(String, Opt)>);

impl Options {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Opt>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.0.iter().map(|(k, v)| (k.clone(), v.to_query_value())).collect()
    }
}

#[derive(Debug, Deserialize)]
struct RemoteError {
    code: i64,
    message: String,
}

/// A decoded response body: either the raw bytes of an octet-stream response, or a parsed JSON
/// value for anything else.
#[derive(Debug, Clone)]
pub enum ApiResponse {
    Raw(Vec<u8>),
    Value(serde_json::Value),
}

pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(api_address: &Multiaddr) -> Result<Self, ApiClientError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base: base_url(api_address)?,
        })
    }

    /// Sends `body` to `path` (joined under [`API_PATH`]) with `options` encoded as query
    /// parameters, and decodes the response per the content-type rule described at module level.
    pub async fn send(&self, path: &[&str], options: &Options, body: Vec<u8>) -> Result<ApiResponse, ApiClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiClientError::InvalidAddress(self.base.to_string()))?
            .extend(path);
        for (key, value) in options.to_query_pairs() {
            url.query_pairs_mut().append_pair(&key, &value);
        }

        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

        match content_type.as_deref() {
            None | Some("application/octet-stream") => Ok(ApiResponse::Raw(response.bytes().await?.to_vec())),
            Some(_) => {
                let bytes = response.bytes().await?;
                if status.as_u16() >= 400 {
                    let err: RemoteError = serde_json::from_slice(&bytes)?;
                    Err(ApiClientError::Remote { code: err.code, message: err.message })
                } else {
                    Ok(ApiResponse::Value(serde_json::from_slice(&bytes)?))
                }
            },
        }
    }
}

fn base_url(addr: &Multiaddr) -> Result<Url, ApiClientError> {
    let mut host = None;
    let mut port = None;
    for protocol in addr.iter() {
        match protocol {
            Protocol::Ip4(ip) => host = Some(ip.to_string()),
            Protocol::Ip6(ip) => host = Some(format!("[{ip}]")),
            Protocol::Dns(name) | Protocol::Dns4(name) | Protocol::Dns6(name) | Protocol::Dnsaddr(name) => {
                host = Some(name.to_string())
            },
            Protocol::Tcp(p) => port = Some(p),
            _ => {},
        }
    }
    let host = host.ok_or_else(|| ApiClientError::InvalidAddress(addr.to_string()))?;
    let port = port.ok_or_else(|| ApiClientError::InvalidAddress(addr.to_string()))?;
    Url::parse(&format!("http://{host}:{port}{API_PATH}")).map_err(ApiClientError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_joins_host_port_and_api_path() {
        let addr: Multiaddr = "/ip4/127.0.0.1/tcp/5001".parse().unwrap();
        let url = base_url(&addr).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5001/api/v0");
    }

    #[test]
    fn base_url_rejects_address_without_port() {
        let addr: Multiaddr = "/ip4/127.0.0.1".parse().unwrap();
        assert!(matches!(base_url(&addr), Err(ApiClientError::InvalidAddress(_))));
    }

    #[test]
    fn options_serialize_in_insertion_order() {
        let options = Options::new().with("arg", "hello").with("recursive", true).with("depth", 2i64);
        assert_eq!(
            options.to_query_pairs(),
            vec![
                ("arg".to_string(), "hello".to_string()),
                ("recursive".to_string(), "true".to_string()),
                ("depth".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn remote_error_body_decodes_code_and_message() {
        let err: RemoteError = serde_json::from_str(r#"{"code": 42, "message": "not found"}"#).unwrap();
        assert_eq!(err.code, 42);
        assert_eq!(err.message, "not found");
    }
}
