// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use prospect_app::{InsertRequest, RecordService, ServiceReply, UpdateRequest};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// POST bodies are JSON but labelled as plain text; the endpoint reads the raw body.
pub const BODY_CONTENT_TYPE: &str = "text/plain;charset=utf-8";

#[derive(Debug, Clone)]
pub struct Client {
    url: Url,
    timeout: Option<Duration>,
    http: HttpClient,
}

impl Client {
    /// `timeout` of `None` waits as long as the server takes.
    pub fn new(url: &str, timeout: Option<Duration>) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            bail!("service.url must not be empty");
        }
        let url = Url::parse(url).with_context(|| format!("parse service url {url:?}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "service.url must use http or https, got {:?} -- check the [service] section",
                url.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self { url, timeout, http })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn lookup_url(&self, id: &str) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("id", id);
        url
    }

    fn post<T: Serialize>(&self, body: &T) -> Result<ServiceReply> {
        let body = serde_json::to_string(body).context("encode request body")?;
        let response = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, BODY_CONTENT_TYPE)
            .body(body)
            .send()
            .map_err(|error| connection_error(&self.url, error))?;
        decode_reply(response)
    }
}

impl RecordService for Client {
    fn lookup(&self, id: &str) -> Result<ServiceReply> {
        log::debug!("looking up record {id}");
        let response = self
            .http
            .get(self.lookup_url(id))
            .send()
            .map_err(|error| connection_error(&self.url, error))?;
        decode_reply(response)
    }

    fn insert(&self, request: &InsertRequest) -> Result<ServiceReply> {
        log::debug!("inserting record with {} fields", request.fields.len());
        self.post(request)
    }

    fn update(&self, request: &UpdateRequest) -> Result<ServiceReply> {
        log::debug!("updating record {}", request.id);
        self.post(request)
    }
}

fn decode_reply(response: Response) -> Result<ServiceReply> {
    let status = response.status();
    let body = response.text().context("read service response")?;
    if !status.is_success() {
        return Err(clean_error_response(status, &body));
    }
    serde_json::from_str(&body).context("decode service response")
}

fn connection_error(url: &Url, error: reqwest::Error) -> anyhow::Error {
    let host = url.host_str().unwrap_or("the record service");
    if error.is_timeout() {
        return anyhow!("request to {host} timed out -- raise service.timeout or check the network");
    }
    anyhow!("cannot reach {host} -- check service.url and your connection ({error})")
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message
        && !message.trim().is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message.trim());
    }

    let body = body.trim();
    if !body.is_empty() && body.len() < 100 && !body.contains('<') && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::{Client, clean_error_response};
    use reqwest::StatusCode;

    #[test]
    fn rejects_empty_and_non_http_urls() {
        assert!(Client::new("  ", None).is_err());
        let error = Client::new("ftp://example.com/exec", None).expect_err("ftp is refused");
        assert!(error.to_string().contains("http or https"));
    }

    #[test]
    fn lookup_url_encodes_identifier_as_query() {
        let client = Client::new("https://script.example.com/macros/s/abc/exec", None)
            .expect("client should initialize");
        assert_eq!(
            client.lookup_url("J-123 45&x").as_str(),
            "https://script.example.com/macros/s/abc/exec?id=J-123+45%26x"
        );
    }

    #[test]
    fn error_response_prefers_json_message() {
        let error = clean_error_response(StatusCode::BAD_GATEWAY, r#"{"message":"sheet busy"}"#);
        assert_eq!(error.to_string(), "server error (502): sheet busy");

        let error = clean_error_response(StatusCode::NOT_FOUND, "no such script");
        assert_eq!(error.to_string(), "server error (404): no such script");

        let error = clean_error_response(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert_eq!(error.to_string(), "server returned 500");
    }
}
