//! HTTP plumbing: the [`Transport`] seam and its default blocking implementation.

use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            _ => Err(Error::InvalidUsage(format!("unsupported HTTP method '{s}'"))),
        }
    }
}

/// Request payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Serialized as `application/json`.
    Json(serde_json::Value),
    /// Sent as-is with the given content type.
    Bytes { data: Vec<u8>, content_type: String },
    /// A single `file` part of a `multipart/form-data` body.
    Multipart {
        file_name: String,
        data: Vec<u8>,
        content_type: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        HttpRequest {
            method,
            url: url.into(),
            params: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first parameter named `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A response whose body has not been read yet.
pub struct HttpResponse {
    pub status: u16,
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// `Link` header entries keyed by `rel`.
    pub links: HashMap<String, String>,
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `rel="next"` pagination link, if any.
    pub fn next_link(&self) -> Option<&str> {
        self.links.get("next").map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

/// Sends one request and hands back the response with its body unread.
///
/// Implementations attach credentials themselves; callers never see them.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Credentials attached by [`ReqwestTransport`].
#[derive(Clone, Default)]
pub enum Auth {
    #[default]
    None,
    Basic {
        user: String,
        password: String,
    },
    Bearer(String),
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::None => f.write_str("None"),
            Auth::Basic { user, .. } => write!(f, "Basic({user}, ***)"),
            Auth::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

static LINK_ENTRY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^>]*)>([^<]*)").expect("Invalid link entry regex pattern"));

static LINK_REL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)rel\s*=\s*"?([^";,]+)"?"#).expect("Invalid link rel regex pattern")
});

/// Parses a `Link` header into a `rel -> url` map.
///
/// URLs may contain commas (field lists in query strings), so entries are
/// delimited by their `<...>` brackets rather than by splitting on `,`.
pub fn parse_link_header(value: &str) -> HashMap<String, String> {
    let mut links = HashMap::new();
    for caps in LINK_ENTRY_PATTERN.captures_iter(value) {
        let url = caps[1].trim().to_string();
        if let Some(rels) = LINK_REL_PATTERN.captures(&caps[2]) {
            for name in rels[1].split_whitespace() {
                links.insert(name.to_string(), url.clone());
            }
        }
    }
    links
}

/// Blocking transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    auth: Auth,
}

impl ReqwestTransport {
    pub fn new(auth: Auth, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(ReqwestTransport { client, auth })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .header(ACCEPT, "application/json");
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        builder = match &self.auth {
            Auth::None => builder,
            Auth::Basic { user, password } => builder.basic_auth(user, Some(password)),
            Auth::Bearer(token) => builder.bearer_auth(token),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            None => builder,
            Some(Body::Json(value)) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(&value)?),
            Some(Body::Bytes { data, content_type }) => {
                builder.header(CONTENT_TYPE, content_type).body(data)
            }
            Some(Body::Multipart {
                file_name,
                data,
                content_type,
            }) => {
                let part = reqwest::blocking::multipart::Part::bytes(data)
                    .file_name(file_name)
                    .mime_str(&content_type)?;
                builder.multipart(reqwest::blocking::multipart::Form::new().part("file", part))
            }
        };

        debug!(method = %request.method, url = %request.url, "sending request");
        let response = builder.send()?;
        let status = response.status().as_u16();
        debug!(method = %request.method, status, "received response");

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let mut links = HashMap::new();
        for (_, value) in headers.iter().filter(|(k, _)| k.eq_ignore_ascii_case("link")) {
            links.extend(parse_link_header(value));
        }

        Ok(HttpResponse {
            status,
            method: request.method,
            url: response.url().to_string(),
            headers,
            links,
            body: Box::new(response),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_header_with_commas_in_urls() {
        let header = concat!(
            r#"<https://x.service-now.com/api/now/table/incident?sysparm_fields=a,b&sysparm_offset=10>;rel="next","#,
            r#"<https://x.service-now.com/api/now/table/incident?sysparm_offset=0>;rel="first""#,
        );
        let links = parse_link_header(header);
        assert_eq!(
            links["next"],
            "https://x.service-now.com/api/now/table/incident?sysparm_fields=a,b&sysparm_offset=10"
        );
        assert_eq!(
            links["first"],
            "https://x.service-now.com/api/now/table/incident?sysparm_offset=0"
        );
    }

    #[test]
    fn link_header_without_rel() {
        assert!(parse_link_header("<https://x.service-now.com/a>").is_empty());
        assert!(parse_link_header("").is_empty());
        let links = parse_link_header(r#"<https://x.service-now.com/b>; REL=next"#);
        assert_eq!(links["next"], "https://x.service-now.com/b");
    }

    #[test]
    fn method_from_str() {
        assert_eq!("patch".parse::<Method>().unwrap(), Method::Patch);
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn auth_debug_hides_secrets() {
        let auth = Auth::Basic {
            user: "admin".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{auth:?}").contains("hunter2"));
    }
}
