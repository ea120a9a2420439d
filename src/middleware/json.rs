//! JSON request-body parsing.
//!
//! Requests whose `Content-Type` is `application/json` have their body
//! decoded into a [`serde_json::Value`] before the router runs. Handlers read
//! it through [`Request::json`]. Other requests pass through untouched.

use std::borrow::Cow;

use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use serde_json::{Map, Value, json};
use tracing::debug;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

const DEFAULT_LIMIT: usize = 100 * 1024;

/// JSON body parser middleware.
pub struct JsonBody {
    limit: usize,
    strict: bool,
}

impl JsonBody {
    /// 100 KiB limit, strict mode on.
    pub fn new() -> Self {
        Self { limit: DEFAULT_LIMIT, strict: true }
    }

    /// Maximum accepted body size in bytes. Larger bodies get `413`.
    pub fn limit(mut self, bytes: usize) -> Self {
        self.limit = bytes;
        self
    }

    /// In strict mode only objects and arrays are accepted at the top level.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn parse(&self, req: &Request, charset: Charset) -> Result<Value, Response> {
        let body = req.body();
        if req.body_over_limit() || body.len() > self.limit {
            return Err(error(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("request entity too large (limit {} bytes)", self.limit),
            ));
        }

        let Some(text) = charset.decode(body) else {
            return Err(error(
                StatusCode::BAD_REQUEST,
                format!("body is not valid {}", charset.label()),
            ));
        };

        // JSON whitespace only: space, tab, LF, CR.
        let first = text.bytes().find(|&b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r'));
        let Some(first) = first else {
            return Ok(Value::Object(Map::new()));
        };
        if self.strict && first != b'{' && first != b'[' {
            return Err(error(
                StatusCode::BAD_REQUEST,
                "strict mode accepts only objects and arrays".to_owned(),
            ));
        }

        serde_json::from_str(&text).map_err(|e| error(StatusCode::BAD_REQUEST, e.to_string()))
    }
}

impl Default for JsonBody {
    fn default() -> Self { Self::new() }
}

impl Middleware for JsonBody {
    fn handle<'a>(&'a self, mut req: Request, next: Next<'a>) -> BoxFuture<'a> {
        let Some(content_type) = req.header(CONTENT_TYPE.as_str()) else {
            return next.run(req);
        };
        let media = MediaType::parse(content_type);
        if !media.is_json() {
            return next.run(req);
        }
        let charset = match Charset::from_label(media.charset) {
            Some(charset) => charset,
            None => {
                let label = media.charset.unwrap_or_default().to_ascii_uppercase();
                let res = error(
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    format!("unsupported charset \"{label}\""),
                );
                return Box::pin(async move { res });
            }
        };

        match self.parse(&req, charset) {
            Ok(value) => {
                req.set_json(value);
                next.run(req)
            }
            Err(res) => {
                debug!(path = req.path(), status = %res.status_code(), "rejecting JSON body");
                Box::pin(async move { res })
            }
        }
    }

    fn name(&self) -> &'static str { "json" }

    fn body_limit(&self, headers: &HeaderMap) -> Option<usize> {
        let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
        MediaType::parse(content_type).is_json().then_some(self.limit)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Endian {
    Little,
    Big,
}

/// Unicode encodings accepted for JSON bodies. `None` endianness means
/// "detect from the byte-order mark, little-endian otherwise".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Charset {
    Utf8,
    Utf16(Option<Endian>),
    Utf32(Option<Endian>),
}

impl Charset {
    /// Maps a `charset` parameter to an encoding. Absent means UTF-8;
    /// anything outside the `utf-*` family is unsupported.
    fn from_label(label: Option<&str>) -> Option<Self> {
        let Some(label) = label else {
            return Some(Self::Utf8);
        };
        match label.to_ascii_lowercase().as_str() {
            "utf-8" => Some(Self::Utf8),
            "utf-16" => Some(Self::Utf16(None)),
            "utf-16le" => Some(Self::Utf16(Some(Endian::Little))),
            "utf-16be" => Some(Self::Utf16(Some(Endian::Big))),
            "utf-32" => Some(Self::Utf32(None)),
            "utf-32le" => Some(Self::Utf32(Some(Endian::Little))),
            "utf-32be" => Some(Self::Utf32(Some(Endian::Big))),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf16(_) => "UTF-16",
            Self::Utf32(_) => "UTF-32",
        }
    }

    /// Decodes `body` to text, dropping a leading byte-order mark.
    fn decode(self, body: &[u8]) -> Option<Cow<'_, str>> {
        let mut text = match self {
            Self::Utf8 => {
                let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
                return std::str::from_utf8(body).ok().map(Cow::Borrowed);
            }
            Self::Utf16(endian) => {
                let (endian, body) = match (endian, body) {
                    (None, [0xFE, 0xFF, rest @ ..]) => (Endian::Big, rest),
                    (None, [0xFF, 0xFE, rest @ ..]) => (Endian::Little, rest),
                    (None, _) => (Endian::Little, body),
                    (Some(e), _) => (e, body),
                };
                if body.len() % 2 != 0 {
                    return None;
                }
                let units = body.chunks_exact(2).map(|c| match endian {
                    Endian::Little => u16::from_le_bytes([c[0], c[1]]),
                    Endian::Big => u16::from_be_bytes([c[0], c[1]]),
                });
                char::decode_utf16(units).collect::<Result<String, _>>().ok()?
            }
            Self::Utf32(endian) => {
                let (endian, body) = match (endian, body) {
                    (None, [0x00, 0x00, 0xFE, 0xFF, rest @ ..]) => (Endian::Big, rest),
                    (None, [0xFF, 0xFE, 0x00, 0x00, rest @ ..]) => (Endian::Little, rest),
                    (None, _) => (Endian::Little, body),
                    (Some(e), _) => (e, body),
                };
                if body.len() % 4 != 0 {
                    return None;
                }
                body.chunks_exact(4)
                    .map(|c| {
                        let unit = [c[0], c[1], c[2], c[3]];
                        char::from_u32(match endian {
                            Endian::Little => u32::from_le_bytes(unit),
                            Endian::Big => u32::from_be_bytes(unit),
                        })
                    })
                    .collect::<Option<String>>()?
            }
        };
        if text.starts_with('\u{FEFF}') {
            text.drain(..'\u{FEFF}'.len_utf8());
        }
        Some(Cow::Owned(text))
    }
}

fn error(status: StatusCode, message: String) -> Response {
    let body = json!({ "error": message }).to_string();
    Response::builder().status(status).json(body)
}

/// The parts of a `Content-Type` value this parser cares about.
struct MediaType<'a> {
    essence: &'a str,
    charset: Option<&'a str>,
}

impl<'a> MediaType<'a> {
    fn parse(value: &'a str) -> Self {
        let mut parts = value.split(';');
        let essence = parts.next().unwrap_or_default().trim();
        let charset = parts
            .filter_map(|p| p.split_once('='))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("charset"))
            .map(|(_, v)| v.trim().trim_matches('"'));
        Self { essence, charset }
    }

    fn is_json(&self) -> bool {
        self.essence.eq_ignore_ascii_case("application/json")
    }
}
