//! Client ownership token.
//!
//! The browser keeps the list of document ids it created in a single cookie,
//! `owned_docs`, holding a percent-encoded JSON array. The list is a hint
//! only: it is never checked against the remote store, so anyone holding
//! the cookie string can claim the same documents.
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};

pub const OWNERSHIP_COOKIE: &str = "owned_docs";

/// One year.
pub const OWNERSHIP_COOKIE_MAX_AGE: u64 = 31_536_000;

/// Characters escaped in the cookie value (encodeURIComponent set).
const COOKIE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Ordered, duplicate-free set of document ids owned by one client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnedDocs {
    ids: Vec<String>,
}

impl OwnedDocs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut owned = Self::new();
        for id in ids {
            owned.add(id);
        }
        owned
    }

    /// Parse a raw `Cookie` request header (`a=1; owned_docs=...; b=2`).
    /// Missing or corrupt cookie gives an empty list.
    pub fn from_cookie_header(header: &str) -> Self {
        header
            .split(';')
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, _)| name.trim() == OWNERSHIP_COOKIE)
            .map(|(_, value)| Self::from_cookie_value(value.trim()))
            .unwrap_or_default()
    }

    /// Parse the cookie value alone.
    pub fn from_cookie_value(value: &str) -> Self {
        let decoded = match percent_decode_str(value).decode_utf8() {
            Ok(decoded) => decoded,
            Err(e) => {
                log::debug!(target: "slidegist.ownership", "cookie is not utf-8: {}", e);
                return Self::new();
            }
        };
        match serde_json::from_str::<Vec<serde_json::Value>>(&decoded) {
            Ok(values) => Self::from_ids(
                values
                    .into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .filter(|id| !id.is_empty()),
            ),
            Err(e) => {
                log::debug!(target: "slidegist.ownership", "ignoring corrupt cookie: {}", e);
                Self::new()
            }
        }
    }

    /// Append `id` unless already present. Returns true if it was added.
    pub fn add(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Remove `id` if present. Returns true if it was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|owned| owned != id);
        self.ids.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|owned| owned == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Percent-encoded JSON array, as stored in the cookie.
    pub fn to_cookie_value(&self) -> String {
        let json = serde_json::to_string(&self.ids).unwrap_or_else(|_| "[]".to_string());
        utf8_percent_encode(&json, COOKIE_VALUE).to_string()
    }

    /// Full `Set-Cookie` header value.
    pub fn to_set_cookie(&self) -> String {
        format!(
            "{}={}; Path=/; Max-Age={}; SameSite=Lax",
            OWNERSHIP_COOKIE,
            self.to_cookie_value(),
            OWNERSHIP_COOKIE_MAX_AGE
        )
    }
}
