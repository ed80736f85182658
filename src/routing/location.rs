//! Navigation locations.
//!
//! A `Location` is what a history observer reports when the host navigates:
//! the host, the path and the hash fragment. Routing runs either on the path
//! or on the hash, depending on `RouteSource`.

use std::fmt;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::routing::matcher;
use crate::routing::types::RouteError;

/// Which part of a location is fed to the route tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteSource {
    /// Route on the URL path.
    #[default]
    Path,
    /// Route on the fragment, for hash-based history.
    Hash,
}

/// A parsed navigation target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Host, empty for relative locations.
    pub host: String,
    /// Percent-decoded URL path, always rooted.
    pub path: String,
    /// Percent-decoded fragment without the leading `#`.
    pub hash: String,
}

impl Location {
    /// Parse an absolute URL or a rooted/relative path.
    pub fn parse(input: &str) -> Result<Self, RouteError> {
        let invalid = |reason: url::ParseError| RouteError::InvalidLocation {
            input: input.to_string(),
            reason,
        };

        let url = match Url::parse(input) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = Url::parse("http://localhost/").map_err(invalid)?;
                let joined = base.join(input).map_err(invalid)?;
                return Ok(Self::from_url(&joined, String::new()));
            }
            Err(reason) => return Err(invalid(reason)),
        };
        let host = url.host_str().unwrap_or_default().to_string();
        Ok(Self::from_url(&url, host))
    }

    fn from_url(url: &Url, host: String) -> Self {
        Self {
            host,
            path: decode(url.path()),
            hash: decode(url.fragment().unwrap_or_default()),
        }
    }

    /// The string handed to the route tree.
    pub fn target(&self, source: RouteSource) -> &str {
        match source {
            RouteSource::Path => &self.path,
            RouteSource::Hash => &self.hash,
        }
    }

    /// Dot-separated state sequence, e.g. `/models/7` → `models.7`.
    pub fn sequence(&self, source: RouteSource) -> String {
        matcher::segments(self.target(source)).join(".")
    }
}

/// Undo the `url` crate's escaping so routes compare against raw text.
///
/// Invalid UTF-8 escapes are replaced with U+FFFD.
fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.trim_end_matches('/');
        f.write_str(if path.is_empty() { "/" } else { path })?;
        if !self.hash.is_empty() {
            write!(f, "#{}", self.hash)?;
        }
        Ok(())
    }
}
