use std::fmt;
use std::str::FromStr;

/// A parsed mime type, e.g. `text/plain; charset=utf-8`.
///
/// Only the parts that drive payload conversion are kept: the type, the subtype and the
/// `charset` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeType {
    primary: String,
    sub: String,
    charset: Option<String>,
}

impl MimeType {
    pub const TEXT_PLAIN: &'static str = "text/plain";
    pub const APPLICATION_BINARY: &'static str = "application/octet-stream";

    /// Parse `raw`, falling back to `text/plain` if it is not a valid mime type.
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| Self::text_plain())
    }

    pub fn text_plain() -> Self {
        Self {
            primary: "text".into(),
            sub: "plain".into(),
            charset: None,
        }
    }

    /// `type/subtype`, without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.primary, self.sub)
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Whether payloads of this type are interpreted as text rather than kept as raw bytes.
    pub fn is_text(&self) -> bool {
        if self.primary == "text" || self.sub.ends_with("+json") || self.sub.ends_with("+xml") {
            return true;
        }
        self.primary == "application"
            && matches!(
                self.sub.as_str(),
                "json" | "xml" | "javascript" | "x-www-form-urlencoded"
            )
    }

    /// Fails if payloads of this type are text in a charset that cannot be decoded.
    pub fn ensure_decodable(&self) -> Result<(), ContentError> {
        match self.charset() {
            Some(charset) if self.is_text() && !is_utf8_compatible(charset) => {
                Err(ContentError::UnsupportedCharset {
                    charset: charset.to_owned(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Turn a raw payload into its typed representation.
    pub fn convert(&self, body: Vec<u8>) -> Result<Content, ContentError> {
        if !self.is_text() {
            return Ok(Content::Binary(body));
        }
        self.ensure_decodable()?;
        String::from_utf8(body)
            .map(Content::Text)
            .map_err(|e| ContentError::InvalidText {
                mime_type: self.essence(),
                source: e.utf8_error(),
            })
    }
}

fn is_utf8_compatible(charset: &str) -> bool {
    matches!(
        charset.to_ascii_lowercase().as_str(),
        "utf-8" | "utf8" | "us-ascii" | "ascii"
    )
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.primary, self.sub)?;
        if let Some(charset) = &self.charset {
            write!(f, "; charset={charset}")?;
        }
        Ok(())
    }
}

impl FromStr for MimeType {
    type Err = ContentError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || ContentError::InvalidMimeType(raw.to_owned());

        let mut parts = raw.split(';');
        let essence = parts.next().unwrap_or_default().trim();
        let (primary, sub) = essence.split_once('/').ok_or_else(invalid)?;
        let is_token = |s: &str| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
        };
        if !is_token(primary) || !is_token(sub) {
            return Err(invalid());
        }

        let charset = parts
            .filter_map(|parameter| parameter.split_once('='))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
            .map(|(_, value)| value.trim().trim_matches('"').to_ascii_lowercase());

        Ok(Self {
            primary: primary.to_ascii_lowercase(),
            sub: sub.to_ascii_lowercase(),
            charset,
        })
    }
}

/// A message payload, typed according to the consumer's configured mime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Binary(Vec<u8>),
}

impl Content {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Returns `None` for binary payloads.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ContentError {
    #[error("`{0}` is not a valid mime type.")]
    InvalidMimeType(String),
    #[error("Payloads encoded as `{charset}` are not supported.")]
    UnsupportedCharset { charset: String },
    #[error("The payload is not valid text for mime type `{mime_type}`.")]
    InvalidText {
        mime_type: String,
        #[source]
        source: std::str::Utf8Error,
    },
}
