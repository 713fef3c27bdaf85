//! Descriptor strings.
//!
//! The adapters pass descriptors to the connectivity library untouched. This
//! module exists for the two parties on either side of that hand-off: callers
//! assembling a descriptor, and connectivity implementations reading one.

use std::fmt;
use std::str::FromStr;

use crate::error::OdbcMiddlewareError;

const SECRET_KEYS: [&str; 3] = ["PWD", "PASSWORD", "ACCESSTOKEN"];

/// A parsed `KEY=value;KEY=value` connection descriptor.
///
/// Keys keep their original spelling but are matched case-insensitively, as ODBC
/// driver managers do. Values containing `;`, `{` or `}` render wrapped in braces.
/// ```rust
/// use odbc_middleware::config::Descriptor;
///
/// let d: Descriptor = "DSN=test;UID=user;PWD={se;cret}".parse().unwrap();
/// assert_eq!(d.get("pwd"), Some("se;cret"));
/// assert_eq!(d.redacted(), "DSN=test;UID=user;PWD=***");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    pairs: Vec<(String, String)>,
}

impl Descriptor {
    #[must_use]
    pub fn builder() -> DescriptorBuilder {
        DescriptorBuilder::default()
    }

    /// Look up a value by key, ignoring ASCII case.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Set `key`, replacing an existing entry with the same (case-insensitive) key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self
            .pairs
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            slot.1 = value;
        } else {
            self.pairs.push((key, value));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Render with credential values masked, for logs and error messages.
    #[must_use]
    pub fn redacted(&self) -> String {
        self.render(true)
    }

    fn render(&self, redact: bool) -> String {
        let mut out = String::new();
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            out.push_str(key);
            out.push('=');
            if redact && is_secret(key) {
                out.push_str("***");
            } else if value.contains([';', '{', '}']) || value.trim() != value {
                out.push('{');
                out.push_str(&value.replace('}', "}}"));
                out.push('}');
            } else {
                out.push_str(value);
            }
        }
        out
    }
}

fn is_secret(key: &str) -> bool {
    SECRET_KEYS.iter().any(|s| s.eq_ignore_ascii_case(key))
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

impl FromStr for Descriptor {
    type Err = OdbcMiddlewareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut descriptor = Descriptor::default();
        let mut rest = s;
        loop {
            rest = rest.trim_start_matches([' ', '\t', ';']);
            if rest.is_empty() {
                break;
            }
            let eq = rest.find('=').ok_or_else(|| {
                OdbcMiddlewareError::ConfigError(format!("descriptor segment without '=': {rest}"))
            })?;
            let key = rest[..eq].trim();
            if key.is_empty() || key.contains(';') {
                return Err(OdbcMiddlewareError::ConfigError(format!(
                    "descriptor segment without a key: {rest}"
                )));
            }
            let after = rest[eq + 1..].trim_start();
            let (value, remaining) = if let Some(braced) = after.strip_prefix('{') {
                parse_braced(braced)?
            } else {
                match after.find(';') {
                    Some(end) => (after[..end].trim_end().to_string(), &after[end..]),
                    None => (after.trim_end().to_string(), ""),
                }
            };
            descriptor.pairs.push((key.to_string(), value));
            rest = remaining;
        }
        Ok(descriptor)
    }
}

fn parse_braced(input: &str) -> Result<(String, &str), OdbcMiddlewareError> {
    let mut value = String::new();
    let mut chars = input.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if c == '}' {
            if matches!(chars.peek(), Some((_, '}'))) {
                chars.next();
                value.push('}');
                continue;
            }
            let remaining = input[idx + 1..].trim_start();
            if !remaining.is_empty() && !remaining.starts_with(';') {
                return Err(OdbcMiddlewareError::ConfigError(format!(
                    "unexpected text after braced value: {remaining}"
                )));
            }
            return Ok((value, remaining));
        }
        value.push(c);
    }
    Err(OdbcMiddlewareError::ConfigError(
        "unterminated braced value in descriptor".into(),
    ))
}

/// Render a descriptor string for logging without leaking credentials.
///
/// Unparseable descriptors are not echoed at all.
#[must_use]
pub fn redact(descriptor: &str) -> String {
    descriptor
        .parse::<Descriptor>()
        .map_or_else(|_| "<unparseable descriptor>".to_string(), |d| d.redacted())
}

/// Fluent builder for descriptors.
#[derive(Debug, Clone, Default)]
pub struct DescriptorBuilder {
    descriptor: Descriptor,
}

impl DescriptorBuilder {
    #[must_use]
    pub fn dsn(self, dsn: impl Into<String>) -> Self {
        self.attribute("DSN", dsn)
    }

    #[must_use]
    pub fn driver(self, driver: impl Into<String>) -> Self {
        self.attribute("Driver", driver)
    }

    #[must_use]
    pub fn database(self, database: impl Into<String>) -> Self {
        self.attribute("Database", database)
    }

    #[must_use]
    pub fn user(self, user: impl Into<String>) -> Self {
        self.attribute("UID", user)
    }

    #[must_use]
    pub fn password(self, password: impl Into<String>) -> Self {
        self.attribute("PWD", password)
    }

    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.descriptor.set(key, value);
        self
    }

    #[must_use]
    pub fn finish(self) -> Descriptor {
        self.descriptor
    }

    /// Render the descriptor string.
    #[must_use]
    pub fn build(self) -> String {
        self.descriptor.to_string()
    }
}
