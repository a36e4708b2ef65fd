//! Release version tokens and their ordering

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Hex digits kept from the BLAKE3 digest in a build hash
pub const BUILD_HASH_LEN: usize = 8;

/// Development stage of a version
///
/// Variant order is the precedence order: an alpha is older than a beta of
/// the same release, and a numbered sub-release follows the plain release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DevTag {
    Alpha(u32),
    Beta(u32),
    Pre(u32),
    Release,
    Sub(u32),
}

impl fmt::Display for DevTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevTag::Alpha(n) => write!(f, "-a{}", n),
            DevTag::Beta(n) => write!(f, "-b{}", n),
            DevTag::Pre(n) => write!(f, "-pre{}", n),
            DevTag::Release => Ok(()),
            DevTag::Sub(n) => write!(f, "-{}", n),
        }
    }
}

/// A parsed version token such as `101`, `1.0.1-b2` or `2.3.0+3fa9c1d2`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub tag: DevTag,
    /// Build hash, ignored by the ordering
    pub build: Option<String>,
}

fn invalid(token: &str, reason: impl Into<String>) -> Error {
    Error::InvalidVersion {
        token: token.to_string(),
        reason: reason.into(),
    }
}

fn number(token: &str, text: &str) -> Result<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(token, format!("'{}' is not a number", text)));
    }
    text.parse()
        .map_err(|_| invalid(token, format!("'{}' is out of range", text)))
}

fn counter(token: &str, text: &str) -> Result<u32> {
    if text.is_empty() { Ok(0) } else { number(token, text) }
}

impl Version {
    /// Parse a version token
    ///
    /// The release part is either dotted (`1.0.1`) or compact, one digit per
    /// component (`101`). Suffixes: `-a<n>`/`-alpha<n>`, `-b<n>`/`-beta<n>`,
    /// `-pre<n>`/`-rc<n>`, `-<n>`. A build hash may follow after `+`.
    pub fn parse(token: &str) -> Result<Self> {
        let trimmed = token.trim();
        let (core, build) = match trimmed.split_once('+') {
            Some((core, build)) => {
                if build.is_empty() || !build.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(invalid(token, "build hash must be alphanumeric"));
                }
                (core, Some(build.to_ascii_lowercase()))
            }
            None => (trimmed, None),
        };
        let (release, suffix) = match core.split_once('-') {
            Some((release, suffix)) => (release, Some(suffix)),
            None => (core, None),
        };

        let (major, minor, patch) = if release.contains('.') {
            let parts: Vec<&str> = release.split('.').collect();
            if parts.len() != 3 {
                return Err(invalid(token, "expected MAJOR.MINOR.PATCH"));
            }
            (number(token, parts[0])?, number(token, parts[1])?, number(token, parts[2])?)
        } else {
            let digits: Vec<u32> = release.chars().filter_map(|c| c.to_digit(10)).collect();
            if release.len() != 3 || digits.len() != 3 {
                return Err(invalid(token, "expected three digits"));
            }
            (digits[0], digits[1], digits[2])
        };

        let tag = match suffix.map(str::to_ascii_lowercase) {
            None => DevTag::Release,
            Some(s) => {
                let split = s.find(|c: char| c.is_ascii_digit()).unwrap_or(s.len());
                let (class, count) = s.split_at(split);
                match class {
                    "a" | "alpha" => DevTag::Alpha(counter(token, count)?),
                    "b" | "beta" => DevTag::Beta(counter(token, count)?),
                    "pre" | "rc" => DevTag::Pre(counter(token, count)?),
                    "" => DevTag::Sub(number(token, count)?),
                    other => return Err(invalid(token, format!("unknown suffix '{}'", other))),
                }
            }
        };

        Ok(Self {
            major,
            minor,
            patch,
            tag,
            build,
        })
    }

    /// Normalized `MAJOR.MINOR.PATCH`
    pub fn release(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    /// `(release, dev tag, build hash)`, with an empty tag for plain releases
    pub fn triple(&self) -> (String, String, Option<String>) {
        (self.release(), self.tag.to_string(), self.build.clone())
    }

    /// Attach a build hash
    pub fn with_build(mut self, build: impl Into<String>) -> Self {
        self.build = Some(build.into());
        self
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.release(), self.tag)?;
        if let Some(build) = &self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch, self.tag).cmp(&(other.major, other.minor, other.patch, other.tag))
    }
}

/// Whether `candidate` strictly succeeds `previous`
pub fn validate(candidate: &str, previous: &str) -> Result<bool> {
    Ok(Version::parse(candidate)? > Version::parse(previous)?)
}

/// Like [`validate`], turning `false` into `Error::VersionOrderViolation`
pub fn ensure_newer(candidate: &str, previous: &str) -> Result<Version> {
    let next = Version::parse(candidate)?;
    if next > Version::parse(previous)? {
        Ok(next)
    } else {
        Err(Error::VersionOrderViolation {
            candidate: candidate.to_string(),
            previous: previous.to_string(),
        })
    }
}

/// Short BLAKE3 hash identifying a build's content
pub fn build_hash(content: &str) -> String {
    let hex = blake3::hash(content.as_bytes()).to_hex();
    hex.as_str()[..BUILD_HASH_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("101", "100", true)]
    #[case("110", "119", false)]
    #[case("100-a1", "099", true)]
    #[case("100-b1", "100-a5", true)]
    #[case("100-a2", "100-a2", false)]
    #[case("100-a2", "100-a10", false)]
    #[case("100-pre1", "100-b9", true)]
    #[case("100", "100-pre3", true)]
    #[case("100-1", "100", true)]
    #[case("1.10.0", "1.9.9", true)]
    #[case("1.0.0+abc", "1.0.0+def", false)]
    fn test_validate(#[case] candidate: &str, #[case] previous: &str, #[case] expected: bool) {
        assert_eq!(validate(candidate, previous).unwrap(), expected);
    }

    #[test]
    fn test_parse_compact_and_dotted_agree() {
        let compact = Version::parse("203-rc2").unwrap();
        let dotted = Version::parse("2.0.3-pre2").unwrap();
        assert_eq!(compact, dotted);
        assert_eq!(compact.to_string(), "2.0.3-pre2");
    }

    #[test]
    fn test_triple() {
        let v = Version::parse("1.4.2-b3+A1B2").unwrap();
        assert_eq!(v.triple(), ("1.4.2".to_string(), "-b3".to_string(), Some("a1b2".to_string())));
        assert_eq!(Version::parse("100").unwrap().triple().1, "");
    }

    #[rstest]
    #[case("")]
    #[case("10")]
    #[case("1000")]
    #[case("1.0")]
    #[case("1.x.0")]
    #[case("100-z1")]
    #[case("100-")]
    #[case("100+")]
    #[case("100+ab-cd")]
    fn test_parse_rejects(#[case] token: &str) {
        assert!(matches!(Version::parse(token), Err(Error::InvalidVersion { .. })));
    }

    #[test]
    fn test_ensure_newer() {
        assert_eq!(ensure_newer("101", "100").unwrap().release(), "1.0.1");
        assert!(matches!(
            ensure_newer("100", "100"),
            Err(Error::VersionOrderViolation { .. })
        ));
    }

    #[test]
    fn test_build_hash() {
        let hash = build_hash("\\documentclass{article}\n");
        assert_eq!(hash.len(), BUILD_HASH_LEN);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, build_hash("\\documentclass{article}\n"));
        assert_ne!(hash, build_hash("\\documentclass{report}\n"));
    }
}
