//! Assembly-source version numbers, `major.minor[.patch][_extra]`.
//!
//! Ordered by `(major, minor, patch)` only — `extra` is a non-ordering tag,
//! per `original_source/ic4/version.py`'s `field(default="", compare=False)`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
#[error("{0:?} is not a valid version number")]
pub struct VersionParseError(pub String);

#[derive(Clone, Eq, Debug)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub extra: String,
}

impl Version {
    pub fn new(major: u32, minor: u32, patch: u32) -> Version {
        Version { major, minor, patch, extra: String::new() }
    }

    fn ordering_key(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Version) -> bool {
        self.ordering_key() == other.ordering_key()
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Version) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Version) -> Ordering {
        self.ordering_key().cmp(&other.ordering_key())
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    /// Parses `major[.minor[.patch]][_extra]`; `minor` and `patch` default
    /// to `0` when omitted.
    fn from_str(s: &str) -> Result<Version, VersionParseError> {
        let (numeric, extra) = match s.find('_') {
            Some(idx) => (&s[..idx], s[idx + 1..].to_string()),
            None => (s, String::new()),
        };
        if !extra.is_empty() && !extra.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(VersionParseError(s.to_string()));
        }

        let mut parts = numeric.split('.');
        let major = parts
            .next()
            .filter(|p| !p.is_empty())
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| VersionParseError(s.to_string()))?;
        let minor = match parts.next() {
            Some(p) => p.parse().map_err(|_| VersionParseError(s.to_string()))?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(p) => p.parse().map_err(|_| VersionParseError(s.to_string()))?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(VersionParseError(s.to_string()));
        }

        Ok(Version { major, minor, patch, extra })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.extra.is_empty() {
            if self.patch == 0 {
                write!(f, "{}.{}", self.major, self.minor)
            } else {
                write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
            }
        } else {
            write!(f, "{}.{}.{}_{}", self.major, self.minor, self.patch, self.extra)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_and_patch_default_to_zero() {
        let v: Version = "1".parse().unwrap();
        assert_eq!(v, Version::new(1, 0, 0));
    }

    #[test]
    fn full_form_parses() {
        let v: Version = "0.1.2".parse().unwrap();
        assert_eq!((v.major, v.minor, v.patch), (0, 1, 2));
    }

    #[test]
    fn extra_tag_is_captured_but_excluded_from_ordering() {
        let a: Version = "1.2.3_rc1".parse().unwrap();
        let b: Version = "1.2.3_rc2".parse().unwrap();
        assert_eq!(a.extra, "rc1");
        assert_eq!(a, b); // extra doesn't participate in comparison
    }

    #[test]
    fn ordering_is_lexicographic_over_major_minor_patch() {
        let a: Version = "0.1".parse().unwrap();
        let b: Version = "0.2".parse().unwrap();
        assert!(a < b);
    }

    #[test]
    fn display_omits_patch_and_extra_when_absent() {
        assert_eq!(Version::new(0, 1, 0).to_string(), "0.1");
        assert_eq!(Version::new(0, 1, 2).to_string(), "0.1.2");
    }

    #[test]
    fn garbage_input_fails_to_parse() {
        assert!("not-a-version".parse::<Version>().is_err());
    }
}
