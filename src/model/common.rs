//! Shared vocabulary types used across element records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Timelike, Utc};

use crate::error::{FormatErrorKind, Result, SpdxError};

// ============================================================================
// Timestamps
// ============================================================================

/// Parse an SPDX timestamp (`YYYY-MM-DDThh:mm:ssZ`).
///
/// Sub-second precision is truncated on input: the SPDX grammar has no
/// fractional-seconds field, and keeping it would break render∘parse
/// exactness.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(s).map_err(|e| {
        SpdxError::decode(
            "SPDX",
            "timestamp field",
            FormatErrorKind::InvalidValue {
                field: "timestamp".to_string(),
                message: format!("`{s}` is not a YYYY-MM-DDThh:mm:ssZ timestamp: {e}"),
            },
        )
    })?;
    let utc = parsed.with_timezone(&Utc);
    Ok(utc.with_nanosecond(0).unwrap_or(utc))
}

/// Render a timestamp in the SPDX `YYYY-MM-DDThh:mm:ssZ` form.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ============================================================================
// Schema versions
// ============================================================================

/// Comma-separated list of the schema versions this crate can represent.
pub const SUPPORTED_VERSIONS: &str = "SPDX-2.1, SPDX-2.2, SPDX-2.3";

/// The SPDX 2.x schema generations the canonical model can represent.
///
/// SPDX 3.0 uses a discontinuous element-collection shape and is refused at
/// version negotiation rather than half-represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpdxVersion {
    V2_1,
    V2_2,
    V2_3,
}

impl SpdxVersion {
    /// All supported versions, oldest first.
    pub const ALL: [Self; 3] = [Self::V2_1, Self::V2_2, Self::V2_3];

    /// The next newer version, if any.
    #[must_use]
    pub fn successor(self) -> Option<Self> {
        match self {
            Self::V2_1 => Some(Self::V2_2),
            Self::V2_2 => Some(Self::V2_3),
            Self::V2_3 => None,
        }
    }
}

impl Default for SpdxVersion {
    fn default() -> Self {
        Self::V2_3
    }
}

impl fmt::Display for SpdxVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::V2_1 => "SPDX-2.1",
            Self::V2_2 => "SPDX-2.2",
            Self::V2_3 => "SPDX-2.3",
        };
        f.write_str(s)
    }
}

impl FromStr for SpdxVersion {
    type Err = SpdxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SPDX-2.1" => Ok(Self::V2_1),
            "SPDX-2.2" => Ok(Self::V2_2),
            "SPDX-2.3" => Ok(Self::V2_3),
            other => Err(SpdxError::unsupported_version(
                "SPDX",
                other,
                SUPPORTED_VERSIONS,
            )),
        }
    }
}

// ============================================================================
// Agents
// ============================================================================

/// A typed actor record: the `{type, value}` shape behind SPDX's
/// `Person: Jane Doe (jane@example.com)` strings.
///
/// The free-text part after the type keyword is kept verbatim (including any
/// parenthesised email), so rendering reproduces the input exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Agent {
    Person(String),
    Organization(String),
    Tool(String),
    /// `NOASSERTION`: the actor was not evaluated (suppliers/originators).
    NoAssertion,
}

impl Agent {
    /// The free-text part, if this is a concrete actor.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Person(name) | Self::Organization(name) | Self::Tool(name) => Some(name),
            Self::NoAssertion => None,
        }
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Person(name) => write!(f, "Person: {name}"),
            Self::Organization(name) => write!(f, "Organization: {name}"),
            Self::Tool(name) => write!(f, "Tool: {name}"),
            Self::NoAssertion => f.write_str("NOASSERTION"),
        }
    }
}

impl FromStr for Agent {
    type Err = SpdxError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "NOASSERTION" {
            return Ok(Self::NoAssertion);
        }
        let (kind, name) = s.split_once(':').ok_or_else(|| invalid_agent(s))?;
        let name = name.trim_start().to_string();
        match kind.trim() {
            "Person" => Ok(Self::Person(name)),
            "Organization" => Ok(Self::Organization(name)),
            "Tool" => Ok(Self::Tool(name)),
            _ => Err(invalid_agent(s)),
        }
    }
}

fn invalid_agent(text: &str) -> SpdxError {
    SpdxError::decode(
        "SPDX",
        "agent string",
        FormatErrorKind::InvalidValue {
            field: "agent".to_string(),
            message: format!(
                "`{text}` must be `Person: <name>`, `Organization: <name>`, `Tool: <name>` or NOASSERTION"
            ),
        },
    )
}

// ============================================================================
// Checksums
// ============================================================================

/// A checksum attached to a file, package or external document reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    pub algorithm: ChecksumAlgorithm,
    /// Hex-encoded digest
    pub value: String,
}

impl Checksum {
    #[must_use]
    pub fn new(algorithm: ChecksumAlgorithm, value: impl Into<String>) -> Self {
        Self {
            algorithm,
            value: value.into(),
        }
    }

    /// The conventional SHA1 checksum used by verification codes.
    #[must_use]
    pub fn sha1(value: impl Into<String>) -> Self {
        Self::new(ChecksumAlgorithm::Sha1, value)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.algorithm, self.value)
    }
}

impl FromStr for Checksum {
    type Err = SpdxError;

    /// Parse the `ALGORITHM: hexvalue` form used by tag-value checksum fields.
    fn from_str(s: &str) -> Result<Self> {
        let (algorithm, value) = s.split_once(':').ok_or_else(|| {
            SpdxError::decode(
                "SPDX",
                "checksum field",
                FormatErrorKind::InvalidValue {
                    field: "checksum".to_string(),
                    message: format!("`{s}` must be `<algorithm>: <value>`"),
                },
            )
        })?;
        Ok(Self::new(
            algorithm.trim().parse::<ChecksumAlgorithm>()?,
            value.trim(),
        ))
    }
}

/// The checksum algorithms SPDX 2.x admits.
///
/// The set grew over time; `introduced_in` drives the per-version capability
/// checks used by encoders and the version adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha3_256,
    Sha3_384,
    Sha3_512,
    Blake2b256,
    Blake2b384,
    Blake2b512,
    Blake3,
    Md2,
    Md4,
    Md5,
    Md6,
    Adler32,
}

impl ChecksumAlgorithm {
    /// The oldest schema version whose grammar admits this algorithm.
    #[must_use]
    pub fn introduced_in(self) -> SpdxVersion {
        match self {
            Self::Sha1
            | Self::Sha224
            | Self::Sha256
            | Self::Sha384
            | Self::Sha512
            | Self::Md2
            | Self::Md4
            | Self::Md5
            | Self::Md6 => SpdxVersion::V2_1,
            Self::Sha3_256
            | Self::Sha3_384
            | Self::Sha3_512
            | Self::Blake2b256
            | Self::Blake2b384
            | Self::Blake2b512
            | Self::Blake3
            | Self::Adler32 => SpdxVersion::V2_3,
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sha1 => "SHA1",
            Self::Sha224 => "SHA224",
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
            Self::Sha512 => "SHA512",
            Self::Sha3_256 => "SHA3-256",
            Self::Sha3_384 => "SHA3-384",
            Self::Sha3_512 => "SHA3-512",
            Self::Blake2b256 => "BLAKE2b-256",
            Self::Blake2b384 => "BLAKE2b-384",
            Self::Blake2b512 => "BLAKE2b-512",
            Self::Blake3 => "BLAKE3",
            Self::Md2 => "MD2",
            Self::Md4 => "MD4",
            Self::Md5 => "MD5",
            Self::Md6 => "MD6",
            Self::Adler32 => "ADLER32",
        };
        f.write_str(s)
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = SpdxError;

    fn from_str(s: &str) -> Result<Self> {
        let algorithm = match s {
            "SHA1" => Self::Sha1,
            "SHA224" => Self::Sha224,
            "SHA256" => Self::Sha256,
            "SHA384" => Self::Sha384,
            "SHA512" => Self::Sha512,
            "SHA3-256" => Self::Sha3_256,
            "SHA3-384" => Self::Sha3_384,
            "SHA3-512" => Self::Sha3_512,
            "BLAKE2b-256" => Self::Blake2b256,
            "BLAKE2b-384" => Self::Blake2b384,
            "BLAKE2b-512" => Self::Blake2b512,
            "BLAKE3" => Self::Blake3,
            "MD2" => Self::Md2,
            "MD4" => Self::Md4,
            "MD5" => Self::Md5,
            "MD6" => Self::Md6,
            "ADLER32" => Self::Adler32,
            other => {
                return Err(SpdxError::decode(
                    "SPDX",
                    "checksum algorithm",
                    FormatErrorKind::InvalidValue {
                        field: "checksum algorithm".to_string(),
                        message: format!("unknown algorithm `{other}`"),
                    },
                ))
            }
        };
        Ok(algorithm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_ordering() {
        assert!(SpdxVersion::V2_1 < SpdxVersion::V2_3);
        assert_eq!(SpdxVersion::V2_1.successor(), Some(SpdxVersion::V2_2));
        assert_eq!(SpdxVersion::V2_3.successor(), None);
    }

    #[test]
    fn test_version_render_parse() {
        for version in SpdxVersion::ALL {
            assert_eq!(version.to_string().parse::<SpdxVersion>().unwrap(), version);
        }
    }

    #[test]
    fn test_spdx_3_0_is_refused() {
        let err = "SPDX-3.0".parse::<SpdxVersion>().unwrap_err();
        match err {
            SpdxError::Decode {
                source: FormatErrorKind::UnsupportedVersion { version, supported },
                ..
            } => {
                assert_eq!(version, "SPDX-3.0");
                assert!(supported.contains("SPDX-2.3"));
            }
            other => panic!("Expected UnsupportedVersion, got {other:?}"),
        }
    }

    #[test]
    fn test_agent_round_trip() {
        let agents = [
            Agent::Person("Jane Doe (jane@example.com)".to_string()),
            Agent::Organization("ExampleCodeInspect ()".to_string()),
            Agent::Tool("LicenseFind-1.0".to_string()),
            Agent::NoAssertion,
        ];
        for agent in agents {
            assert_eq!(agent.to_string().parse::<Agent>().unwrap(), agent);
        }
    }

    #[test]
    fn test_agent_rejects_unknown_kind() {
        assert!("Robot: beep".parse::<Agent>().is_err());
        assert!("no separator".parse::<Agent>().is_err());
    }

    #[test]
    fn test_checksum_field_parse() {
        let checksum: Checksum = "SHA1: 85ed0817af83a24ad8da68c2b5094de69833983c"
            .parse()
            .unwrap();
        assert_eq!(checksum.algorithm, ChecksumAlgorithm::Sha1);
        assert_eq!(checksum.value, "85ed0817af83a24ad8da68c2b5094de69833983c");
        assert_eq!(
            checksum.to_string(),
            "SHA1: 85ed0817af83a24ad8da68c2b5094de69833983c"
        );
    }

    #[test]
    fn test_algorithm_spellings() {
        assert_eq!(ChecksumAlgorithm::Sha3_256.to_string(), "SHA3-256");
        assert_eq!(
            "BLAKE2b-384".parse::<ChecksumAlgorithm>().unwrap(),
            ChecksumAlgorithm::Blake2b384
        );
        assert!("SHA-1".parse::<ChecksumAlgorithm>().is_err());
    }

    #[test]
    fn test_timestamp_round_trip() {
        let ts = parse_timestamp("2021-01-01T12:00:00Z").unwrap();
        assert_eq!(format_timestamp(&ts), "2021-01-01T12:00:00Z");
    }

    #[test]
    fn test_timestamp_truncates_subseconds() {
        let ts = parse_timestamp("2021-01-01T12:00:00.123Z").unwrap();
        assert_eq!(format_timestamp(&ts), "2021-01-01T12:00:00Z");
    }

    #[test]
    fn test_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_algorithm_version_gates() {
        assert_eq!(
            ChecksumAlgorithm::Sha256.introduced_in(),
            SpdxVersion::V2_1
        );
        assert_eq!(
            ChecksumAlgorithm::Blake3.introduced_in(),
            SpdxVersion::V2_3
        );
    }
}
