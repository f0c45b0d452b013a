//! Conformance profiles and support levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// A closed conformance profile.
///
/// Variant declaration order is the canonical report order; the derived
/// `Ord` follows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Profile {
    #[serde(rename = "HTTP")]
    Http,
    #[serde(rename = "GRPC")]
    Grpc,
    #[serde(rename = "TLSPassthrough")]
    TlsPassthrough,
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
}

impl Profile {
    /// Every profile, in canonical order.
    pub const ALL: [Profile; 5] = [
        Profile::Http,
        Profile::Grpc,
        Profile::TlsPassthrough,
        Profile::Tcp,
        Profile::Udp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Http => "HTTP",
            Profile::Grpc => "GRPC",
            Profile::TlsPassthrough => "TLSPassthrough",
            Profile::Tcp => "TCP",
            Profile::Udp => "UDP",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profile::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypesError::UnknownProfile(s.to_string()))
    }
}

/// Support level a feature or test belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportLevel {
    Core,
    Extended,
}

impl SupportLevel {
    pub const ALL: [SupportLevel; 2] = [SupportLevel::Core, SupportLevel::Extended];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupportLevel::Core => "core",
            SupportLevel::Extended => "extended",
        }
    }

    /// Capitalised form used in report summaries.
    pub fn label(&self) -> &'static str {
        match self {
            SupportLevel::Core => "Core",
            SupportLevel::Extended => "Extended",
        }
    }
}

impl fmt::Display for SupportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupportLevel {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "core" => Ok(SupportLevel::Core),
            "extended" => Ok(SupportLevel::Extended),
            _ => Err(TypesError::UnknownSupportLevel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_matches_ord() {
        let mut shuffled = vec![Profile::Udp, Profile::Http, Profile::Tcp, Profile::Grpc];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![Profile::Http, Profile::Grpc, Profile::Tcp, Profile::Udp]
        );
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("http".parse::<Profile>().unwrap(), Profile::Http);
        assert_eq!(
            "tlspassthrough".parse::<Profile>().unwrap(),
            Profile::TlsPassthrough
        );
        assert!(matches!(
            "SCTP".parse::<Profile>(),
            Err(TypesError::UnknownProfile(name)) if name == "SCTP"
        ));
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&Profile::TlsPassthrough).unwrap();
        assert_eq!(json, "\"TLSPassthrough\"");
        let parsed: Profile = serde_json::from_str("\"GRPC\"").unwrap();
        assert_eq!(parsed, Profile::Grpc);
        assert!(serde_json::from_str::<Profile>("\"Mesh\"").is_err());
    }

    #[test]
    fn support_level_round_trip() {
        for level in SupportLevel::ALL {
            assert_eq!(level.as_str().parse::<SupportLevel>().unwrap(), level);
        }
        assert!("optional".parse::<SupportLevel>().is_err());
    }
}
