//! Device identity and OS-family tags.
//!
//! A [`DeviceProfile`] is produced by an inventory loader outside this crate.
//! [`OsFamily::classify`] is offered for loaders that only have the free-text
//! platform column of an inventory sheet.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Closed set of device operating-system families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OsFamily {
    /// Cisco IOS-XR (ASR9k, NCS, CRS, XRv).
    IosXr,
    /// Cisco IOS / IOS-XE routers.
    IosXe,
    /// Catalyst-class layer 2 switches.
    L2Switch,
}

/// Ordered classification table. Narrow model codes come before the broader
/// families that would otherwise swallow them (`ASR903` before `ASR90`).
const CLASSIFICATION: &[(OsFamily, &[&str])] = &[
    (OsFamily::IosXe, &["ASR903", "ASR-903", "ASR920", "ASR-920"]),
    (
        OsFamily::IosXr,
        &[
            "ASR9K", "ASR-9K", "ASR90", "ASR91", "ASR99", "XRV", "IOS-XR", "IOSXR", "NCS", "CRS",
        ],
    ),
    (
        OsFamily::IosXe,
        &[
            "ASR1", "ASR-1", "ISR", "CSR", "IOS-XE", "IOSXE", "IOSV", "IOS-V", "VIOS", "C8", "C11",
            "C12",
        ],
    ),
    (
        OsFamily::L2Switch,
        &[
            "SWITCH", "SW", "CAT", "C9300", "C9200", "C9400", "C9500", "C3850", "C3750", "C2960",
            "9300", "9200", "3850", "3750", "2960", "L2", "IOL", "I86BI",
        ],
    ),
];

impl OsFamily {
    /// Every family, in registry order.
    pub const ALL: [OsFamily; 3] = [OsFamily::IosXr, OsFamily::IosXe, OsFamily::L2Switch];

    /// Map a free-text platform string (e.g. "ASR9006", "C9300-48P") to a family.
    ///
    /// Unrecognized text falls back to [`OsFamily::IosXe`].
    pub fn classify(platform: &str) -> OsFamily {
        let text = platform.trim().to_ascii_uppercase();
        CLASSIFICATION
            .iter()
            .find(|(_, codes)| codes.iter().any(|code| text.contains(code)))
            .map(|(family, _)| *family)
            .unwrap_or(OsFamily::IosXe)
    }

    /// Canonical tag, as used in command-file names and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::IosXr => "IOS-XR",
            OsFamily::IosXe => "IOS-XE",
            OsFamily::L2Switch => "L2-SWITCH",
        }
    }

    /// Position in [`OsFamily::ALL`].
    pub(crate) fn index(self) -> usize {
        match self {
            OsFamily::IosXr => 0,
            OsFamily::IosXe => 1,
            OsFamily::L2Switch => 2,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsFamily {
    type Err = ConfigError;

    /// Parse a family tag. Case, dashes and underscores are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "IOSXR" | "XR" => Ok(OsFamily::IosXr),
            "IOSXE" | "XE" | "IOS" => Ok(OsFamily::IosXe),
            "L2SWITCH" | "L2" => Ok(OsFamily::L2Switch),
            _ => Err(ConfigError::UnknownFamily { name: s.to_string() }),
        }
    }
}

/// One target device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Inventory hostname, used for logging and transcript file names.
    pub hostname: String,

    /// Address the transport connects to.
    pub address: String,

    /// OS family tag.
    pub family: OsFamily,

    /// Port override; the run's credential port applies when `None`.
    #[serde(default)]
    pub port: Option<u16>,
}

impl DeviceProfile {
    /// Create a profile using the run's default port.
    pub fn new(
        hostname: impl Into<String>,
        address: impl Into<String>,
        family: OsFamily,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            address: address.into(),
            family,
            port: None,
        }
    }

    /// Set an explicit port for this device.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// The port to connect to, given the run default.
    pub fn port_or(&self, default: u16) -> u16 {
        self.port.unwrap_or(default)
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) [{}]", self.hostname, self.address, self.family)
    }
}
