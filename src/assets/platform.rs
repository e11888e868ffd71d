use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The cloud platform the operator manages private clusters on
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlatformType {
    #[default]
    None,
    AWS,
    IBMCloud,
    Agent,
    KubeVirt,
    Azure,
}

impl PlatformType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformType::None => "None",
            PlatformType::AWS => "AWS",
            PlatformType::IBMCloud => "IBMCloud",
            PlatformType::Agent => "Agent",
            PlatformType::KubeVirt => "KubeVirt",
            PlatformType::Azure => "Azure",
        }
    }
}

impl fmt::Display for PlatformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            PlatformType::None,
            PlatformType::AWS,
            PlatformType::IBMCloud,
            PlatformType::Agent,
            PlatformType::KubeVirt,
            PlatformType::Azure,
        ]
        .into_iter()
        .find(|p| p.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| Error::UnsupportedPlatform(s.into()))
    }
}
