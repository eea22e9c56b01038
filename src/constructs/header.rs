use crate::BpmError;

pub const IDENTIFIER: &str = "BPM"; // leading tag of every manifest
pub const IDENTIFIER_LEN: usize = IDENTIFIER.len();
pub const CONTAINER_VERSION: u8 = 1;
pub const VERSION_FLAG: u32 = 0x1000;
pub const MIN_INNER_VERSION: u32 = 3;
pub const MAX_INNER_VERSION: u32 = 5;

/// Manifest-level metadata preceding the probe tables.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    pub identifier: String, // "BPM"
    pub container_version: u8, // always 1
    pub inner_version: u32, // masked, 3..=5
    pub version_flag: bool, // 0x1000 was set on disk
    pub manifest_name: String, // free text
    pub control_config: Option<String>, // present when inner_version > 1
}
impl Header {
    /// Splits a raw on-disk inner version into its masked value and flag bit.
    pub fn split_inner_version(raw: u32) -> (u32, bool) {
        if raw & VERSION_FLAG == VERSION_FLAG {
            (raw ^ VERSION_FLAG, true)
        } else {
            (raw, false)
        }
    }
    /// Whether a (masked) inner version carries the control config block.
    pub fn has_control_config(inner_version: u32) -> bool {
        inner_version > 1
    }
    pub fn validate_identifier(identifier: &str) -> crate::Result<()> {
        if identifier != IDENTIFIER {
            return Err(BpmError::InvalidIdentifier {
                expected: IDENTIFIER,
                actual: identifier.to_string(),
            });
        }
        Ok(())
    }
    pub fn validate_container_version(version: u8) -> crate::Result<()> {
        if version != CONTAINER_VERSION {
            return Err(BpmError::UnsupportedContainerVersion(version));
        }
        Ok(())
    }
    pub fn validate_inner_version(version: u32) -> crate::Result<()> {
        if !(MIN_INNER_VERSION..=MAX_INNER_VERSION).contains(&version) {
            return Err(BpmError::UnsupportedInnerVersion {
                version,
                min: MIN_INNER_VERSION,
                max: MAX_INNER_VERSION,
            });
        }
        Ok(())
    }
    pub fn validate(&self) -> crate::Result<()> {
        Self::validate_identifier(&self.identifier)?;
        Self::validate_container_version(self.container_version)?;
        Self::validate_inner_version(self.inner_version)?;
        Ok(())
    }
    /// The inner version as it appeared on disk, flag bit included.
    pub fn raw_inner_version(&self) -> u32 {
        if self.version_flag {
            self.inner_version | VERSION_FLAG
        } else {
            self.inner_version
        }
    }
}
