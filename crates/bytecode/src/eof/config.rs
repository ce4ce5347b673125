use primitives::MAX_INITCODE_SIZE;

/// Validation settings.
///
/// Defaults accept any non-zero version and containers of any size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EofConfig {
    /// Container size limit.
    ///
    /// If `Some`, bigger containers are rejected before the header is read.
    pub limit_container_size: Option<usize>,
    /// Accepted container version.
    ///
    /// If `None`, any non-zero version is accepted.
    pub version: Option<u8>,
}

impl EofConfig {
    /// Returns config that limits containers to the initcode size limit.
    pub fn with_initcode_limit() -> Self {
        Self::default().with_limit_container_size(MAX_INITCODE_SIZE)
    }

    /// Sets the container size limit.
    pub fn with_limit_container_size(mut self, limit: usize) -> Self {
        self.limit_container_size = Some(limit);
        self
    }

    /// Pins the accepted version.
    pub fn with_version(mut self, version: u8) -> Self {
        self.version = Some(version);
        self
    }

    /// Returns `true` if a container of `size` bytes is within the limit.
    #[inline]
    pub fn is_size_allowed(&self, size: usize) -> bool {
        self.limit_container_size.is_none_or(|limit| size <= limit)
    }

    /// Returns `true` if the version is accepted.
    #[inline]
    pub fn is_version_allowed(&self, version: u8) -> bool {
        version != 0 && self.version.is_none_or(|expected| expected == version)
    }
}
