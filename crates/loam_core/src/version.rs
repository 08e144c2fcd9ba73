//! Versions for plugin ABI and scene format compatibility

use core::cmp::Ordering;
use core::fmt;

/// Semantic version
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl Version {
    #[inline]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self { major, minor, patch }
    }

    /// Unpack from the `major << 16 | minor` word plugins export
    #[inline]
    pub const fn from_abi_word(word: u32) -> Self {
        Self::new((word >> 16) as u16, (word & 0xFFFF) as u16, 0)
    }

    /// Whether a host at `self` can use something built against `built_for`.
    ///
    /// Majors must match and `built_for` must not rely on a newer minor.
    pub fn can_host(&self, built_for: &Version) -> bool {
        self.major == built_for.major && built_for.minor <= self.minor
    }

    #[inline]
    const fn sort_key(&self) -> u64 {
        (self.major as u64) << 32 | (self.minor as u64) << 16 | self.patch as u64
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abi_word() {
        assert_eq!(Version::from_abi_word(0x0001_0003), Version::new(1, 3, 0));
        assert_eq!(Version::from_abi_word(0x0002_0000), Version::new(2, 0, 0));
    }

    #[test]
    fn test_hosting_rules() {
        let host = Version::new(1, 2, 0);
        assert!(host.can_host(&Version::new(1, 0, 0)));
        assert!(host.can_host(&Version::new(1, 2, 9)));
        assert!(!host.can_host(&Version::new(1, 3, 0)));
        assert!(!host.can_host(&Version::new(2, 0, 0)));
    }

    #[test]
    fn test_ordering_and_display() {
        assert_eq!(Version::new(1, 2, 3).to_string(), "1.2.3");
        assert!(Version::new(1, 10, 0) > Version::new(1, 9, 9));
    }
}
