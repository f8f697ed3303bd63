/// Packed `major.minor.patch` version.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Version {
    pub value: u32,
}

/// Version of the array semantics implemented by this crate.
pub const VERSION: Version = Version::new(2, 0, 0);

impl Version {

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        let value =
            (major << 22) |
            ((minor & 0x3FF) << 12) |
            (patch & 0xFFF);
        Self {
            value,
        }
    }

    pub const fn as_u32(&self) -> u32 {
        self.value
    }

    pub const fn major(self) -> u32 {
        self.value >> 22
    }

    pub const fn minor(self) -> u32 {
        (self.value >> 12) & 0x3FF
    }

    pub const fn patch(self) -> u32 {
        self.value & 0xFFF
    }
}

impl From<Version> for u32 {

    fn from(value: Version) -> Self {
        value.value
    }
}

impl From<u32> for Version {

    fn from(value: u32) -> Self {
        Self {
            value
        }
    }
}

impl core::fmt::Display for Version {

    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}
