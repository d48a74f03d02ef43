//! Process-wide registry of vendor profiles.

use std::sync::LazyLock;

use super::definition::VendorProfile;
use super::{Vendor, vendors};

/// Built once on first use, read-only afterwards.
static REGISTRY: LazyLock<VendorRegistry> = LazyLock::new(VendorRegistry::builtin);

/// Registry of vendor profiles, indexed by [`Vendor`].
#[derive(Debug)]
pub struct VendorRegistry {
    profiles: [VendorProfile; 4],
}

impl VendorRegistry {
    /// Get the global registry.
    pub fn global() -> &'static VendorRegistry {
        &REGISTRY
    }

    fn builtin() -> Self {
        Self {
            profiles: [
                vendors::swarco::profile(),
                vendors::potok_p::profile(),
                vendors::potok_s::profile(),
                vendors::peek::profile(),
            ],
        }
    }

    fn slot(vendor: Vendor) -> usize {
        match vendor {
            Vendor::Swarco => 0,
            Vendor::PotokP => 1,
            Vendor::PotokS => 2,
            Vendor::Peek => 3,
        }
    }

    /// Get the profile of a vendor.
    pub fn get(&self, vendor: Vendor) -> &VendorProfile {
        &self.profiles[Self::slot(vendor)]
    }

    /// Look a profile up by vendor name.
    pub fn lookup(&self, name: &str) -> Option<&VendorProfile> {
        name.parse::<Vendor>().ok().map(|v| self.get(v))
    }

    /// Iterate over all profiles.
    pub fn profiles(&self) -> impl Iterator<Item = &VendorProfile> {
        self.profiles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_vendor_has_its_own_profile() {
        let registry = VendorRegistry::global();
        for vendor in Vendor::ALL {
            assert_eq!(registry.get(vendor).vendor, vendor);
        }
        assert_eq!(registry.profiles().count(), Vendor::ALL.len());
    }

    #[test]
    fn test_stage_ranges() {
        let registry = VendorRegistry::global();
        assert_eq!(registry.get(Vendor::Swarco).max_stage, 8);
        assert_eq!(registry.get(Vendor::PotokP).max_stage, 128);
        assert_eq!(registry.get(Vendor::PotokS).max_stage, 128);
        assert_eq!(registry.get(Vendor::Peek).max_stage, 32);
    }

    #[test]
    fn test_lookup_by_name() {
        let registry = VendorRegistry::global();
        assert_eq!(registry.lookup("potok_s").map(|p| p.vendor), Some(Vendor::PotokS));
        assert!(registry.lookup("unknown").is_none());
    }
}
