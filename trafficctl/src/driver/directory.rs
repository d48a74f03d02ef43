//! Host lookup by caller token.

use indexmap::IndexMap;

use crate::platform::Vendor;

/// What a directory knows about one controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    pub vendor: Vendor,
    pub address: String,
    /// Site control number, when known up front
    pub scn: Option<String>,
}

impl HostRecord {
    pub fn new(vendor: Vendor, address: impl Into<String>) -> Self {
        Self {
            vendor,
            address: address.into(),
            scn: None,
        }
    }

    pub fn with_scn(mut self, scn: impl Into<String>) -> Self {
        self.scn = Some(scn.into());
        self
    }
}

/// Resolves a caller's host token (usually a site number) to a controller.
pub trait HostDirectory: Send + Sync {
    fn lookup(&self, token: &str) -> Option<HostRecord>;
}

/// Directory backed by an in-memory table.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    hosts: IndexMap<String, HostRecord>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>, record: HostRecord) {
        self.hosts.insert(token.into(), record);
    }

    pub fn with(mut self, token: impl Into<String>, record: HostRecord) -> Self {
        self.insert(token, record);
        self
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl HostDirectory for StaticDirectory {
    fn lookup(&self, token: &str) -> Option<HostRecord> {
        self.hosts.get(token.trim()).cloned()
    }
}
