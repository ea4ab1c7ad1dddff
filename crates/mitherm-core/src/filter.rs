//! Device filtering by name or address.

/// Predicate matching a discovered device by local name or address.
///
/// If an address was configured, comparison is solely on the address;
/// otherwise solely on the local name. Both comparisons are
/// case-insensitive string equality. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct DeviceFilter {
    name: String,
    address: String,
}

impl DeviceFilter {
    /// Create a filter matching a device by local name.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: String::new(),
        }
    }

    /// Create a filter matching a device by address
    /// (MAC on Linux/Windows, UUID on macOS).
    pub fn by_address(address: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            address: address.into(),
        }
    }

    /// Create a filter from the configuration surface: a non-empty
    /// address takes priority over the name.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        let address = address.into();
        if address.is_empty() {
            Self::by_name(name)
        } else {
            Self::by_address(address)
        }
    }

    /// Check whether a discovered device matches this filter.
    ///
    /// An empty discovered name or address simply does not match;
    /// it is never an error.
    #[must_use]
    pub fn matches(&self, name: &str, address: &str) -> bool {
        if !self.address.is_empty() {
            !address.is_empty() && address.eq_ignore_ascii_case(&self.address)
        } else {
            !name.is_empty() && name.eq_ignore_ascii_case(&self.name)
        }
    }

    /// Human-readable description of what the filter is looking for,
    /// used in log and error messages.
    #[must_use]
    pub fn target(&self) -> &str {
        if self.address.is_empty() {
            &self.name
        } else {
            &self.address
        }
    }
}
