//! Per-flag registration options.

/// Options accepted by the typed constructors on [`FlagSet`](crate::FlagSet).
///
/// Both settings are opt-in relative to the registry's defaults: a flag is
/// optional unless [`required`](Self::required) is set, and follows file
/// edits unless [`static_value`](Self::static_value) is set (or the registry
/// was configured with `dynamic_by_default = false`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagOptions {
    pub(crate) required: bool,
    pub(crate) dynamic: Option<bool>,
}

impl FlagOptions {
    pub const fn new() -> Self {
        Self {
            required: false,
            dynamic: None,
        }
    }

    /// Fail registration when the backing file is missing or does not parse.
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Keep observing the backing file after registration.
    pub const fn dynamic(mut self) -> Self {
        self.dynamic = Some(true);
        self
    }

    /// Read the backing file once at registration and ignore later edits.
    pub const fn static_value(mut self) -> Self {
        self.dynamic = Some(false);
        self
    }

    pub(crate) fn is_dynamic(&self, registry_default: bool) -> bool {
        self.dynamic.unwrap_or(registry_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_registry() {
        let opts = FlagOptions::new();
        assert!(!opts.required);
        assert!(opts.is_dynamic(true));
        assert!(!opts.is_dynamic(false));
    }

    #[test]
    fn test_explicit_overrides_registry() {
        assert!(!FlagOptions::new().static_value().is_dynamic(true));
        assert!(FlagOptions::new().dynamic().is_dynamic(false));
        assert!(FlagOptions::new().required().required);
    }
}
