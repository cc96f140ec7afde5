//! System-wide constants for the exit game.

/// Default dispute window, in ledger-height units.
pub const DEFAULT_DISPUTE_PERIOD: u64 = 10;

/// Extra lockup a predicate adds on top of the dispute window unless it
/// says otherwise.
pub const DEFAULT_ADDITIONAL_LOCKUP: u64 = 0;

/// Label the default contract address is derived from.
pub const DEFAULT_PLASMA_LABEL: &str = "plasma";

/// Label the default operator address is derived from.
pub const DEFAULT_OPERATOR_LABEL: &str = "operator";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_semver() {
        let parts: Vec<_> = VERSION.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.parse::<u64>().is_ok()));
    }
}
