// ABOUTME: Crate-wide version string and the CLI-tunable diagnostic toggles

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runtime options threaded through lexing, parsing, and evaluation. Built
/// from CLI flags in `main.rs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunConfig {
    /// `--report-scopes`: emit a line to stderr on every scope push/pop,
    /// for debugging closures and call-stack depth.
    pub report_scopes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_disables_scope_reporting() {
        assert!(!RunConfig::default().report_scopes);
    }
}
