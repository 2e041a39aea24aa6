//! Observability utilities for agents.

#![warn(missing_docs, clippy::pedantic)]

pub mod tracing_support {
    //! Structured tracing helpers.
    //!
    //! Logs are written to stderr so stdout stays reserved for command
    //! output. A non-empty `RUST_LOG` replaces the verbosity-derived filter.

    use std::io;

    use thiserror::Error;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::filter::ParseError;

    /// Environment variable that overrides the verbosity flags.
    pub const FILTER_ENV: &str = "RUST_LOG";

    /// Errors raised while installing the subscriber.
    #[derive(Debug, Error)]
    pub enum TelemetryError {
        /// The filter directive could not be parsed.
        #[error("invalid log filter `{directive}`: {source}")]
        Filter {
            /// Directive that failed to parse.
            directive: String,
            /// Parser error.
            #[source]
            source: ParseError,
        },

        /// A global subscriber was already installed.
        #[error("tracing subscriber already initialised: {0}")]
        AlreadyInitialised(String),
    }

    /// Verbosity chosen on the command line.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Verbosity {
        /// Number of `-v` flags.
        pub verbose: u8,
        /// Whether `-q` was given; wins over `verbose`.
        pub quiet: bool,
    }

    impl Verbosity {
        /// Creates a verbosity setting.
        #[must_use]
        pub const fn new(verbose: u8, quiet: bool) -> Self {
            Self { verbose, quiet }
        }

        /// Filter directive implied by the flags alone.
        #[must_use]
        pub fn directive(self) -> &'static str {
            if self.quiet {
                return "error";
            }
            match self.verbose {
                0 => "warn,agent_kernel=info,article_generator=info",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Picks the effective directive: a non-blank `override_directive`
    /// (normally the value of `RUST_LOG`) wins over the flags.
    #[must_use]
    pub fn select_directive(override_directive: Option<&str>, verbosity: Verbosity) -> String {
        override_directive
            .map(str::trim)
            .filter(|directive| !directive.is_empty())
            .map_or_else(|| verbosity.directive().to_owned(), ToOwned::to_owned)
    }

    /// Builds the filter for `directive`.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Filter`] if the directive does not parse.
    pub fn build_filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
        EnvFilter::try_new(directive).map_err(|source| TelemetryError::Filter {
            directive: directive.to_owned(),
            source,
        })
    }

    /// Installs the global fmt subscriber writing to stderr.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError`] if the filter is invalid or a subscriber is
    /// already installed.
    pub fn init(verbosity: Verbosity) -> Result<(), TelemetryError> {
        let from_env = std::env::var(FILTER_ENV).ok();
        let directive = select_directive(from_env.as_deref(), verbosity);
        let filter = build_filter(&directive)?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(verbosity.verbose > 0)
            .try_init()
            .map_err(|err| TelemetryError::AlreadyInitialised(err.to_string()))?;

        tracing::debug!(directive = %directive, "tracing initialised");
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn quiet_wins_over_verbose() {
            assert_eq!(Verbosity::new(3, true).directive(), "error");
        }

        #[test]
        fn verbose_flags_raise_the_level() {
            assert!(Verbosity::default().directive().starts_with("warn"));
            assert_eq!(Verbosity::new(1, false).directive(), "info");
            assert_eq!(Verbosity::new(2, false).directive(), "debug");
            assert_eq!(Verbosity::new(9, false).directive(), "trace");
        }

        #[test]
        fn rust_log_overrides_flags() {
            let verbosity = Verbosity::new(2, false);
            assert_eq!(select_directive(Some("agent_adapters=trace"), verbosity), "agent_adapters=trace");
            assert_eq!(select_directive(Some("  "), verbosity), "debug");
            assert_eq!(select_directive(None, verbosity), "debug");
        }

        #[test]
        fn default_directives_parse() {
            for verbose in 0..4 {
                assert!(build_filter(Verbosity::new(verbose, false).directive()).is_ok());
            }
            assert!(build_filter("error").is_ok());
        }

        #[test]
        fn invalid_directive_is_reported() {
            let err = build_filter("agent_kernel=loud").unwrap_err();
            assert!(err.to_string().contains("agent_kernel=loud"));
        }
    }
}
