use crate::iovec::MAX_IOVECS;
use crate::readiness::Backend;

/// Receive pipeline configuration, applied once per connection.
#[derive(Debug, Clone)]
pub struct Config {
    /// Event-notification backend governing readiness bookkeeping.
    /// Defaults to the platform's usual backend ([`Backend::detect`]).
    pub backend: Backend,
    /// Maximum iovecs per read. Must be in `1..=MAX_IOVECS`.
    /// Default: [`MAX_IOVECS`].
    pub max_iovecs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::detect(),
            max_iovecs: MAX_IOVECS,
        }
    }
}

impl Config {
    /// Validate configuration values. Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        if self.max_iovecs == 0 || self.max_iovecs > MAX_IOVECS {
            return Err(crate::error::Error::Config(format!(
                "max_iovecs must be > 0 and <= {MAX_IOVECS}"
            )));
        }
        Ok(())
    }
}

/// Builder for [`Config`] with `build()` validation.
///
/// # Example
///
/// ```rust
/// use recvchain::{Backend, ConfigBuilder};
///
/// let config = ConfigBuilder::new()
///     .backend(Backend::QueryAfterRead)
///     .max_iovecs(16)
///     .build()
///     .expect("invalid config");
/// assert_eq!(config.max_iovecs, 16);
/// ```
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default config values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event-notification backend.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Set the maximum number of iovecs per read.
    pub fn max_iovecs(mut self, n: usize) -> Self {
        self.config.max_iovecs = n;
        self
    }

    /// Get mutable access to the underlying config.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Validate and build the final [`Config`].
    pub fn build(self) -> Result<Config, crate::error::Error> {
        self.config.validate()?;
        Ok(self.config)
    }
}
