use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use tracing::debug;

use crate::connectivity::Connectivity;
use crate::driver::{Connection, Driver, OdbcDriver};
use crate::error::OdbcMiddlewareError;

/// Name the adapter family registers under.
pub const DRIVER_NAME: &str = "odbc";

static GLOBAL: LazyLock<DriverRegistry> = LazyLock::new(DriverRegistry::new);

/// Process-wide registry, empty until the application registers its drivers.
#[must_use]
pub fn global() -> &'static DriverRegistry {
    &GLOBAL
}

/// Name → driver association.
///
/// Populated explicitly at startup; nothing registers itself. Tests can build
/// their own registry, or register and unregister fixtures on the global one.
/// ```rust
/// # #[cfg(feature = "sqlite")]
/// # fn main() -> Result<(), odbc_middleware::OdbcMiddlewareError> {
/// use odbc_middleware::registry::DriverRegistry;
/// use odbc_middleware::sqlite::SqliteConnectivity;
///
/// let registry = DriverRegistry::new();
/// registry.register_odbc(SqliteConnectivity::new())?;
/// let conn = registry.open("odbc", "Database=:memory:")?;
/// # drop(conn);
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "sqlite"))]
/// # fn main() {}
/// ```
#[derive(Default)]
pub struct DriverRegistry {
    drivers: RwLock<HashMap<String, Arc<dyn Driver>>>,
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.drivers())
            .finish()
    }
}

impl DriverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `driver` under `name`.
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::DuplicateDriver` if the name is taken.
    pub fn register<D>(&self, name: impl Into<String>, driver: D) -> Result<(), OdbcMiddlewareError>
    where
        D: Driver + 'static,
    {
        self.register_arc(name, Arc::new(driver))
    }

    /// Register an already shared driver under `name`.
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::DuplicateDriver` if the name is taken.
    pub fn register_arc(
        &self,
        name: impl Into<String>,
        driver: Arc<dyn Driver>,
    ) -> Result<(), OdbcMiddlewareError> {
        let name = name.into();
        let mut drivers = self.drivers.write().unwrap_or_else(PoisonError::into_inner);
        if drivers.contains_key(&name) {
            return Err(OdbcMiddlewareError::DuplicateDriver(name));
        }
        debug!(driver = %name, "registering driver");
        drivers.insert(name, driver);
        Ok(())
    }

    /// Register an [`OdbcDriver`] over `connectivity` under [`DRIVER_NAME`].
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::DuplicateDriver` if `"odbc"` is taken.
    pub fn register_odbc<C>(&self, connectivity: C) -> Result<(), OdbcMiddlewareError>
    where
        C: Connectivity + 'static,
    {
        self.register(DRIVER_NAME, OdbcDriver::new(connectivity))
    }

    /// Remove and return the driver registered under `name`.
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn drivers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Open a connection through the driver registered under `name`.
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::UnknownDriver` for an unregistered name, or the
    /// driver's own error.
    pub fn open(&self, name: &str, descriptor: &str) -> Result<Connection, OdbcMiddlewareError> {
        let driver = self
            .get(name)
            .ok_or_else(|| OdbcMiddlewareError::UnknownDriver(name.to_string()))?;
        driver.open(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedConnectivity;

    #[test]
    fn duplicate_names_are_rejected() {
        let registry = DriverRegistry::new();
        registry.register_odbc(ScriptedConnectivity::new()).unwrap();
        let err = registry
            .register_odbc(ScriptedConnectivity::new())
            .unwrap_err();
        assert!(matches!(err, OdbcMiddlewareError::DuplicateDriver(name) if name == "odbc"));
    }

    #[test]
    fn unknown_name_fails_to_open() {
        let registry = DriverRegistry::new();
        let err = registry.open("odbc", "DSN=test").unwrap_err();
        assert!(matches!(err, OdbcMiddlewareError::UnknownDriver(_)));
    }

    #[test]
    fn unregister_frees_the_name() {
        let registry = DriverRegistry::new();
        registry.register("fixture", OdbcDriver::new(ScriptedConnectivity::new())).unwrap();
        assert_eq!(registry.drivers(), vec!["fixture".to_string()]);
        assert!(registry.unregister("fixture").is_some());
        assert!(registry.drivers().is_empty());
        assert!(registry.unregister("fixture").is_none());
        registry.register("fixture", OdbcDriver::new(ScriptedConnectivity::new())).unwrap();
    }

    #[test]
    fn open_passes_descriptor_through() {
        let connectivity = ScriptedConnectivity::new();
        let registry = DriverRegistry::new();
        registry.register_odbc(connectivity.clone()).unwrap();
        let conn = registry.open(DRIVER_NAME, "DSN=test;UID=user;PWD=secret").unwrap();
        assert!(!conn.is_closed());
        assert_eq!(
            connectivity.descriptors(),
            vec!["DSN=test;UID=user;PWD=secret".to_string()]
        );
    }
}
