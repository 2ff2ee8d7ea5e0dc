use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use svql_common::design::Design;
use svql_common::{import_design, Config, ImportOptions, MatchList};
use tracing::{debug, info};

use crate::error::DriverError;
use crate::query::run_query;
use crate::DriverKey;

/// Loads designs through yosys or from JSON and caches them by [`DriverKey`].
#[derive(Debug, Clone)]
pub struct Driver {
    registry: Arc<RwLock<HashMap<DriverKey, Arc<Design>>>>,
    root_path: PathBuf,
    import_options: ImportOptions,
}

impl Driver {
    /// Relative design paths are resolved against `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, DriverError> {
        let root = root.as_ref();
        let root_path = std::fs::canonicalize(root).map_err(|source| DriverError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        Ok(Self {
            registry: Arc::new(RwLock::new(HashMap::new())),
            root_path,
            import_options: ImportOptions::new(),
        })
    }

    /// A driver rooted at the current directory.
    pub fn new_workspace() -> Result<Self, DriverError> {
        Self::new(".")
    }

    /// Options applied to every import; the top module comes from the key.
    #[must_use]
    pub fn with_import_options(mut self, options: ImportOptions) -> Self {
        self.import_options = options;
        self
    }

    /// Canonical directory relative design paths are resolved against.
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_path.join(path)
        }
    }

    /// Load a design and store it in the registry.
    pub fn load_design<P: AsRef<Path>>(&self, design_path: P, module_name: &str) -> Result<DriverKey, DriverError> {
        self.get_or_load_design(design_path, module_name).map(|(key, _)| key)
    }

    /// Get a design from the registry, loading it if necessary.
    pub fn get_or_load_design<P: AsRef<Path>>(
        &self,
        design_path: P,
        module_name: &str,
    ) -> Result<(DriverKey, Arc<Design>), DriverError> {
        let key = DriverKey::new(self.absolute(design_path.as_ref()), module_name);

        if let Some(design) = self.get_design(&key) {
            debug!("design {} already loaded", key.path.display());
            return Ok((key, design));
        }

        let design = Arc::new(self.load_design_from_path(&key)?);
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), design.clone());
        Ok((key, design))
    }

    /// Get a design from the registry (`None` if not loaded).
    #[must_use]
    pub fn get_design(&self, key: &DriverKey) -> Option<Arc<Design>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// All currently loaded designs.
    #[must_use]
    pub fn get_all_designs(&self) -> HashMap<DriverKey, Arc<Design>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run `config` with the needle and haystack designs behind two loaded keys.
    /// The needle module is the needle key's module.
    pub fn query(&self, needle: &DriverKey, haystack: &DriverKey, config: &Config) -> Result<MatchList, DriverError> {
        let needle_design = self
            .get_design(needle)
            .ok_or_else(|| DriverError::NotLoaded(needle.clone()))?;
        let haystack_design = self
            .get_design(haystack)
            .ok_or_else(|| DriverError::NotLoaded(haystack.clone()))?;

        let config = Config {
            pat_filename: needle.path.display().to_string(),
            pat_module_name: needle.module_name.clone(),
            ..config.clone()
        };
        Ok(run_query(&needle_design, &haystack_design, &config)?)
    }

    fn load_design_from_path(&self, key: &DriverKey) -> Result<Design, DriverError> {
        info!("loading {} ({})", key.path.display(), key.module_name);
        let options = self.import_options.clone().with_top(&key.module_name);
        let design = import_design(&key.path, &options)?;
        if design.module(&key.module_name).is_none() {
            return Err(DriverError::MissingModule(key.clone()));
        }
        Ok(design)
    }
}
