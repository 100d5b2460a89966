//! Engine lifecycle - owns the single engine handle
//!
//! Closed → Open via a successful `open`, Open → Closed via `close` or a
//! `restart`. A failed open or restart always leaves the lifecycle closed;
//! nothing is retried automatically.

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use lsm_core::{LsmError, LsmResult, RendererConfig};
use tracing::{error, info};

use crate::{EngineHandle, RendererFactory};

/// Read an engine configuration file into memory
pub fn load_config_blob(path: &Path) -> LsmResult<Bytes> {
    let blob = std::fs::read(path).map_err(|source| {
        error!(path = %path.display(), error = %source, "engine configuration could not be read");
        LsmError::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        }
    })?;

    if blob.is_empty() {
        error!(path = %path.display(), "engine configuration is empty");
        return Err(LsmError::ConfigUnreadable {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, "configuration file is empty"),
        });
    }

    Ok(Bytes::from(blob))
}

/// Owner of the engine handle and its configuration
pub struct EngineLifecycle {
    factory: Arc<dyn RendererFactory>,
    handle: Option<EngineHandle>,
    config: Option<RendererConfig>,
}

impl EngineLifecycle {
    pub fn new(factory: Arc<dyn RendererFactory>) -> Self {
        EngineLifecycle {
            factory,
            handle: None,
            config: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<&EngineHandle> {
        self.handle.as_ref()
    }

    pub fn handle_mut(&mut self) -> Option<&mut EngineHandle> {
        self.handle.as_mut()
    }

    /// Configuration of the open engine
    pub fn config(&self) -> Option<&RendererConfig> {
        self.config.as_ref()
    }

    /// Construct the engine
    pub fn open(&mut self, config: RendererConfig) -> LsmResult<&EngineHandle> {
        if self.handle.is_some() {
            return Err(LsmError::EngineAlreadyOpen);
        }
        if config.config_blob.is_empty() {
            error!("engine configuration blob cannot be empty");
            return Err(LsmError::ConfigMissing);
        }

        info!(
            config_bytes = config.blob_len(),
            max_num_objs = config.max_num_objs,
            color_space = config.color_space,
            frame_period_us = config.frame_period_us,
            "opening light engine"
        );
        let handle = EngineHandle::construct(self.factory.as_ref(), &config)?;
        self.config = Some(config);

        Ok(&*self.handle.insert(handle))
    }

    /// Destroy the current engine, then open with `new_config`
    pub fn restart(&mut self, new_config: RendererConfig) -> LsmResult<&EngineHandle> {
        info!("restarting light engine");
        self.close();
        self.open(new_config)
    }

    /// Destroy the engine and release the configuration blob; idempotent
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            info!("closing light engine");
            handle.destroy();
        }
        self.config = None;
    }

    /// Reset inter-frame engine state, if open
    pub fn reset(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.reset();
        }
    }
}

impl fmt::Debug for EngineLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineLifecycle")
            .field("handle", &self.handle)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{config, config_with_blob, FakeFactory};
    use std::io::Write;

    fn lifecycle(factory: &FakeFactory) -> EngineLifecycle {
        EngineLifecycle::new(Arc::new(factory.clone()))
    }

    #[test]
    fn test_open_and_close() {
        let factory = FakeFactory::new(64);
        let mut engine = lifecycle(&factory);

        assert_eq!(engine.open(config()).unwrap().max_output_size(), 64);
        assert!(engine.is_open());
        assert!(engine.config().is_some());

        engine.close();
        assert!(!engine.is_open());
        assert!(engine.config().is_none());
        assert_eq!(factory.live(), 0);
    }

    #[test]
    fn test_close_is_idempotent() {
        let factory = FakeFactory::new(64);
        let mut engine = lifecycle(&factory);
        engine.open(config()).unwrap();

        engine.close();
        engine.close();
        assert_eq!(factory.destroyed(), 1);
    }

    #[test]
    fn test_single_handle() {
        let factory = FakeFactory::new(64);
        let mut engine = lifecycle(&factory);
        engine.open(config()).unwrap();

        assert!(matches!(
            engine.open(config()),
            Err(LsmError::EngineAlreadyOpen)
        ));
        assert_eq!(factory.live(), 1);
    }

    #[test]
    fn test_empty_blob_rejected() {
        let factory = FakeFactory::new(64);
        let mut engine = lifecycle(&factory);
        assert!(matches!(
            engine.open(config_with_blob(b"")),
            Err(LsmError::ConfigMissing)
        ));
        assert_eq!(factory.constructed(), 0);
    }

    #[test]
    fn test_construction_failure_leaves_closed() {
        let factory = FakeFactory::failing();
        let mut engine = lifecycle(&factory);
        assert!(matches!(
            engine.open(config()),
            Err(LsmError::EngineConstructionFailed)
        ));
        assert!(!engine.is_open());
        assert!(engine.config().is_none());
    }

    #[test]
    fn test_failed_restart_then_recover() {
        let factory = FakeFactory::new(64);
        factory.fail_on_blob(b"broken");
        let mut engine = lifecycle(&factory);
        engine.open(config()).unwrap();

        assert!(engine.restart(config_with_blob(b"broken")).is_err());
        assert!(!engine.is_open());
        assert_eq!(factory.live(), 0);

        engine.open(config_with_blob(b"fixed")).unwrap();
        assert!(engine.is_open());
        assert_eq!(factory.live(), 1);
        assert_eq!(
            factory.last_config().unwrap().config_blob.as_ref(),
            b"fixed"
        );
    }

    #[test]
    fn test_restart_replaces_handle() {
        let factory = FakeFactory::new(64);
        let mut engine = lifecycle(&factory);
        engine.open(config()).unwrap();
        engine.restart(config_with_blob(b"second")).unwrap();

        assert_eq!(factory.constructed(), 2);
        assert_eq!(factory.destroyed(), 1);
        assert_eq!(engine.config().unwrap().config_blob.as_ref(), b"second");
    }

    #[test]
    fn test_load_config_blob() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"serialized").unwrap();
        assert_eq!(load_config_blob(file.path()).unwrap().as_ref(), b"serialized");

        let empty = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            load_config_blob(empty.path()),
            Err(LsmError::ConfigUnreadable { .. })
        ));

        let missing = Path::new("/nonexistent/lsm/engine.conf");
        assert!(matches!(
            load_config_blob(missing),
            Err(LsmError::ConfigUnreadable { .. })
        ));
    }
}
