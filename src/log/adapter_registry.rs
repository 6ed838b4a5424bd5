use std::{collections::HashMap, fmt, sync::Arc};

use crate::log::{
    console_sink::ConsoleSink,
    diag_sink::DiagSink,
    file_sink::{FileSinkConfig, RotatingFileSink},
    log_error::LogError,
    log_sink::LogSink,
    sink_error::SinkError,
    sink_kind::SinkKind,
};

/// Zero-argument factory producing a fresh sink instance.
pub type SinkConstructor = Arc<dyn Fn() -> Result<Arc<dyn LogSink>, SinkError> + Send + Sync>;

/// Maps sink kinds to their constructors.
///
/// Each dispatcher receives its own registry, so tests and separate logging
/// domains never share sink kinds by accident.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    constructors: HashMap<SinkKind, SinkConstructor>,
}

impl AdapterRegistry {
    /// An empty registry; nothing can be added to a dispatcher until kinds
    /// are registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `console` (stdout) and `file` (rotating file built from
    /// `file_config`) kinds.
    #[must_use]
    pub fn with_defaults(file_config: FileSinkConfig, diag: Arc<dyn DiagSink>) -> Self {
        let mut registry = Self::new();
        registry.register(SinkKind::Console, || {
            Ok(Arc::new(ConsoleSink::stdout()) as Arc<dyn LogSink>)
        });
        registry.register(SinkKind::File, move || {
            let sink = RotatingFileSink::open(file_config.clone(), Arc::clone(&diag))?;
            Ok(Arc::new(sink) as Arc<dyn LogSink>)
        });
        registry
    }

    /// Registers `ctor` for `kind`, replacing any previous constructor.
    pub fn register<F>(&mut self, kind: SinkKind, ctor: F)
    where
        F: Fn() -> Result<Arc<dyn LogSink>, SinkError> + Send + Sync + 'static,
    {
        self.constructors.insert(kind, Arc::new(ctor));
    }

    /// Builds a new sink of `kind`.
    ///
    /// # Errors
    ///
    /// [`LogError::UnknownSinkKind`] when nothing is registered for `kind`;
    /// [`LogError::SinkConstruction`] when the constructor itself fails.
    pub fn construct(&self, kind: &SinkKind) -> Result<Arc<dyn LogSink>, LogError> {
        let ctor = self
            .constructors
            .get(kind)
            .ok_or_else(|| LogError::UnknownSinkKind(kind.clone()))?;
        ctor().map_err(|source| LogError::SinkConstruction {
            kind: kind.clone(),
            source,
        })
    }

    #[must_use]
    pub fn contains(&self, kind: &SinkKind) -> bool {
        self.constructors.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &SinkKind> {
        self.constructors.keys()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.kinds()).finish()
    }
}
