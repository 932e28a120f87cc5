//! Fluent builder for constructing a [`JunctionArbitrationEngine`].

use ja_core::{EngineConfig, Tick};
use ja_network::RoadNetworkAccessor;

use crate::{EngineResult, EngineSnapshot, JunctionArbitrationEngine};

/// Fluent builder for [`JunctionArbitrationEngine<N>`].
///
/// # Required inputs
///
/// - `N: RoadNetworkAccessor`: the host's view of the road network
///
/// # Optional inputs (have defaults)
///
/// | Method           | Default                    |
/// |------------------|----------------------------|
/// | `.config(c)`     | `EngineConfig::default()`  |
/// | `.snapshot(s)`   | No signs, no signals       |
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new(network)
///     .config(EngineConfig { seed: 7, ..EngineConfig::default() })
///     .snapshot(saved)
///     .build()?;
/// ```
pub struct EngineBuilder<N: RoadNetworkAccessor> {
    network:  N,
    config:   EngineConfig,
    snapshot: Option<EngineSnapshot>,
}

impl<N: RoadNetworkAccessor> EngineBuilder<N> {
    pub fn new(network: N) -> Self {
        Self { network, config: EngineConfig::default(), snapshot: None }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Priority signs and signals to load.  Started timed programs resume at
    /// tick zero.
    pub fn snapshot(mut self, snapshot: EngineSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Validate the configuration, restore the snapshot (if any), and return
    /// a ready engine.
    pub fn build(self) -> EngineResult<JunctionArbitrationEngine<N>> {
        self.config.validate()?;
        let engine = JunctionArbitrationEngine::new(self.config, self.network);
        if let Some(snapshot) = self.snapshot {
            engine.restore(snapshot, Tick::ZERO)?;
        }
        Ok(engine)
    }
}
