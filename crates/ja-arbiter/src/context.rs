//! Read-only state shared by every decision in a tick.

use ja_network::RoadNetworkAccessor;
use ja_registry::PriorityRegistry;
use ja_signal::SignalController;

/// Borrowed view of everything a decision reads.
///
/// Built by the engine for each call (or each batch) and shared immutably
/// across worker threads; all mutation goes through the registry's
/// per-vehicle slots.
pub struct ArbitrationContext<'a, N: RoadNetworkAccessor + ?Sized> {
    pub registry: &'a PriorityRegistry,
    pub signals:  &'a SignalController,
    pub net:      &'a N,
}

impl<'a, N: RoadNetworkAccessor + ?Sized> ArbitrationContext<'a, N> {
    #[inline]
    pub fn new(registry: &'a PriorityRegistry, signals: &'a SignalController, net: &'a N) -> Self {
        Self { registry, signals, net }
    }
}

impl<N: RoadNetworkAccessor + ?Sized> Clone for ArbitrationContext<'_, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N: RoadNetworkAccessor + ?Sized> Copy for ArbitrationContext<'_, N> {}
