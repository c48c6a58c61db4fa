//! Execution context of one VM instruction

use alloy_primitives::Bytes;
use dvm_storage::VmStore;
use serde::{Deserialize, Serialize};

/// Header of the block being processed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block height
    pub height: u64,
    /// Block time, unix seconds
    pub time: u64,
}

/// Gas accounting of the calling transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GasMeter {
    limit: u64,
    consumed: u64,
}

impl GasMeter {
    /// Create meter with `limit` and nothing consumed
    pub fn new(limit: u64) -> Self {
        Self { limit, consumed: 0 }
    }

    /// Record gas use
    pub fn consume(&mut self, amount: u64) {
        self.consumed = self.consumed.saturating_add(amount);
    }

    /// Gas still available: limit minus consumed
    pub fn free_gas(&self) -> u64 {
        self.limit.saturating_sub(self.consumed)
    }
}

/// Event attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: Bytes,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

/// Ledger event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub ty: String,
    pub attributes: Vec<Attribute>,
}

impl Event {
    /// Create event without attributes
    pub fn new(ty: impl Into<String>) -> Self {
        Self { ty: ty.into(), attributes: Vec::new() }
    }

    /// Append an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        self.attributes.push(Attribute::new(key, value));
        self
    }

    /// Value of the first attribute named `key`
    pub fn attribute(&self, key: &str) -> Option<&Bytes> {
        self.attributes.iter().find(|attr| attr.key == key).map(|attr| &attr.value)
    }
}

/// Events emitted while processing the current transaction
#[derive(Debug, Clone, Default)]
pub struct EventManager {
    events: Vec<Event>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn emit_all(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take all emitted events
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

/// State the data-source server reads through during an execution
#[derive(Debug, Clone)]
pub struct DsContext {
    pub header: BlockHeader,
    pub store: VmStore,
}

/// Host-provided context of one VM instruction
#[derive(Debug)]
pub struct ExecContext {
    pub header: BlockHeader,
    pub gas: GasMeter,
    /// Store scoped to the current state transition
    pub store: VmStore,
    pub events: EventManager,
}

impl ExecContext {
    pub fn new(header: BlockHeader, gas: GasMeter, store: VmStore) -> Self {
        Self { header, gas, store, events: EventManager::new() }
    }

    /// Gas ceiling handed to the VM
    pub fn free_gas(&self) -> u64 {
        self.gas.free_gas()
    }

    /// Read context shared with the data-source server
    pub fn ds_context(&self) -> DsContext {
        DsContext { header: self.header, store: self.store.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_gas() {
        let mut gas = GasMeter::new(100_000);
        gas.consume(25_000);
        assert_eq!(gas.free_gas(), 75_000);

        gas.consume(u64::MAX);
        assert_eq!(gas.free_gas(), 0);
    }

    #[test]
    fn test_event_attribute_lookup() {
        let event = Event::new("contract_status")
            .with_attribute("status", "keep")
            .with_attribute("message", Bytes::new());

        assert_eq!(event.attribute("status").unwrap().as_ref(), b"keep");
        assert_eq!(event.attribute("message").unwrap().len(), 0);
        assert!(event.attribute("missing").is_none());
    }

    #[test]
    fn test_event_manager_preserves_order() {
        let mut events = EventManager::new();
        events.emit(Event::new("a"));
        events.emit_all([Event::new("b"), Event::new("c")]);

        let types: Vec<_> = events.drain().into_iter().map(|e| e.ty).collect();
        assert_eq!(types, ["a", "b", "c"]);
        assert!(events.is_empty());
    }
}
