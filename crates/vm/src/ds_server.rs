//! Data-source server answering the VM's storage reads

use crate::{
    context::DsContext,
    error::{fault, DsError, VmFault},
    middlewares::{default_middlewares, DataMiddleware},
    oracle::oracle_access_path,
};
use dvm_primitives::AccessPath;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

struct DsInner {
    middlewares: RwLock<Vec<Arc<dyn DataMiddleware>>>,
    /// Context of the execution in flight
    scope: Mutex<Option<DsContext>>,
}

/// Read-only view of ledger state served to the VM.
///
/// Reads are only answered while an execution is in flight, see [`DsServer::enter`].
#[derive(Clone)]
pub struct DsServer {
    inner: Arc<DsInner>,
}

impl DsServer {
    /// Create server without middlewares
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DsInner {
                middlewares: RwLock::new(Vec::new()),
                scope: Mutex::new(None),
            }),
        }
    }

    /// Create server with the block and time middlewares registered
    pub fn with_default_middlewares() -> Self {
        let server = Self::new();
        for middleware in default_middlewares() {
            server.register_middleware(middleware);
        }
        server
    }

    /// Append a middleware to the chain
    pub fn register_middleware(&self, middleware: Arc<dyn DataMiddleware>) {
        tracing::debug!(middleware = middleware.name(), "Data middleware registered");
        self.inner.middlewares.write().push(middleware);
    }

    /// Start serving reads for one execution, until the returned scope is dropped
    pub fn enter(&self, ctx: DsContext) -> DsScope {
        let mut scope = self.inner.scope.lock();
        if scope.is_some() {
            drop(scope);
            fault(VmFault::ScopeBusy);
        }

        tracing::debug!(height = ctx.header.height, "Data source scope opened");
        *scope = Some(ctx);

        DsScope { server: self.clone() }
    }

    /// Whether an execution is in flight
    pub fn is_active(&self) -> bool {
        self.inner.scope.lock().is_some()
    }

    fn context(&self) -> Result<DsContext, DsError> {
        self.inner.scope.lock().clone().ok_or(DsError::NoActiveExecution)
    }

    fn read_in(&self, ctx: &DsContext, path: &AccessPath) -> Option<Vec<u8>> {
        for middleware in self.inner.middlewares.read().iter() {
            if let Some(value) = middleware.try_read(ctx, path) {
                let middleware = middleware.name();
                tracing::debug!(%path, middleware, "Data read served by middleware");
                return Some(value);
            }
        }

        ctx.store.get_value(path)
    }

    /// Read value at `path`
    pub fn read(&self, path: &AccessPath) -> Result<Vec<u8>, DsError> {
        let ctx = self.context()?;

        match self.read_in(&ctx, path) {
            Some(value) => {
                tracing::debug!(%path, len = value.len(), "Data read");
                Ok(value)
            }
            None => {
                tracing::debug!(%path, "Data read missed");
                Err(DsError::NotFound(path.clone()))
            }
        }
    }

    /// Read all `paths`, failing on the first missing one
    pub fn multi_read(&self, paths: &[AccessPath]) -> Result<Vec<Vec<u8>>, DsError> {
        let ctx = self.context()?;

        paths
            .iter()
            .map(|path| self.read_in(&ctx, path).ok_or_else(|| DsError::NotFound(path.clone())))
            .collect()
    }

    /// Whether a price is stored for `asset_code`
    pub fn has_oracle_price(&self, asset_code: &str) -> Result<bool, DsError> {
        let ctx = self.context()?;
        Ok(ctx.store.has_value(&oracle_access_path(asset_code)))
    }
}

impl Default for DsServer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DsServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DsServer")
            .field("middlewares", &self.inner.middlewares.read().len())
            .field("active", &self.is_active())
            .finish()
    }
}

/// Guard of an in-flight execution, closes the data-source scope on drop
#[must_use = "the scope closes as soon as the guard is dropped"]
pub struct DsScope {
    server: DsServer,
}

impl Drop for DsScope {
    fn drop(&mut self) {
        self.server.inner.scope.lock().take();
        tracing::debug!("Data source scope closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::BlockHeader,
        middlewares::{block_metadata_path, current_timestamp_path},
    };
    use dvm_primitives::VmAddress;
    use dvm_storage::{KeyScheme, MemoryStore, VmStore};

    fn ds_context(memory: &Arc<MemoryStore>) -> DsContext {
        DsContext {
            header: BlockHeader { height: 7, time: 1_700_000_000 },
            store: VmStore::new(memory.clone(), KeyScheme::Canonical),
        }
    }

    fn resource(byte: u8) -> AccessPath {
        AccessPath::new(VmAddress::new([byte; 24]), b"resource".to_vec())
    }

    #[test]
    fn test_read_requires_scope() {
        let server = DsServer::with_default_middlewares();
        assert_eq!(server.read(&resource(1)), Err(DsError::NoActiveExecution));

        let memory = Arc::new(MemoryStore::new());
        {
            let _scope = server.enter(ds_context(&memory));
            assert!(server.is_active());
        }
        assert!(!server.is_active());
        assert_eq!(server.read(&block_metadata_path()), Err(DsError::NoActiveExecution));
    }

    #[test]
    fn test_read_falls_through_to_store() {
        let memory = Arc::new(MemoryStore::new());
        let ctx = ds_context(&memory);
        ctx.store.set_value(&resource(1), b"stored");

        let server = DsServer::with_default_middlewares();
        let _scope = server.enter(ctx);

        assert_eq!(server.read(&resource(1)).unwrap(), b"stored".to_vec());
        assert_eq!(server.read(&resource(2)), Err(DsError::NotFound(resource(2))));
    }

    #[test]
    fn test_middleware_wins_over_stored_value() {
        let memory = Arc::new(MemoryStore::new());
        let ctx = ds_context(&memory);
        ctx.store.set_value(&block_metadata_path(), &999u64.to_le_bytes());

        let server = DsServer::with_default_middlewares();
        let _scope = server.enter(ctx);

        assert_eq!(server.read(&block_metadata_path()).unwrap(), 7u64.to_le_bytes().to_vec());
        assert_eq!(
            server.read(&current_timestamp_path()).unwrap(),
            1_700_000_000u64.to_le_bytes().to_vec()
        );
    }

    #[test]
    fn test_first_middleware_short_circuits() {
        struct Fixed(&'static str, &'static [u8]);

        impl DataMiddleware for Fixed {
            fn name(&self) -> &'static str {
                self.0
            }

            fn try_read(&self, _ctx: &DsContext, _path: &AccessPath) -> Option<Vec<u8>> {
                Some(self.1.to_vec())
            }
        }

        let server = DsServer::new();
        server.register_middleware(Arc::new(Fixed("first", b"one")));
        server.register_middleware(Arc::new(Fixed("second", b"two")));

        let memory = Arc::new(MemoryStore::new());
        let _scope = server.enter(ds_context(&memory));

        assert_eq!(server.read(&resource(3)).unwrap(), b"one".to_vec());
    }

    #[test]
    fn test_reads_do_not_mutate_storage() {
        let memory = Arc::new(MemoryStore::new());
        let ctx = ds_context(&memory);
        ctx.store.set_value(&resource(1), b"v");
        let before = memory.snapshot();

        let server = DsServer::with_default_middlewares();
        let _scope = server.enter(ctx);
        let _ = server.read(&resource(1));
        let _ = server.read(&resource(2));
        let _ = server.read(&block_metadata_path());
        let _ = server.multi_read(&[resource(1), resource(2)]);
        let _ = server.has_oracle_price("eth_usdt");

        assert_eq!(memory.snapshot(), before);
    }

    #[test]
    fn test_multi_read_is_all_or_nothing() {
        let memory = Arc::new(MemoryStore::new());
        let ctx = ds_context(&memory);
        ctx.store.set_value(&resource(1), b"a");
        ctx.store.set_value(&resource(2), b"b");

        let server = DsServer::with_default_middlewares();
        let _scope = server.enter(ctx);

        assert_eq!(
            server.multi_read(&[resource(1), block_metadata_path(), resource(2)]).unwrap(),
            vec![b"a".to_vec(), 7u64.to_le_bytes().to_vec(), b"b".to_vec()]
        );
        assert_eq!(
            server.multi_read(&[resource(1), resource(9), resource(2)]),
            Err(DsError::NotFound(resource(9)))
        );
    }

    #[test]
    fn test_has_oracle_price() {
        let memory = Arc::new(MemoryStore::new());
        let ctx = ds_context(&memory);
        ctx.store.set_value(&oracle_access_path("eth_usdt"), &100u64.to_le_bytes());

        let server = DsServer::new();
        let _scope = server.enter(ctx);

        assert!(server.has_oracle_price("eth_usdt").unwrap());
        assert!(!server.has_oracle_price("btc_usdt").unwrap());
    }

    #[test]
    #[should_panic(expected = "already serving")]
    fn test_nested_scope_is_fatal() {
        let memory = Arc::new(MemoryStore::new());
        let server = DsServer::new();

        let _outer = server.enter(ds_context(&memory));
        let _inner = server.enter(ds_context(&memory));
    }
}
