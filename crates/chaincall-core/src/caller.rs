//! The read-only call capability the batch invoker runs on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;

use crate::block::BlockTag;
use crate::error::TransportError;
use crate::request::JsonRpcRequest;
use crate::transport::RpcTransport;

/// Submit a read-only call to `to` with payload `data` and return the raw
/// response bytes. No state is mutated and no signing key is involved.
///
/// Execution reverts are reported as `TransportError::Rpc` carrying the
/// node's error object; the invoker classifies them.
#[async_trait]
pub trait EthCaller: Send + Sync {
    async fn eth_call(
        &self,
        to: Address,
        data: Bytes,
        block: BlockTag,
    ) -> Result<Bytes, TransportError>;
}

#[async_trait]
impl<C: EthCaller + ?Sized> EthCaller for Arc<C> {
    async fn eth_call(
        &self,
        to: Address,
        data: Bytes,
        block: BlockTag,
    ) -> Result<Bytes, TransportError> {
        (**self).eth_call(to, data, block).await
    }
}

/// [`EthCaller`] over any JSON-RPC transport, using `eth_call`.
pub struct JsonRpcCaller {
    transport: Arc<dyn RpcTransport>,
    next_id: AtomicU64,
}

impl JsonRpcCaller {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    /// The wrapped transport's URL or name.
    pub fn url(&self) -> &str {
        self.transport.url()
    }
}

#[async_trait]
impl EthCaller for JsonRpcCaller {
    async fn eth_call(
        &self,
        to: Address,
        data: Bytes,
        block: BlockTag,
    ) -> Result<Bytes, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::eth_call(id, to, &data, block);
        let resp = self.transport.send(req).await?;
        let result = resp.into_result().map_err(TransportError::Rpc)?;
        serde_json::from_value(result).map_err(TransportError::Deserialization)
    }
}
