//! ubus adapter.
//!
//! Calls ubus objects through the local `ubus` CLI with JSON payloads. On
//! systems without ubus (or with the daemon down) every operation yields an
//! empty result; the session must keep going without it.

use serde_json::Value;
use tracing::debug;

use crate::exec::Executor;
use crate::CollectorError;

pub struct UbusClient {
    executor: Executor,
}

impl UbusClient {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    /// Invokes `object.method` with a JSON argument object. `None` when the
    /// bus is unavailable or the object does not exist.
    pub async fn call(
        &self,
        object: &str,
        method: &str,
        args: &Value,
    ) -> Result<Option<Value>, CollectorError> {
        let payload = args.to_string();
        let result = match self
            .executor
            .execute("ubus", &["call", object, method, &payload])
            .await
        {
            Ok(result) => result,
            Err(CollectorError::Io(error)) => {
                debug!(%error, "ubus unavailable");
                return Ok(None);
            }
            Err(other) => return Err(other),
        };
        if !result.success {
            debug!(object, method, stderr = %result.stderr, "ubus call failed");
            return Ok(None);
        }
        Ok(result.json())
    }

    /// Lists the registered ubus objects; empty when the bus is down.
    pub async fn list(&self) -> Result<Vec<String>, CollectorError> {
        let result = match self.executor.execute("ubus", &["list"]).await {
            Ok(result) => result,
            Err(CollectorError::Io(error)) => {
                debug!(%error, "ubus unavailable");
                return Ok(Vec::new());
            }
            Err(other) => return Err(other),
        };
        if !result.success {
            return Ok(Vec::new());
        }
        Ok(result
            .text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ExecConfig;

    #[tokio::test]
    async fn missing_ubus_binary_yields_empty_results() {
        let executor = Executor::new(ExecConfig::default());
        let client = UbusClient::new(executor);
        // This host has no ubus; both surfaces degrade to empty.
        assert_eq!(client.list().await.unwrap(), Vec::<String>::new());
        assert_eq!(
            client
                .call("network.device", "status", &serde_json::json!({}))
                .await
                .unwrap(),
            None
        );
    }
}
