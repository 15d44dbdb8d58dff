use crate::{ProcessHandle, ProcessRecord, SupervisorResult};

use async_trait::async_trait;

/// The slice of a supervisor that orchestration and health checks depend on.
#[async_trait]
pub trait SupervisedProcess: Send + Sync {
    fn name(&self) -> &str;

    async fn start(&self) -> SupervisorResult<ProcessHandle>;

    async fn stop(&self, force: bool) -> SupervisorResult<()>;

    async fn restart(&self) -> SupervisorResult<ProcessHandle>;

    /// Point-in-time copy of the process record.
    fn record(&self) -> ProcessRecord;
}
