// Gateway trait for dashboard resource access
use async_trait::async_trait;

use crate::domain::fetch::FetchError;
use crate::domain::payload::ResourcePayload;
use crate::domain::resource::Resource;

/// One HTTP GET per resource against the dashboard backend.
///
/// The executor only sees this seam, so tests drive the retry and
/// supersession logic with scripted in-memory gateways instead of
/// mocking the network.
#[async_trait]
pub trait DashboardGateway: Send + Sync {
    async fn fetch(&self, resource: Resource) -> Result<ResourcePayload, FetchError>;
}
