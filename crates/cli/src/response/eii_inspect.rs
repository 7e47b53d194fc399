use bastion_common::InstanceSummary;
use serde::Serialize;

use crate::response::Response;

#[derive(Clone, Debug, Serialize)]
pub struct EiiInspectResponse {
    #[serde(flatten)]
    pub summary: InstanceSummary,
}

impl From<EiiInspectResponse> for Response {
    fn from(response: EiiInspectResponse) -> Self {
        Self::EiiInspect(response)
    }
}
