use bastion_common::EnclaveInstanceInfo;
use color_eyre::{Report, Result};
use tracing::{debug, info};

use crate::{
    config::Config,
    handler::Handler,
    request::eii_inspect::EiiInspectRequest,
    response::{eii_inspect::EiiInspectResponse, Response},
};

impl Handler for EiiInspectRequest {
    type Response = Response;

    fn handle<C: AsRef<Config>>(self, config: C) -> Result<Self::Response, Report> {
        let config = config.as_ref();
        let bytes = std::fs::read(&self.file)?;
        debug!("Read {} bytes from {}", bytes.len(), self.file.display());

        let eii = EnclaveInstanceInfo::deserialize(&bytes, &config.verifier()?)?;
        info!("{eii}");

        Ok(EiiInspectResponse {
            summary: eii.summary(),
        }
        .into())
    }
}
