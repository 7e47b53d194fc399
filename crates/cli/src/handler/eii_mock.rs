use bastion_common::EnclaveIdentity;
use bastion_tee_ra::{mock::MockAttestor, EncodedKey};
use color_eyre::{Report, Result};
use tracing::{info, warn};

use crate::{
    config::Config,
    error::Error,
    handler::Handler,
    request::eii_mock::EiiMockRequest,
    response::{eii_mock::EiiMockResponse, Response},
};

impl Handler for EiiMockRequest {
    type Response = Response;

    fn handle<C: AsRef<Config>>(self, config: C) -> Result<Self::Response, Report> {
        let config = config.as_ref();
        if !config.mock_sgx {
            return Err(Error::MockSgxRequired("eii mock").into());
        }
        warn!("Generating a mock enclave identity; it carries no hardware attestation");

        let identity = EnclaveIdentity::generate();
        let attestor = MockAttestor::new(self.measurement);
        let eii = identity.instance_info(&attestor, &config.verifier()?)?;

        std::fs::write(&self.out, eii.serialize())?;
        std::fs::write(&self.key_out, hex::encode(identity.to_bytes()))?;
        info!(
            "Wrote {} and {}",
            self.out.display(),
            self.key_out.display()
        );

        Ok(EiiMockResponse {
            eii_file: self.out,
            key_file: self.key_out,
            measurement: eii.measurement(),
            encryption_key: hex::encode(eii.encryption_key().encoded()),
        }
        .into())
    }
}
