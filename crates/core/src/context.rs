use bastion_tee_ra::EnclaveMode;

/// Where a component is running. Passed explicitly to the components whose
/// behaviour depends on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionContext {
    Host,
    Enclave { mode: EnclaveMode },
}

impl ExecutionContext {
    pub fn is_enclave(&self) -> bool {
        matches!(self, Self::Enclave { .. })
    }

    /// Error messages may carry secrets and must not leave a release enclave.
    pub fn redacts_errors(&self) -> bool {
        matches!(
            self,
            Self::Enclave {
                mode: EnclaveMode::Release
            }
        )
    }
}
