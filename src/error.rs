use ark_relations::gr1cs::SynthesisError;
use thiserror::Error;

/// Errors surfaced by the circuit, the setup/proving pipeline and the
/// witness builder. The façade-facing `ApiError` (see `server::error`) wraps
/// this type for the HTTP boundary.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("no persisted setup found at the configured artifact path")]
    SetupNotFound,

    #[error("constraint count mismatch: circuit has {actual}, persisted setup expects {expected}")]
    ConstraintMismatch { expected: usize, actual: usize },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("constraint system is not satisfied: {0}")]
    UnsatisfiedConstraint(String),

    #[error("account {index} has balance {available}, which cannot cover a transfer of {requested}")]
    InsufficientBalance {
        index: usize,
        available: u64,
        requested: u64,
    },

    #[error("cannot transfer from account {0} to itself")]
    SameAccount(usize),

    #[error("account index {index} is out of range (tree holds {max} accounts)")]
    IndexOutOfRange { index: usize, max: usize },

    #[error("transfer amount {amount} does not fit in the configured {bound}-bit ciphertext modulus")]
    AmountTooLarge { amount: u64, bound: u64 },

    #[error("no account record at index {0}")]
    AccountNotFound(usize),
}
