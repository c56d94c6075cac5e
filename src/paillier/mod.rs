pub mod gadget;
pub mod native;

pub use gadget::{add, encrypt, PublicKeyVar};
pub use native::{decrypt, generate, PublicKey, SecretKey};
