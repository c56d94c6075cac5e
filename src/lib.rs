pub mod bigint;
pub mod circuit;
pub mod config;
pub mod db;
pub mod error;
pub mod field_hash;
pub mod macros;
pub mod merkle;
pub mod modmath;
pub mod paillier;
pub mod server;
pub mod setup;
pub mod witness;
