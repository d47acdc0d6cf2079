pub mod babyjub;
pub mod bn254;
pub mod context;
pub mod dleq;
pub mod ecdh;
pub mod field;
pub mod keys;
pub mod mimc;
pub mod poseidon;
pub mod signature;
