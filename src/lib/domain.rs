pub mod cipher;
pub mod keys;
pub mod proof;
pub mod transfer;
pub mod witness;
