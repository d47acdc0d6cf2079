pub mod abi;
pub mod memory_assets;
pub mod memory_escrow;
pub mod mock_prover;
pub mod snarkjs_prover;
