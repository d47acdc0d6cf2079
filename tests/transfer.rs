//! End-to-end key transfer over the in-memory escrow.
//!
//! Both schemes run provider → escrow → buyer:
//! 1. Provider publishes the service attributes
//! 2. Buyer locks payment against the agreed condition values
//! 3. Provider fulfils the condition with ciphertext (or re-encryption) and proof
//! 4. Buyer recovers the key from what the escrow exposes
//!
//! The SNARK path uses `MockProver` here. `test_snarkjs_key_transfer` runs the
//! real prover and is ignored by default.
//!
//! ## Prerequisites for the ignored test
//!
//! - `snarkjs` on `PATH` (`npm install -g snarkjs`)
//! - compiled key-transfer circuit: `keytransfer.wasm`, `keytransfer.zkey` and
//!   `verification_key.json` in one directory
//!
//! ```bash
//! DTP_CIRCUITS_DIR=./circuits cargo test --test transfer -- --ignored --nocapture
//! ```

use alloy::primitives::{Address, B256, U256};

use dtp::adapters::abi::{access_dleq_value_hash, access_proof_value_hash, dleq_condition_id};
use dtp::adapters::memory_assets::InMemoryAssets;
use dtp::adapters::memory_escrow::InMemoryEscrow;
use dtp::adapters::mock_prover::MockProver;
use dtp::crypto::dleq;
use dtp::crypto::keys::make_key;
use dtp::crypto::poseidon::hash_block;
use dtp::domain::cipher::PlaintextBlock;
use dtp::domain::keys::BabyjubPublicKey;
use dtp::domain::transfer::TransferState;
use dtp::dtp::Dtp;
use dtp::ports::assets::ServiceAttributes;
use dtp::ports::escrow::{Escrow, EscrowError};
use dtp::ports::AccessDleqFulfillment;
use dtp::{CryptoContext, DtpError};

fn dleq_condition() -> Address {
    Address::repeat_byte(0xd1)
}

const PASSWD: &[u8; 32] = b"passwd_32_letters_1234567890asdf";

fn dtp() -> Dtp<MockProver, InMemoryEscrow> {
    let ctx = CryptoContext::shared();
    Dtp::new(
        ctx.clone(),
        MockProver::new(ctx.clone()),
        InMemoryEscrow::new(ctx, dleq_condition()),
    )
}

#[tokio::test]
async fn test_snark_key_transfer() {
    let dtp = dtp();
    let provider = dtp.babyjub_account("abc");
    let buyer = dtp.babyjub_account("abd");
    let data = PlaintextBlock::new(*PASSWD);
    let agreement_id = B256::repeat_byte(0x01);

    let ServiceAttributes::AccessProof { hash, provider_pub } =
        dtp.publish_commitment(&data, provider.public())
    else {
        panic!("expected access-proof attributes");
    };
    assert_eq!(provider_pub, *provider.public());

    dtp.escrow()
        .lock_payment(
            agreement_id,
            access_proof_value_hash(hash, buyer.public().to_pair(), provider_pub.to_pair()),
        )
        .await
        .unwrap();

    dtp.transfer_key(
        agreement_id,
        &data,
        provider.secret(),
        buyer.public(),
        provider.public(),
    )
    .await
    .unwrap();
    assert_eq!(
        dtp.escrow().state(agreement_id).await,
        Some(TransferState::KeyRecoverable)
    );

    let recovered = dtp
        .read_key(agreement_id, buyer.secret(), provider.public())
        .await
        .unwrap();
    assert_eq!(recovered.as_bytes(), PASSWD);

    dtp.escrow().release(agreement_id).await.unwrap();
    assert_eq!(
        dtp.escrow().state(agreement_id).await,
        Some(TransferState::EscrowReleased)
    );
}

#[tokio::test]
async fn test_snark_other_buyer_cannot_read() {
    let dtp = dtp();
    let provider = dtp.babyjub_account("abc");
    let buyer = dtp.babyjub_account("abd");
    let eve = dtp.babyjub_account("eve");
    let data = PlaintextBlock::new(*PASSWD);
    let agreement_id = B256::repeat_byte(0x02);

    dtp.escrow()
        .lock_payment(
            agreement_id,
            access_proof_value_hash(
                hash_block(&data),
                buyer.public().to_pair(),
                provider.public().to_pair(),
            ),
        )
        .await
        .unwrap();
    dtp.transfer_key(
        agreement_id,
        &data,
        provider.secret(),
        buyer.public(),
        provider.public(),
    )
    .await
    .unwrap();

    let err = dtp
        .read_key(agreement_id, eve.secret(), provider.public())
        .await
        .unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_snark_transfer_for_wrong_buyer_rejected() {
    let dtp = dtp();
    let provider = dtp.babyjub_account("abc");
    let buyer = dtp.babyjub_account("abd");
    let eve = dtp.babyjub_account("eve");
    let data = PlaintextBlock::new(*PASSWD);
    let agreement_id = B256::repeat_byte(0x03);

    dtp.escrow()
        .lock_payment(
            agreement_id,
            access_proof_value_hash(
                hash_block(&data),
                buyer.public().to_pair(),
                provider.public().to_pair(),
            ),
        )
        .await
        .unwrap();

    let err = dtp
        .transfer_key(agreement_id, &data, provider.secret(), eve.public(), provider.public())
        .await
        .unwrap_err();
    assert!(matches!(err, DtpError::ProofVerificationFailed(_)));
    assert_eq!(
        dtp.escrow().state(agreement_id).await,
        Some(TransferState::AgreementLocked)
    );
}

struct DleqParties {
    provider_pub: BabyjubPublicKey,
    buyer_pub: BabyjubPublicKey,
    cipher: U256,
    secret_id: BabyjubPublicKey,
}

async fn lock_dleq(
    dtp: &Dtp<MockProver, InMemoryEscrow>,
    agreement_id: B256,
) -> DleqParties {
    let ctx = dtp.context();
    let provider_pub = dleq::secret_to_public(ctx, &make_key("abc"));
    let buyer_pub = dleq::secret_to_public(ctx, &make_key("abd"));

    let ServiceAttributes::AccessDleq {
        cipher, secret_id, ..
    } = dtp
        .publish_dleq(U256::from(123456u64), &make_key("abcedf"), &provider_pub)
        .unwrap()
    else {
        panic!("expected access-dleq attributes");
    };

    dtp.escrow()
        .lock_payment(
            agreement_id,
            access_dleq_value_hash(
                cipher,
                secret_id.to_pair(),
                provider_pub.to_pair(),
                buyer_pub.to_pair(),
            ),
        )
        .await
        .unwrap();

    DleqParties {
        provider_pub,
        buyer_pub,
        cipher,
        secret_id,
    }
}

#[tokio::test]
async fn test_dleq_key_transfer() {
    let dtp = dtp();
    let agreement_id = B256::repeat_byte(0x10);
    let p = lock_dleq(&dtp, agreement_id).await;
    assert_ne!(p.cipher, U256::from(123456u64));

    dtp.transfer_key_dleq(
        agreement_id,
        p.cipher,
        &make_key("abc"),
        &p.secret_id,
        &p.buyer_pub,
    )
    .await
    .unwrap();

    let passwd = dtp
        .read_key_dleq(agreement_id, p.cipher, &make_key("abd"), &p.provider_pub)
        .await
        .unwrap();
    assert_eq!(passwd, U256::from(123456u64));
}

#[tokio::test]
async fn test_dleq_proof_for_other_agreement_rejected() {
    let dtp = dtp();
    let agreement_id = B256::repeat_byte(0x11);
    let p = lock_dleq(&dtp, agreement_id).await;
    let ctx = dtp.context();

    // Proof bound to a different agreement's condition id.
    let label = dleq_condition_id(
        B256::repeat_byte(0x99),
        dleq_condition(),
        p.cipher,
        p.secret_id.to_pair(),
        p.provider_pub.to_pair(),
        p.buyer_pub.to_pair(),
    );
    let transfer = dleq::make_proof(
        ctx,
        label,
        &make_key("abc"),
        &p.secret_id,
        &p.buyer_pub,
        &mut ark_std::test_rng(),
    )
    .unwrap();

    let err = dtp
        .escrow()
        .fulfill_access_dleq(
            agreement_id,
            AccessDleqFulfillment {
                cipher: p.cipher,
                secret_id: p.secret_id,
                provider: p.provider_pub,
                buyer: p.buyer_pub,
                reencrypt: transfer.reencrypt,
                proof: transfer.proof,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EscrowError::Rejected(_)));
    assert_eq!(
        dtp.escrow().state(agreement_id).await,
        Some(TransferState::AgreementLocked)
    );
}

#[tokio::test]
async fn test_dleq_wrong_provider_secret_rejected() {
    let dtp = dtp();
    let agreement_id = B256::repeat_byte(0x12);
    let p = lock_dleq(&dtp, agreement_id).await;

    // A different secret gives a different G1 key, so the values no longer match.
    let err = dtp
        .transfer_key_dleq(
            agreement_id,
            p.cipher,
            &make_key("not abc"),
            &p.secret_id,
            &p.buyer_pub,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DtpError::ProofVerificationFailed(_)));
    assert!(dtp
        .escrow()
        .access_dleq_fulfilled(agreement_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_dleq_timeout_before_transfer() {
    let dtp = dtp();
    let agreement_id = B256::repeat_byte(0x13);
    let p = lock_dleq(&dtp, agreement_id).await;
    dtp.escrow().expire(agreement_id).await.unwrap();

    let err = dtp
        .transfer_key_dleq(
            agreement_id,
            p.cipher,
            &make_key("abc"),
            &p.secret_id,
            &p.buyer_pub,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DtpError::ExternalDependencyError(_)));
    assert_eq!(
        dtp.escrow().state(agreement_id).await,
        Some(TransferState::TimedOut)
    );
}

#[tokio::test]
async fn test_transfer_for_asset_selects_scheme() {
    let dtp = dtp();
    let assets = InMemoryAssets::new();
    let provider_secret = make_key("abc");
    let provider = dtp.babyjub_account("abc");
    let buyer = dtp.babyjub_account("abd");
    let data = PlaintextBlock::new(*PASSWD);

    // access-proof asset
    let snark_attrs = dtp.publish_commitment(&data, provider.public());
    assets.publish("did:nv:proof", snark_attrs).await;
    assets.store_plaintext("did:nv:proof", data).await;
    let proof_id = B256::repeat_byte(0x20);
    dtp.escrow()
        .lock_payment(
            proof_id,
            access_proof_value_hash(
                hash_block(&data),
                buyer.public().to_pair(),
                provider.public().to_pair(),
            ),
        )
        .await
        .unwrap();
    dtp.transfer_for_asset(&assets, "did:nv:proof", proof_id, &provider_secret, buyer.public())
        .await
        .unwrap();
    assert!(dtp
        .escrow()
        .access_proof_fulfilled(proof_id)
        .await
        .unwrap()
        .is_some());

    // access-dleq asset
    let dleq_id = B256::repeat_byte(0x21);
    let p = lock_dleq(&dtp, dleq_id).await;
    assets
        .publish(
            "did:nv:dleq",
            ServiceAttributes::AccessDleq {
                cipher: p.cipher,
                secret_id: p.secret_id,
                provider_pub: p.provider_pub,
            },
        )
        .await;
    dtp.transfer_for_asset(&assets, "did:nv:dleq", dleq_id, &provider_secret, &p.buyer_pub)
        .await
        .unwrap();
    assert!(dtp
        .escrow()
        .access_dleq_fulfilled(dleq_id)
        .await
        .unwrap()
        .is_some());

    // unknown asset
    let err = dtp
        .transfer_for_asset(&assets, "did:nv:none", dleq_id, &provider_secret, &p.buyer_pub)
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
#[ignore = "requires snarkjs and compiled key-transfer circuit (DTP_CIRCUITS_DIR)"]
async fn test_snarkjs_key_transfer() {
    use dtp::adapters::snarkjs_prover::SnarkjsProver;
    use dtp::config::CircuitArtifacts;
    use dtp::ports::prover::Prover;
    use dtp::scheme::{ProofScheme, SnarkClaim, SnarkInput, SnarkScheme};

    let dir = std::env::var("DTP_CIRCUITS_DIR").expect("DTP_CIRCUITS_DIR not set");
    let ctx = CryptoContext::shared();
    let artifacts = CircuitArtifacts::from_dir(std::path::Path::new(&dir));
    let scheme = SnarkScheme::new(ctx.clone(), SnarkjsProver::new(artifacts, "snarkjs"));

    let provider = dtp::domain::keys::Account::from_passphrase(&ctx, "abc");
    let buyer = dtp::domain::keys::Account::from_passphrase(&ctx, "abd");
    let input = SnarkInput {
        buyer_pub: *buyer.public(),
        provider_pub: *provider.public(),
        provider_secret: *provider.secret(),
        data: PlaintextBlock::new(*PASSWD),
    };

    let transfer = scheme.prove(&input).await.expect("snarkjs proving failed");
    println!("calldata: {} bytes", transfer.proof.calldata.len());
    assert!(scheme.prover().verify_key_transfer(&transfer.proof).await.unwrap());

    scheme
        .verify(
            &SnarkClaim {
                buyer_pub: input.buyer_pub,
                provider_pub: input.provider_pub,
                orig_hash: hash_block(&input.data),
            },
            &transfer,
        )
        .await
        .unwrap();

    let k = dtp::crypto::ecdh::ecdh(&ctx, buyer.secret(), provider.public()).unwrap();
    let recovered = ctx.mimc().decrypt(&transfer.cipher, k).unwrap();
    assert_eq!(recovered.as_bytes(), PASSWD);
}
