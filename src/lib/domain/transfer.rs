use serde::{Deserialize, Serialize};

/// Lifecycle of one key transfer against the escrow.
///
/// ```text
/// SecretCommitted -> AgreementLocked -> ProofSubmitted -> KeyRecoverable -> EscrowReleased
///                          \________________\_________________\____________-> TimedOut
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferState {
    /// Provider published `hash(secret)` and its public key.
    SecretCommitted,
    /// Buyer locked payment under an agreement.
    AgreementLocked,
    /// Provider submitted ciphertext and proof.
    ProofSubmitted,
    /// Proof accepted; the buyer can decrypt from public data.
    KeyRecoverable,
    /// Payment released to the provider.
    EscrowReleased,
    /// Agreement expired before release; payment is refundable.
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferEvent {
    LockPayment,
    SubmitProof,
    AcceptProof,
    ReleaseEscrow,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot apply {event:?} in state {state:?}")]
pub struct TransitionError {
    pub state: TransferState,
    pub event: TransferEvent,
}

impl TransferState {
    /// Apply an event, rejecting transitions the lifecycle does not allow.
    pub fn advance(self, event: TransferEvent) -> Result<Self, TransitionError> {
        use TransferEvent::*;
        use TransferState::*;

        let next = match (self, event) {
            (SecretCommitted, LockPayment) => AgreementLocked,
            (AgreementLocked, SubmitProof) => ProofSubmitted,
            (ProofSubmitted, AcceptProof) => KeyRecoverable,
            (KeyRecoverable, ReleaseEscrow) => EscrowReleased,
            (AgreementLocked | ProofSubmitted | KeyRecoverable, Timeout) => TimedOut,
            (state, event) => return Err(TransitionError { state, event }),
        };
        Ok(next)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TransferState::EscrowReleased | TransferState::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use super::TransferEvent::*;
    use super::TransferState::*;
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = SecretCommitted;
        for event in [LockPayment, SubmitProof, AcceptProof, ReleaseEscrow] {
            state = state.advance(event).unwrap();
        }
        assert_eq!(state, EscrowReleased);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_timeout_from_open_states() {
        for state in [AgreementLocked, ProofSubmitted, KeyRecoverable] {
            assert_eq!(state.advance(Timeout), Ok(TimedOut));
        }
        assert!(SecretCommitted.advance(Timeout).is_err());
    }

    #[test]
    fn test_no_release_without_accepted_proof() {
        assert_eq!(
            ProofSubmitted.advance(ReleaseEscrow),
            Err(TransitionError {
                state: ProofSubmitted,
                event: ReleaseEscrow
            })
        );
        assert!(AgreementLocked.advance(AcceptProof).is_err());
    }

    #[test]
    fn test_terminal_states_are_final() {
        for event in [LockPayment, SubmitProof, AcceptProof, ReleaseEscrow, Timeout] {
            assert!(EscrowReleased.advance(event).is_err());
            assert!(TimedOut.advance(event).is_err());
        }
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&KeyRecoverable).unwrap(),
            "\"KEY_RECOVERABLE\""
        );
    }
}
