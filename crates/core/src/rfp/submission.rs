use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::decision::{BatchId, DecisionBatch};
use crate::errors::DomainError;

use super::router::{ActionKind, ActionPayload};

/// One record carrying every outcome of a batch, so the decision and the RFP
/// request are persisted together or not at all.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionSubmission {
    pub batch_id: BatchId,
    pub idempotency_key: String,
    pub decision: Option<ActionPayload>,
    pub rfp_request: Option<ActionPayload>,
}

impl DecisionSubmission {
    pub fn new(
        batch: &DecisionBatch,
        decision: Option<ActionPayload>,
        rfp_request: Option<ActionPayload>,
    ) -> Result<Self, DomainError> {
        if decision.is_none() && rfp_request.is_none() {
            return Err(DomainError::InvariantViolation(
                "submission must carry a decision or an rfp request".to_string(),
            ));
        }

        for (payload, expected) in
            [(&decision, ActionKind::SaveDecision), (&rfp_request, ActionKind::RaiseRfp)]
        {
            let Some(payload) = payload else { continue };
            if payload.action != expected {
                return Err(DomainError::InvariantViolation(format!(
                    "payload for {expected} was built for {}",
                    payload.action
                )));
            }
            if payload.batch_id != batch.batch_id {
                return Err(DomainError::InvariantViolation(format!(
                    "payload batch `{}` does not match submission batch `{}`",
                    payload.batch_id.0, batch.batch_id.0
                )));
            }
        }

        let idempotency_key =
            submission_key(&batch.batch_id, decision.as_ref(), rfp_request.as_ref())?;

        Ok(Self { batch_id: batch.batch_id.clone(), idempotency_key, decision, rfp_request })
    }

    pub fn actions(&self) -> Vec<ActionKind> {
        self.decision.iter().chain(self.rfp_request.iter()).map(|payload| payload.action).collect()
    }
}

/// Deterministic key over the batch id and the full JSON of each payload,
/// every field length-prefixed. Identical resubmissions collide; a change to
/// any quantity, price or date yields a new key.
pub fn submission_key(
    batch_id: &BatchId,
    decision: Option<&ActionPayload>,
    rfp_request: Option<&ActionPayload>,
) -> Result<String, DomainError> {
    let mut hasher = Sha256::new();
    update_field(&mut hasher, batch_id.0.as_bytes());
    for payload in [decision, rfp_request] {
        let encoded = match payload {
            Some(payload) => serde_json::to_vec(payload).map_err(|error| {
                DomainError::InvariantViolation(format!("payload is not serializable: {error}"))
            })?,
            None => Vec::new(),
        };
        update_field(&mut hasher, &encoded);
    }
    Ok(format!("sha256:{:x}", hasher.finalize()))
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}
