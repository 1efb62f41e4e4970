//! Error taxonomy
//!
//! Only caller bugs surface as errors. Degenerate geometry, pool exhaustion
//! and stale boss tasks are absorbed inside the simulation.

use thiserror::Error;

/// What a rejected amount was meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountKind {
    Damage,
    Heal,
}

impl std::fmt::Display for AmountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmountKind::Damage => write!(f, "damage"),
            AmountKind::Heal => write!(f, "heal"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SimError {
    /// Negative or NaN damage/heal amount
    #[error("invalid {kind} amount: {amount}")]
    NegativeAmount { kind: AmountKind, amount: f32 },

    /// Construction-time configuration that cannot produce a playable arena
    #[error("invalid tuning: {0}")]
    InvalidTuning(String),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedSnapshot { found: u32, expected: u32 },

    #[error("snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reject amounts that would violate the `[0, max]` invariants
#[inline]
pub fn check_amount(kind: AmountKind, amount: f32) -> Result<f32, SimError> {
    if amount.is_nan() || amount < 0.0 {
        return Err(SimError::NegativeAmount { kind, amount });
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_amount() {
        assert_eq!(check_amount(AmountKind::Damage, 0.0).ok(), Some(0.0));
        assert_eq!(check_amount(AmountKind::Heal, 12.5).ok(), Some(12.5));
        assert!(matches!(
            check_amount(AmountKind::Damage, -1.0),
            Err(SimError::NegativeAmount { kind: AmountKind::Damage, .. })
        ));
        assert!(check_amount(AmountKind::Heal, f32::NAN).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = SimError::NegativeAmount {
            kind: AmountKind::Heal,
            amount: -3.0,
        };
        assert_eq!(err.to_string(), "invalid heal amount: -3");
    }
}
