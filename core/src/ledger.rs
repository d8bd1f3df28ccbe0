//! Inventory ledger.
//!
//! Each asset carries a fixed capacity (`initial_quantity`) and a counter of units
//! on the shelf (`available_quantity`). The counter only moves by one, driven by
//! the lifecycle (accept → decrement, return → increment), and stays within
//! `0..=initial`. Admin edits of the capacity shift the counter by the same delta.
//!
//! The arithmetic here is the reference for every store: the in-memory store
//! applies it directly, the `PostgreSQL` store expresses the same bounds as
//! conditional `UPDATE` statements.

use crate::error::{LendingError, Result};
use crate::types::{AssetId, RequestId, RequestStatus};
use serde::{Deserialize, Serialize};

/// Capacity and shelf count of one asset.
///
/// Constructed only through [`Quantities::new`], which enforces `0 <= available <= initial`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantities {
    initial: i32,
    available: i32,
}

impl Quantities {
    /// Build a quantity pair, checking the ledger bounds.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::Validation`] when `available` is negative or exceeds `initial`.
    pub fn new(initial: i32, available: i32) -> Result<Self> {
        if available < 0 || available > initial {
            return Err(LendingError::Validation(format!(
                "available quantity {available} outside 0..={initial}"
            )));
        }
        Ok(Self { initial, available })
    }

    /// A freshly created asset: every unit is on the shelf.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::Validation`] for a negative capacity.
    pub fn full(initial: i32) -> Result<Self> {
        Self::new(initial, initial)
    }

    /// Total owned units.
    #[must_use]
    pub const fn initial(self) -> i32 {
        self.initial
    }

    /// Units on the shelf.
    #[must_use]
    pub const fn available(self) -> i32 {
        self.available
    }

    /// Units currently loaned out.
    #[must_use]
    pub const fn on_loan(self) -> i32 {
        self.initial - self.available
    }

    /// Take one unit off the shelf.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::OutOfStock`] when nothing is available.
    pub const fn decrement(self, asset_id: AssetId) -> Result<Self> {
        if self.available <= 0 {
            return Err(LendingError::OutOfStock { asset_id });
        }
        Ok(Self {
            initial: self.initial,
            available: self.available - 1,
        })
    }

    /// Put one unit back on the shelf, or `None` when already at capacity.
    #[must_use]
    pub const fn increment(self) -> Option<Self> {
        if self.available >= self.initial {
            return None;
        }
        Some(Self {
            initial: self.initial,
            available: self.available + 1,
        })
    }

    /// Change the capacity, moving the shelf count by the same delta.
    ///
    /// # Errors
    ///
    /// - [`LendingError::Validation`] for a negative capacity
    /// - [`LendingError::CapacityBelowLoaned`] when the new capacity is smaller
    ///   than the number of units on loan
    pub fn adjust_initial(self, asset_id: AssetId, new_initial: i32) -> Result<Self> {
        if new_initial < 0 {
            return Err(LendingError::Validation(
                "initial_quantity must not be negative".to_string(),
            ));
        }
        let on_loan = self.on_loan();
        if new_initial < on_loan {
            return Err(LendingError::CapacityBelowLoaned {
                asset_id,
                requested: new_initial,
                on_loan,
            });
        }
        Ok(Self {
            initial: new_initial,
            available: new_initial - on_loan,
        })
    }
}

/// Quantity adjustment triggered by a status change.
///
/// Keyed by request: the store resolves the asset through the request row
/// inside the same transaction as the status write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerEffect {
    /// Accepted: one unit leaves the shelf
    Decrement {
        /// Request being accepted
        request_id: RequestId,
    },
    /// Returned: one unit comes back, bounded by capacity
    Increment {
        /// Request being returned
        request_id: RequestId,
    },
}

impl LedgerEffect {
    /// Adjustment that follows a transition to `status`, if any.
    #[must_use]
    pub const fn for_status(request_id: RequestId, status: RequestStatus) -> Option<Self> {
        match status {
            RequestStatus::Accepted => Some(Self::Decrement { request_id }),
            RequestStatus::Returned => Some(Self::Increment { request_id }),
            _ => None,
        }
    }

    /// Request the adjustment is keyed by.
    #[must_use]
    pub const fn request_id(self) -> RequestId {
        match self {
            Self::Decrement { request_id } | Self::Increment { request_id } => request_id,
        }
    }
}

/// What a committed ledger effect did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ledger", rename_all = "snake_case")]
pub enum LedgerOutcome {
    /// One unit left the shelf
    Decremented {
        /// Asset adjusted
        asset_id: AssetId,
        /// Shelf count after the write
        available: i32,
    },
    /// One unit came back
    Incremented {
        /// Asset adjusted
        asset_id: AssetId,
        /// Shelf count after the write
        available: i32,
    },
    /// Return confirmed while already at capacity; nothing written
    AtCapacity {
        /// Asset left unchanged
        asset_id: AssetId,
    },
}

impl LedgerOutcome {
    /// Apply `effect` to `quantities` of `asset_id`, returning the new counter and the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::OutOfStock`] for a decrement at zero.
    pub fn apply(
        effect: LedgerEffect,
        asset_id: AssetId,
        quantities: Quantities,
    ) -> Result<(Quantities, Self)> {
        match effect {
            LedgerEffect::Decrement { .. } => {
                let next = quantities.decrement(asset_id)?;
                Ok((
                    next,
                    Self::Decremented {
                        asset_id,
                        available: next.available(),
                    },
                ))
            },
            LedgerEffect::Increment { .. } => Ok(match quantities.increment() {
                Some(next) => (
                    next,
                    Self::Incremented {
                        asset_id,
                        available: next.available(),
                    },
                ),
                None => (quantities, Self::AtCapacity { asset_id }),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use proptest::prelude::*;

    const ASSET: AssetId = AssetId::new(7);

    #[test]
    fn constructor_enforces_bounds() {
        assert!(Quantities::new(2, 2).is_ok());
        assert!(Quantities::new(2, 0).is_ok());
        assert!(Quantities::new(2, 3).is_err());
        assert!(Quantities::new(2, -1).is_err());
        assert!(Quantities::full(-1).is_err());
    }

    #[test]
    fn decrement_stops_at_zero() {
        let q = Quantities::new(1, 1).unwrap();
        let q = q.decrement(ASSET).unwrap();
        assert_eq!(q.available(), 0);
        assert_eq!(
            q.decrement(ASSET),
            Err(LendingError::OutOfStock { asset_id: ASSET })
        );
    }

    #[test]
    fn increment_is_a_no_op_at_capacity() {
        let q = Quantities::full(2).unwrap();
        assert_eq!(q.increment(), None);

        let request_id = RequestId::new(1);
        let (after, outcome) =
            LedgerOutcome::apply(LedgerEffect::Increment { request_id }, ASSET, q).unwrap();
        assert_eq!(after, q);
        assert_eq!(outcome, LedgerOutcome::AtCapacity { asset_id: ASSET });
    }

    #[test]
    fn adjust_initial_moves_available_by_the_same_delta() {
        // 10 owned, 3 on loan
        let q = Quantities::new(10, 7).unwrap();

        let grown = q.adjust_initial(ASSET, 12).unwrap();
        assert_eq!((grown.initial(), grown.available()), (12, 9));

        let shrunk = q.adjust_initial(ASSET, 3).unwrap();
        assert_eq!((shrunk.initial(), shrunk.available()), (3, 0));

        assert_eq!(
            q.adjust_initial(ASSET, 2),
            Err(LendingError::CapacityBelowLoaned {
                asset_id: ASSET,
                requested: 2,
                on_loan: 3,
            })
        );
        assert!(matches!(
            q.adjust_initial(ASSET, -1),
            Err(LendingError::Validation(_))
        ));
    }

    #[test]
    fn ledger_effect_follows_target_status() {
        let id = RequestId::new(3);
        assert_eq!(
            LedgerEffect::for_status(id, RequestStatus::Accepted),
            Some(LedgerEffect::Decrement { request_id: id })
        );
        assert_eq!(
            LedgerEffect::for_status(id, RequestStatus::Returned),
            Some(LedgerEffect::Increment { request_id: id })
        );
        for status in [
            RequestStatus::PendingAdmin,
            RequestStatus::PendingManager,
            RequestStatus::ApprovedByManager,
            RequestStatus::RejectedByManager,
            RequestStatus::RejectedByAdmin,
            RequestStatus::ReturnRequested,
        ] {
            assert_eq!(LedgerEffect::for_status(id, status), None);
        }
    }

    proptest! {
        #[test]
        fn available_stays_within_capacity(
            initial in 0_i32..20,
            ops in proptest::collection::vec(any::<bool>(), 0..64),
        ) {
            let request_id = RequestId::new(1);
            let mut q = Quantities::full(initial).unwrap();
            for accept in ops {
                let effect = if accept {
                    LedgerEffect::Decrement { request_id }
                } else {
                    LedgerEffect::Increment { request_id }
                };
                match LedgerOutcome::apply(effect, ASSET, q) {
                    Ok((next, _)) => q = next,
                    Err(err) => prop_assert_eq!(err, LendingError::OutOfStock { asset_id: ASSET }),
                }
                prop_assert!(q.available() >= 0);
                prop_assert!(q.available() <= q.initial());
            }
        }
    }
}
