use std::sync::Arc;

use tracing::debug;

use crate::{
    data_structures::{
        amount::Amount,
        transaction::Input,
        types::{AssetId, ProgramHash},
    },
    storage::{Utxo, UtxoStore},
    WalletError, WalletResult,
};

/// Lock time given to outputs whose lock has expired, so they are never
/// mistaken for a future lock again
pub const LOCK_TIME_EXPIRED: u32 = u32::MAX - 1;

/// Drop outputs still locked at `current_height` and order the rest ascending by amount
///
/// The sort is stable: equal amounts keep their original relative order.
pub fn select(candidates: Vec<Utxo>, current_height: u32) -> Vec<Utxo> {
    let mut available: Vec<Utxo> = candidates
        .into_iter()
        .filter_map(|mut utxo| {
            if utxo.lock_time > 0 {
                if utxo.lock_time >= current_height {
                    return None;
                }
                utxo.lock_time = LOCK_TIME_EXPIRED;
            }
            Some(utxo)
        })
        .collect();
    available.sort_by(|a, b| a.amount.to_units().cmp(&b.amount.to_units()));
    available
}

#[derive(Debug)]
pub struct UtxoSelection {
    pub utxos: Vec<Utxo>,
    /// Sum of the selected UTXOs
    pub total_value: Amount,
    /// Surplus over the required amount, if any
    pub change: Option<Amount>,
}

impl UtxoSelection {
    /// Inputs spending the selected UTXOs; the sequence carries the UTXO's lock time
    pub fn inputs(&self) -> Vec<Input> {
        self.utxos
            .iter()
            .map(|utxo| Input {
                previous: utxo.outpoint,
                sequence: utxo.lock_time,
            })
            .collect()
    }
}

/// Consume `available` in order until `required` is covered
///
/// Zero-value outputs are skipped. Nothing is selected when `required` is zero.
pub fn accumulate(
    available: Vec<Utxo>,
    asset_id: &AssetId,
    required: &Amount,
) -> WalletResult<UtxoSelection> {
    let mut utxos = Vec::new();
    let mut total_value = Amount::zero_for(asset_id);
    let mut remaining = required.clone();

    if !required.matches_asset(asset_id) {
        return Err(WalletError::asset_mismatch(
            format!("amount of asset {asset_id}"),
            required,
        ));
    }
    if required.is_zero() {
        return Ok(UtxoSelection {
            utxos,
            total_value,
            change: None,
        });
    }

    let mut change = None;
    let mut sufficient_funds = false;

    for utxo in available {
        if !utxo.amount.is_positive() {
            continue;
        }
        total_value = total_value.checked_add(&utxo.amount)?;
        let ordering = utxo.amount.compare(&remaining)?;
        match ordering {
            std::cmp::Ordering::Less => {
                remaining = remaining.checked_sub(&utxo.amount)?;
                utxos.push(utxo);
            }
            std::cmp::Ordering::Equal => {
                utxos.push(utxo);
                sufficient_funds = true;
                break;
            }
            std::cmp::Ordering::Greater => {
                change = Some(utxo.amount.checked_sub(&remaining)?);
                utxos.push(utxo);
                sufficient_funds = true;
                break;
            }
        }
    }

    // Short of funds means every positive UTXO was consumed
    if !sufficient_funds {
        return Err(WalletError::InsufficientFunds {
            asset_id: asset_id.to_string(),
            required: required.to_string(),
            available: total_value.to_string(),
        });
    }

    Ok(UtxoSelection {
        utxos,
        total_value,
        change,
    })
}

/// Selects inputs for one (owner, asset) pool from the store
pub struct InputSelector {
    pub database: Arc<dyn UtxoStore>,
}

impl InputSelector {
    pub fn new(database: Arc<dyn UtxoStore>) -> Self {
        Self { database }
    }

    pub async fn fetch_unspent_outputs(
        &self,
        owner: &ProgramHash,
        asset_id: &AssetId,
        required: &Amount,
    ) -> WalletResult<UtxoSelection> {
        let snapshot = self.database.spendable_snapshot(owner, asset_id).await?;
        let candidates = snapshot.utxos.len();
        let available = select(snapshot.utxos, snapshot.height);
        debug!(
            owner = %owner,
            asset = %asset_id,
            height = snapshot.height,
            candidates,
            available = available.len(),
            "Selecting inputs"
        );
        accumulate(available, asset_id, required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{
        amount::{NativeAmount, TokenAmount},
        asset::SYSTEM_ASSET_ID,
        transaction::OutPoint,
        types::TxId,
    };

    fn utxo(index: u16, coins_e8: i64, lock_time: u32) -> Utxo {
        Utxo::new(
            *SYSTEM_ASSET_ID,
            OutPoint::new(TxId::new([7u8; 32]), index),
            NativeAmount::from_units(coins_e8).into(),
            lock_time,
        )
    }

    fn native(units: i64) -> Amount {
        NativeAmount::from_units(units).into()
    }

    #[test]
    fn test_select_filters_locked_and_normalizes() {
        let candidates = vec![utxo(0, 100, 0), utxo(1, 200, 10), utxo(2, 300, 9), utxo(3, 400, 11)];
        let selected = select(candidates, 10);
        let indexes: Vec<u16> = selected.iter().map(|u| u.outpoint.index).collect();
        assert_eq!(indexes, vec![0, 2]);
        assert_eq!(selected[0].lock_time, 0);
        assert_eq!(selected[1].lock_time, LOCK_TIME_EXPIRED);
    }

    #[test]
    fn test_select_sorts_ascending_and_stable() {
        let candidates = vec![utxo(0, 500, 0), utxo(1, 100, 0), utxo(2, 200, 0), utxo(3, 100, 0)];
        let selected = select(candidates, 1);
        let indexes: Vec<u16> = selected.iter().map(|u| u.outpoint.index).collect();
        assert_eq!(indexes, vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_accumulate_with_change() {
        let available = select(
            vec![
                utxo(2, 500_000_000, 0),
                utxo(0, 100_000_000, 0),
                utxo(1, 200_000_000, 0),
            ],
            1,
        );
        let selection = accumulate(available, &SYSTEM_ASSET_ID, &native(260_000_000)).unwrap();
        assert_eq!(selection.utxos.len(), 2);
        assert_eq!(selection.total_value, native(300_000_000));
        assert_eq!(selection.change, Some(native(40_000_000)));
    }

    #[test]
    fn test_accumulate_exact_match_has_no_change() {
        let available = vec![utxo(0, 100, 0), utxo(1, 200, 0)];
        let selection = accumulate(available, &SYSTEM_ASSET_ID, &native(300)).unwrap();
        assert_eq!(selection.utxos.len(), 2);
        assert_eq!(selection.change, None);
    }

    #[test]
    fn test_accumulate_skips_zero_value() {
        let available = vec![utxo(0, 0, 0), utxo(1, 500, 0)];
        let selection = accumulate(available, &SYSTEM_ASSET_ID, &native(100)).unwrap();
        assert_eq!(selection.utxos.len(), 1);
        assert_eq!(selection.utxos[0].outpoint.index, 1);
        assert_eq!(selection.inputs()[0].sequence, 0);
    }

    #[test]
    fn test_accumulate_stops_once_covered() {
        // The second UTXO is never added, so its size cannot overflow the total
        let available = select(vec![utxo(0, 200, 0), utxo(1, i64::MAX, 0)], 1);
        let selection = accumulate(available, &SYSTEM_ASSET_ID, &native(100)).unwrap();
        assert_eq!(selection.utxos.len(), 1);
        assert_eq!(selection.utxos[0].outpoint.index, 0);
        assert_eq!(selection.total_value, native(200));
        assert_eq!(selection.change, Some(native(100)));
    }

    #[test]
    fn test_accumulate_insufficient_reports_context() {
        let available = vec![utxo(0, 100, 0), utxo(1, 200, 0)];
        let err = accumulate(available, &SYSTEM_ASSET_ID, &native(1_000)).unwrap_err();
        match err {
            WalletError::InsufficientFunds {
                asset_id,
                required,
                available,
            } => {
                assert_eq!(asset_id, SYSTEM_ASSET_ID.to_string());
                assert_eq!(required, "0.00001000");
                assert_eq!(available, "0.00000300");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_accumulate_rejects_wrong_representation() {
        let token_id = AssetId::new([1u8; 32]);
        assert!(matches!(
            accumulate(vec![], &token_id, &native(1)),
            Err(WalletError::AssetMismatch { .. })
        ));
        let selection =
            accumulate(vec![], &token_id, &Amount::Token(TokenAmount::zero())).unwrap();
        assert!(selection.utxos.is_empty());
    }
}
