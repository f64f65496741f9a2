use rust_decimal::Decimal;

/// The persisted essence of a position: share count and cost basis per
/// share. All position arithmetic lives here as pure functions so the
/// executor's transaction code stays a thin shell around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionState {
    pub quantity: i64,
    pub average_cost: Decimal,
}

/// Result of applying a sell to a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellOutcome {
    /// None when the full position was sold; the holding row is deleted.
    pub remaining: Option<PositionState>,
    /// (price - average_cost) * quantity. Derived, not persisted.
    pub realized_pnl: Decimal,
}

/// Fold a buy into a position. The new average cost is the
/// quantity-weighted mean of the old basis and the execution price,
/// computed in decimal arithmetic so repeated partial buys do not drift.
pub fn apply_buy(existing: Option<&PositionState>, quantity: i64, price: Decimal) -> PositionState {
    match existing {
        None => PositionState {
            quantity,
            average_cost: price,
        },
        Some(pos) => {
            let old_qty = Decimal::from(pos.quantity);
            let buy_qty = Decimal::from(quantity);
            let new_qty = old_qty + buy_qty;
            let average_cost = (pos.average_cost * old_qty + price * buy_qty) / new_qty;

            PositionState {
                quantity: pos.quantity + quantity,
                average_cost,
            }
        }
    }
}

/// Reduce a position by a sell. Callers must have verified
/// `quantity <= position.quantity`. Average cost is unchanged: selling
/// realizes gain against the existing basis, it does not rewrite it.
pub fn apply_sell(position: &PositionState, quantity: i64, price: Decimal) -> SellOutcome {
    debug_assert!(quantity <= position.quantity);

    let realized_pnl = (price - position.average_cost) * Decimal::from(quantity);
    let left = position.quantity - quantity;

    SellOutcome {
        remaining: (left > 0).then(|| PositionState {
            quantity: left,
            average_cost: position.average_cost,
        }),
        realized_pnl,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_first_buy_sets_basis_to_price() {
        let pos = apply_buy(None, 10, dec("150"));
        assert_eq!(pos.quantity, 10);
        assert_eq!(pos.average_cost, dec("150"));
    }

    #[test]
    fn test_buy_recomputes_weighted_average() {
        // 10 @ 150 then 5 @ 180 → (10*150 + 5*180) / 15 = 160
        let pos = apply_buy(None, 10, dec("150"));
        let pos = apply_buy(Some(&pos), 5, dec("180"));

        assert_eq!(pos.quantity, 15);
        assert_eq!(pos.average_cost, dec("160"));
    }

    #[test]
    fn test_sell_keeps_average_cost() {
        let pos = apply_buy(None, 15, dec("160"));
        let outcome = apply_sell(&pos, 5, dec("200"));

        let remaining = outcome.remaining.unwrap();
        assert_eq!(remaining.quantity, 10);
        assert_eq!(remaining.average_cost, dec("160"));
        assert_eq!(outcome.realized_pnl, dec("200"));
    }

    #[test]
    fn test_full_sell_closes_position() {
        let pos = apply_buy(None, 15, dec("160"));
        let outcome = apply_sell(&pos, 15, dec("200"));

        assert!(outcome.remaining.is_none());
        assert_eq!(outcome.realized_pnl, dec("600"));
    }

    #[test]
    fn test_buy_buy_sell_round_trip() {
        // BUY 10 @ 150, BUY 5 @ 180, SELL 15 @ 200.
        let pos = apply_buy(None, 10, dec("150"));
        let pos = apply_buy(Some(&pos), 5, dec("180"));
        assert_eq!(pos.average_cost, dec("160"));

        let outcome = apply_sell(&pos, 15, dec("200"));
        assert!(outcome.remaining.is_none());
        // Proceeds 3000 vs basis 2400.
        assert_eq!(outcome.realized_pnl, dec("600"));
    }

    #[test]
    fn test_average_cost_matches_weighted_mean_over_many_buys() {
        // Many small odd-priced buys; the running average must match the
        // directly-computed weighted mean to well under a cent.
        let prices = [
            "150.33", "151.07", "149.99", "152.41", "148.86", "153.17", "150.01",
        ];

        let mut pos: Option<PositionState> = None;
        let mut total_cost = Decimal::ZERO;
        let mut total_qty = 0i64;

        for (i, p) in prices.iter().cycle().take(500).enumerate() {
            let qty = (i as i64 % 7) + 1;
            let price = dec(p);
            pos = Some(apply_buy(pos.as_ref(), qty, price));
            total_cost += price * Decimal::from(qty);
            total_qty += qty;
        }

        let pos = pos.unwrap();
        assert_eq!(pos.quantity, total_qty);

        let expected = total_cost / Decimal::from(total_qty);
        let drift = (pos.average_cost - expected).abs();
        assert!(drift < dec("0.000001"), "drift {drift} too large");
    }

    #[test]
    fn test_buy_order_does_not_change_final_average() {
        // Weighted mean is order-independent.
        let forward = {
            let pos = apply_buy(None, 3, dec("10.50"));
            let pos = apply_buy(Some(&pos), 7, dec("11.25"));
            apply_buy(Some(&pos), 5, dec("9.75"))
        };
        let backward = {
            let pos = apply_buy(None, 5, dec("9.75"));
            let pos = apply_buy(Some(&pos), 7, dec("11.25"));
            apply_buy(Some(&pos), 3, dec("10.50"))
        };

        let diff = (forward.average_cost - backward.average_cost).abs();
        assert!(diff < dec("0.000000001"));
        assert_eq!(forward.quantity, backward.quantity);
    }

    #[test]
    fn test_sell_at_loss_has_negative_pnl() {
        let pos = apply_buy(None, 4, dec("100"));
        let outcome = apply_sell(&pos, 4, dec("90"));
        assert_eq!(outcome.realized_pnl, dec("-40"));
    }
}
