use common_types::{Bundle, MintBundleAnalysis, Trade, INSTANT_PURCHASE_VELOCITY};

pub fn units_to_ui(amount: f64, decimals: u8) -> f64 {
    amount / 10f64.powi(decimals as i32)
}

fn price_to_ui(price: f64, decimals: u8) -> f64 {
    price * 10f64.powi(decimals as i32)
}

fn trade_to_ui(trade: &Trade, decimals: u8) -> Trade {
    Trade {
        quantity: units_to_ui(trade.quantity, decimals),
        price: price_to_ui(trade.price, decimals),
        ..trade.clone()
    }
}

fn bundle_to_ui(bundle: &Bundle, decimals: u8) -> Bundle {
    let purchase_velocity = if bundle.purchase_velocity == INSTANT_PURCHASE_VELOCITY {
        INSTANT_PURCHASE_VELOCITY
    } else {
        units_to_ui(bundle.purchase_velocity, decimals)
    };
    Bundle {
        transactions: bundle.transactions.iter().map(|t| trade_to_ui(t, decimals)).collect(),
        current_holdings: units_to_ui(bundle.current_holdings, decimals),
        avg_price_per_token: price_to_ui(bundle.avg_price_per_token, decimals),
        purchase_velocity,
        ..bundle.clone()
    }
}

/// Rescale raw token amounts in a report to display units.
///
/// Quantities shrink by `10^decimals`, per-token SOL prices grow by the same
/// factor. SOL totals and supply percentages are unit free and stay put.
pub trait ToUi {
    fn to_ui(&self, decimals: u8) -> Self;
}

impl ToUi for MintBundleAnalysis {
    fn to_ui(&self, decimals: u8) -> Self {
        let rescale = |list: &Vec<Bundle>| list.iter().map(|b| bundle_to_ui(b, decimals)).collect::<Vec<_>>();
        let mut out = self.clone();
        out.total_supply = units_to_ui(self.total_supply, decimals);
        out.largest_bundle = self.largest_bundle.as_ref().map(|b| bundle_to_ui(b, decimals));
        out.bundles = rescale(&self.bundles);
        out.suspicious_patterns.rapid_accumulation = rescale(&self.suspicious_patterns.rapid_accumulation);
        out.suspicious_patterns.price_manipulation = rescale(&self.suspicious_patterns.price_manipulation);
        out.suspicious_patterns.coordinated_buying = rescale(&self.suspicious_patterns.coordinated_buying);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analyze_trades, AnalysisOptions};

    #[test]
    fn rescale_keeps_unit_free_fields() {
        let trades = vec![
            Trade { signature: "a".into(), slot: 1, timestamp: 0, price: 0.000_000_1, quantity: 2_000_000.0 },
            Trade { signature: "b".into(), slot: 1, timestamp: 3_600_000, price: 0.000_000_1, quantity: 2_000_000.0 },
        ];
        let raw = analyze_trades("mint", trades, 100_000_000.0, &AnalysisOptions::default());
        let ui = raw.to_ui(6);

        assert!((ui.total_supply - 100.0).abs() < 1e-9);
        assert_eq!(ui.total_sol_spent, raw.total_sol_spent);
        let (r, u) = (&raw.bundles[0], &ui.bundles[0]);
        assert_eq!(u.supply_percentage, r.supply_percentage);
        assert_eq!(u.sol_spent, r.sol_spent);
        assert!((u.current_holdings - 4.0).abs() < 1e-9);
        assert!((u.avg_price_per_token - 0.1).abs() < 1e-9);
        assert!((u.purchase_velocity - 4.0).abs() < 1e-9);
        assert!((u.transactions[0].quantity - 2.0).abs() < 1e-9);
        assert_eq!(ui.largest_bundle.as_ref(), Some(u));
    }

    #[test]
    fn sentinel_velocity_survives_rescale() {
        let trades = vec![
            Trade { signature: "a".into(), slot: 1, timestamp: 5, price: 0.1, quantity: 10.0 },
            Trade { signature: "b".into(), slot: 1, timestamp: 5, price: 0.1, quantity: 10.0 },
        ];
        let ui = analyze_trades("mint", trades, 1_000.0, &AnalysisOptions::default()).to_ui(9);
        assert_eq!(ui.bundles[0].purchase_velocity, INSTANT_PURCHASE_VELOCITY);
    }
}
