//! Shared snapshot builders for evaluator tests.

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sevendte_core::market::{
    Candle, Greeks, Instrument, MarketSnapshot, OptionQuote, OptionRight,
};

pub fn instrument() -> Instrument {
    Instrument {
        symbol: "NVDA".to_string(),
        name: "NVIDIA Corporation".to_string(),
        sector: "Technology".to_string(),
        last_price: Decimal::from(100),
        beta: 1.7,
    }
}

/// Daily candles plus an ATM call/put pair expiring 7 days out. The chain
/// straddles the final close so every evaluator can select a leg.
pub fn snapshot_from_closes(closes: &[f64]) -> MarketSnapshot {
    let as_of = Utc.with_ymd_and_hms(2025, 6, 2, 15, 0, 0).unwrap();
    let candles: Vec<Candle> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let close = Decimal::from_f64(close).unwrap();
            Candle {
                timestamp: as_of - Duration::days((closes.len() - i) as i64),
                open: close,
                high: close + Decimal::ONE,
                low: close - Decimal::ONE,
                close,
                volume: 1_000_000,
            }
        })
        .collect();

    let chain = closes.last().map_or_else(Vec::new, |&spot| {
        let strike = Decimal::from_f64(spot.round()).unwrap();
        let expiry = as_of.date_naive() + Duration::days(7);
        [OptionRight::Call, OptionRight::Put]
            .into_iter()
            .map(|right| OptionQuote {
                symbol: format!("NVDA250609{right}{strike}"),
                right,
                strike,
                expiry,
                bid: Decimal::new(240, 2),
                ask: Decimal::new(260, 2),
                implied_volatility: 0.45,
                greeks: Greeks::default(),
            })
            .collect()
    });

    MarketSnapshot {
        as_of,
        candles,
        chain,
        fundamentals: None,
        volatility: None,
    }
}
