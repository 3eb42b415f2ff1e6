//! Trade signal types: candidate signals produced by strategy evaluators and
//! persisted signals with a validated status state machine.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::market::OptionRight;

/// Directional bias derived from a signal kind, used for ensemble bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Bullish => Self::Bearish,
            Self::Bearish => Self::Bullish,
            Self::Neutral => Self::Neutral,
        }
    }

    #[must_use]
    pub const fn is_directional(self) -> bool {
        !matches!(self, Self::Neutral)
    }
}

/// The option structure a signal recommends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    LongCall,
    LongPut,
    ShortCall,
    ShortPut,
    CallSpread,
    PutSpread,
    IronCondor,
    Butterfly,
    CalendarSpread,
    DiagonalSpread,
}

impl SignalKind {
    /// Directional bias of the structure. Non-directional structures map to
    /// Neutral and are never bucketed by the ensemble.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::LongCall | Self::ShortPut | Self::CallSpread => Direction::Bullish,
            Self::LongPut | Self::ShortCall | Self::PutSpread => Direction::Bearish,
            Self::IronCondor | Self::Butterfly | Self::CalendarSpread | Self::DiagonalSpread => {
                Direction::Neutral
            }
        }
    }
}

/// Which family of analysis produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Technical,
    Fundamental,
    Volatility,
    Ensemble,
}

impl std::fmt::Display for SignalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Technical => write!(f, "technical"),
            Self::Fundamental => write!(f, "fundamental"),
            Self::Volatility => write!(f, "volatility"),
            Self::Ensemble => write!(f, "ensemble"),
        }
    }
}

/// A piece of evidence attached to a signal for explainability.
///
/// Weights are relative importance hints and need not sum to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Factor {
    pub name: String,
    pub value: f64,
    pub weight: f64,
    pub category: String,
    pub description: String,
}

impl Factor {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value: f64,
        weight: f64,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            weight,
            category: category.into(),
            description: description.into(),
        }
    }
}

/// Signal validity horizon in days, rendered as e.g. "7d".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFrame(pub u32);

impl TimeFrame {
    #[must_use]
    pub fn as_duration(self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.0))
    }
}

impl Default for TimeFrame {
    fn default() -> Self {
        Self(7)
    }
}

impl std::fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d", self.0)
    }
}

/// The specific contract a signal recommends trading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionLeg {
    pub symbol: String,
    pub right: OptionRight,
    pub strike: Decimal,
    pub expiry: NaiveDate,
}

impl From<&crate::market::OptionQuote> for OptionLeg {
    fn from(quote: &crate::market::OptionQuote) -> Self {
        Self {
            symbol: quote.symbol.clone(),
            right: quote.right,
            strike: quote.strike,
            expiry: quote.expiry,
        }
    }
}

/// Output of a single strategy evaluation, before persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSignal {
    /// Name of the producing strategy, e.g. "rsi".
    pub strategy: String,
    pub kind: SignalKind,
    pub source: SignalSource,
    /// Estimated reliability in [0, 1].
    pub confidence: f64,
    pub entry_price: Option<Decimal>,
    pub target_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub leg: OptionLeg,
    pub time_frame: TimeFrame,
    pub factors: Vec<Factor>,
}

impl CandidateSignal {
    /// Creates a candidate, validating the confidence bound.
    ///
    /// # Errors
    /// Returns an error if confidence lies outside [0.0, 1.0].
    pub fn new(
        strategy: impl Into<String>,
        kind: SignalKind,
        source: SignalSource,
        confidence: f64,
        leg: OptionLeg,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            anyhow::bail!("confidence must be in [0.0, 1.0], got {confidence}");
        }
        Ok(Self {
            strategy: strategy.into(),
            kind,
            source,
            confidence,
            entry_price: None,
            target_price: None,
            stop_price: None,
            leg,
            time_frame: TimeFrame::default(),
            factors: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_prices(mut self, target: Option<Decimal>, stop: Option<Decimal>) -> Self {
        self.target_price = target;
        self.stop_price = stop;
        self
    }

    #[must_use]
    pub fn with_factor(mut self, factor: Factor) -> Self {
        self.factors.push(factor);
        self
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.kind.direction()
    }
}

/// Lifecycle status of a persisted signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    Pending,
    /// Live but unexecuted; only some sources use this intermediate state.
    Active,
    Executed,
    Expired,
    Cancelled,
}

impl SignalStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Executed | Self::Expired | Self::Cancelled)
    }

    /// Whether a transition to `to` is legal.
    #[must_use]
    pub const fn can_transition(self, to: Self) -> bool {
        match self {
            Self::Pending => matches!(
                to,
                Self::Active | Self::Executed | Self::Expired | Self::Cancelled
            ),
            Self::Active => matches!(to, Self::Executed | Self::Expired | Self::Cancelled),
            Self::Executed | Self::Expired | Self::Cancelled => false,
        }
    }
}

/// A persisted trade signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: i64,
    pub symbol: String,
    pub kind: SignalKind,
    pub source: SignalSource,
    pub status: SignalStatus,
    pub confidence: f64,
    pub entry_price: Option<Decimal>,
    pub target_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub leg: OptionLeg,
    pub time_frame: TimeFrame,
    pub generated_at: DateTime<Utc>,
    pub factors: Vec<Factor>,
}

impl Signal {
    /// Promotes a candidate into a pending persisted signal.
    #[must_use]
    pub fn from_candidate(
        id: i64,
        symbol: impl Into<String>,
        candidate: CandidateSignal,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            kind: candidate.kind,
            source: candidate.source,
            status: SignalStatus::Pending,
            confidence: candidate.confidence,
            entry_price: candidate.entry_price,
            target_price: candidate.target_price,
            stop_price: candidate.stop_price,
            leg: candidate.leg,
            time_frame: candidate.time_frame,
            generated_at,
            factors: candidate.factors,
        }
    }

    /// Applies a status transition, rejecting illegal ones.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidTransition`] when the move is not legal.
    pub fn transition(&mut self, to: SignalStatus) -> Result<(), EngineError> {
        if !self.status.can_transition(to) {
            return Err(EngineError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// True once the signal's time frame has elapsed since generation.
    #[must_use]
    pub fn is_elapsed(&self, now: DateTime<Utc>) -> bool {
        now - self.generated_at >= self.time_frame.as_duration()
    }

    /// Expires a pending or active signal whose time frame has elapsed.
    /// Returns true if a transition happened.
    pub fn expire_if_elapsed(&mut self, now: DateTime<Utc>) -> bool {
        if !self.status.is_terminal() && self.is_elapsed(now) {
            self.status = SignalStatus::Expired;
            true
        } else {
            false
        }
    }
}
