use crate::analysis::indicators::IndicatorSet;
use crate::domain::{Action, Confidence, Outlook, Timeframe, Trend};
use crate::time::expiry;
use chrono::{DateTime, Local};

const SUPPORT_FALLBACK: f64 = 0.95;
const RESISTANCE_FALLBACK: f64 = 1.05;

/// Everything the synthesizer needs for one instrument.
#[derive(Debug, Clone, Copy)]
pub struct SignalInput<'a> {
    pub price: f64,
    pub indicators: &'a IndicatorSet,
    pub trend: Trend,
    pub volatility: f64,
    pub timeframe: Timeframe,
    pub outlook: Option<Outlook>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub confidence: Confidence,
    pub action: Action,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub potential_percent: f64,
    pub expiration: DateTime<Local>,
}

pub fn synthesize(input: SignalInput<'_>, now: DateTime<Local>) -> Signal {
    let confidence = confidence(input.indicators, input.trend, input.outlook);
    let action = determine_action(input.trend, input.indicators, confidence);
    let (stop_loss, take_profit) =
        risk_levels(input.price, input.volatility, action, input.timeframe);

    Signal {
        confidence,
        action,
        stop_loss,
        take_profit,
        potential_percent: potential_percent(action, input.price, take_profit),
        expiration: expiry::expiration_at(input.timeframe, now),
    }
}

/// Counts indicators agreeing with the trend; an agreeing provider outlook
/// counts double.
pub fn confidence_score(indicators: &IndicatorSet, trend: Trend, outlook: Option<Outlook>) -> u8 {
    let rsi = indicators.rsi_or_default();
    let sma_short = indicators.sma_short_or_default();
    let sma_medium = indicators.sma_medium_or_default();
    let macd = indicators.macd_or_default();

    let mut score = 0;
    match trend {
        Trend::Bullish => {
            score += u8::from(rsi < 40.0);
            score += u8::from(sma_short > sma_medium);
            score += u8::from(macd > 0.0);
        }
        Trend::Bearish => {
            score += u8::from(rsi > 60.0);
            score += u8::from(sma_short < sma_medium);
            score += u8::from(macd < 0.0);
        }
        Trend::Neutral => {}
    }

    if outlook.is_some_and(|o| o.agrees_with(trend)) {
        score += 2;
    }
    score
}

pub fn confidence(indicators: &IndicatorSet, trend: Trend, outlook: Option<Outlook>) -> Confidence {
    Confidence::from_score(confidence_score(indicators, trend, outlook))
}

/// A confident trend decides directly. Otherwise an RSI/MACD extreme can
/// override, and failing that bullish buys and everything else sells.
pub fn determine_action(trend: Trend, indicators: &IndicatorSet, confidence: Confidence) -> Action {
    if confidence.is_actionable() {
        match trend {
            Trend::Bullish => return Action::Buy,
            Trend::Bearish => return Action::Sell,
            Trend::Neutral => {}
        }
    }

    let rsi = indicators.rsi_or_default();
    let macd = indicators.macd_or_default();
    if rsi < 30.0 && macd > 0.0 {
        return Action::Buy;
    }
    if rsi > 70.0 && macd < 0.0 {
        return Action::Sell;
    }

    // Neutral lands on SELL here; there is no HOLD action.
    if trend == Trend::Bullish {
        Action::Buy
    } else {
        Action::Sell
    }
}

/// Stop-loss and take-profit around `price`, rounded to cents. Long positions
/// risk 2x and target 4x the timeframe-adjusted volatility; short positions
/// risk 2x and target 3x.
///
/// Cent rounding can put both levels on the entry price for instruments
/// quoted near 1.0 with low volatility (major forex pairs), leaving a
/// potential of zero.
pub fn risk_levels(price: f64, volatility: f64, side: Action, timeframe: Timeframe) -> (f64, f64) {
    let adjusted = volatility * timeframe.risk_multiplier();
    let stop_loss_pct = adjusted * 2.0;

    match side {
        Action::Buy => {
            let take_profit_pct = adjusted * 4.0;
            (
                round2(price * (1.0 - stop_loss_pct)),
                round2(price * (1.0 + take_profit_pct)),
            )
        }
        Action::Sell => {
            let take_profit_pct = adjusted * 3.0;
            (
                round2(price * (1.0 + stop_loss_pct)),
                round2(price * (1.0 - take_profit_pct)),
            )
        }
    }
}

pub fn potential_percent(action: Action, price: f64, take_profit: f64) -> f64 {
    if price == 0.0 {
        return 0.0;
    }
    match action {
        Action::Buy => (take_profit - price) / price * 100.0,
        Action::Sell => (price - take_profit) / price * 100.0,
    }
}

/// Provider levels win; otherwise +-5% around the price.
pub fn support_resistance(
    price: f64,
    provider_support: Option<f64>,
    provider_resistance: Option<f64>,
) -> (f64, f64) {
    (
        provider_support.unwrap_or(price * SUPPORT_FALLBACK),
        provider_resistance.unwrap_or(price * RESISTANCE_FALLBACK),
    )
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
