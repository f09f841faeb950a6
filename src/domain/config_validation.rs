//! Configuration validation.
//!
//! Every key is checked before a run starts; errors name the section and key.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::LinkError;
use crate::domain::resolution::Resolution;
use crate::domain::session::SessionConfig;
use crate::domain::strategy::{
    Algorithm, BuyAndHoldParams, BuyAndHoldStrategy, RatioParams, RatioStrategy,
    ValueMomentumParams, ValueMomentumStrategy,
};
use crate::domain::value_column::DataDescriptor;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DEFAULT_CASH: f64 = 25_000.0;

/// Where rows come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    #[default]
    Local,
    Remote,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(SourceKind::Local),
            "remote" => Ok(SourceKind::Remote),
            other => Err(format!("unknown source '{}' (expected local or remote)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyConfig {
    Ratio(RatioParams),
    BuyAndHold(BuyAndHoldParams),
    ValueMomentum(ValueMomentumParams),
}

impl StrategyConfig {
    pub fn into_algorithm(self) -> Box<dyn Algorithm> {
        match self {
            StrategyConfig::Ratio(p) => Box::new(RatioStrategy::new(p)),
            StrategyConfig::BuyAndHold(p) => Box::new(BuyAndHoldStrategy::new(p)),
            StrategyConfig::ValueMomentum(p) => Box::new(ValueMomentumStrategy::new(p)),
        }
    }
}

impl fmt::Display for StrategyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyConfig::Ratio(p) => write!(
                f,
                "ratio: SMA({num}[{nd}],{period}) / SMA({den}[{dd}],{period}) vs {th}, trade {q} {den} ({res})",
                num = p.numerator,
                nd = p.numerator_descriptor,
                den = p.denominator,
                dd = p.denominator_descriptor,
                period = p.period,
                th = p.threshold,
                q = p.quantity,
                res = p.resolution,
            ),
            StrategyConfig::BuyAndHold(p) => {
                write!(
                    f,
                    "buy_and_hold: {}[{}] at {} of equity ({})",
                    p.symbol, p.descriptor, p.fraction, p.resolution
                )?;
                if let Some(period) = p.sma_period {
                    write!(f, ", plot SMA({})", period)?;
                }
                Ok(())
            }
            StrategyConfig::ValueMomentum(p) => write!(
                f,
                "value_momentum: {}[{}] long while {}[{}] rises, history {} ({})",
                p.symbol, p.descriptor, p.signal, p.signal_descriptor, p.history, p.resolution
            ),
        }
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> LinkError {
    LinkError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> LinkError {
    LinkError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn non_blank(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, LinkError> {
    let s = non_blank(config, "session", key).ok_or_else(|| missing("session", key))?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
        .map_err(|_| invalid("session", key, format!("invalid {} format, expected YYYY-MM-DD", key)))
}

/// Parse a key strictly: absent means `default`, present but unparsable is
/// an error.
fn parse_or<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, LinkError> {
    match non_blank(config, section, key) {
        None => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|_| invalid(section, key, format!("cannot parse '{}'", s))),
    }
}

fn parse_descriptor(
    config: &dyn ConfigPort,
    key: &str,
    default: DataDescriptor,
) -> Result<DataDescriptor, LinkError> {
    match config.get_string("strategy", key) {
        None => Ok(default),
        Some(s) => DataDescriptor::from_str(&s).map_err(|e| invalid("strategy", key, e.to_string())),
    }
}

fn parse_resolution(config: &dyn ConfigPort) -> Result<Resolution, LinkError> {
    match non_blank(config, "strategy", "resolution") {
        None => Ok(Resolution::Daily),
        Some(s) => s.parse().map_err(|e: String| invalid("strategy", "resolution", e)),
    }
}

pub fn build_session_config(config: &dyn ConfigPort) -> Result<SessionConfig, LinkError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;
    let cash = parse_or(config, "session", "cash", DEFAULT_CASH)?;
    SessionConfig::new(start, end, cash)
}

pub fn source_kind(config: &dyn ConfigPort) -> Result<SourceKind, LinkError> {
    match non_blank(config, "data", "source") {
        None => Ok(SourceKind::Local),
        Some(s) => s.parse().map_err(|e: String| invalid("data", "source", e)),
    }
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<SourceKind, LinkError> {
    let kind = source_kind(config)?;
    match kind {
        SourceKind::Local => {
            non_blank(config, "data", "path").ok_or_else(|| missing("data", "path"))?;
        }
        #[cfg(not(feature = "remote"))]
        SourceKind::Remote => {
            return Err(invalid(
                "data",
                "source",
                "remote source requires building with --features remote",
            ));
        }
        #[cfg(feature = "remote")]
        SourceKind::Remote => {
            non_blank(config, "data", "auth_token")
                .or_else(|| non_blank(config, "data", "quandl_auth_token"))
                .ok_or_else(|| missing("data", "auth_token"))?;
        }
    }
    Ok(kind)
}

fn positive_period(value: i64, key: &str) -> Result<usize, LinkError> {
    if value < 1 {
        return Err(invalid("strategy", key, format!("{} must be at least 1", key)));
    }
    Ok(value as usize)
}

fn build_ratio(config: &dyn ConfigPort) -> Result<RatioParams, LinkError> {
    let numerator =
        non_blank(config, "strategy", "numerator").unwrap_or_else(|| "WIKI/FB".to_string());
    let denominator =
        non_blank(config, "strategy", "denominator").unwrap_or_else(|| "WIKI/IBM".to_string());
    if numerator == denominator {
        return Err(invalid(
            "strategy",
            "numerator",
            "numerator and denominator must differ",
        ));
    }

    let quantity: i64 = parse_or(config, "strategy", "quantity", 100)?;
    if quantity < 1 {
        return Err(invalid("strategy", "quantity", "quantity must be positive"));
    }
    let threshold: f64 = parse_or(config, "strategy", "threshold", 1.0)?;
    if !threshold.is_finite() {
        return Err(invalid("strategy", "threshold", "threshold must be finite"));
    }

    Ok(RatioParams {
        numerator,
        numerator_descriptor: parse_descriptor(
            config,
            "numerator_column",
            DataDescriptor::custom("adj. close")?,
        )?,
        denominator,
        denominator_descriptor: parse_descriptor(
            config,
            "denominator_column",
            DataDescriptor::Default,
        )?,
        period: positive_period(parse_or(config, "strategy", "sma_period", 1)?, "sma_period")?,
        threshold,
        quantity,
        resolution: parse_resolution(config)?,
    })
}

fn build_buy_and_hold(config: &dyn ConfigPort) -> Result<BuyAndHoldParams, LinkError> {
    let symbol = non_blank(config, "strategy", "symbol").ok_or_else(|| missing("strategy", "symbol"))?;

    let fraction: f64 = parse_or(config, "strategy", "fraction", 1.0)?;
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(invalid("strategy", "fraction", "fraction must be in (0, 1]"));
    }

    let sma_period = match non_blank(config, "strategy", "sma_period") {
        None => None,
        Some(_) => Some(positive_period(
            parse_or(config, "strategy", "sma_period", 0)?,
            "sma_period",
        )?),
    };

    Ok(BuyAndHoldParams {
        symbol,
        descriptor: parse_descriptor(config, "value_column", DataDescriptor::Default)?,
        fraction,
        sma_period,
        resolution: parse_resolution(config)?,
    })
}

fn build_value_momentum(config: &dyn ConfigPort) -> Result<ValueMomentumParams, LinkError> {
    let signal =
        non_blank(config, "strategy", "signal").unwrap_or_else(|| "UMICH/SOC1".to_string());
    let symbol = non_blank(config, "strategy", "symbol").unwrap_or_else(|| "SPY".to_string());
    if signal == symbol {
        return Err(invalid("strategy", "signal", "signal and symbol must differ"));
    }

    let history: i64 = parse_or(config, "strategy", "history", 10)?;
    if history < 0 {
        return Err(invalid("strategy", "history", "history must not be negative"));
    }

    Ok(ValueMomentumParams {
        signal,
        signal_descriptor: parse_descriptor(config, "signal_column", DataDescriptor::Default)?,
        symbol,
        descriptor: parse_descriptor(config, "value_column", DataDescriptor::Default)?,
        history: history as usize,
        resolution: parse_resolution(config)?,
    })
}

pub fn build_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, LinkError> {
    let kind = non_blank(config, "strategy", "kind").unwrap_or_else(|| "ratio".to_string());
    match kind.to_lowercase().as_str() {
        "ratio" => build_ratio(config).map(StrategyConfig::Ratio),
        "buy_and_hold" => build_buy_and_hold(config).map(StrategyConfig::BuyAndHold),
        "value_momentum" => build_value_momentum(config).map(StrategyConfig::ValueMomentum),
        other => Err(invalid(
            "strategy",
            "kind",
            format!(
                "unknown strategy '{}' (expected ratio, buy_and_hold or value_momentum)",
                other
            ),
        )),
    }
}

/// Everything a run needs, validated.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub session: SessionConfig,
    pub source: SourceKind,
    pub strategy: StrategyConfig,
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<RunConfig, LinkError> {
    Ok(RunConfig {
        session: build_session_config(config)?,
        source: validate_data_config(config)?,
        strategy: build_strategy_config(config)?,
    })
}
