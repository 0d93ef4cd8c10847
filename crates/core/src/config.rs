use crate::error::{AnalyticsError, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Analytics parameter set consumed by every scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Exchange the price history was fetched from.
    pub exchange_id: String,
    /// Bar size, e.g. "1h".
    pub timeframe: String,
    /// Days of history shown to the caller.
    pub history_days_display: u32,
    /// Days of history fetched (extra buffer for rolling windows).
    pub history_days_fetch: u32,
    /// Rolling window for z-score and Bollinger bands.
    pub z_window: usize,
    /// Window for correlation, volatility, and spread-volatility aggregates.
    pub analytics_window: usize,
    /// Bollinger band width multiplier.
    pub boll_k: f64,
    /// Entry threshold on |z|.
    pub z_entry: f64,
    /// Seconds a loaded price history stays fresh before it is reloaded.
    pub cache_ttl_seconds: u64,
    /// Bars used for top-mover and short-horizon return figures.
    pub lookback_bars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            exchange_id: "binance".to_string(),
            timeframe: "1h".to_string(),
            history_days_display: 10,
            history_days_fetch: 12,
            z_window: 120,
            analytics_window: 240,
            boll_k: 2.0,
            z_entry: 2.0,
            cache_ttl_seconds: 300,
            lookback_bars: 24,
        }
    }
}

impl Settings {
    /// Checks parameter ranges.
    ///
    /// # Errors
    /// Returns `InvalidParameter` describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.z_window < 2 {
            return Err(AnalyticsError::invalid_parameter(format!(
                "z_window must be >= 2, got {}",
                self.z_window
            )));
        }
        if self.analytics_window < 2 {
            return Err(AnalyticsError::invalid_parameter(format!(
                "analytics_window must be >= 2, got {}",
                self.analytics_window
            )));
        }
        if self.lookback_bars == 0 {
            return Err(AnalyticsError::invalid_parameter(
                "lookback_bars must be >= 1",
            ));
        }
        if !self.boll_k.is_finite() || self.boll_k < 0.0 {
            return Err(AnalyticsError::invalid_parameter(format!(
                "boll_k must be a finite value >= 0, got {}",
                self.boll_k
            )));
        }
        if !self.z_entry.is_finite() || self.z_entry < 0.0 {
            return Err(AnalyticsError::invalid_parameter(format!(
                "z_entry must be a finite value >= 0, got {}",
                self.z_entry
            )));
        }
        if self.history_days_fetch < self.history_days_display {
            return Err(AnalyticsError::invalid_parameter(format!(
                "history_days_fetch ({}) must cover history_days_display ({})",
                self.history_days_fetch, self.history_days_display
            )));
        }
        Timeframe::parse(&self.timeframe)?;
        Ok(())
    }

    /// Parsed bar size.
    ///
    /// # Errors
    /// Returns `InvalidParameter` if the timeframe string is malformed.
    pub fn bar(&self) -> Result<Timeframe> {
        Timeframe::parse(&self.timeframe)
    }

    /// Rows covering the display window, e.g. 240 for 10 days of 1h bars.
    ///
    /// Falls back to hourly bars when the timeframe cannot be parsed.
    #[must_use]
    pub fn display_bars(&self) -> usize {
        let per_day = self.bar().map_or(24, |tf| tf.bars_per_day());
        self.history_days_display as usize * per_day
    }
}

/// Bar duration parsed from strings like "15m", "1h", "1d".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeframe {
    seconds: i64,
}

impl Timeframe {
    /// Parses `<count><unit>` with unit one of `m`, `h`, `d`, `w`.
    ///
    /// # Errors
    /// Returns `InvalidParameter` for an empty count, zero count, or unknown unit.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || AnalyticsError::invalid_parameter(format!("invalid timeframe: '{s}'"));

        let unit = s.chars().last().ok_or_else(invalid)?;
        let count: i64 = s[..s.len() - unit.len_utf8()]
            .parse()
            .map_err(|_| invalid())?;
        if count <= 0 {
            return Err(invalid());
        }

        let unit_seconds = match unit {
            'm' => 60,
            'h' => 3_600,
            'd' => 86_400,
            'w' => 604_800,
            _ => return Err(invalid()),
        };

        Ok(Self {
            seconds: count * unit_seconds,
        })
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::seconds(self.seconds)
    }

    /// Whole bars per day, at least 1.
    #[must_use]
    pub fn bars_per_day(&self) -> usize {
        usize::try_from(86_400 / self.seconds).unwrap_or(0).max(1)
    }
}
