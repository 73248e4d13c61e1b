use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// All analysis thresholds, constructed once and passed by reference into
/// every component. A JSON file given via `--config` overlays individual
/// fields; anything absent keeps its default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum actions a player needs in the scoping window to be analyzed.
    pub min_player_actions: i64,
    /// Minimum distinct hands before an hourly bucket is stored.
    pub hourly_min_hands: i64,
    /// Minimum distinct hands before a weekday bucket is stored.
    pub weekday_min_hands: i64,
    /// Inactivity gap (minutes) that ends a session.
    pub session_gap_minutes: i64,
    pub session_min_actions: i64,
    pub session_min_duration_minutes: i64,
    pub session_win_threshold: f64,
    pub session_loss_threshold: f64,
    /// Session length (minutes) at which base fatigue reaches 100.
    pub fatigue_threshold_minutes: f64,
    pub fatigue_morning_modifier: f64,
    pub fatigue_afternoon_modifier: f64,
    pub fatigue_evening_modifier: f64,
    pub fatigue_night_modifier: f64,
    /// Stricter hand minimums applied when picking best/worst buckets.
    pub optimal_min_hands_hourly: i64,
    pub optimal_min_hands_daily: i64,
    pub optimal_min_hands_category: i64,
    /// Fallback recommendation when a player has no winning sessions.
    pub default_session_length_minutes: i64,
    /// An hour is flagged when its tilt count exceeds this...
    pub avoid_tilt_threshold: i64,
    /// ...or its bb/100 falls below this.
    pub avoid_loss_threshold: f64,
    pub max_daily_volume: i64,
    /// Lifetime hand count at which data confidence reaches 100.
    pub confidence_threshold_hands: f64,
    pub performance_alerts: bool,
    pub slow_player_warning_secs: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_player_actions: 5,
            hourly_min_hands: 5,
            weekday_min_hands: 10,
            session_gap_minutes: 30,
            session_min_actions: 5,
            session_min_duration_minutes: 10,
            session_win_threshold: 5.0,
            session_loss_threshold: -5.0,
            fatigue_threshold_minutes: 300.0,
            fatigue_morning_modifier: 0.8,
            fatigue_afternoon_modifier: 1.0,
            fatigue_evening_modifier: 1.2,
            fatigue_night_modifier: 1.5,
            optimal_min_hands_hourly: 20,
            optimal_min_hands_daily: 50,
            optimal_min_hands_category: 30,
            default_session_length_minutes: 120,
            avoid_tilt_threshold: 2,
            avoid_loss_threshold: -10.0,
            max_daily_volume: 500,
            confidence_threshold_hands: 1000.0,
            performance_alerts: false,
            slow_player_warning_secs: 5.0,
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Fatigue multiplier for an upstream time-of-day label. Labels outside
    /// the known four are treated as neutral.
    pub fn fatigue_modifier(&self, time_category: &str) -> f64 {
        match time_category {
            "morning" => self.fatigue_morning_modifier,
            "afternoon" => self.fatigue_afternoon_modifier,
            "evening" => self.fatigue_evening_modifier,
            "night" => self.fatigue_night_modifier,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = AnalysisConfig::default();
        assert_eq!(config.session_gap_minutes, 30);
        assert_eq!(config.session_min_actions, 5);
        assert_eq!(config.session_min_duration_minutes, 10);
        assert_eq!(config.optimal_min_hands_hourly, 20);
        assert_eq!(config.max_daily_volume, 500);
        assert_eq!(config.confidence_threshold_hands, 1000.0);
    }

    #[test]
    fn partial_json_overlay_keeps_remaining_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"session_gap_minutes": 45, "fatigue_night_modifier": 2.0}"#)
                .unwrap();
        assert_eq!(config.session_gap_minutes, 45);
        assert_eq!(config.fatigue_night_modifier, 2.0);
        assert_eq!(config.weekday_min_hands, 10);
        assert_eq!(config.default_session_length_minutes, 120);
    }

    #[test]
    fn unknown_category_gets_neutral_modifier() {
        let config = AnalysisConfig::default();
        assert_eq!(config.fatigue_modifier("night"), 1.5);
        assert_eq!(config.fatigue_modifier("dawn"), 1.0);
    }
}
