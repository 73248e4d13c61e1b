use chrono::NaiveDateTime;

/// One player decision within a hand. The stream handed to the analysis
/// pipeline is sorted by `played_at` per player and never mutated.
#[derive(Debug, Clone)]
pub struct ActionRecord {
    pub player_id: String,
    pub hand_id: String,
    pub played_at: NaiveDateTime,
    pub action: ActionKind,
    pub net_win: f64,
    pub raise_percentage: f64,
    pub hand_strength: f64,
    pub time_category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
}

impl ActionKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fold" => Some(ActionKind::Fold),
            "check" => Some(ActionKind::Check),
            "call" => Some(ActionKind::Call),
            "bet" => Some(ActionKind::Bet),
            "raise" => Some(ActionKind::Raise),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Fold => "fold",
            ActionKind::Check => "check",
            ActionKind::Call => "call",
            ActionKind::Bet => "bet",
            ActionKind::Raise => "raise",
        }
    }

    pub fn is_aggressive(&self) -> bool {
        matches!(self, ActionKind::Bet | ActionKind::Raise)
    }
}

/// Externally-detected episode of degraded play, joined into hourly and
/// weekday buckets by its start time.
#[derive(Debug, Clone)]
pub struct TiltEvent {
    pub player_id: String,
    pub started_at: NaiveDateTime,
    pub duration_minutes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Winning,
    Losing,
    Breakeven,
}

impl SessionOutcome {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "winning" => Some(SessionOutcome::Winning),
            "losing" => Some(SessionOutcome::Losing),
            "breakeven" => Some(SessionOutcome::Breakeven),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionOutcome::Winning => "winning",
            SessionOutcome::Losing => "losing",
            SessionOutcome::Breakeven => "breakeven",
        }
    }
}

/// One detected play session. Recomputed from scratch every run; rows below
/// the configured action-count or duration minimums are never materialized.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub player_id: String,
    pub session_start: NaiveDateTime,
    pub session_end: NaiveDateTime,
    pub duration_minutes: i64,
    pub hands_played: i64,
    pub net_win: f64,
    pub bb_per_hour: f64,
    pub time_category: String,
    /// Monday = 0 through Sunday = 6.
    pub day_of_week: i32,
    pub is_weekend: bool,
    pub early_aggression: f64,
    pub late_aggression: f64,
    pub aggression_change: f64,
    pub fatigue_score: f64,
    pub outcome: SessionOutcome,
    pub biggest_pot_won: f64,
    pub biggest_pot_lost: f64,
}

#[derive(Debug, Clone)]
pub struct HourlyRow {
    pub player_id: String,
    pub hour_of_day: i32,
    pub hands_played: i64,
    pub net_win_bb: f64,
    pub bb_per_100_hands: f64,
    pub avg_pot_size: f64,
    pub aggression_factor: f64,
    pub avg_bet_size_percentage: f64,
    pub overbet_frequency: f64,
    pub variance_bb: f64,
    pub biggest_win_bb: f64,
    pub biggest_loss_bb: f64,
    pub tilt_events_count: i64,
}

#[derive(Debug, Clone)]
pub struct WeekdayRow {
    pub player_id: String,
    /// Monday = 0 through Sunday = 6.
    pub day_of_week: i32,
    pub day_name: String,
    pub hands_played: i64,
    pub net_win_bb: f64,
    pub bb_per_100_hands: f64,
    pub aggression_factor: f64,
    pub variance_bb: f64,
    pub tilt_events_count: i64,
    pub avg_tilt_duration_minutes: f64,
}

/// Direct rollup by the upstream time-of-day label, used only by the
/// optimal-time selector. Rows keep first-seen order from the action stream.
#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub time_category: String,
    pub hands: i64,
    pub bb_per_100: f64,
    pub variance: f64,
}

#[derive(Debug, Clone)]
pub struct OptimalPlayTimes {
    pub player_id: String,
    pub best_hour_of_day: Option<i32>,
    pub best_day_of_week: Option<i32>,
    pub best_time_category: Option<String>,
    pub optimal_bb_per_100: f64,
    pub optimal_variance: f64,
    pub worst_hour_of_day: Option<i32>,
    pub worst_day_of_week: Option<i32>,
    pub worst_time_category: Option<String>,
    pub worst_bb_per_100: f64,
    pub worst_variance: f64,
    pub recommended_session_length_minutes: i64,
    pub avoid_hours: Vec<i32>,
    pub optimal_volume_per_day: i64,
    pub data_confidence: f64,
}

/// Result of one player's analysis attempt. Failures are isolated per
/// player; the orchestrator folds these into a `RunSummary`.
#[derive(Debug, Clone)]
pub enum PlayerOutcome {
    Analyzed {
        sessions: usize,
        hourly_buckets: usize,
        weekday_buckets: usize,
    },
    Skipped {
        reason: String,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub analyzed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub sessions_written: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kind_roundtrips_known_labels() {
        for label in ["fold", "check", "call", "bet", "raise"] {
            let kind = ActionKind::parse(label).unwrap();
            assert_eq!(kind.as_str(), label);
        }
        assert!(ActionKind::parse("limp").is_none());
    }

    #[test]
    fn only_bets_and_raises_are_aggressive() {
        assert!(ActionKind::Bet.is_aggressive());
        assert!(ActionKind::Raise.is_aggressive());
        assert!(!ActionKind::Call.is_aggressive());
        assert!(!ActionKind::Check.is_aggressive());
        assert!(!ActionKind::Fold.is_aggressive());
    }
}
