use std::ops::Range;

use chrono::Duration;

use crate::config::AnalysisConfig;
use crate::models::{ActionRecord, SessionOutcome, SessionRecord};

/// Fraction of bet/raise actions in a window, as a percentage.
/// An empty window rates 0, not an error.
pub fn aggression_rate(actions: &[ActionRecord]) -> f64 {
    if actions.is_empty() {
        return 0.0;
    }
    let aggressive = actions.iter().filter(|a| a.action.is_aggressive()).count();
    aggressive as f64 / actions.len() as f64 * 100.0
}

/// Fatigue ramps linearly with session length, reaching 100 at the
/// configured threshold, then scales by the time-of-day modifier. Always
/// clamped to [0, 100].
pub fn fatigue_score(duration_minutes: i64, time_category: &str, config: &AnalysisConfig) -> f64 {
    let base = (duration_minutes as f64 / (config.fatigue_threshold_minutes / 100.0)).min(100.0);
    (base * config.fatigue_modifier(time_category)).min(100.0)
}

/// Cuts a chronologically sorted action stream into session windows: a new
/// window starts wherever the gap to the previous action exceeds the
/// threshold. The returned ranges are contiguous, non-overlapping, and
/// cover the whole stream. Players with fewer than 10 actions carry too
/// little signal to segment and get no windows at all.
pub fn session_windows(actions: &[ActionRecord], gap_minutes: i64) -> Vec<Range<usize>> {
    if actions.len() < 10 {
        return Vec::new();
    }

    let gap = Duration::minutes(gap_minutes);
    let mut windows = Vec::new();
    let mut start = 0;

    for i in 1..actions.len() {
        if actions[i].played_at - actions[i - 1].played_at > gap {
            windows.push(start..i);
            start = i;
        }
    }
    windows.push(start..actions.len());
    windows
}

/// Derives the session record for one window, or `None` when the window
/// fails the action-count or elapsed-duration minimums. A window can pack
/// many actions into too short a span, or stretch a handful of actions
/// across a long idle stretch; both are rejected here.
pub fn analyze_session(
    player_id: &str,
    window: &[ActionRecord],
    config: &AnalysisConfig,
) -> Option<SessionRecord> {
    if (window.len() as i64) < config.session_min_actions {
        return None;
    }

    let session_start = window.first()?.played_at;
    let session_end = window.last()?.played_at;
    let duration_minutes = (session_end - session_start).num_minutes();
    if duration_minutes < config.session_min_duration_minutes {
        return None;
    }

    let net_win: f64 = window.iter().map(|a| a.net_win).sum();
    let bb_per_hour = if duration_minutes > 0 {
        net_win / (duration_minutes as f64 / 60.0)
    } else {
        0.0
    };

    let outcome = if net_win > config.session_win_threshold {
        SessionOutcome::Winning
    } else if net_win < config.session_loss_threshold {
        SessionOutcome::Losing
    } else {
        SessionOutcome::Breakeven
    };

    let third = window.len() / 3;
    let early_aggression = aggression_rate(&window[..third]);
    let late_aggression = aggression_rate(&window[window.len() - third..]);

    let time_category = modal_category(window);
    let fatigue = fatigue_score(duration_minutes, &time_category, config);

    let biggest_pot_won = window.iter().map(|a| a.net_win).fold(f64::NEG_INFINITY, f64::max);
    let biggest_pot_lost = window.iter().map(|a| a.net_win).fold(f64::INFINITY, f64::min);

    let day_of_week = crate::aggregate::weekday_index(&session_start);

    Some(SessionRecord {
        player_id: player_id.to_string(),
        session_start,
        session_end,
        duration_minutes,
        hands_played: window.len() as i64,
        net_win,
        bb_per_hour,
        time_category,
        day_of_week,
        is_weekend: day_of_week >= 5,
        early_aggression,
        late_aggression,
        aggression_change: late_aggression - early_aggression,
        fatigue_score: fatigue,
        outcome,
        biggest_pot_won,
        biggest_pot_lost,
    })
}

/// Most frequent time-of-day label in the window; ties go to the label
/// encountered first.
fn modal_category(window: &[ActionRecord]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for action in window {
        let position = counts
            .iter()
            .position(|(label, _)| *label == action.time_category.as_str());
        match position {
            Some(i) => counts[i].1 += 1,
            None => counts.push((action.time_category.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActionKind;
    use chrono::NaiveDate;

    fn action(minute_offset: i64, kind: ActionKind, net_win: f64, category: &str) -> ActionRecord {
        let base = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        ActionRecord {
            player_id: "p1".to_string(),
            hand_id: format!("h{minute_offset}"),
            played_at: base + Duration::minutes(minute_offset),
            action: kind,
            net_win,
            raise_percentage: 50.0,
            hand_strength: 0.5,
            time_category: category.to_string(),
        }
    }

    fn stream(minutes: &[i64]) -> Vec<ActionRecord> {
        minutes
            .iter()
            .map(|&m| action(m, ActionKind::Call, 1.0, "morning"))
            .collect()
    }

    #[test]
    fn aggression_rate_is_bounded_and_zero_on_empty() {
        assert_eq!(aggression_rate(&[]), 0.0);
        let mixed = vec![
            action(0, ActionKind::Bet, 0.0, "morning"),
            action(1, ActionKind::Fold, 0.0, "morning"),
            action(2, ActionKind::Raise, 0.0, "morning"),
            action(3, ActionKind::Call, 0.0, "morning"),
        ];
        assert_eq!(aggression_rate(&mixed), 50.0);
    }

    #[test]
    fn fatigue_clamps_at_both_ends() {
        let config = AnalysisConfig::default();
        assert_eq!(fatigue_score(0, "afternoon", &config), 0.0);
        // 300 minutes at the 300-minute threshold hits base 100; the night
        // modifier cannot push past the cap.
        assert_eq!(fatigue_score(300, "night", &config), 100.0);
        assert_eq!(fatigue_score(10_000, "morning", &config), 100.0);
    }

    #[test]
    fn fatigue_is_monotonic_in_duration() {
        let config = AnalysisConfig::default();
        let mut last = 0.0;
        for duration in [0, 30, 60, 150, 300, 600] {
            let score = fatigue_score(duration, "evening", &config);
            assert!(score >= last);
            assert!((0.0..=100.0).contains(&score));
            last = score;
        }
    }

    #[test]
    fn windows_cover_the_stream_without_overlap() {
        // 12 actions, gaps after index 4 and 8.
        let minutes = [0, 2, 4, 6, 8, 60, 62, 64, 66, 120, 122, 124];
        let actions = stream(&minutes);
        let windows = session_windows(&actions, 30);
        assert_eq!(windows, vec![0..5, 5..9, 9..12]);

        let covered: usize = windows.iter().map(|w| w.len()).sum();
        assert_eq!(covered, actions.len());
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn wider_gap_never_yields_more_sessions() {
        let minutes = [0, 5, 40, 45, 90, 95, 200, 205, 300, 305, 400, 405];
        let actions = stream(&minutes);
        let mut last_count = usize::MAX;
        for gap in [10, 30, 60, 120, 500] {
            let count = session_windows(&actions, gap).len();
            assert!(count <= last_count);
            last_count = count;
        }
    }

    #[test]
    fn under_ten_actions_yields_no_windows() {
        let actions = stream(&[0, 10, 20, 400, 410, 420, 800, 810, 820]);
        assert!(session_windows(&actions, 30).is_empty());
    }

    #[test]
    fn winning_session_rate_matches_duration() {
        let config = AnalysisConfig {
            session_min_actions: 3,
            ..AnalysisConfig::default()
        };
        let window = vec![
            action(0, ActionKind::Call, 10.0, "morning"),
            action(7, ActionKind::Call, 10.0, "morning"),
            action(15, ActionKind::Call, 10.0, "morning"),
        ];
        let session = analyze_session("p1", &window, &config).unwrap();
        assert_eq!(session.outcome, SessionOutcome::Winning);
        assert_eq!(session.duration_minutes, 15);
        assert!((session.bb_per_hour - 120.0).abs() < 1e-9);
        assert_eq!(session.biggest_pot_won, 10.0);
        // 2026-03-02 is a Monday.
        assert_eq!(session.day_of_week, 0);
        assert!(!session.is_weekend);
    }

    #[test]
    fn too_short_a_span_is_rejected_despite_many_actions() {
        let config = AnalysisConfig::default();
        let window = stream(&[0, 1, 2, 3, 4, 5]);
        assert!(analyze_session("p1", &window, &config).is_none());
    }

    #[test]
    fn too_few_actions_are_rejected_despite_long_span() {
        let config = AnalysisConfig::default();
        let window = stream(&[0, 120]);
        assert!(analyze_session("p1", &window, &config).is_none());
    }

    #[test]
    fn aggression_change_compares_first_and_last_thirds() {
        let config = AnalysisConfig {
            session_min_actions: 6,
            ..AnalysisConfig::default()
        };
        // Passive opening, aggressive close: early third all calls, late
        // third all raises.
        let window = vec![
            action(0, ActionKind::Call, 0.0, "evening"),
            action(5, ActionKind::Call, 0.0, "evening"),
            action(10, ActionKind::Fold, 0.0, "evening"),
            action(15, ActionKind::Bet, 0.0, "evening"),
            action(20, ActionKind::Raise, 0.0, "evening"),
            action(25, ActionKind::Raise, 0.0, "evening"),
        ];
        let session = analyze_session("p1", &window, &config).unwrap();
        assert_eq!(session.early_aggression, 0.0);
        assert_eq!(session.late_aggression, 100.0);
        assert_eq!(session.aggression_change, 100.0);
    }

    #[test]
    fn breakeven_between_thresholds() {
        let config = AnalysisConfig {
            session_min_actions: 5,
            ..AnalysisConfig::default()
        };
        let window = vec![
            action(0, ActionKind::Call, 2.0, "night"),
            action(10, ActionKind::Call, -1.0, "night"),
            action(20, ActionKind::Call, 1.0, "night"),
            action(30, ActionKind::Call, 0.0, "night"),
            action(40, ActionKind::Call, 1.0, "night"),
        ];
        let session = analyze_session("p1", &window, &config).unwrap();
        assert_eq!(session.outcome, SessionOutcome::Breakeven);
        assert_eq!(session.biggest_pot_lost, -1.0);
    }

    #[test]
    fn modal_category_prefers_first_seen_on_tie() {
        let window = vec![
            action(0, ActionKind::Call, 0.0, "evening"),
            action(5, ActionKind::Call, 0.0, "night"),
            action(10, ActionKind::Call, 0.0, "evening"),
            action(15, ActionKind::Call, 0.0, "night"),
        ];
        assert_eq!(modal_category(&window), "evening");
    }
}
