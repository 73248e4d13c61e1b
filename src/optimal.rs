use crate::config::AnalysisConfig;
use crate::models::{
    CategoryRow, HourlyRow, OptimalPlayTimes, SessionOutcome, SessionRecord, WeekdayRow,
};

/// Picks the best and worst play times for one player from the persisted
/// hourly/weekday buckets, the direct time-of-day rollup, and the run's
/// session records. Dimensions with no qualifying bucket stay `None` with
/// zeroed metrics rather than a fabricated value.
pub fn select_optimal_times(
    player_id: &str,
    hourly: &[HourlyRow],
    weekday: &[WeekdayRow],
    categories: &[CategoryRow],
    sessions: &[SessionRecord],
    total_hands: i64,
    config: &AnalysisConfig,
) -> OptimalPlayTimes {
    // Bucket rows arrive sorted by index, and category rows in first-seen
    // order, so strict comparisons keep ties on the earlier entry.
    let qualifying_hours: Vec<&HourlyRow> = hourly
        .iter()
        .filter(|row| row.hands_played >= config.optimal_min_hands_hourly)
        .collect();
    let best_hour = extreme(&qualifying_hours, |r| r.bb_per_100_hands, Extreme::Max);
    let worst_hour = extreme(&qualifying_hours, |r| r.bb_per_100_hands, Extreme::Min);

    let qualifying_days: Vec<&WeekdayRow> = weekday
        .iter()
        .filter(|row| row.hands_played >= config.optimal_min_hands_daily)
        .collect();
    let best_day = extreme(&qualifying_days, |r| r.bb_per_100_hands, Extreme::Max);
    let worst_day = extreme(&qualifying_days, |r| r.bb_per_100_hands, Extreme::Min);

    let category_refs: Vec<&CategoryRow> = categories.iter().collect();
    let best_category = extreme(&category_refs, |r| r.bb_per_100, Extreme::Max);
    let worst_category = extreme(&category_refs, |r| r.bb_per_100, Extreme::Min);

    OptimalPlayTimes {
        player_id: player_id.to_string(),
        best_hour_of_day: best_hour.map(|r| r.hour_of_day),
        best_day_of_week: best_day.map(|r| r.day_of_week),
        best_time_category: best_category.map(|r| r.time_category.clone()),
        optimal_bb_per_100: best_hour.map_or(0.0, |r| r.bb_per_100_hands),
        optimal_variance: best_hour.map_or(0.0, |r| r.variance_bb),
        worst_hour_of_day: worst_hour.map(|r| r.hour_of_day),
        worst_day_of_week: worst_day.map(|r| r.day_of_week),
        worst_time_category: worst_category.map(|r| r.time_category.clone()),
        worst_bb_per_100: worst_hour.map_or(0.0, |r| r.bb_per_100_hands),
        worst_variance: worst_hour.map_or(0.0, |r| r.variance_bb),
        recommended_session_length_minutes: recommended_session_length(sessions, config),
        avoid_hours: avoid_hours(hourly, config),
        optimal_volume_per_day: config.max_daily_volume.min(total_hands / 10),
        data_confidence: data_confidence(total_hands, config),
    }
}

#[derive(Clone, Copy)]
enum Extreme {
    Max,
    Min,
}

fn extreme<'a, T>(rows: &[&'a T], metric: impl Fn(&T) -> f64, which: Extreme) -> Option<&'a T> {
    let mut selected: Option<&'a T> = None;
    for &row in rows {
        let better = match selected {
            None => true,
            Some(current) => match which {
                Extreme::Max => metric(row) > metric(current),
                Extreme::Min => metric(row) < metric(current),
            },
        };
        if better {
            selected = Some(row);
        }
    }
    selected
}

/// Mean duration of the player's winning sessions, or the configured
/// default when there are none.
fn recommended_session_length(sessions: &[SessionRecord], config: &AnalysisConfig) -> i64 {
    let winning: Vec<i64> = sessions
        .iter()
        .filter(|s| s.outcome == SessionOutcome::Winning)
        .map(|s| s.duration_minutes)
        .collect();
    if winning.is_empty() {
        return config.default_session_length_minutes;
    }
    let total: i64 = winning.iter().sum();
    (total as f64 / winning.len() as f64) as i64
}

/// Hours where the player tilts too often or bleeds too hard, worst first:
/// tilt count descending, then rate ascending.
fn avoid_hours(hourly: &[HourlyRow], config: &AnalysisConfig) -> Vec<i32> {
    let mut flagged: Vec<&HourlyRow> = hourly
        .iter()
        .filter(|row| {
            row.tilt_events_count > config.avoid_tilt_threshold
                || row.bb_per_100_hands < config.avoid_loss_threshold
        })
        .collect();
    flagged.sort_by(|a, b| {
        b.tilt_events_count.cmp(&a.tilt_events_count).then(
            a.bb_per_100_hands
                .partial_cmp(&b.bb_per_100_hands)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });
    flagged.into_iter().map(|row| row.hour_of_day).collect()
}

/// Linear ramp to 100 at the configured lifetime hand count.
fn data_confidence(total_hands: i64, config: &AnalysisConfig) -> f64 {
    (total_hands as f64 / (config.confidence_threshold_hands / 100.0)).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hour_row(hour: i32, hands: i64, rate: f64, tilt: i64) -> HourlyRow {
        HourlyRow {
            player_id: "p1".to_string(),
            hour_of_day: hour,
            hands_played: hands,
            net_win_bb: 0.0,
            bb_per_100_hands: rate,
            avg_pot_size: 0.0,
            aggression_factor: 0.0,
            avg_bet_size_percentage: 0.0,
            overbet_frequency: 0.0,
            variance_bb: 1.0,
            biggest_win_bb: 0.0,
            biggest_loss_bb: 0.0,
            tilt_events_count: tilt,
        }
    }

    fn winning_session(duration_minutes: i64) -> SessionRecord {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        SessionRecord {
            player_id: "p1".to_string(),
            session_start: start,
            session_end: start + chrono::Duration::minutes(duration_minutes),
            duration_minutes,
            hands_played: 20,
            net_win: 30.0,
            bb_per_hour: 10.0,
            time_category: "evening".to_string(),
            day_of_week: 0,
            is_weekend: false,
            early_aggression: 20.0,
            late_aggression: 30.0,
            aggression_change: 10.0,
            fatigue_score: 20.0,
            outcome: SessionOutcome::Winning,
            biggest_pot_won: 12.0,
            biggest_pot_lost: -4.0,
        }
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    #[test]
    fn best_and_worst_hour_by_rate() {
        let hourly = vec![
            hour_row(3, 30, 8.0, 0),
            hour_row(14, 30, -2.0, 0),
            hour_row(22, 30, 15.0, 0),
        ];
        let result = select_optimal_times("p1", &hourly, &[], &[], &[], 500, &config());
        assert_eq!(result.best_hour_of_day, Some(22));
        assert_eq!(result.worst_hour_of_day, Some(14));
        assert_eq!(result.optimal_bb_per_100, 15.0);
        assert_eq!(result.worst_bb_per_100, -2.0);
    }

    #[test]
    fn equal_rates_tie_break_to_the_lower_hour() {
        let hourly = vec![hour_row(5, 30, 10.0, 0), hour_row(19, 30, 10.0, 0)];
        let result = select_optimal_times("p1", &hourly, &[], &[], &[], 500, &config());
        assert_eq!(result.best_hour_of_day, Some(5));
        assert_eq!(result.worst_hour_of_day, Some(5));
    }

    #[test]
    fn buckets_below_selector_minimum_are_ignored() {
        // Stored at the 5-hand storage minimum, but under the selector's 20.
        let hourly = vec![hour_row(9, 8, 50.0, 0)];
        let result = select_optimal_times("p1", &hourly, &[], &[], &[], 80, &config());
        assert_eq!(result.best_hour_of_day, None);
        assert_eq!(result.worst_hour_of_day, None);
        assert_eq!(result.optimal_bb_per_100, 0.0);
        assert_eq!(result.worst_variance, 0.0);
    }

    #[test]
    fn avoid_hours_order_tilt_desc_then_rate_asc() {
        let hourly = vec![
            hour_row(1, 30, -12.0, 0),
            hour_row(2, 30, -15.0, 0),
            hour_row(3, 30, 5.0, 4),
            hour_row(4, 30, 5.0, 3),
            hour_row(5, 30, 5.0, 0),
        ];
        let result = select_optimal_times("p1", &hourly, &[], &[], &[], 500, &config());
        assert_eq!(result.avoid_hours, vec![3, 4, 2, 1]);
    }

    #[test]
    fn session_length_falls_back_without_winning_sessions() {
        let result = select_optimal_times("p1", &[], &[], &[], &[], 100, &config());
        assert_eq!(result.recommended_session_length_minutes, 120);

        let sessions = vec![winning_session(60), winning_session(90)];
        let result = select_optimal_times("p1", &[], &[], &[], &sessions, 100, &config());
        assert_eq!(result.recommended_session_length_minutes, 75);
    }

    #[test]
    fn confidence_and_volume_ramp_and_clamp() {
        let cfg = config();
        let mut last_confidence = 0.0;
        let mut last_volume = 0;
        for hands in [0, 100, 500, 1000, 10_000] {
            let result = select_optimal_times("p1", &[], &[], &[], &[], hands, &cfg);
            assert!(result.data_confidence >= last_confidence);
            assert!(result.data_confidence <= 100.0);
            assert!(result.optimal_volume_per_day >= last_volume);
            assert!(result.optimal_volume_per_day <= cfg.max_daily_volume);
            last_confidence = result.data_confidence;
            last_volume = result.optimal_volume_per_day;
        }
        let result = select_optimal_times("p1", &[], &[], &[], &[], 500, &cfg);
        assert_eq!(result.data_confidence, 50.0);
        assert_eq!(result.optimal_volume_per_day, 50);
    }

    #[test]
    fn categories_pick_best_and_worst_by_per_action_rate() {
        let categories = vec![
            CategoryRow {
                time_category: "evening".to_string(),
                hands: 40,
                bb_per_100: 12.0,
                variance: 2.0,
            },
            CategoryRow {
                time_category: "night".to_string(),
                hands: 35,
                bb_per_100: -6.0,
                variance: 9.0,
            },
        ];
        let result = select_optimal_times("p1", &[], &[], &categories, &[], 500, &config());
        assert_eq!(result.best_time_category.as_deref(), Some("evening"));
        assert_eq!(result.worst_time_category.as_deref(), Some("night"));
    }
}
