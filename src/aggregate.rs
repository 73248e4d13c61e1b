use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Timelike};

use crate::config::AnalysisConfig;
use crate::models::{ActionRecord, CategoryRow, HourlyRow, TiltEvent, WeekdayRow};

pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub fn day_name(day_of_week: i32) -> &'static str {
    DAY_NAMES
        .get(day_of_week as usize)
        .copied()
        .unwrap_or("unknown")
}

/// Weekday index under the one canonical convention used everywhere in this
/// crate: Monday = 0 through Sunday = 6. This is the single point where
/// chrono's weekday is converted.
pub fn weekday_index(timestamp: &chrono::NaiveDateTime) -> i32 {
    timestamp.weekday().num_days_from_monday() as i32
}

pub fn distinct_hand_count(actions: &[ActionRecord]) -> i64 {
    let hands: HashSet<&str> = actions.iter().map(|a| a.hand_id.as_str()).collect();
    hands.len() as i64
}

/// Running per-bucket aggregate over actions. Extrema start at the
/// identity values so a bucket's first action sets them.
struct BucketAcc {
    hand_ids: HashSet<String>,
    actions: usize,
    aggressive: usize,
    total_net: f64,
    total_net_sq: f64,
    bet_size_sum: f64,
    overbets: usize,
    biggest_win: f64,
    biggest_loss: f64,
}

impl BucketAcc {
    fn new() -> Self {
        Self {
            hand_ids: HashSet::new(),
            actions: 0,
            aggressive: 0,
            total_net: 0.0,
            total_net_sq: 0.0,
            bet_size_sum: 0.0,
            overbets: 0,
            biggest_win: f64::NEG_INFINITY,
            biggest_loss: f64::INFINITY,
        }
    }

    fn push(&mut self, action: &ActionRecord) {
        self.hand_ids.insert(action.hand_id.clone());
        self.actions += 1;
        if action.action.is_aggressive() {
            self.aggressive += 1;
        }
        self.total_net += action.net_win;
        self.total_net_sq += action.net_win * action.net_win;
        self.bet_size_sum += action.raise_percentage;
        if action.raise_percentage > 100.0 {
            self.overbets += 1;
        }
        self.biggest_win = self.biggest_win.max(action.net_win);
        self.biggest_loss = self.biggest_loss.min(action.net_win);
    }

    fn hands(&self) -> i64 {
        self.hand_ids.len() as i64
    }

    fn mean_net(&self) -> f64 {
        if self.actions == 0 {
            0.0
        } else {
            self.total_net / self.actions as f64
        }
    }

    /// Population variance of per-action net result: E[x^2] - E[x]^2.
    fn variance(&self) -> f64 {
        if self.actions == 0 {
            return 0.0;
        }
        let mean = self.mean_net();
        self.total_net_sq / self.actions as f64 - mean * mean
    }

    fn aggression_factor(&self) -> f64 {
        if self.actions == 0 {
            0.0
        } else {
            self.aggressive as f64 / self.actions as f64 * 100.0
        }
    }

    fn overbet_frequency(&self) -> f64 {
        if self.aggressive == 0 {
            0.0
        } else {
            self.overbets as f64 / self.aggressive as f64 * 100.0
        }
    }

    fn bb_per_100(&self) -> f64 {
        let hands = self.hands();
        if hands == 0 {
            0.0
        } else {
            self.total_net / hands as f64 * 100.0
        }
    }
}

/// Hour-of-day rollup over a player's full action history, independent of
/// session boundaries. Buckets under the minimum hand count are not
/// produced at all. Rows come back sorted by hour.
pub fn hourly_rollup(
    player_id: &str,
    actions: &[ActionRecord],
    tilt_events: &[TiltEvent],
    config: &AnalysisConfig,
) -> Vec<HourlyRow> {
    let mut buckets: HashMap<i32, BucketAcc> = HashMap::new();
    for action in actions {
        buckets
            .entry(action.played_at.hour() as i32)
            .or_insert_with(BucketAcc::new)
            .push(action);
    }

    let mut tilt_by_hour: HashMap<i32, i64> = HashMap::new();
    for event in tilt_events {
        *tilt_by_hour.entry(event.started_at.hour() as i32).or_insert(0) += 1;
    }

    let mut rows: Vec<HourlyRow> = buckets
        .into_iter()
        .filter(|(_, acc)| acc.hands() >= config.hourly_min_hands)
        .map(|(hour, acc)| HourlyRow {
            player_id: player_id.to_string(),
            hour_of_day: hour,
            hands_played: acc.hands(),
            net_win_bb: acc.total_net,
            bb_per_100_hands: acc.bb_per_100(),
            avg_pot_size: acc.mean_net(),
            aggression_factor: acc.aggression_factor(),
            avg_bet_size_percentage: acc.bet_size_sum / acc.actions as f64,
            overbet_frequency: acc.overbet_frequency(),
            variance_bb: acc.variance(),
            biggest_win_bb: acc.biggest_win,
            biggest_loss_bb: acc.biggest_loss,
            tilt_events_count: tilt_by_hour.get(&hour).copied().unwrap_or(0),
        })
        .collect();

    rows.sort_by_key(|row| row.hour_of_day);
    rows
}

/// Weekday rollup, Monday = 0. Tilt events contribute both a count and a
/// mean episode duration per day.
pub fn weekday_rollup(
    player_id: &str,
    actions: &[ActionRecord],
    tilt_events: &[TiltEvent],
    config: &AnalysisConfig,
) -> Vec<WeekdayRow> {
    let mut buckets: HashMap<i32, BucketAcc> = HashMap::new();
    for action in actions {
        buckets
            .entry(weekday_index(&action.played_at))
            .or_insert_with(BucketAcc::new)
            .push(action);
    }

    let mut tilt_by_day: HashMap<i32, (i64, f64)> = HashMap::new();
    for event in tilt_events {
        let entry = tilt_by_day
            .entry(weekday_index(&event.started_at))
            .or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += event.duration_minutes;
    }

    let mut rows: Vec<WeekdayRow> = buckets
        .into_iter()
        .filter(|(_, acc)| acc.hands() >= config.weekday_min_hands)
        .map(|(day, acc)| {
            let (tilt_count, tilt_duration_sum) =
                tilt_by_day.get(&day).copied().unwrap_or((0, 0.0));
            WeekdayRow {
                player_id: player_id.to_string(),
                day_of_week: day,
                day_name: day_name(day).to_string(),
                hands_played: acc.hands(),
                net_win_bb: acc.total_net,
                bb_per_100_hands: acc.bb_per_100(),
                aggression_factor: acc.aggression_factor(),
                variance_bb: acc.variance(),
                tilt_events_count: tilt_count,
                avg_tilt_duration_minutes: if tilt_count == 0 {
                    0.0
                } else {
                    tilt_duration_sum / tilt_count as f64
                },
            }
        })
        .collect();

    rows.sort_by_key(|row| row.day_of_week);
    rows
}

/// Direct rollup by upstream time-of-day label for the optimal-time
/// selector. Unlike the bucket tables this rates per action
/// (mean net * 100) and keeps first-seen label order so selector
/// tie-breaks stay deterministic.
pub fn category_rollup(actions: &[ActionRecord], min_hands: i64) -> Vec<CategoryRow> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, BucketAcc> = HashMap::new();

    for action in actions {
        if !buckets.contains_key(&action.time_category) {
            order.push(action.time_category.clone());
        }
        buckets
            .entry(action.time_category.clone())
            .or_insert_with(BucketAcc::new)
            .push(action);
    }

    order
        .into_iter()
        .filter_map(|label| {
            let acc = buckets.remove(&label)?;
            if acc.hands() < min_hands {
                return None;
            }
            Some(CategoryRow {
                time_category: label,
                hands: acc.hands(),
                bb_per_100: acc.mean_net() * 100.0,
                variance: acc.variance(),
            })
        })
        .collect()
}
