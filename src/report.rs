use std::fmt::Write;

use crate::aggregate::day_name;
use crate::models::{HourlyRow, OptimalPlayTimes, SessionRecord};

fn hour_label(hour: Option<i32>) -> String {
    match hour {
        Some(h) => format!("{h:02}:00"),
        None => "n/a".to_string(),
    }
}

fn day_label(day: Option<i32>) -> &'static str {
    match day {
        Some(d) => day_name(d),
        None => "n/a",
    }
}

pub fn build_report(
    player_id: &str,
    optimal: Option<&OptimalPlayTimes>,
    hourly: &[HourlyRow],
    sessions: &[SessionRecord],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Time Pattern Report: {player_id}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Optimal Play Times");

    match optimal {
        None => {
            let _ = writeln!(output, "No analysis stored for this player yet.");
        }
        Some(optimal) => {
            let _ = writeln!(
                output,
                "- Best hour: {} ({:+.1} bb/100), worst hour: {} ({:+.1} bb/100)",
                hour_label(optimal.best_hour_of_day),
                optimal.optimal_bb_per_100,
                hour_label(optimal.worst_hour_of_day),
                optimal.worst_bb_per_100
            );
            let _ = writeln!(
                output,
                "- Best day: {}, worst day: {}",
                day_label(optimal.best_day_of_week),
                day_label(optimal.worst_day_of_week)
            );
            let _ = writeln!(
                output,
                "- Best time of day: {}, worst: {}",
                optimal.best_time_category.as_deref().unwrap_or("n/a"),
                optimal.worst_time_category.as_deref().unwrap_or("n/a")
            );
            let _ = writeln!(
                output,
                "- Recommended session length: {} minutes, daily volume: {} hands",
                optimal.recommended_session_length_minutes, optimal.optimal_volume_per_day
            );
            if optimal.avoid_hours.is_empty() {
                let _ = writeln!(output, "- No hours flagged to avoid");
            } else {
                let hours: Vec<String> = optimal
                    .avoid_hours
                    .iter()
                    .map(|h| format!("{h:02}:00"))
                    .collect();
                let _ = writeln!(output, "- Hours to avoid: {}", hours.join(", "));
            }
            let _ = writeln!(
                output,
                "- Data confidence: {:.0}/100",
                optimal.data_confidence
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Hourly Performance");

    if hourly.is_empty() {
        let _ = writeln!(output, "No hourly buckets met the minimum hand count.");
    } else {
        for row in hourly {
            let _ = writeln!(
                output,
                "- {:02}:00 — {} hands, {:+.1} bb/100, aggression {:.0}%, {} tilt events",
                row.hour_of_day,
                row.hands_played,
                row.bb_per_100_hands,
                row.aggression_factor,
                row.tilt_events_count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Sessions");

    if sessions.is_empty() {
        let _ = writeln!(output, "No sessions met the minimum length.");
    } else {
        for session in sessions {
            let _ = writeln!(
                output,
                "- {} — {} min, {} actions, {:+.1} bb ({}), fatigue {:.0}, aggression drift {:+.1}",
                session.session_start,
                session.duration_minutes,
                session.hands_played,
                session.net_win,
                session.outcome.as_str(),
                session.fatigue_score,
                session.aggression_change
            );
        }
    }

    output
}
