use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    ActionKind, ActionRecord, HourlyRow, OptimalPlayTimes, SessionOutcome, SessionRecord,
    TiltEvent, WeekdayRow,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn seed_category(hour: u32) -> &'static str {
    match hour {
        5..=11 => "morning",
        12..=17 => "afternoon",
        18..=22 => "evening",
        _ => "night",
    }
}

/// Deterministic demo dataset: two players grinding daily blocks at
/// rotating start hours, plus a handful of tilt episodes. Safe to re-run.
pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let players = ["seed-hero", "seed-grinder"];
    let base = NaiveDate::from_ymd_opt(2026, 6, 1).context("invalid seed date")?;
    let action_types = ["call", "bet", "fold", "raise", "check"];
    let start_hours: [u32; 3] = [8, 14, 23];

    for (player_idx, player_id) in players.iter().enumerate() {
        for day in 0..14i64 {
            let date = base + Duration::days(day);
            let start_hour = start_hours[(day % 3) as usize];
            let category = seed_category(start_hour);

            for slot in 0..20i64 {
                let played_at = date
                    .and_hms_opt(start_hour, 0, 0)
                    .context("invalid seed time")?
                    + Duration::minutes(slot * 4);
                let hand_id = format!("seed-{player_id}-{day}-{slot}");
                let net_win = ((slot * 7 + day * 3 + player_idx as i64 * 5) % 11) as f64 - 4.0;
                let action_type = action_types[((slot + day) % 5) as usize];
                let raise_percentage = 40.0 + (slot % 5) as f64 * 20.0;
                let hand_strength = 0.3 + (slot % 7) as f64 * 0.1;

                sqlx::query(
                    r#"
                    INSERT INTO time_patterns.hands (id, played_at, time_of_day_category)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (id) DO UPDATE
                    SET played_at = EXCLUDED.played_at,
                        time_of_day_category = EXCLUDED.time_of_day_category
                    "#,
                )
                .bind(&hand_id)
                .bind(played_at)
                .bind(category)
                .execute(pool)
                .await?;

                sqlx::query(
                    r#"
                    INSERT INTO time_patterns.actions
                    (id, hand_id, player_id, action_type, net_win, raise_percentage,
                     hand_strength, source_key)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    ON CONFLICT (source_key) DO NOTHING
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(&hand_id)
                .bind(*player_id)
                .bind(action_type)
                .bind(net_win)
                .bind(raise_percentage)
                .bind(hand_strength)
                .bind(format!("{hand_id}-a0"))
                .execute(pool)
                .await?;
            }
        }

        for day in [2i64, 5, 9] {
            let started_at = (base + Duration::days(day))
                .and_hms_opt(23, 30, 0)
                .context("invalid seed time")?;
            sqlx::query(
                r#"
                INSERT INTO time_patterns.tilt_events
                (id, player_id, started_at, duration_minutes, source_key)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (source_key) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(*player_id)
            .bind(started_at)
            .bind(15.0 + day as f64)
            .bind(format!("seed-tilt-{player_id}-{day}"))
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

pub async fn import_actions_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        player_id: String,
        hand_id: String,
        played_at: NaiveDateTime,
        action_type: String,
        net_win: f64,
        raise_percentage: f64,
        hand_strength: f64,
        time_category: String,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let action = ActionKind::parse(&row.action_type)
            .with_context(|| format!("unknown action type {:?}", row.action_type))?;

        sqlx::query(
            r#"
            INSERT INTO time_patterns.hands (id, played_at, time_of_day_category)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET played_at = EXCLUDED.played_at,
                time_of_day_category = EXCLUDED.time_of_day_category
            "#,
        )
        .bind(&row.hand_id)
        .bind(row.played_at)
        .bind(&row.time_category)
        .execute(pool)
        .await?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO time_patterns.actions
            (id, hand_id, player_id, action_type, net_win, raise_percentage,
             hand_strength, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.hand_id)
        .bind(&row.player_id)
        .bind(action.as_str())
        .bind(row.net_win)
        .bind(row.raise_percentage)
        .bind(row.hand_strength)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub async fn import_tilt_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        player_id: String,
        started_at: NaiveDateTime,
        duration_minutes: f64,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO time_patterns.tilt_events
            (id, player_id, started_at, duration_minutes, source_key)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.player_id)
        .bind(row.started_at)
        .bind(row.duration_minutes)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

/// Players with enough recent actions to be worth re-analyzing.
pub async fn active_players(
    pool: &PgPool,
    since: NaiveDateTime,
    min_actions: i64,
) -> anyhow::Result<Vec<String>> {
    let rows = sqlx::query(
        "SELECT a.player_id \
         FROM time_patterns.actions a \
         JOIN time_patterns.hands h ON h.id = a.hand_id \
         WHERE h.played_at >= $1 \
         GROUP BY a.player_id \
         HAVING COUNT(*) >= $2 \
         ORDER BY a.player_id",
    )
    .bind(since)
    .bind(min_actions)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(|row| row.get("player_id")).collect())
}

/// A player's full action history, chronologically sorted. Unknown action
/// labels surface as an error here and get caught at the player boundary.
pub async fn fetch_actions(pool: &PgPool, player_id: &str) -> anyhow::Result<Vec<ActionRecord>> {
    let rows = sqlx::query(
        "SELECT a.player_id, a.hand_id, h.played_at, a.action_type, a.net_win, \
         a.raise_percentage, a.hand_strength, h.time_of_day_category \
         FROM time_patterns.actions a \
         JOIN time_patterns.hands h ON h.id = a.hand_id \
         WHERE a.player_id = $1 \
         ORDER BY h.played_at, a.id",
    )
    .bind(player_id)
    .fetch_all(pool)
    .await?;

    let mut actions = Vec::with_capacity(rows.len());
    for row in rows {
        let action_type: String = row.get("action_type");
        let action = ActionKind::parse(&action_type)
            .with_context(|| format!("unknown action type {action_type:?} for {player_id}"))?;
        actions.push(ActionRecord {
            player_id: row.get("player_id"),
            hand_id: row.get("hand_id"),
            played_at: row.get("played_at"),
            action,
            net_win: row.get("net_win"),
            raise_percentage: row.get("raise_percentage"),
            hand_strength: row.get("hand_strength"),
            time_category: row.get("time_of_day_category"),
        });
    }

    Ok(actions)
}

pub async fn fetch_tilt_events(pool: &PgPool, player_id: &str) -> anyhow::Result<Vec<TiltEvent>> {
    let rows = sqlx::query(
        "SELECT player_id, started_at, duration_minutes \
         FROM time_patterns.tilt_events \
         WHERE player_id = $1 \
         ORDER BY started_at",
    )
    .bind(player_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| TiltEvent {
            player_id: row.get("player_id"),
            started_at: row.get("started_at"),
            duration_minutes: row.get("duration_minutes"),
        })
        .collect())
}

/// Replaces a player's hourly buckets wholesale, so buckets that fell
/// below the minimum since the last run disappear instead of going stale.
pub async fn replace_hourly(
    pool: &PgPool,
    player_id: &str,
    rows: &[HourlyRow],
) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM time_patterns.hourly_performance WHERE player_id = $1")
        .bind(player_id)
        .execute(&mut *tx)
        .await?;

    for row in rows {
        sqlx::query(
            r#"
            INSERT INTO time_patterns.hourly_performance
            (player_id, hour_of_day, hands_played, net_win_bb, bb_per_100_hands,
             avg_pot_size, aggression_factor, avg_bet_size_percentage,
             overbet_frequency, variance_bb, biggest_win_bb, biggest_loss_bb,
             tilt_events_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(&row.player_id)
        .bind(row.hour_of_day)
        .bind(row.hands_played)
        .bind(row.net_win_bb)
        .bind(row.bb_per_100_hands)
        .bind(row.avg_pot_size)
        .bind(row.aggression_factor)
        .bind(row.avg_bet_size_percentage)
        .bind(row.overbet_frequency)
        .bind(row.variance_bb)
        .bind(row.biggest_win_bb)
        .bind(row.biggest_loss_bb)
        .bind(row.tilt_events_count)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn replace_weekday(
    pool: &PgPool,
    player_id: &str,
    rows: &[WeekdayRow],
) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM time_patterns.weekday_performance WHERE player_id = $1")
        .bind(player_id)
        .execute(&mut *tx)
        .await?;

    for row in rows {
        sqlx::query(
            r#"
            INSERT INTO time_patterns.weekday_performance
            (player_id, day_of_week, day_name, hands_played, net_win_bb,
             bb_per_100_hands, aggression_factor, variance_bb, tilt_events_count,
             avg_tilt_duration_minutes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&row.player_id)
        .bind(row.day_of_week)
        .bind(&row.day_name)
        .bind(row.hands_played)
        .bind(row.net_win_bb)
        .bind(row.bb_per_100_hands)
        .bind(row.aggression_factor)
        .bind(row.variance_bb)
        .bind(row.tilt_events_count)
        .bind(row.avg_tilt_duration_minutes)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn replace_sessions(
    pool: &PgPool,
    player_id: &str,
    sessions: &[SessionRecord],
) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM time_patterns.session_analysis WHERE player_id = $1")
        .bind(player_id)
        .execute(&mut *tx)
        .await?;

    for session in sessions {
        sqlx::query(
            r#"
            INSERT INTO time_patterns.session_analysis
            (player_id, session_start, session_end, duration_minutes, hands_played,
             net_win_bb, bb_per_hour, time_of_day_category, day_of_week, is_weekend,
             early_aggression, late_aggression, aggression_change, fatigue_score,
             session_outcome, biggest_pot_won, biggest_pot_lost)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17)
            "#,
        )
        .bind(&session.player_id)
        .bind(session.session_start)
        .bind(session.session_end)
        .bind(session.duration_minutes)
        .bind(session.hands_played)
        .bind(session.net_win)
        .bind(session.bb_per_hour)
        .bind(&session.time_category)
        .bind(session.day_of_week)
        .bind(session.is_weekend)
        .bind(session.early_aggression)
        .bind(session.late_aggression)
        .bind(session.aggression_change)
        .bind(session.fatigue_score)
        .bind(session.outcome.as_str())
        .bind(session.biggest_pot_won)
        .bind(session.biggest_pot_lost)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn upsert_optimal_times(
    pool: &PgPool,
    optimal: &OptimalPlayTimes,
) -> anyhow::Result<()> {
    let avoid_hours = serde_json::to_string(&optimal.avoid_hours)?;

    sqlx::query(
        r#"
        INSERT INTO time_patterns.optimal_play_times
        (player_id, best_hour_of_day, best_day_of_week, best_time_category,
         optimal_bb_per_100, optimal_variance, worst_hour_of_day,
         worst_day_of_week, worst_time_category, worst_bb_per_100,
         worst_variance, recommended_session_length_minutes, avoid_hours,
         optimal_volume_per_day, data_confidence)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        ON CONFLICT (player_id) DO UPDATE
        SET best_hour_of_day = EXCLUDED.best_hour_of_day,
            best_day_of_week = EXCLUDED.best_day_of_week,
            best_time_category = EXCLUDED.best_time_category,
            optimal_bb_per_100 = EXCLUDED.optimal_bb_per_100,
            optimal_variance = EXCLUDED.optimal_variance,
            worst_hour_of_day = EXCLUDED.worst_hour_of_day,
            worst_day_of_week = EXCLUDED.worst_day_of_week,
            worst_time_category = EXCLUDED.worst_time_category,
            worst_bb_per_100 = EXCLUDED.worst_bb_per_100,
            worst_variance = EXCLUDED.worst_variance,
            recommended_session_length_minutes = EXCLUDED.recommended_session_length_minutes,
            avoid_hours = EXCLUDED.avoid_hours,
            optimal_volume_per_day = EXCLUDED.optimal_volume_per_day,
            data_confidence = EXCLUDED.data_confidence
        "#,
    )
    .bind(&optimal.player_id)
    .bind(optimal.best_hour_of_day)
    .bind(optimal.best_day_of_week)
    .bind(&optimal.best_time_category)
    .bind(optimal.optimal_bb_per_100)
    .bind(optimal.optimal_variance)
    .bind(optimal.worst_hour_of_day)
    .bind(optimal.worst_day_of_week)
    .bind(&optimal.worst_time_category)
    .bind(optimal.worst_bb_per_100)
    .bind(optimal.worst_variance)
    .bind(optimal.recommended_session_length_minutes)
    .bind(avoid_hours)
    .bind(optimal.optimal_volume_per_day)
    .bind(optimal.data_confidence)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn fetch_hourly(pool: &PgPool, player_id: &str) -> anyhow::Result<Vec<HourlyRow>> {
    let rows = sqlx::query(
        "SELECT player_id, hour_of_day, hands_played, net_win_bb, bb_per_100_hands, \
         avg_pot_size, aggression_factor, avg_bet_size_percentage, overbet_frequency, \
         variance_bb, biggest_win_bb, biggest_loss_bb, tilt_events_count \
         FROM time_patterns.hourly_performance \
         WHERE player_id = $1 \
         ORDER BY hour_of_day",
    )
    .bind(player_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| HourlyRow {
            player_id: row.get("player_id"),
            hour_of_day: row.get("hour_of_day"),
            hands_played: row.get("hands_played"),
            net_win_bb: row.get("net_win_bb"),
            bb_per_100_hands: row.get("bb_per_100_hands"),
            avg_pot_size: row.get("avg_pot_size"),
            aggression_factor: row.get("aggression_factor"),
            avg_bet_size_percentage: row.get("avg_bet_size_percentage"),
            overbet_frequency: row.get("overbet_frequency"),
            variance_bb: row.get("variance_bb"),
            biggest_win_bb: row.get("biggest_win_bb"),
            biggest_loss_bb: row.get("biggest_loss_bb"),
            tilt_events_count: row.get("tilt_events_count"),
        })
        .collect())
}

pub async fn fetch_weekday(pool: &PgPool, player_id: &str) -> anyhow::Result<Vec<WeekdayRow>> {
    let rows = sqlx::query(
        "SELECT player_id, day_of_week, day_name, hands_played, net_win_bb, \
         bb_per_100_hands, aggression_factor, variance_bb, tilt_events_count, \
         avg_tilt_duration_minutes \
         FROM time_patterns.weekday_performance \
         WHERE player_id = $1 \
         ORDER BY day_of_week",
    )
    .bind(player_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| WeekdayRow {
            player_id: row.get("player_id"),
            day_of_week: row.get("day_of_week"),
            day_name: row.get("day_name"),
            hands_played: row.get("hands_played"),
            net_win_bb: row.get("net_win_bb"),
            bb_per_100_hands: row.get("bb_per_100_hands"),
            aggression_factor: row.get("aggression_factor"),
            variance_bb: row.get("variance_bb"),
            tilt_events_count: row.get("tilt_events_count"),
            avg_tilt_duration_minutes: row.get("avg_tilt_duration_minutes"),
        })
        .collect())
}

pub async fn fetch_optimal_times(
    pool: &PgPool,
    player_id: &str,
) -> anyhow::Result<Option<OptimalPlayTimes>> {
    let row = sqlx::query(
        "SELECT player_id, best_hour_of_day, best_day_of_week, best_time_category, \
         optimal_bb_per_100, optimal_variance, worst_hour_of_day, worst_day_of_week, \
         worst_time_category, worst_bb_per_100, worst_variance, \
         recommended_session_length_minutes, avoid_hours, optimal_volume_per_day, \
         data_confidence \
         FROM time_patterns.optimal_play_times \
         WHERE player_id = $1",
    )
    .bind(player_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let avoid_hours_raw: String = row.get("avoid_hours");
    let avoid_hours = serde_json::from_str(&avoid_hours_raw)
        .with_context(|| format!("invalid avoid_hours for {player_id}"))?;

    Ok(Some(OptimalPlayTimes {
        player_id: row.get("player_id"),
        best_hour_of_day: row.get("best_hour_of_day"),
        best_day_of_week: row.get("best_day_of_week"),
        best_time_category: row.get("best_time_category"),
        optimal_bb_per_100: row.get("optimal_bb_per_100"),
        optimal_variance: row.get("optimal_variance"),
        worst_hour_of_day: row.get("worst_hour_of_day"),
        worst_day_of_week: row.get("worst_day_of_week"),
        worst_time_category: row.get("worst_time_category"),
        worst_bb_per_100: row.get("worst_bb_per_100"),
        worst_variance: row.get("worst_variance"),
        recommended_session_length_minutes: row.get("recommended_session_length_minutes"),
        avoid_hours,
        optimal_volume_per_day: row.get("optimal_volume_per_day"),
        data_confidence: row.get("data_confidence"),
    }))
}

pub async fn fetch_recent_sessions(
    pool: &PgPool,
    player_id: &str,
    limit: i64,
) -> anyhow::Result<Vec<SessionRecord>> {
    let rows = sqlx::query(
        "SELECT player_id, session_start, session_end, duration_minutes, hands_played, \
         net_win_bb, bb_per_hour, time_of_day_category, day_of_week, is_weekend, \
         early_aggression, late_aggression, aggression_change, fatigue_score, \
         session_outcome, biggest_pot_won, biggest_pot_lost \
         FROM time_patterns.session_analysis \
         WHERE player_id = $1 \
         ORDER BY session_start DESC \
         LIMIT $2",
    )
    .bind(player_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut sessions = Vec::with_capacity(rows.len());
    for row in rows {
        let outcome_raw: String = row.get("session_outcome");
        let outcome = SessionOutcome::parse(&outcome_raw)
            .with_context(|| format!("invalid session outcome {outcome_raw:?}"))?;
        sessions.push(SessionRecord {
            player_id: row.get("player_id"),
            session_start: row.get("session_start"),
            session_end: row.get("session_end"),
            duration_minutes: row.get("duration_minutes"),
            hands_played: row.get("hands_played"),
            net_win: row.get("net_win_bb"),
            bb_per_hour: row.get("bb_per_hour"),
            time_category: row.get("time_of_day_category"),
            day_of_week: row.get("day_of_week"),
            is_weekend: row.get("is_weekend"),
            early_aggression: row.get("early_aggression"),
            late_aggression: row.get("late_aggression"),
            aggression_change: row.get("aggression_change"),
            fatigue_score: row.get("fatigue_score"),
            outcome,
            biggest_pot_won: row.get("biggest_pot_won"),
            biggest_pot_lost: row.get("biggest_pot_lost"),
        });
    }

    Ok(sessions)
}

pub async fn hourly_player_count(pool: &PgPool) -> anyhow::Result<i64> {
    let row = sqlx::query(
        "SELECT COUNT(DISTINCT player_id) AS players FROM time_patterns.hourly_performance",
    )
    .fetch_one(pool)
    .await?;
    Ok(row.get("players"))
}

pub async fn session_count(pool: &PgPool) -> anyhow::Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS sessions FROM time_patterns.session_analysis")
        .fetch_one(pool)
        .await?;
    Ok(row.get("sessions"))
}
