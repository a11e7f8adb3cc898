use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use ranksim_game::numbers::round_f64_to_u64;
use ranksim_game::{BatchResult, SweepPoint, TierSummary};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use crate::util::{escape_csv, group_thousands};

/// One-line answer: "Given a 0.600 Win Rate, it will take 241 games to hit Master Ball rank".
pub fn headline(result: &BatchResult) -> String {
    let (points_text, more) = if result.starting_points == 0 {
        (String::new(), "")
    } else {
        (
            format!(
                " and {} points",
                group_thousands(result.starting_points.unsigned_abs())
            ),
            " more",
        )
    };
    format!(
        "Given a {:.3} Win Rate{points_text}, it will take {}{more} games to hit {} rank",
        result.win_rate,
        group_thousands(round_f64_to_u64(result.mean_total_games)),
        result.terminal_tier
    )
}

pub fn generate_console_report(
    out: &mut dyn Write,
    result: &BatchResult,
    elapsed: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Season Simulation Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "============================".cyan())?;
    writeln!(out, "{}", headline(result).bold())?;
    writeln!(out)?;
    writeln!(
        out,
        "Starting rank: {} ({} points)",
        result.starting_rank, result.starting_points
    )?;
    writeln!(out, "Seed: {}", result.seed)?;
    writeln!(
        out,
        "Seasons: {}/{} completed",
        result.seasons_completed(),
        result.seasons_requested
    )?;
    if !result.excluded.is_empty() {
        writeln!(
            out,
            "Excluded: {}",
            result.excluded.len().to_string().yellow()
        )?;
    }
    writeln!(
        out,
        "Games simulated: {}",
        group_thousands(result.games_simulated())
    )?;
    writeln!(
        out,
        "Observed win rate: {:.3}",
        result.mean_observed_win_rate
    )?;
    let total = &result.total_games;
    writeln!(
        out,
        "Total games: mean {:.1}, sd {:.1}, min {}, median {}, max {}",
        total.mean, total.std_dev, total.min, total.percentiles.p50, total.max
    )?;
    writeln!(out)?;

    writeln!(out, "{}", "🎯 Games To Reach Each Tier".bright_yellow().bold())?;
    writeln!(out, "{}", "===========================".yellow())?;
    let summaries = result.tier_summaries();
    if summaries.is_empty() {
        writeln!(out, "No tiers besides the starting tier.")?;
    }
    for summary in &summaries {
        write_console_tier(out, summary)?;
    }
    writeln!(out)?;
    writeln!(out, "🏁 Total time: {elapsed:?}")?;
    Ok(())
}

fn write_console_tier(out: &mut dyn Write, summary: &TierSummary) -> Result<()> {
    let Some(dist) = &summary.distribution else {
        writeln!(out, "{:<12} never reached", summary.tier)?;
        return Ok(());
    };
    writeln!(
        out,
        "{:<12} {} games (p10 {}, p50 {}, p90 {})",
        summary.tier.green(),
        group_thousands(round_f64_to_u64(dist.mean)),
        dist.percentiles.p10,
        dist.percentiles.p50,
        dist.percentiles.p90
    )?;
    Ok(())
}

#[derive(Serialize)]
struct BatchReport<'a> {
    generated_at: String,
    headline: String,
    #[serde(flatten)]
    result: &'a BatchResult,
    tiers: Vec<TierSummary>,
}

pub fn generate_json_report(out: &mut dyn Write, result: &BatchResult) -> Result<()> {
    let report = BatchReport {
        generated_at: Utc::now().to_rfc3339(),
        headline: headline(result),
        result,
        tiers: result.tier_summaries(),
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, result: &BatchResult) -> Result<()> {
    writeln!(out, "# Ranked Season Simulation\n")?;
    writeln!(out, "{}\n", headline(result))?;
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Win rate**: {:.3}", result.win_rate)?;
    writeln!(
        out,
        "- **Starting rank**: {} ({} points)",
        result.starting_rank, result.starting_points
    )?;
    writeln!(out, "- **Seed**: {}", result.seed)?;
    writeln!(
        out,
        "- **Seasons**: {}/{} completed",
        result.seasons_completed(),
        result.seasons_requested
    )?;
    writeln!(out, "- **Mean games**: {:.2}\n", result.mean_total_games)?;

    writeln!(out, "## Games To Reach Each Tier\n")?;
    writeln!(out, "| Tier | Reached | Mean | p10 | p50 | p90 |")?;
    writeln!(out, "|---|---:|---:|---:|---:|---:|")?;
    for summary in result.tier_summaries() {
        match &summary.distribution {
            Some(dist) => writeln!(
                out,
                "| {} | {} | {:.1} | {} | {} | {} |",
                summary.tier,
                summary.seasons_reached,
                dist.mean,
                dist.percentiles.p10,
                dist.percentiles.p50,
                dist.percentiles.p90
            )?,
            None => writeln!(out, "| {} | 0 | - | - | - | - |", summary.tier)?,
        }
    }
    Ok(())
}

/// Per-season table: `season,total_games,<tier>...`, blank where a tier was never reached.
pub fn generate_csv_report(out: &mut dyn Write, result: &BatchResult) -> Result<()> {
    let table = &result.table;
    let mut header = vec!["season".to_string(), "total_games".to_string()];
    header.extend(table.columns().iter().map(|name| escape_csv(name)));
    writeln!(out, "{}", header.join(","))?;
    for row in table.rows() {
        let mut cells = vec![row.season.to_string(), row.total_games.to_string()];
        cells.extend(
            row.tier_games
                .iter()
                .map(|games| games.map(|g| g.to_string()).unwrap_or_default()),
        );
        writeln!(out, "{}", cells.join(","))?;
    }
    Ok(())
}

pub fn generate_sweep_console_report(
    out: &mut dyn Write,
    points: &[SweepPoint],
    elapsed: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📈 Win Rate Sweep".bright_cyan().bold())?;
    writeln!(out, "{}", "=================".cyan())?;
    writeln!(
        out,
        "{:>8} {:>8} {:>10} {:>10} {:>8}",
        "win rate", "seasons", "mean", "reference", "drift"
    )?;
    for point in points {
        let reference = point
            .reference_mean
            .map_or_else(|| "-".to_string(), |r| format!("{r:.1}"));
        let drift = point
            .reference_deviation()
            .map_or_else(|| "-".to_string(), |d| format!("{:+.1}%", d * 100.0));
        writeln!(
            out,
            "{:>8.2} {:>8} {:>10.1} {:>10} {:>8}",
            point.win_rate, point.seasons, point.mean_total_games, reference, drift
        )?;
    }
    writeln!(out)?;
    writeln!(out, "🏁 Total time: {elapsed:?}")?;
    Ok(())
}

#[derive(Serialize)]
struct SweepReport<'a> {
    generated_at: String,
    points: &'a [SweepPoint],
}

pub fn generate_sweep_json_report(out: &mut dyn Write, points: &[SweepPoint]) -> Result<()> {
    let report = SweepReport {
        generated_at: Utc::now().to_rfc3339(),
        points,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_sweep_markdown_report(out: &mut dyn Write, points: &[SweepPoint]) -> Result<()> {
    writeln!(out, "# Win Rate Sweep\n")?;
    writeln!(out, "| Win rate | Seasons | Mean games | Reference |")?;
    writeln!(out, "|---:|---:|---:|---:|")?;
    for point in points {
        let reference = point
            .reference_mean
            .map_or_else(|| "-".to_string(), |r| format!("{r:.3}"));
        writeln!(
            out,
            "| {:.2} | {} | {:.3} | {reference} |",
            point.win_rate, point.seasons, point.mean_total_games
        )?;
    }
    Ok(())
}

pub fn generate_sweep_csv_report(out: &mut dyn Write, points: &[SweepPoint]) -> Result<()> {
    writeln!(out, "win_rate,seasons,excluded,mean_total_games,reference_mean")?;
    for point in points {
        let reference = point
            .reference_mean
            .map(|r| r.to_string())
            .unwrap_or_default();
        writeln!(
            out,
            "{},{},{},{:.3},{reference}",
            point.win_rate, point.seasons, point.excluded, point.mean_total_games
        )?;
    }
    Ok(())
}
