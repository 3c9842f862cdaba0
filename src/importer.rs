//! Free-text / CSV import. Turns pasted prediction output into
//! candidate matches; the session promotes candidates into wagers once
//! a stake is committed. Malformed lines are dropped, a fully empty
//! result is an invalid-format error to the caller.

use crate::errors::{TrackerError, TrackerResult};
use crate::records::{CandidateMatch, Side};
use chrono::{DateTime, Utc};
use smallvec::SmallVec;

/// Expected pipe-delimited shape:
/// `teamA x teamB | referee | prediction | line | odd | edge% | side`
pub fn parse_free_text(text: &str, now: DateTime<Utc>) -> TrackerResult<Vec<CandidateMatch>> {
    let matches: Vec<CandidateMatch> = text
        .lines()
        .filter(|l| !l.trim().is_empty() && l.contains('|'))
        .filter_map(|line| parse_line(line, now))
        .collect();

    if matches.is_empty() {
        return Err(TrackerError::InvalidValue(
            "no parsable lines; expected 'teamA x teamB | referee | prediction | line | odd | edge% | side'".into(),
        ));
    }
    Ok(matches)
}

fn parse_line(line: &str, now: DateTime<Utc>) -> Option<CandidateMatch> {
    let parts: SmallVec<[&str; 8]> = line.split('|').map(str::trim).collect();
    if parts.len() < 7 {
        tracing::debug!(line, "dropping import line: too few fields");
        return None;
    }

    let (home, away) = split_teams(parts[0]);
    let prediction = parse_number(parts[2])?;
    let bookie_line = parse_number(parts[3])?;
    let odd = parse_number(parts[4])?;
    let edge = parse_number(parts[5].trim_end_matches('%'))?;
    if odd < 1.0 {
        tracing::debug!(line, odd, "dropping import line: odd below 1.0");
        return None;
    }

    let side = if parts[6].to_ascii_uppercase().contains("UNDER") {
        Side::Under
    } else {
        Side::Over
    };

    Some(CandidateMatch {
        id: format!("ai-{}", uuid::Uuid::new_v4()),
        league: "Unknown".into(),
        home_team: home,
        away_team: away,
        referee: parts[1].to_string(),
        prediction,
        line: bookie_line,
        odd,
        edge,
        side,
        created_at: now,
    })
}

/// Comma-separated export rows (supplementary path). Prediction and
/// edge are absent from the export and default to 0; side defaults to
/// UNDER pending manual selection.
pub fn parse_csv(csv: &str, now: DateTime<Utc>) -> TrackerResult<Vec<CandidateMatch>> {
    let matches: Vec<CandidateMatch> = csv
        .lines()
        .skip(1) // header
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let cols: Vec<&str> = line.split(',').map(str::trim).collect();
            if cols.len() < 11 {
                return None;
            }
            let bookie_line = parse_number(cols[9])?;
            let odd = parse_number(cols[10])?;
            Some(CandidateMatch {
                id: cols[0].to_string(),
                league: cols[2].to_string(),
                home_team: cols[4].to_string(),
                away_team: cols[5].to_string(),
                referee: cols[6].to_string(),
                prediction: 0.0,
                line: bookie_line,
                odd,
                edge: 0.0,
                side: Side::Under,
                created_at: now,
            })
        })
        .collect();

    if matches.is_empty() {
        return Err(TrackerError::InvalidValue("no parsable CSV rows".into()));
    }
    Ok(matches)
}

fn split_teams(field: &str) -> (String, String) {
    match field.split_once(" x ") {
        Some((home, away)) => (home.trim().to_string(), away.trim().to_string()),
        None => (field.trim().to_string(), "Unknown".to_string()),
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}
