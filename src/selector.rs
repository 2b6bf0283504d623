//! Selector (C7, spec §4.7).
//!
//! Lexicographic tie-break over feasible candidates: lateness, then
//! forming time (only past a relative-difference threshold), then yield
//! rank, then frequency. Emits the chosen candidate plus an audit record
//! naming which criterion actually decided it.

use crate::candidate_generator::Candidate;
use std::cmp::Ordering;

const LATENESS_EPSILON_HOURS: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreakReason {
    DueDate,
    FormingTime,
    YieldRank,
    Frequency,
    FirstFeasible,
}

#[derive(Debug, Clone)]
pub struct ScoreRecord {
    pub lateness_hours: f64,
    pub forming_hours: f64,
    pub yield_rank_score: u32,
    pub frequency: f64,
}

fn yield_rank_score(rank: &Option<String>) -> u32 {
    match rank.as_deref() {
        Some("A") => 1,
        Some("B") => 2,
        Some("C") => 3,
        _ => 999,
    }
}

fn score(candidate: &Candidate) -> ScoreRecord {
    ScoreRecord {
        lateness_hours: candidate.lateness_hours,
        forming_hours: candidate.forming_hours,
        yield_rank_score: yield_rank_score(&candidate.yield_rank),
        frequency: candidate.frequency.unwrap_or(0.0),
    }
}

/// Orders `a` before `b` per the spec's five-step lexicographic rule.
/// Returns `Ordering::Less` when `a` should be preferred.
pub fn compare(a: &Candidate, b: &Candidate, time_threshold_pct: f64) -> Ordering {
    if (a.lateness_hours - b.lateness_hours).abs() > LATENESS_EPSILON_HOURS {
        return a
            .lateness_hours
            .partial_cmp(&b.lateness_hours)
            .unwrap_or(Ordering::Equal);
    }

    let max_forming = a.forming_hours.max(b.forming_hours);
    if max_forming > 0.0 {
        let relative_delta = (a.forming_hours - b.forming_hours).abs() / max_forming;
        if relative_delta >= time_threshold_pct / 100.0 {
            return a
                .forming_hours
                .partial_cmp(&b.forming_hours)
                .unwrap_or(Ordering::Equal);
        }
    }

    let yield_a = yield_rank_score(&a.yield_rank);
    let yield_b = yield_rank_score(&b.yield_rank);
    if yield_a != yield_b {
        return yield_a.cmp(&yield_b);
    }

    let freq_a = a.frequency.unwrap_or(0.0);
    let freq_b = b.frequency.unwrap_or(0.0);
    freq_b.partial_cmp(&freq_a).unwrap_or(Ordering::Equal)
}

fn reason_for(winner: &Candidate, runner_up: &Candidate, time_threshold_pct: f64) -> TieBreakReason {
    if (winner.lateness_hours - runner_up.lateness_hours).abs() > LATENESS_EPSILON_HOURS {
        return TieBreakReason::DueDate;
    }
    let max_forming = winner.forming_hours.max(runner_up.forming_hours);
    if max_forming > 0.0 {
        let relative_delta = (winner.forming_hours - runner_up.forming_hours).abs() / max_forming;
        if relative_delta >= time_threshold_pct / 100.0 {
            return TieBreakReason::FormingTime;
        }
    }
    if yield_rank_score(&winner.yield_rank) != yield_rank_score(&runner_up.yield_rank) {
        return TieBreakReason::YieldRank;
    }
    if winner.frequency.unwrap_or(0.0) != runner_up.frequency.unwrap_or(0.0) {
        return TieBreakReason::Frequency;
    }
    TieBreakReason::FirstFeasible
}

/// Picks the best feasible candidate from `candidates`, returning the
/// winner, its score record, and the criterion that decided it.
pub fn select(
    candidates: &[Candidate],
    time_threshold_pct: f64,
) -> Option<(Candidate, ScoreRecord, TieBreakReason)> {
    let mut feasible: Vec<&Candidate> = candidates.iter().filter(|c| c.feasible).collect();
    if feasible.is_empty() {
        return None;
    }
    feasible.sort_by(|a, b| compare(a, b, time_threshold_pct));

    let winner = feasible[0];
    let reason = feasible
        .get(1)
        .map(|runner_up| reason_for(winner, runner_up, time_threshold_pct))
        .unwrap_or(TieBreakReason::FirstFeasible);

    Some((winner.clone(), score(winner), reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate_generator::Strategy;
    use chrono::NaiveDate;

    fn candidate(machine: &str, lateness: f64, forming: f64, yield_rank: Option<&str>, freq: f64) -> Candidate {
        let base = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        Candidate {
            mmo_id: "MMO-1".into(),
            machine_id: machine.into(),
            mold_code: "6X".into(),
            strategy: Strategy::Asap,
            start: base,
            end: base,
            forming_hours: forming,
            changeover_minutes: 30.0,
            total_hours: forming + 0.5,
            lateness_hours: lateness,
            lateness_days: lateness / 24.0,
            is_on_time: lateness <= 0.0,
            feasible: true,
            constraint_violations: vec![],
            yield_rank: yield_rank.map(|s| s.to_string()),
            frequency: Some(freq),
        }
    }

    #[test]
    fn lower_lateness_wins_outright() {
        let candidates = vec![candidate("A", 2.0, 1.0, Some("A"), 1.0), candidate("B", 0.5, 1.0, Some("A"), 1.0)];
        let (winner, _, reason) = select(&candidates, 10.0).unwrap();
        assert_eq!(winner.machine_id, "B");
        assert_eq!(reason, TieBreakReason::DueDate);
    }

    #[test]
    fn forming_time_breaks_tie_past_threshold() {
        let candidates = vec![candidate("A", 0.0, 2.0, Some("A"), 1.0), candidate("B", 0.0, 1.7, Some("A"), 1.0)];
        let (winner, _, reason) = select(&candidates, 10.0).unwrap();
        assert_eq!(winner.machine_id, "B");
        assert_eq!(reason, TieBreakReason::FormingTime);
    }

    #[test]
    fn forming_time_difference_below_threshold_falls_through_to_yield_rank() {
        let candidates = vec![
            candidate("A", 0.0, 2.0, Some("B"), 1.0),
            candidate("B", 0.0, 1.95, Some("A"), 1.0),
        ];
        let (winner, _, reason) = select(&candidates, 10.0).unwrap();
        assert_eq!(winner.machine_id, "B");
        assert_eq!(reason, TieBreakReason::YieldRank);
    }

    #[test]
    fn infeasible_candidates_are_excluded() {
        let mut infeasible = candidate("A", 0.0, 1.0, Some("A"), 1.0);
        infeasible.feasible = false;
        let candidates = vec![infeasible, candidate("B", 1.0, 1.0, Some("A"), 1.0)];
        let (winner, ..) = select(&candidates, 10.0).unwrap();
        assert_eq!(winner.machine_id, "B");
    }

    #[test]
    fn no_feasible_candidates_returns_none() {
        let mut infeasible = candidate("A", 0.0, 1.0, Some("A"), 1.0);
        infeasible.feasible = false;
        assert!(select(&[infeasible], 10.0).is_none());
    }
}
