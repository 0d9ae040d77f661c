//! Greedy daily allocation pipeline.
//!
//! This module is the pure core of plan generation: it merges the carry-over
//! and upcoming candidate pools, time-boxes tasks into a tolerance band
//! around the requested budget, synthesizes filler blocks for empty backlogs,
//! and tops up under-filled schedules with a single correction pass.
//!
//! Everything here is deterministic: the same ordered candidates and budget
//! produce bit-identical output. No clock access, no randomness, no I/O.

use std::collections::HashSet;

use crate::backlog::BacklogCandidate;

/// Smallest admissible schedule block, in minutes.
pub const MIN_BLOCK_MINUTES: u32 = 15;

/// Largest admissible schedule block, in minutes.
pub const MAX_BLOCK_MINUTES: u32 = 180;

/// Upper bound on a single day's budget.
pub const MAX_DAILY_MINUTES: u32 = 1440;

const DEEP_FOCUS_LABEL: &str = "Deep Focus Sprint";
const REVIEW_LABEL: &str = "Review & Practice";
const REFLECTION_LABEL: &str = "Reflection & Planning";
const WRAP_UP_LABEL: &str = "Focused Wrap-up";

/// Tolerance band around the requested daily budget.
///
/// Allocation aims for `[min, max]`; `min` is floored at
/// [`MIN_BLOCK_MINUTES`] so tiny budgets still admit one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetRange {
    pub min: u32,
    pub max: u32,
}

/// A time-boxed block chosen for the day's schedule.
///
/// Carries only what the persisted line item needs; the backlog task that
/// inspired a block is linked by topic copy alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedBlock {
    pub topic: String,
    pub minutes: u32,
}

/// Clamp a requested daily budget into `[MIN_BLOCK_MINUTES, MAX_DAILY_MINUTES]`.
///
/// Missing or non-positive requests fall back to the minimum block size.
pub fn clamp_daily_minutes(requested: Option<i64>) -> u32 {
    match requested {
        Some(minutes) if minutes > 0 => {
            (minutes.min(MAX_DAILY_MINUTES as i64) as u32).max(MIN_BLOCK_MINUTES)
        }
        _ => MIN_BLOCK_MINUTES,
    }
}

/// Compute the `[0.9x, 1.1x]` tolerance band for a clamped budget.
pub fn target_range(budget: u32) -> TargetRange {
    let min = (budget as f64 * 0.9).round() as u32;
    let max = (budget as f64 * 1.1).round() as u32;
    TargetRange {
        min: min.max(MIN_BLOCK_MINUTES),
        max,
    }
}

/// Merge the carry-over and upcoming pools into one ordered candidate list.
///
/// Carry-over comes first; duplicates by id keep their first occurrence, so
/// a task present in both pools is scheduled with carry-over priority.
/// Relative order within each pool is preserved.
pub fn merge_candidates(
    carry_over: Vec<BacklogCandidate>,
    upcoming: Vec<BacklogCandidate>,
) -> Vec<BacklogCandidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::with_capacity(carry_over.len() + upcoming.len());
    for candidate in carry_over.into_iter().chain(upcoming) {
        if seen.insert(candidate.id.clone()) {
            merged.push(candidate);
        }
    }
    merged
}

/// Greedily select and time-box candidates until the band ceiling is reached.
///
/// Each candidate's authored estimate is clamped into
/// `[MIN_BLOCK_MINUTES, MAX_BLOCK_MINUTES]`, then distorted only as far as
/// the band requires: never less than what is still needed to reach the
/// floor, never more than what remains to the ceiling for this step. This is
/// a satisficing allocator, not a knapsack optimizer.
pub fn allocate(candidates: &[BacklogCandidate], range: TargetRange) -> (Vec<PlannedBlock>, u32) {
    let mut blocks = Vec::new();
    let mut total: u32 = 0;

    for candidate in candidates {
        if total >= range.max {
            break;
        }
        let estimated = candidate
            .estimated_minutes
            .unwrap_or(0)
            .clamp(MIN_BLOCK_MINUTES, MAX_BLOCK_MINUTES);
        let remaining_to_min = range.min.saturating_sub(total);
        let remaining_to_max = range.max - total;
        let size = estimated
            .min(remaining_to_max)
            .max(remaining_to_min)
            .clamp(MIN_BLOCK_MINUTES, MAX_BLOCK_MINUTES);

        blocks.push(PlannedBlock {
            topic: candidate.title.clone(),
            minutes: size,
        });
        total += size;
    }

    (blocks, total)
}

/// Build generic filler blocks for an empty backlog.
///
/// Budgets of at most two minimum blocks get a single block covering the
/// whole budget. Larger budgets get the fixed three-way split: deep focus
/// ~60%, review ~25%, reflection absorbing the remainder so the sum equals
/// the budget exactly. Block-size bounds outrank the exact sum: each block
/// is clamped into `[MIN_BLOCK_MINUTES, MAX_BLOCK_MINUTES]`, which keeps the
/// split exact for ordinary budgets and best-effort at the extremes.
pub fn synthetic_blocks(budget: u32) -> Vec<PlannedBlock> {
    if budget <= 2 * MIN_BLOCK_MINUTES {
        return vec![PlannedBlock {
            topic: DEEP_FOCUS_LABEL.to_string(),
            minutes: budget.clamp(MIN_BLOCK_MINUTES, MAX_BLOCK_MINUTES),
        }];
    }

    let focus = ((budget as f64 * 0.6).round() as u32).clamp(MIN_BLOCK_MINUTES, MAX_BLOCK_MINUTES);
    let review = ((budget as f64 * 0.25).round() as u32).clamp(MIN_BLOCK_MINUTES, MAX_BLOCK_MINUTES);
    let reflection = budget
        .saturating_sub(focus + review)
        .clamp(MIN_BLOCK_MINUTES, MAX_BLOCK_MINUTES);

    vec![
        PlannedBlock {
            topic: DEEP_FOCUS_LABEL.to_string(),
            minutes: focus,
        },
        PlannedBlock {
            topic: REVIEW_LABEL.to_string(),
            minutes: review,
        },
        PlannedBlock {
            topic: REFLECTION_LABEL.to_string(),
            minutes: reflection,
        },
    ]
}

/// Single-pass top-up for schedules that finished below the band floor.
///
/// First grows the last selected block up to [`MAX_BLOCK_MINUTES`]; if a
/// deficit remains, appends exactly one wrap-up block sized
/// `clamp(deficit, MIN_BLOCK_MINUTES, MAX_BLOCK_MINUTES)`. No further passes
/// run even if the total still falls short of the floor.
pub fn correct_deficit(blocks: &mut Vec<PlannedBlock>, total: &mut u32, range: TargetRange) {
    if blocks.is_empty() || *total >= range.min {
        return;
    }
    let mut deficit = range.min - *total;

    if let Some(last) = blocks.last_mut() {
        let available = MAX_BLOCK_MINUTES.saturating_sub(last.minutes);
        let applied = deficit.min(available);
        last.minutes += applied;
        *total += applied;
        deficit -= applied;
    }

    if deficit > 0 {
        let minutes = deficit.clamp(MIN_BLOCK_MINUTES, MAX_BLOCK_MINUTES);
        blocks.push(PlannedBlock {
            topic: WRAP_UP_LABEL.to_string(),
            minutes,
        });
        *total += minutes;
    }
}

/// Run the full selection pipeline for one day.
///
/// Allocation first; synthetic filler only when nothing was selected;
/// deficit correction only when something was selected but the total missed
/// the band floor.
pub fn plan_day(candidates: &[BacklogCandidate], budget: u32) -> (Vec<PlannedBlock>, u32) {
    let range = target_range(budget);
    let (mut blocks, mut total) = allocate(candidates, range);

    if blocks.is_empty() {
        blocks = synthetic_blocks(budget);
        total = blocks.iter().map(|b| b.minutes).sum();
    } else if total < range.min {
        correct_deficit(&mut blocks, &mut total, range);
    }

    (blocks, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backlog::CandidateStatus;
    use chrono::{TimeZone, Utc};

    fn make_candidate(id: &str, estimated_minutes: Option<u32>) -> BacklogCandidate {
        BacklogCandidate {
            id: id.to_string(),
            title: format!("Task {id}"),
            task_type: None,
            estimated_minutes,
            due_date: None,
            status: CandidateStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn clamps_missing_and_non_positive_budgets() {
        assert_eq!(clamp_daily_minutes(None), MIN_BLOCK_MINUTES);
        assert_eq!(clamp_daily_minutes(Some(0)), MIN_BLOCK_MINUTES);
        assert_eq!(clamp_daily_minutes(Some(-90)), MIN_BLOCK_MINUTES);
        assert_eq!(clamp_daily_minutes(Some(5)), MIN_BLOCK_MINUTES);
        assert_eq!(clamp_daily_minutes(Some(240)), 240);
        assert_eq!(clamp_daily_minutes(Some(100_000)), MAX_DAILY_MINUTES);
    }

    #[test]
    fn target_range_is_ten_percent_band() {
        assert_eq!(target_range(240), TargetRange { min: 216, max: 264 });
        // The floor never drops below one minimum block.
        assert_eq!(target_range(15), TargetRange { min: 15, max: 17 });
    }

    #[test]
    fn merge_keeps_carry_over_on_duplicate_id() {
        let mut dup_carry = make_candidate("a", Some(30));
        dup_carry.title = "carry".to_string();
        let mut dup_upcoming = make_candidate("a", Some(60));
        dup_upcoming.title = "upcoming".to_string();

        let merged = merge_candidates(
            vec![dup_carry, make_candidate("b", Some(30))],
            vec![dup_upcoming, make_candidate("c", Some(30))],
        );

        let ids: Vec<&str> = merged.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(merged[0].title, "carry");
    }

    #[test]
    fn allocate_stays_within_band() {
        let candidates: Vec<_> = (0..8).map(|i| make_candidate(&i.to_string(), Some(60))).collect();
        let range = target_range(240);
        let (blocks, total) = allocate(&candidates, range);

        assert!(total >= range.min, "total {total} below floor {}", range.min);
        // The ceiling stop may overshoot by at most one clamped step.
        assert!(total < range.max + MIN_BLOCK_MINUTES);
        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks[4].minutes, 24); // last step trimmed to the ceiling
    }

    #[test]
    fn allocate_stops_once_ceiling_reached() {
        let candidates: Vec<_> = (0..10).map(|i| make_candidate(&i.to_string(), Some(180))).collect();
        let range = target_range(240);
        let (blocks, total) = allocate(&candidates, range);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].minutes, 180);
        assert_eq!(blocks[1].minutes, 84); // 264 - 180
        assert_eq!(total, 264);
    }

    #[test]
    fn allocate_clamps_small_and_missing_estimates() {
        let candidates = vec![
            make_candidate("tiny", Some(5)),
            make_candidate("unsized", None),
        ];
        let range = TargetRange { min: 15, max: 40 };
        let (blocks, _) = allocate(&candidates, range);
        for block in &blocks {
            assert!(block.minutes >= MIN_BLOCK_MINUTES);
        }
    }

    #[test]
    fn allocate_single_short_candidate_hits_block_ceiling() {
        // One 20-minute task against a 240 budget: the floor pull (216) is
        // capped by the per-block ceiling, leaving a deficit for correction.
        let candidates = vec![make_candidate("only", Some(20))];
        let range = target_range(240);
        let (blocks, total) = allocate(&candidates, range);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].minutes, MAX_BLOCK_MINUTES);
        assert_eq!(total, 180);
    }

    #[test]
    fn synthetic_small_budget_single_block() {
        let blocks = synthetic_blocks(30);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].topic, "Deep Focus Sprint");
        assert_eq!(blocks[0].minutes, 30);
    }

    #[test]
    fn synthetic_default_budget_three_way_split() {
        let blocks = synthetic_blocks(240);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].topic, "Deep Focus Sprint");
        assert_eq!(blocks[0].minutes, 144);
        assert_eq!(blocks[1].topic, "Review & Practice");
        assert_eq!(blocks[1].minutes, 60);
        assert_eq!(blocks[2].topic, "Reflection & Planning");
        assert_eq!(blocks[2].minutes, 36);
        assert_eq!(blocks.iter().map(|b| b.minutes).sum::<u32>(), 240);
    }

    #[test]
    fn synthetic_huge_budget_respects_block_ceiling() {
        let blocks = synthetic_blocks(MAX_DAILY_MINUTES);
        assert_eq!(blocks.len(), 3);
        for block in &blocks {
            assert!(block.minutes <= MAX_BLOCK_MINUTES);
        }
    }

    #[test]
    fn correction_grows_last_block_first() {
        let mut blocks = vec![
            PlannedBlock { topic: "a".into(), minutes: 60 },
            PlannedBlock { topic: "b".into(), minutes: 100 },
        ];
        let mut total = 160;
        correct_deficit(&mut blocks, &mut total, TargetRange { min: 216, max: 264 });

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].minutes, 156); // grew by the 56-minute deficit
        assert_eq!(total, 216);
    }

    #[test]
    fn correction_appends_single_wrap_up_when_growth_insufficient() {
        let mut blocks = vec![PlannedBlock { topic: "a".into(), minutes: 170 }];
        let mut total = 170;
        correct_deficit(&mut blocks, &mut total, TargetRange { min: 216, max: 264 });

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].minutes, MAX_BLOCK_MINUTES);
        assert_eq!(blocks[1].topic, "Focused Wrap-up");
        assert_eq!(blocks[1].minutes, 36);
        assert_eq!(total, 216);
    }

    #[test]
    fn correction_is_noop_when_total_in_band() {
        let mut blocks = vec![PlannedBlock { topic: "a".into(), minutes: 220 }];
        let mut total = 220;
        correct_deficit(&mut blocks, &mut total, TargetRange { min: 216, max: 264 });
        assert_eq!(blocks.len(), 1);
        assert_eq!(total, 220);
    }

    #[test]
    fn plan_day_falls_back_to_synthetic_on_empty_backlog() {
        let (blocks, total) = plan_day(&[], 240);
        assert_eq!(blocks.len(), 3);
        assert_eq!(total, 240);
    }

    #[test]
    fn plan_day_corrects_underfilled_selection() {
        let candidates = vec![make_candidate("only", Some(20))];
        let (blocks, total) = plan_day(&candidates, 240);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].topic, "Focused Wrap-up");
        assert_eq!(total, 216);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn every_block_stays_within_bounds(
                estimates in proptest::collection::vec(0u32..400, 1..12),
                requested in 1i64..=2000,
            ) {
                let candidates: Vec<_> = estimates
                    .iter()
                    .enumerate()
                    .map(|(i, est)| make_candidate(&i.to_string(), Some(*est)))
                    .collect();
                let budget = clamp_daily_minutes(Some(requested));
                let (blocks, total) = plan_day(&candidates, budget);

                prop_assert!(!blocks.is_empty());
                for block in &blocks {
                    prop_assert!(block.minutes >= MIN_BLOCK_MINUTES);
                    prop_assert!(block.minutes <= MAX_BLOCK_MINUTES);
                }
                prop_assert_eq!(total, blocks.iter().map(|b| b.minutes).sum::<u32>());
            }

            #[test]
            fn allocation_is_deterministic(
                estimates in proptest::collection::vec(0u32..400, 0..12),
                requested in 1i64..=2000,
            ) {
                let candidates: Vec<_> = estimates
                    .iter()
                    .enumerate()
                    .map(|(i, est)| make_candidate(&i.to_string(), Some(*est)))
                    .collect();
                let budget = clamp_daily_minutes(Some(requested));
                prop_assert_eq!(plan_day(&candidates, budget), plan_day(&candidates, budget));
            }

            #[test]
            fn ample_backlog_reaches_the_band(requested in 100i64..=480) {
                let candidates: Vec<_> = (0..12)
                    .map(|i| make_candidate(&i.to_string(), Some(60)))
                    .collect();
                let budget = clamp_daily_minutes(Some(requested));
                let range = target_range(budget);
                let (_, total) = plan_day(&candidates, budget);

                prop_assert!(total >= range.min);
                prop_assert!(total < range.max + MIN_BLOCK_MINUTES);
            }
        }
    }
}
