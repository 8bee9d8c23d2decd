//! Candidate scoring and selection.
//!
//! Each detected element gets a weighted score from its playback
//! signals; the highest scorer wins, with ties broken by
//! first-encountered order so repeated scans of an unchanged surface
//! always select the same element.

use crate::limits::{MIN_CANDIDATE_HEIGHT, MIN_CANDIDATE_WIDTH};
use crate::types::Candidate;

/// Signal weight: element is visible on the surface.
pub const SCORE_VISIBLE: u32 = 10;

/// Signal weight: element is at least 300x200 logical units.
pub const SCORE_LARGE: u32 = 20;

/// Signal weight: element is currently playing.
pub const SCORE_PLAYING: u32 = 30;

/// Signal weight: playback position past zero.
pub const SCORE_PROGRESS: u32 = 15;

/// Signal weight: known duration.
pub const SCORE_DURATION: u32 = 10;

/// Signal weight: minimally loaded.
pub const SCORE_READY: u32 = 5;

/// Signal weight: recognized as a known platform's primary player.
pub const SCORE_PRIMARY_PLAYER: u32 = 25;

/// Positive content evidence: without at least one of these, a candidate
/// is rejected outright even if otherwise visible.
pub fn has_content_evidence(candidate: &Candidate) -> bool {
    candidate.duration > 0.0 || candidate.position > 0.0 || candidate.ready
}

/// Score a candidate, or `None` when it lacks all content evidence.
pub fn score(candidate: &Candidate) -> Option<u32> {
    if !has_content_evidence(candidate) {
        return None;
    }

    let mut total = 0;
    if candidate.visible {
        total += SCORE_VISIBLE;
    }
    if candidate.rect.width >= MIN_CANDIDATE_WIDTH && candidate.rect.height >= MIN_CANDIDATE_HEIGHT
    {
        total += SCORE_LARGE;
    }
    if candidate.playing {
        total += SCORE_PLAYING;
    }
    if candidate.position > 0.0 {
        total += SCORE_PROGRESS;
    }
    if candidate.duration > 0.0 {
        total += SCORE_DURATION;
    }
    if candidate.ready {
        total += SCORE_READY;
    }
    if candidate.primary_player {
        total += SCORE_PRIMARY_PLAYER;
    }
    Some(total)
}

/// Pick the best-scoring candidate.
///
/// The fold uses a strict `>` so an equal later score never displaces an
/// earlier winner — selection is deterministic in scan order.
pub fn select_best(candidates: &[Candidate]) -> Option<&Candidate> {
    let mut best: Option<(&Candidate, u32)> = None;
    for candidate in candidates {
        let Some(points) = score(candidate) else {
            continue;
        };
        match best {
            Some((_, best_points)) if points <= best_points => {}
            _ => best = Some((candidate, points)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MediaKind, Rect};

    fn playing_candidate(locator: &str) -> Candidate {
        Candidate {
            locator: locator.to_string(),
            title: "A Video".to_string(),
            position: 12.4,
            duration: 300.0,
            rect: Rect::new(0.0, 0.0, 640.0, 360.0),
            visible: true,
            playing: true,
            ready: true,
            kind: MediaKind::Native,
            ..Default::default()
        }
    }

    // ── 1. End-to-end scoring example ───────────────────────────

    #[test]
    fn visible_playing_native_element_scores_ninety() {
        // 640x360, playing, position 12.4s / duration 300s, not a
        // recognized primary player: 10+20+30+15+10+5 = 90.
        let candidate = playing_candidate("https://video.example/clip");
        assert_eq!(score(&candidate), Some(90));
    }

    // ── 2. Content evidence guard ───────────────────────────────

    #[test]
    fn no_content_evidence_rejected_even_if_visible() {
        let candidate = Candidate {
            locator: "https://video.example/clip".to_string(),
            rect: Rect::new(0.0, 0.0, 640.0, 360.0),
            visible: true,
            position: 0.0,
            duration: 0.0,
            ready: false,
            ..Default::default()
        };
        assert!(!has_content_evidence(&candidate));
        assert_eq!(score(&candidate), None);
    }

    #[test]
    fn any_single_evidence_signal_admits_scoring() {
        let base = Candidate {
            visible: true,
            ..Default::default()
        };

        let with_duration = Candidate {
            duration: 10.0,
            ..base.clone()
        };
        assert!(score(&with_duration).is_some());

        let with_position = Candidate {
            position: 1.0,
            ..base.clone()
        };
        assert!(score(&with_position).is_some());

        let with_ready = Candidate {
            ready: true,
            ..base
        };
        assert!(score(&with_ready).is_some());
    }

    // ── 3. Individual weights ───────────────────────────────────

    #[test]
    fn size_threshold_is_inclusive() {
        let mut candidate = playing_candidate("https://video.example/clip");
        candidate.rect = Rect::new(0.0, 0.0, 300.0, 200.0);
        assert_eq!(score(&candidate), Some(90));

        candidate.rect = Rect::new(0.0, 0.0, 299.0, 200.0);
        assert_eq!(score(&candidate), Some(70), "just under threshold");
    }

    #[test]
    fn primary_player_bonus() {
        let mut candidate = playing_candidate("https://www.youtube.com/watch?v=abc");
        candidate.primary_player = true;
        assert_eq!(score(&candidate), Some(115));
    }

    #[test]
    fn paused_at_zero_with_duration_scores_low() {
        let candidate = Candidate {
            duration: 120.0,
            rect: Rect::new(0.0, 0.0, 100.0, 100.0),
            visible: true,
            ..Default::default()
        };
        // visible(10) + duration(10) only.
        assert_eq!(score(&candidate), Some(20));
    }

    // ── 4. Selection determinism ────────────────────────────────

    #[test]
    fn select_best_picks_highest_score() {
        let small = Candidate {
            rect: Rect::new(0.0, 0.0, 100.0, 80.0),
            visible: true,
            duration: 60.0,
            ..Default::default()
        };
        let big = playing_candidate("https://video.example/big");
        let binding = [small, big.clone()];
        let picked = select_best(&binding).expect("one wins");
        assert_eq!(picked.locator, big.locator);
    }

    #[test]
    fn select_best_tie_keeps_first_encountered() {
        let first = playing_candidate("https://video.example/first");
        let second = playing_candidate("https://video.example/second");
        assert_eq!(score(&first), score(&second));

        let binding = [first.clone(), second];
        let picked = select_best(&binding).expect("one wins");
        assert_eq!(picked.locator, first.locator);
    }

    #[test]
    fn select_best_repeated_scans_stable() {
        let a = playing_candidate("https://video.example/a");
        let b = playing_candidate("https://video.example/b");
        let list = [a, b];
        let first_pick = select_best(&list).expect("pick").locator.clone();
        for _ in 0..10 {
            assert_eq!(select_best(&list).expect("pick").locator, first_pick);
        }
    }

    #[test]
    fn select_best_skips_no_evidence_candidates() {
        let hollow = Candidate {
            visible: true,
            rect: Rect::new(0.0, 0.0, 640.0, 360.0),
            ..Default::default()
        };
        let real = Candidate {
            duration: 30.0,
            ..Default::default()
        };
        let binding = [hollow, real.clone()];
        let picked = select_best(&binding).expect("real wins");
        assert_eq!(picked.duration, real.duration);
    }

    #[test]
    fn select_best_empty_and_all_rejected() {
        assert!(select_best(&[]).is_none());
        let hollow = Candidate {
            visible: true,
            ..Default::default()
        };
        assert!(select_best(&[hollow]).is_none());
    }
}
