//! Turning subtitle events (or their absence) into concrete capture instants.

use rand::Rng;

use super::distribution::select_well_distributed;
use super::media::{ScreenshotTarget, SubtitleEvent, TimestampSource};

/// Fractions of the duration used when subtitles cannot steer the capture.
pub const FALLBACK_PERCENTAGES: [f64; 5] = [0.15, 0.30, 0.50, 0.70, 0.85];

/// Middle of the video, away from intros and credits.
pub const GOLDEN_WINDOW: (f64, f64) = (0.30, 0.80);

/// Share of an event's span skipped at the start before jitter applies.
const JITTER_LEAD: f64 = 0.1;
/// Share of an event's span over which the capture instant is spread.
const JITTER_SPREAD: f64 = 0.8;

/// Events lying entirely inside the golden window.
pub fn golden_events(events: &[SubtitleEvent], duration: f64) -> Vec<SubtitleEvent> {
    let (from, to) = (duration * GOLDEN_WINDOW.0, duration * GOLDEN_WINDOW.1);
    events
        .iter()
        .filter(|event| event.start_time >= from && event.end_time <= to)
        .copied()
        .collect()
}

/// An instant inside the event, biased away from its first and last frames.
pub fn jittered_instant<R: Rng + ?Sized>(event: &SubtitleEvent, rng: &mut R) -> f64 {
    let span = event.span();
    event.start_time + span * JITTER_LEAD + rng.random::<f64>() * span * JITTER_SPREAD
}

/// Keeps a capture instant inside `[0, duration)`.
fn clamp_to_video(time_point: f64, duration: f64) -> f64 {
    let last = (duration - 0.001).max(0.0);
    time_point.clamp(0.0, last)
}

pub fn fallback_targets(duration: f64, count: usize) -> Vec<ScreenshotTarget> {
    let fractions: Vec<f64> = if count == FALLBACK_PERCENTAGES.len() {
        FALLBACK_PERCENTAGES.to_vec()
    } else {
        (1..=count).map(|i| i as f64 / (count + 1) as f64).collect()
    };

    fractions
        .into_iter()
        .enumerate()
        .map(|(i, fraction)| ScreenshotTarget {
            time_point: clamp_to_video(duration * fraction, duration),
            ordinal: i + 1,
        })
        .collect()
}

/// Picks capture instants from subtitle events. Returns `None` when there are fewer than
/// `count` events, in which case the caller falls back to [`fallback_targets`].
pub fn event_targets<R: Rng + ?Sized>(
    events: &[SubtitleEvent],
    duration: f64,
    count: usize,
    rng: &mut R,
) -> Option<Vec<ScreenshotTarget>> {
    if count == 0 || events.len() < count {
        return None;
    }

    let golden = golden_events(events, duration);
    let pool = if golden.len() >= count {
        golden
    } else {
        events.to_vec()
    };

    let targets: Vec<ScreenshotTarget> = select_well_distributed(&pool, count, rng)
        .iter()
        .enumerate()
        .map(|(i, event)| ScreenshotTarget {
            time_point: clamp_to_video(jittered_instant(event, rng), duration),
            ordinal: i + 1,
        })
        .collect();

    (targets.len() >= count).then_some(targets)
}

/// Event-driven targets when possible, fixed percentages otherwise.
pub fn plan_targets<R: Rng + ?Sized>(
    events: Option<&[SubtitleEvent]>,
    duration: f64,
    count: usize,
    rng: &mut R,
) -> (Vec<ScreenshotTarget>, TimestampSource) {
    match events.and_then(|events| event_targets(events, duration, count, rng)) {
        Some(targets) => (targets, TimestampSource::SubtitleEvents),
        None => (
            fallback_targets(duration, count),
            TimestampSource::FixedPercentages,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn times(targets: &[ScreenshotTarget]) -> Vec<f64> {
        targets.iter().map(|t| t.time_point).collect()
    }

    #[test]
    fn test_fallback_percentages() {
        let targets = fallback_targets(3600.0, 5);
        assert_eq!(times(&targets), vec![540.0, 1080.0, 1800.0, 2520.0, 3060.0]);
        let ordinals: Vec<usize> = targets.iter().map(|t| t.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_fallback_for_other_counts_is_even() {
        assert_eq!(times(&fallback_targets(400.0, 3)), vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn test_jitter_stays_in_middle_of_event() {
        let mut rng = StdRng::seed_from_u64(5);
        let event = SubtitleEvent::new(100.0, 110.0);
        for _ in 0..200 {
            let t = jittered_instant(&event, &mut rng);
            assert!((101.0..=109.0).contains(&t), "{} outside middle span", t);
        }
    }

    #[test]
    fn test_golden_window_filter() {
        let events = vec![
            SubtitleEvent::new(100.0, 105.0),
            SubtitleEvent::new(300.0, 305.0),
            SubtitleEvent::new(798.0, 801.0),
        ];
        assert_eq!(golden_events(&events, 1000.0), vec![events[1]]);
    }

    #[test]
    fn test_too_few_events_fall_back() {
        let mut rng = StdRng::seed_from_u64(9);
        let events: Vec<SubtitleEvent> = (0..4)
            .map(|i| SubtitleEvent::new(1000.0 + i as f64 * 60.0, 1002.0 + i as f64 * 60.0))
            .collect();

        let (targets, source) = plan_targets(Some(events.as_slice()), 3600.0, 5, &mut rng);
        assert_eq!(source, TimestampSource::FixedPercentages);
        assert_eq!(targets.len(), 5);

        let (_, source) = plan_targets(None, 3600.0, 5, &mut rng);
        assert_eq!(source, TimestampSource::FixedPercentages);
    }

    #[test]
    fn test_event_targets_prefer_golden_window() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut events: Vec<SubtitleEvent> = (0..10)
            .map(|i| {
                let start = 1200.0 + i as f64 * 100.0;
                SubtitleEvent::new(start, start + 3.0)
            })
            .collect();
        events.push(SubtitleEvent::new(10.0, 13.0));
        events.push(SubtitleEvent::new(3500.0, 3503.0));

        let (targets, source) = plan_targets(Some(events.as_slice()), 3600.0, 5, &mut rng);
        assert_eq!(source, TimestampSource::SubtitleEvents);
        assert_eq!(targets.len(), 5);
        for target in &targets {
            assert!(target.time_point >= 1080.0 && target.time_point <= 2880.0);
        }
        assert!(targets.windows(2).all(|p| p[0].time_point < p[1].time_point));
    }
}
