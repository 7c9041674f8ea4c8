//! Well-distributed selection of subtitle events.

use rand::seq::SliceRandom;
use rand::Rng;

use super::media::SubtitleEvent;

/// Preferred minimum distance between the start times of two selected events.
pub const MIN_GAP_SECS: f64 = 30.0;

fn sort_by_start(events: &mut [SubtitleEvent]) {
    events.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
}

/// Initial index picks spread across `len` events.
fn spread_indices(len: usize, count: usize) -> Vec<usize> {
    match count {
        0 => Vec::new(),
        1 => vec![len / 2],
        2 | 3 => [0, len / 2, len - 1].into_iter().take(count).collect(),
        _ => {
            let interval = len / (count + 1);
            (1..=count).map(|i| (interval * i).min(len - 1)).collect()
        }
    }
}

fn far_from_all(event: &SubtitleEvent, accepted: &[usize], events: &[SubtitleEvent]) -> bool {
    accepted
        .iter()
        .all(|&i| (event.start_time - events[i].start_time).abs() >= MIN_GAP_SECS)
}

/// Picks `count` events spread over the timeline, at least [`MIN_GAP_SECS`] apart where
/// the data allows. Spacing is a preference: when too few events satisfy it, the rest are
/// drawn at random from the unselected events. The result is sorted by start time.
pub fn select_well_distributed<R: Rng + ?Sized>(
    events: &[SubtitleEvent],
    count: usize,
    rng: &mut R,
) -> Vec<SubtitleEvent> {
    let mut sorted = events.to_vec();
    sort_by_start(&mut sorted);

    if sorted.len() <= count {
        return sorted;
    }

    let picks = spread_indices(sorted.len(), count);
    let mut accepted: Vec<usize> = Vec::with_capacity(count);

    for &pick in &picks {
        if far_from_all(&sorted[pick], &accepted, &sorted) {
            accepted.push(pick);
            continue;
        }

        let substitute = (0..sorted.len()).find(|candidate| {
            !picks.contains(candidate)
                && !accepted.contains(candidate)
                && far_from_all(&sorted[*candidate], &accepted, &sorted)
        });
        if let Some(substitute) = substitute {
            accepted.push(substitute);
        }
    }

    if accepted.len() < count {
        let mut remaining: Vec<usize> = (0..sorted.len())
            .filter(|i| !accepted.contains(i))
            .collect();
        remaining.shuffle(rng);
        let needed = count - accepted.len();
        accepted.extend(remaining.into_iter().take(needed));
    }

    accepted.truncate(count);
    let mut selected: Vec<SubtitleEvent> = accepted.into_iter().map(|i| sorted[i]).collect();
    sort_by_start(&mut selected);
    selected
}
