//! Subtitle track selection.
//!
//! Chinese tracks are scored and the best one is mounted for overlay. When none scores,
//! a track is still picked by format so that its timing can steer the screenshots.

use super::media::{SubtitleChoice, SubtitleCodec, SubtitleStreamInfo};

const CHINESE_LANGUAGES: &[&str] = &["chi", "zho", "zh"];
const LANGUAGE_BONUS: i32 = 10;

/// Title rules, highest priority first. Only the first matching rule contributes.
const TITLE_RULES: &[(&[&str], i32)] = &[
    (&["简", "chs", "sc"], 5),
    (&["繁", "cht", "tc"], 3),
    (&["中", "chinese"], 2),
];

/// Added on top of whichever title rule matched.
const BILINGUAL_MARKER: &str = "双语";
const BILINGUAL_BONUS: i32 = 1;

pub fn chinese_score(language: &str, title: &str) -> i32 {
    let language = language.to_lowercase();
    let title = title.to_lowercase();

    let mut score = 0;
    if CHINESE_LANGUAGES.contains(&language.as_str()) {
        score += LANGUAGE_BONUS;
    }

    if let Some((_, bonus)) = TITLE_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| title.contains(*needle)))
    {
        score += bonus;
    }

    if title.contains(BILINGUAL_MARKER) {
        score += BILINGUAL_BONUS;
    }

    score
}

/// Best-scoring Chinese track. Ties go to the smaller renderer-local index.
pub fn best_chinese_subtitle(streams: &[SubtitleStreamInfo]) -> Option<SubtitleChoice> {
    streams
        .iter()
        .map(|stream| (stream, chinese_score(&stream.language, &stream.title)))
        .filter(|(_, score)| *score > 0)
        .min_by(|(a, a_score), (b, b_score)| {
            b_score
                .cmp(a_score)
                .then_with(|| a.local_index.cmp(&b.local_index))
        })
        .map(|(stream, score)| SubtitleChoice {
            local_index: stream.local_index,
            global_index: stream.global_index,
            codec: stream.codec.clone(),
            score,
        })
}

fn format_rank(codec: &SubtitleCodec) -> Option<u8> {
    match codec {
        SubtitleCodec::Ass => Some(0),
        SubtitleCodec::Srt => Some(1),
        SubtitleCodec::Pgs => Some(2),
        SubtitleCodec::Other(_) => None,
    }
}

/// Format-priority fallback: ASS, then SRT, then PGS among normal-disposition tracks,
/// first occurrence within a format. Anything else falls back to the first track.
pub fn first_available_subtitle(streams: &[SubtitleStreamInfo]) -> Option<SubtitleChoice> {
    let preferred = streams
        .iter()
        .filter(|stream| stream.disposition.is_normal())
        .filter_map(|stream| format_rank(&stream.codec).map(|rank| (rank, stream)))
        .min_by_key(|(rank, stream)| (*rank, stream.local_index))
        .map(|(_, stream)| stream);

    preferred.or_else(|| streams.first()).map(|stream| SubtitleChoice {
        local_index: stream.local_index,
        global_index: stream.global_index,
        codec: stream.codec.clone(),
        score: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::media::Disposition;

    fn stream(local: u32, codec: SubtitleCodec, lang: &str, title: &str) -> SubtitleStreamInfo {
        SubtitleStreamInfo {
            local_index: local,
            global_index: local + 1,
            codec,
            language: lang.to_string(),
            title: title.to_string(),
            disposition: Disposition::default(),
        }
    }

    #[test]
    fn test_title_rules_do_not_stack() {
        assert_eq!(chinese_score("", "繁体中字"), 3);
        assert_eq!(chinese_score("", "简体双语"), 6);
        assert_eq!(chinese_score("", "简繁"), 5);
        assert_eq!(chinese_score("", "Chinese"), 2);
        assert_eq!(chinese_score("CHI", "CHS"), 15);
        assert_eq!(chinese_score("eng", "English"), 0);
    }

    #[test]
    fn test_selects_highest_score() {
        let streams = vec![
            stream(1, SubtitleCodec::Srt, "eng", ""),
            stream(2, SubtitleCodec::Ass, "chi", "简体"),
            stream(3, SubtitleCodec::Ass, "chi", ""),
        ];

        let choice = best_chinese_subtitle(&streams).unwrap();
        assert_eq!(choice.local_index, 2);
        assert_eq!(choice.global_index, 3);
        assert_eq!(choice.codec, SubtitleCodec::Ass);
        assert_eq!(choice.score, 15);
    }

    #[test]
    fn test_tie_break_uses_local_index() {
        let mut first = stream(2, SubtitleCodec::Pgs, "zho", "");
        first.global_index = 9;
        let mut second = stream(1, SubtitleCodec::Pgs, "zh", "");
        second.global_index = 12;

        let choice = best_chinese_subtitle(&[first, second]).unwrap();
        assert_eq!(choice.local_index, 1);
        assert_eq!(choice.global_index, 12);
    }

    #[test]
    fn test_no_chinese_is_a_miss() {
        let streams = vec![stream(1, SubtitleCodec::Srt, "eng", "English SDH")];
        assert_eq!(best_chinese_subtitle(&streams), None);
        assert_eq!(best_chinese_subtitle(&[]), None);
    }

    #[test]
    fn test_format_priority() {
        let streams = vec![
            stream(1, SubtitleCodec::Pgs, "eng", ""),
            stream(2, SubtitleCodec::Srt, "eng", ""),
            stream(3, SubtitleCodec::Ass, "eng", ""),
            stream(4, SubtitleCodec::Ass, "fre", ""),
        ];
        assert_eq!(first_available_subtitle(&streams).unwrap().local_index, 3);

        let streams = vec![
            stream(1, SubtitleCodec::Pgs, "eng", ""),
            stream(2, SubtitleCodec::Srt, "eng", ""),
        ];
        assert_eq!(first_available_subtitle(&streams).unwrap().local_index, 2);
    }

    #[test]
    fn test_fallback_skips_commentary_tracks() {
        let mut commentary = stream(1, SubtitleCodec::Ass, "eng", "Commentary");
        commentary.disposition.comment = true;
        let streams = vec![commentary, stream(2, SubtitleCodec::Pgs, "eng", "")];

        let choice = first_available_subtitle(&streams).unwrap();
        assert_eq!(choice.local_index, 2);
        assert_eq!(choice.codec, SubtitleCodec::Pgs);
    }

    #[test]
    fn test_fallback_to_first_stream_of_unknown_format() {
        let streams = vec![
            stream(1, SubtitleCodec::Other("dvd_subtitle".into()), "eng", ""),
            stream(2, SubtitleCodec::Other("mov_text".into()), "eng", ""),
        ];
        assert_eq!(first_available_subtitle(&streams).unwrap().local_index, 1);
        assert_eq!(first_available_subtitle(&[]), None);
    }
}
