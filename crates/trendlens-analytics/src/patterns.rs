//! Text pattern miners over video descriptions.
//!
//! All functions are pure: they take the batch and return ranked matches.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use trendlens_core::{AnalyzedVideo, EmojiCount, PatternMatch};

const MAX_PHRASES: usize = 10;
const MAX_EMOJIS: usize = 15;
const MAX_EXAMPLES: usize = 3;
const PHRASE_EXAMPLE_CHARS: usize = 100;
const CTA_EXAMPLE_CHARS: usize = 80;

/// Curated hook/format phrases, `(label, pattern)`.
const PHRASE_PATTERNS: &[(&str, &str)] = &[
    ("wait for it", r"(?i)\bwait for it\b"),
    ("part N", r"(?i)\bpart\s*\d+\b"),
    ("pov", r"(?i)\bpov\b:?"),
    ("tutorial", r"(?i)\btutorials?\b"),
    ("how to", r"(?i)\bhow to\b"),
    ("fyp", r"(?i)#?\bfyp\b"),
    ("day in my life", r"(?i)\bday in (?:the|my) life\b"),
    ("story time", r"(?i)\bstory ?time\b"),
    ("grwm", r"(?i)\b(?:grwm|get ready with me)\b"),
    ("hack", r"(?i)\b(?:life ?)?hacks?\b"),
    ("tips", r"(?i)\btips?\b"),
    ("challenge", r"(?i)\bchallenge\b"),
    ("before and after", r"(?i)\bbefore (?:and|&) after\b"),
    ("review", r"(?i)\breviews?\b"),
    ("unboxing", r"(?i)\bunboxing\b"),
    ("must have", r"(?i)\bmust[- ]haves?\b"),
    ("did you know", r"(?i)\bdid you know\b"),
    ("you need", r"(?i)\byou need (?:to|this)\b"),
    ("watch till the end", r"(?i)\bwatch (?:till|until|to) the end\b"),
];

/// Call-to-action patterns, `(label, pattern)`.
const CTA_PATTERNS: &[(&str, &str)] = &[
    ("follow", r"(?i)\bfollow(?:ing|s)?\b"),
    ("like", r"(?i)\blike\b"),
    ("comment", r"(?i)\bcomments?\b"),
    ("share", r"(?i)\bshare\b"),
    ("link in bio", r"(?i)\blink in (?:my )?bio\b"),
    ("save this", r"(?i)\bsave (?:this|it|for later)\b"),
    ("tag", r"(?i)\btag\b"),
];

static PHRASE_REGEXES: LazyLock<Vec<(&'static str, Regex)>> =
    LazyLock::new(|| compile(PHRASE_PATTERNS));

static CTA_REGEXES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| compile(CTA_PATTERNS));

static EMOJI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\x{1F300}-\x{1F5FF}\x{1F600}-\x{1F64F}\x{1F680}-\x{1F6FF}\x{1F700}-\x{1F7FF}\x{1F800}-\x{1F8FF}\x{1F900}-\x{1F9FF}\x{1FA00}-\x{1FAFF}\x{2600}-\x{26FF}\x{2700}-\x{27BF}\x{1F1E6}-\x{1F1FF}]",
    )
    .expect("valid emoji regex")
});

fn compile(patterns: &'static [(&'static str, &'static str)]) -> Vec<(&'static str, Regex)> {
    patterns
        .iter()
        .map(|&(label, pattern)| (label, Regex::new(pattern).expect("valid regex")))
        .collect()
}

/// Truncate to at most `max` characters on a char boundary.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn push_example(examples: &mut Vec<String>, description: &str, max_chars: usize) {
    if examples.len() >= MAX_EXAMPLES {
        return;
    }
    let snippet = truncate_chars(description.trim(), max_chars);
    if !snippet.is_empty() && !examples.contains(&snippet) {
        examples.push(snippet);
    }
}

/// Count curated phrase occurrences across all descriptions.
///
/// Returns at most 10 patterns with at least one match, by count descending.
#[must_use]
pub fn extract_common_phrases(videos: &[AnalyzedVideo]) -> Vec<PatternMatch> {
    let mut matches: Vec<PatternMatch> = PHRASE_REGEXES
        .iter()
        .filter_map(|(label, re)| {
            let mut count = 0;
            let mut examples = Vec::new();
            for video in videos {
                let description = &video.video.description;
                let hits = re.find_iter(description).count();
                if hits > 0 {
                    count += hits;
                    push_example(&mut examples, description, PHRASE_EXAMPLE_CHARS);
                }
            }
            (count > 0).then(|| PatternMatch {
                pattern: (*label).to_string(),
                count,
                examples,
            })
        })
        .collect();

    matches.sort_by_key(|m| Reverse(m.count));
    matches.truncate(MAX_PHRASES);
    matches
}

/// Detect call-to-action phrasing. Each video counts at most once per CTA.
#[must_use]
pub fn detect_call_to_actions(videos: &[AnalyzedVideo]) -> Vec<PatternMatch> {
    let mut matches: Vec<PatternMatch> = CTA_REGEXES
        .iter()
        .filter_map(|(label, re)| {
            let mut count = 0;
            let mut examples = Vec::new();
            for video in videos {
                let description = &video.video.description;
                if re.is_match(description) {
                    count += 1;
                    push_example(&mut examples, description, CTA_EXAMPLE_CHARS);
                }
            }
            (count > 0).then(|| PatternMatch {
                pattern: (*label).to_string(),
                count,
                examples,
            })
        })
        .collect();

    matches.sort_by_key(|m| Reverse(m.count));
    matches
}

/// Count emoji glyphs across all descriptions; top 15 by count.
#[must_use]
pub fn extract_emojis(videos: &[AnalyzedVideo]) -> Vec<EmojiCount> {
    let mut order: Vec<EmojiCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for video in videos {
        for m in EMOJI_RE.find_iter(&video.video.description) {
            if let Some(&i) = index.get(m.as_str()) {
                order[i].count += 1;
            } else {
                index.insert(m.as_str(), order.len());
                order.push(EmojiCount {
                    emoji: m.as_str().to_string(),
                    count: 1,
                });
            }
        }
    }

    order.sort_by_key(|e| Reverse(e.count));
    order.truncate(MAX_EMOJIS);
    order
}

/// Mean description length in characters, rounded; `0` for an empty batch.
#[must_use]
pub fn average_description_length(videos: &[AnalyzedVideo]) -> usize {
    if videos.is_empty() {
        return 0;
    }
    let total: usize = videos
        .iter()
        .map(|v| v.video.description.chars().count())
        .sum();
    (total + videos.len() / 2) / videos.len()
}
