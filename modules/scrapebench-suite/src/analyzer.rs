//! Content-quality scoring: best-matching-window token overlap against
//! ground-truth snippets.
//!
//! Everything here is pure and deterministic (no I/O, no hidden state), so
//! re-analyzing the same persisted fetch artifacts yields byte-identical
//! results.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use scrapebench_common::{AnalyzerResult, ContentFormat, ScrapeOutput, Summary, Task};

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+/\d+|[\w'-]+").expect("valid regex"));

static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[\s\S]*?```").expect("valid regex"));
static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`]+`").expect("valid regex"));
static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").expect("valid regex"));
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("valid regex"));
static MARKER_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[#>\-\*\+\s]+").expect("valid regex"));
static EMPHASIS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_]{1,3}([^*_]+)[*_]{1,3}").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Substrings (matched case-insensitively) that mark an anti-scraping block
/// page rather than real content: interstitial challenges, WAF denials, bot
/// detection vendors.
const BLOCK_PAGE_MARKERS: [&str; 9] = [
    "attention required",
    "cloudflare",
    "verify you are a human",
    "access denied",
    "bot detection",
    "datadome",
    "akamai bot manager",
    "imperva",
    "sucuri website firewall",
];

/// Tokenize for overlap scoring: "digits/digits" fractions survive whole,
/// otherwise runs of word characters plus apostrophe/hyphen; lowercased.
/// Punctuation and whitespace carry no signal.
pub fn smart_tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Reduce markdown to its visible text: drop code, collapse image/link
/// markup to label text, strip structural markers, normalize whitespace.
fn strip_markdown(md: &str) -> String {
    if md.is_empty() {
        return String::new();
    }
    let text = CODE_FENCE_RE.replace_all(md, " ");
    let text = INLINE_CODE_RE.replace_all(&text, " ");
    let text = IMAGE_RE.replace_all(&text, "$1");
    let text = LINK_RE.replace_all(&text, "$1");
    let text = MARKER_PREFIX_RE.replace_all(&text, "");
    let text = EMPHASIS_RE.replace_all(&text, "$1");
    let text = text.replace('|', " ");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Best-matching-window recall/precision over the content token sequence.
///
/// The window width equals the truth snippet length, so one dense matching
/// region wins over partial matches scattered across a huge page. Ties on
/// recall break toward higher precision. Returns (recall, precision, f1).
fn window_scores(content: &[String], truth: &[String]) -> (f64, f64, f64) {
    if content.is_empty() || truth.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let truth_set: HashSet<&str> = truth.iter().map(|t| t.as_str()).collect();
    let win = truth.len().max(1);

    let mut best_recall = 0.0f64;
    let mut best_precision = 0.0f64;
    let positions = if content.len() > win {
        content.len() - win + 1
    } else {
        1
    };
    for i in 0..positions {
        let window = &content[i..(i + win).min(content.len())];
        let window_set: HashSet<&str> = window.iter().map(|t| t.as_str()).collect();
        let overlap = window_set.intersection(&truth_set).count() as f64;
        let recall = overlap / truth_set.len().max(1) as f64;
        let precision = overlap / window_set.len().max(1) as f64;
        if recall > best_recall
            || ((recall - best_recall).abs() < 1e-9 && precision > best_precision)
        {
            best_recall = recall;
            best_precision = precision;
        }
    }

    let f1 = if best_recall + best_precision > 0.0 {
        2.0 * best_precision * best_recall / (best_precision + best_recall)
    } else {
        0.0
    };
    (best_recall, best_precision, f1)
}

fn is_block_page(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let lowered = text.to_lowercase();
    BLOCK_PAGE_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Score one fetch against its task's reference text.
///
/// `lie_weight` is accepted but currently applies no penalty: the lie text
/// is a reserved extension point and only participates in the
/// no-reference-signal success gate.
pub fn analyze_one(task: &Task, output: &ScrapeOutput, _lie_weight: f64) -> AnalyzerResult {
    let raw_content = output.content.as_deref().unwrap_or("");
    let content_text = if output.format == Some(ContentFormat::Markdown) {
        strip_markdown(raw_content)
    } else {
        raw_content.to_string()
    };

    let content_words = smart_tokenize(&content_text);
    let truth_words = smart_tokenize(&task.truth_text);
    let lie_words = smart_tokenize(&task.lie_text);

    let (recall, precision, f1) = window_scores(&content_words, &truth_words);

    // A task with no reference signal at all cannot be judged successful
    // (guards against mis-specified dataset rows such as known-broken pages).
    let success = if truth_words.is_empty() && lie_words.is_empty() {
        false
    } else {
        let status_ok = output
            .status_code
            .map(|s| (200..400).contains(&s))
            .unwrap_or(false);
        let has_error = output.error.as_deref().is_some_and(|e| !e.is_empty());
        status_ok
            && !has_error
            && !raw_content.is_empty()
            && output.content_size.unwrap_or(0) > 0
            && !is_block_page(raw_content)
    };

    AnalyzerResult {
        success,
        recall,
        precision,
        f1,
    }
}

/// Mean of each metric over all analyzed tasks; `success_rate` is the
/// fraction with `success == true`. Empty input summarizes to zeros.
pub fn summarize(results: &[AnalyzerResult]) -> Summary {
    if results.is_empty() {
        return Summary::default();
    }
    let n = results.len() as f64;
    Summary {
        success_rate: results.iter().filter(|r| r.success).count() as f64 / n,
        avg_recall: results.iter().map(|r| r.recall).sum::<f64>() / n,
        avg_precision: results.iter().map(|r| r.precision).sum::<f64>() / n,
        avg_f1: results.iter().map(|r| r.f1).sum::<f64>() / n,
    }
}
