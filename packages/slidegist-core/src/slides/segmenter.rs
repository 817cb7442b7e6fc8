//! Markdown-to-slide segmentation.
//!
//! A slide starts at every level-1 or level-2 heading line (`# ` / `## `).
//! Deeper headings stay inside the current slide. The split is a partition
//! of the input: joining the slides with `\n` gives back the (LF-normalized)
//! source text.
//!
//! ```text
//! # Intro            <- slide 1
//! welcome
//! ### detail         <- still slide 1
//! ## Second          <- slide 2
//! more
//! ```
use std::sync::OnceLock;

use regex::Regex;

fn boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#{1,2} ").unwrap())
}

/// True if `line` opens a new slide.
pub fn is_slide_boundary(line: &str) -> bool {
    boundary_re().is_match(line)
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Split markdown into slide sources.
///
/// Never returns an empty vector. Blank input yields a single blank slide,
/// which the renderer shows as a placeholder.
pub fn segment(text: &str) -> Vec<String> {
    let text = normalize_line_endings(text);

    if text.trim().is_empty() {
        return vec![text];
    }

    let mut slides = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    // Leading lines without a heading are carried into the first slide.
    let mut current_has_boundary = false;

    for line in text.split('\n') {
        if is_slide_boundary(line) {
            if current_has_boundary {
                slides.push(current.join("\n"));
                current.clear();
            }
            current_has_boundary = true;
        }
        current.push(line);
    }

    if !current.is_empty() {
        slides.push(current.join("\n"));
    }

    if slides.is_empty() {
        slides.push(String::new());
    }
    slides
}

/// Number of slides `text` segments into (always >= 1).
pub fn slide_count(text: &str) -> usize {
    segment(text).len()
}

/// The slide at `index`, clamped to the last slide.
pub fn slide_at(text: &str, index: usize) -> String {
    let mut slides = segment(text);
    let index = index.min(slides.len() - 1);
    slides.swap_remove(index)
}

/// Heading text of the slide's opening boundary line, if it has one.
pub fn slide_title(slide: &str) -> Option<String> {
    slide
        .split('\n')
        .find(|line| is_slide_boundary(line))
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .filter(|title| !title.is_empty())
}
