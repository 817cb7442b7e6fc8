//! Slide rendering: markdown source -> sanitized HTML.
//!
//! Markdown goes through `pulldown-cmark`. Raw HTML in the source is emitted
//! as escaped text and script-capable URL schemes are replaced with `#`, so
//! the output can be mounted without executing anything from the slide.
//! Code blocks are highlighted server-side with `syntect` using CSS classes;
//! pair the output with [`highlight_stylesheet`].
use std::sync::OnceLock;

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::segmenter::segment;

const PLACEHOLDER_HTML: &str =
    "<div class=\"slide-placeholder\"><p>Start writing markdown to create slides.</p></div>";

const HIGHLIGHT_THEME: &str = "InspiredGitHub";

fn syntax_set() -> &'static SyntaxSet {
    static SET: OnceLock<SyntaxSet> = OnceLock::new();
    SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Render one slide source into sanitized HTML.
pub fn render(slide_source: &str) -> String {
    if slide_source.trim().is_empty() {
        return PLACEHOLDER_HTML.to_string();
    }

    let mut events: Vec<Event<'_>> = Vec::new();
    let mut code: Option<(String, String)> = None;

    for event in Parser::new_ext(slide_source, markdown_options()) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .unwrap_or_default()
                        .to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                code = Some((lang, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, body)) = code.take() {
                    events.push(Event::Html(CowStr::from(highlight_code(&body, &lang))));
                }
            }
            Event::Text(text) if code.is_some() => {
                if let Some((_, body)) = code.as_mut() {
                    body.push_str(&text);
                }
            }
            Event::Html(raw) | Event::InlineHtml(raw) => events.push(Event::Text(raw)),
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => events.push(Event::Start(Tag::Link {
                link_type,
                dest_url: sanitize_url(dest_url),
                title,
                id,
            })),
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => events.push(Event::Start(Tag::Image {
                link_type,
                dest_url: sanitize_url(dest_url),
                title,
                id,
            })),
            other => events.push(other),
        }
    }

    let mut output = String::with_capacity(slide_source.len() * 2);
    html::push_html(&mut output, events.into_iter());
    output
}

/// Render the slide at `index` (clamped) of a whole document.
pub fn render_slide(text: &str, index: usize) -> String {
    let slides = segment(text);
    let index = index.min(slides.len() - 1);
    render(&slides[index])
}

/// Render every slide of a document, in order.
pub fn render_all(text: &str) -> Vec<String> {
    segment(text).iter().map(|slide| render(slide)).collect()
}

/// CSS for the classes emitted inside highlighted code blocks.
pub fn highlight_stylesheet() -> String {
    let themes = ThemeSet::load_defaults();
    themes
        .themes
        .get(HIGHLIGHT_THEME)
        .and_then(|theme| css_for_theme_with_class_style(theme, ClassStyle::Spaced).ok())
        .unwrap_or_default()
}

fn sanitize_url(url: CowStr<'_>) -> CowStr<'_> {
    let scheme = url.trim_start().to_ascii_lowercase();
    if scheme.starts_with("javascript:") || scheme.starts_with("vbscript:") || scheme.starts_with("data:") {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

fn highlight_code(code: &str, lang: &str) -> String {
    let set = syntax_set();
    let syntax = if lang.is_empty() {
        set.find_syntax_plain_text()
    } else {
        set.find_syntax_by_token(lang)
            .unwrap_or_else(|| set.find_syntax_plain_text())
    };

    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, set, ClassStyle::Spaced);
    let mut body_ok = true;
    for line in LinesWithEndings::from(code) {
        if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
            log::debug!(target: "slidegist.render", "highlighting failed for {}: {}", lang, e);
            body_ok = false;
            break;
        }
    }
    let body = if body_ok {
        generator.finalize()
    } else {
        html_escape::encode_text(code).into_owned()
    };

    let class = if lang.is_empty() {
        String::new()
    } else {
        format!(
            " class=\"language-{}\"",
            html_escape::encode_double_quoted_attribute(lang)
        )
    };
    format!("<pre class=\"code\"><code{}>{}</code></pre>\n", class, body)
}
