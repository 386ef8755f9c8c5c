use once_cell::sync::Lazy;
use regex::Regex;

use crate::parse::Element;

/// Weights for the content-density heuristic
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Adjustment for class/id names that suggest content
    pub positive_weight: f64,
    /// Adjustment for class/id names that suggest boilerplate
    pub negative_weight: f64,
    /// Characters per density point
    pub chars_per_point: usize,
    /// Cap on the character density contribution
    pub max_char_points: f64,
    /// Cap on the comma density contribution
    pub max_comma_points: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { positive_weight: 25.0, negative_weight: -25.0, chars_per_point: 100, max_char_points: 3.0, max_comma_points: 3.0 }
    }
}

/// Breakdown of one element's score
#[derive(Debug, Clone, PartialEq)]
pub struct ElementScore {
    pub tag_weight: f64,
    pub class_weight: f64,
    pub density: f64,
    pub link_density: f64,
    pub total: f64,
}

static POSITIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(article|body|content|entry|hentry|h-entry|main|page|post|text|blog|story)").unwrap()
});
static NEGATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(banner|breadcrumbs?|combx|comment|community|disqus|extra|foot|header|menu|related|remark|rss|shoutbox|sidebar|sponsor|ad-break|agegate|pagination|pager|popup|promo|share|social|widget)").unwrap()
});

/// How likely a tag is to wrap main content.
///
/// - ARTICLE: +10
/// - SECTION: +8
/// - DIV, MAIN: +5
/// - TD, BLOCKQUOTE: +3
/// - FORM, ADDRESS, lists: -3
/// - headings, TH, HEADER, FOOTER, NAV: -5
pub fn tag_weight(element: &Element<'_>) -> f64 {
    match element.tag_name().as_str() {
        "article" => 10.0,
        "section" => 8.0,
        "div" | "main" => 5.0,
        "td" | "blockquote" => 3.0,
        "form" | "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" | "header" | "footer" | "nav" => -5.0,
        _ => 0.0,
    }
}

/// Class/id adjustment. The id is checked first; positive wins within a name.
pub fn class_weight(element: &Element<'_>, config: &ScoringConfig) -> f64 {
    let names = element
        .attr("id")
        .into_iter()
        .chain(element.attr("class").into_iter().flat_map(str::split_whitespace));

    for name in names {
        if POSITIVE.is_match(name) {
            return config.positive_weight;
        }
        if NEGATIVE.is_match(name) {
            return config.negative_weight;
        }
    }

    0.0
}

/// Points for text length and comma count, both capped.
pub fn text_density(text: &str, config: &ScoringConfig) -> f64 {
    let chars = text.trim().chars().count();
    let char_points = ((chars / config.chars_per_point.max(1)) as f64).min(config.max_char_points);
    let comma_points = (text.matches(',').count() as f64).min(config.max_comma_points);

    char_points + comma_points
}

/// Ratio of link text to all text, from 0.0 (no links) to 1.0.
pub fn link_density(element: &Element<'_>) -> f64 {
    let text_length = element.text().chars().count();
    if text_length == 0 {
        return 0.0;
    }

    let link_length: usize = element
        .select("a")
        .unwrap_or_default()
        .iter()
        .map(|link| link.text().chars().count())
        .sum();

    (link_length as f64 / text_length as f64).min(1.0)
}

fn looks_like_code(text: &str) -> bool {
    let len = text.len();
    if len <= 50 {
        return false;
    }
    let ratio = |count: usize| count as f64 / len as f64;
    let special = text.chars().filter(|c| !c.is_alphanumeric() && !c.is_whitespace()).count();

    ratio(special) > 0.15 && ratio(text.matches(',').count()) < 0.01 && ratio(text.matches(' ').count()) < 0.15
}

/// Score one element.
///
/// `(tag + class + density + code penalty) * link penalty`, where the link
/// penalty is `1 - link_density`, halved in strength for elements that are
/// content-named or carry more than 500 characters.
pub fn score_element(element: &Element<'_>, config: &ScoringConfig) -> ElementScore {
    let text = element.text();
    let tag_weight = tag_weight(element);
    let class_weight = class_weight(element, config);
    let density = text_density(&text, config);
    let link_density = link_density(element);

    let code_penalty = if element.tag_name() == "pre" && looks_like_code(&text) { -10.0 } else { 0.0 };
    let lenient = class_weight > 0.0 || text.chars().count() > 500;
    let link_penalty = if lenient { 1.0 - link_density * 0.5 } else { 1.0 - link_density };

    let total = (tag_weight + class_weight + density + code_penalty) * link_penalty;

    ElementScore { tag_weight, class_weight, density, link_density, total }
}
