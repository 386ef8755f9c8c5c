//! Heuristic, readability-style content extraction.
//!
//! Strategy 1 of the extraction stage. The document must already be cleaned
//! with the noise denylist (see [`Document::parse_cleaned`]).
//!
//! 1. Score every candidate container with [`score_element`]
//! 2. Propagate half of each candidate's score to its parent and a third to
//!    its grandparent
//! 3. Pick the best of the top candidates
//! 4. Join qualifying siblings in document order
//! 5. Drop link-heavy blocks from the result

use std::cmp::Ordering;
use std::collections::HashMap;

use ego_tree::NodeId;

use crate::parse::{Document, Element};
use crate::scoring::{ScoringConfig, link_density, score_element};
use crate::{ReadModeError, Result};

/// Tags that are considered potential content containers
const CANDIDATE_SELECTOR: &str = "div, article, section, main, p, td, pre, blockquote";

/// Link-heavy blocks considered for removal from the joined content
const LINK_HEAVY_SELECTOR: &str = "div, section, ul, ol, table, p";

/// Close top candidates that must share an ancestor for it to be promoted
const MIN_SHARED_CANDIDATES: usize = 3;

/// Configuration for readability extraction
#[derive(Debug, Clone)]
pub struct ReadabilityConfig {
    /// Minimum characters for the content; elements shorter than a tenth of
    /// this are not scored on their own
    pub char_threshold: usize,
    /// Number of best candidates considered for the final pick
    pub max_top_candidates: usize,
    /// Minimum score of the top candidate
    pub min_score: f64,
    /// Siblings scoring at least `top * sibling_threshold` are included
    pub sibling_threshold: f64,
    /// Blocks above this link density are dropped from the output
    pub max_link_density: f64,
    pub scoring: ScoringConfig,
}

impl Default for ReadabilityConfig {
    fn default() -> Self {
        Self {
            char_threshold: 100,
            max_top_candidates: 5,
            min_score: 10.0,
            sibling_threshold: 0.2,
            max_link_density: 0.5,
            scoring: ScoringConfig::default(),
        }
    }
}

/// The main content found by the heuristic
#[derive(Debug, Clone)]
pub struct ReadabilityContent {
    /// Joined outer HTML of the top candidate and its siblings
    pub content: String,
    pub top_score: f64,
    /// Number of top-level elements joined into `content`
    pub element_count: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    element: Element<'a>,
    score: f64,
}

/// Run the heuristic on a cleaned document.
///
/// # Errors
///
/// - [`ReadModeError::NoContent`] when nothing could be scored
/// - [`ReadModeError::NotReadable`] when the best score is below `min_score`
pub fn extract_content(doc: &Document, config: &ReadabilityConfig) -> Result<ReadabilityContent> {
    let found = extract_best(doc, config)?;
    if found.top_score < config.min_score {
        return Err(ReadModeError::NotReadable { score: found.top_score, threshold: config.min_score });
    }
    Ok(found)
}

/// Like [`extract_content`] without the `min_score` check, so the best
/// attempt on a low-scoring page is still available.
///
/// # Errors
///
/// [`ReadModeError::NoContent`] when nothing could be scored
pub fn extract_best(doc: &Document, config: &ReadabilityConfig) -> Result<ReadabilityContent> {
    let scores = score_candidates(doc, config)?;

    let mut ranked: Vec<Candidate<'_>> = scores
        .iter()
        .filter_map(|(id, score)| doc.element(*id).map(|element| Candidate { element, score: *score }))
        .collect();
    ranked.sort_by(|a, b| compare_candidates(b, a));
    ranked.truncate(config.max_top_candidates.max(1));

    let best = *ranked.first().ok_or(ReadModeError::NoContent)?;
    let top = promote_shared_ancestor(&ranked, &scores, config);

    let parts = collect_siblings(top, &scores, config);
    let content = parts
        .iter()
        .map(|element| strip_link_heavy(element, config.max_link_density))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(ReadabilityContent { content, top_score: best.score, element_count: parts.len() })
}

/// Initial scores plus propagated ancestor scores, keyed by node.
fn score_candidates(doc: &Document, config: &ReadabilityConfig) -> Result<HashMap<NodeId, f64>> {
    let min_chars = config.char_threshold / 10;
    let mut scores: HashMap<NodeId, f64> = HashMap::new();
    let mut initial: Vec<(Element<'_>, f64)> = Vec::new();

    for element in doc.select(CANDIDATE_SELECTOR)? {
        let tag = element.tag_name();
        if !matches!(tag.as_str(), "article" | "section" | "main") && element.text_len() < min_chars {
            continue;
        }
        let score = score_element(&element, &config.scoring).total;
        scores.insert(element.id(), score);
        initial.push((element, score));
    }

    for (element, score) in initial {
        let ancestors = std::iter::successors(element.parent(), Element::parent).take(2);
        for (level, ancestor) in ancestors.enumerate() {
            if matches!(ancestor.tag_name().as_str(), "html" | "head") {
                break;
            }
            let divider = if level == 0 { 2.0 } else { 3.0 };
            let entry = scores
                .entry(ancestor.id())
                .or_insert_with(|| score_element(&ancestor, &config.scoring).total);
            *entry += score / divider;
        }
    }

    Ok(scores)
}

/// The best candidate, or its nearest ancestor holding at least
/// [`MIN_SHARED_CANDIDATES`] of the other close top candidates.
///
/// Close means scoring at least three quarters of the best. Content split
/// across sibling containers is recovered this way. `body` is never promoted.
fn promote_shared_ancestor<'a>(
    ranked: &[Candidate<'a>], scores: &HashMap<NodeId, f64>, config: &ReadabilityConfig,
) -> Candidate<'a> {
    let best = ranked[0];
    let alternatives: Vec<Element<'a>> = ranked[1..]
        .iter()
        .filter(|candidate| candidate.score >= best.score * 0.75 && !is_ancestor(&best.element, &candidate.element))
        .map(|candidate| candidate.element)
        .collect();
    if alternatives.len() < MIN_SHARED_CANDIDATES {
        return best;
    }

    let mut ancestor = best.element.parent();
    while let Some(element) = ancestor {
        if matches!(element.tag_name().as_str(), "body" | "html") {
            break;
        }

        let contained = alternatives.iter().filter(|alt| is_ancestor(&element, alt)).count();
        if contained >= MIN_SHARED_CANDIDATES {
            let score = scores
                .get(&element.id())
                .copied()
                .unwrap_or_else(|| score_element(&element, &config.scoring).total);
            return Candidate { element, score };
        }
        ancestor = element.parent();
    }

    best
}

fn is_ancestor(ancestor: &Element<'_>, element: &Element<'_>) -> bool {
    std::iter::successors(element.parent(), Element::parent).any(|parent| parent.id() == ancestor.id())
}

/// Higher score wins; ties go to semantic containers, then to longer text.
fn compare_candidates(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.score
        .partial_cmp(&b.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| container_priority(&a.element).cmp(&container_priority(&b.element)))
        .then_with(|| a.element.text_len().cmp(&b.element.text_len()))
}

fn container_priority(element: &Element<'_>) -> u8 {
    match element.tag_name().as_str() {
        "article" | "main" | "section" => 3,
        "div" => 2,
        _ => 1,
    }
}

/// The top candidate and every qualifying sibling, in document order.
///
/// A sibling qualifies when its score reaches `top * sibling_threshold`, or
/// when it is a prose paragraph: longer than 80 characters with a link
/// density under 0.25.
fn collect_siblings<'a>(
    top: Candidate<'a>, scores: &HashMap<NodeId, f64>, config: &ReadabilityConfig,
) -> Vec<Element<'a>> {
    let Some(parent) = top.element.parent() else {
        return vec![top.element];
    };
    if matches!(parent.tag_name().as_str(), "html") {
        return vec![top.element];
    }

    let threshold = (top.score * config.sibling_threshold).max(config.min_score / 2.0);
    parent
        .children()
        .into_iter()
        .filter(|sibling| {
            if sibling.id() == top.element.id() {
                return true;
            }
            if scores.get(&sibling.id()).is_some_and(|score| *score >= threshold) {
                return true;
            }
            sibling.tag_name() == "p" && sibling.text_len() > 80 && link_density(sibling) < 0.25
        })
        .collect()
}

/// Outer HTML of `element` without descendants whose link density exceeds
/// `max_density`.
fn strip_link_heavy(element: &Element<'_>, max_density: f64) -> String {
    let mut html = element.outer_html();
    for block in element.select(LINK_HEAVY_SELECTOR).unwrap_or_default() {
        if block.text_len() > 0 && link_density(&block) > max_density {
            html = html.replacen(&block.outer_html(), "", 1);
        }
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::PreprocessConfig;

    fn cleaned(html: &str) -> Document {
        Document::parse_cleaned(html, &PreprocessConfig::default()).unwrap()
    }

    const PROSE: &str = "The committee met on Tuesday to review the proposal, and after a long debate, \
        members agreed that the plan would move forward with several amendments to the budget.";

    #[test]
    fn test_extracts_article_body() {
        let html = format!(
            r#"<html><body>
                <div class="sidebar"><p>Short sidebar text</p></div>
                <article class="main-content">
                    <h1>Main Article Title</h1>
                    <p>{PROSE}</p>
                    <p>{PROSE}</p>
                    <p>{PROSE}</p>
                </article>
            </body></html>"#
        );

        let doc = cleaned(&html);
        let result = extract_content(&doc, &ReadabilityConfig::default()).unwrap();

        assert!(result.content.contains("committee met on Tuesday"));
        assert!(result.content.contains("<p>"));
        assert!(!result.content.contains("Short sidebar text"));
        assert!(result.top_score >= 10.0);
    }

    #[test]
    fn test_parent_collects_paragraph_scores() {
        let html = format!(
            r#"<html><body>
                <div id="story">
                    <p>{PROSE}</p>
                    <p>{PROSE}</p>
                    <p>{PROSE}</p>
                    <p>{PROSE}</p>
                </div>
            </body></html>"#
        );

        let doc = cleaned(&html);
        let result = extract_content(&doc, &ReadabilityConfig::default()).unwrap();

        assert!(result.content.starts_with("<div id=\"story\">"));
        assert_eq!(result.content.matches("committee met").count(), 4);
    }

    #[test]
    fn test_siblings_join_in_document_order() {
        let html = format!(
            r#"<html><body><div id="wrap">
                <div class="post-text"><p>Opening part. {PROSE}</p><p>{PROSE}</p></div>
                <p>Bridge paragraph between parts, long enough to qualify as prose content on its own merits.</p>
                <div class="post-text"><p>Closing part. {PROSE}</p></div>
            </div></body></html>"#
        );

        let doc = cleaned(&html);
        let result = extract_content(&doc, &ReadabilityConfig::default()).unwrap();

        let opening = result.content.find("Opening part.").unwrap();
        let bridge = result.content.find("Bridge paragraph").unwrap();
        let closing = result.content.find("Closing part.").unwrap();
        assert!(opening < bridge && bridge < closing);
    }

    #[test]
    fn test_link_heavy_blocks_are_dropped() {
        let html = format!(
            r##"<html><body><article>
                <p>{PROSE}</p>
                <ul><li><a href="/a">Read more about the budget</a></li><li><a href="/b">Another story entirely</a></li></ul>
                <p>{PROSE}</p>
            </article></body></html>"##
        );

        let doc = cleaned(&html);
        let result = extract_content(&doc, &ReadabilityConfig::default()).unwrap();

        assert!(result.content.contains("committee met"));
        assert!(!result.content.contains("Read more about the budget"));
    }

    #[test]
    fn test_not_readable() {
        let html = r##"<html><body><div><a href="#">Link 1</a> <a href="#">Link 2</a> <a href="#">Link 3</a></div></body></html>"##;

        let doc = cleaned(html);
        let result = extract_content(&doc, &ReadabilityConfig::default());

        assert!(matches!(result, Err(ReadModeError::NotReadable { .. })));
    }

    #[test]
    fn test_best_attempt_below_min_score() {
        let html = r#"<html><body><div><p>The library will stay open late on Thursdays this spring while the reading room is repainted.</p></div></body></html>"#;

        let doc = cleaned(html);
        let config = ReadabilityConfig { min_score: 1000.0, ..Default::default() };

        assert!(matches!(extract_content(&doc, &config), Err(ReadModeError::NotReadable { .. })));
        let found = extract_best(&doc, &config).unwrap();
        assert!(found.content.contains("reading room is repainted"));
        assert!(found.top_score < 1000.0);
    }

    #[test]
    fn test_top_candidate_count_promotes_shared_wrapper() {
        let html = format!(
            r#"<html><body>
                <div id="lede"><p>{PROSE}</p></div>
                <div id="wrap">
                    <div id="a"><p>{PROSE}</p></div>
                    <div id="b"><p>{PROSE}</p></div>
                    <div id="c"><p>{PROSE}</p></div>
                    <div id="d"><p>{PROSE}</p></div>
                </div>
            </body></html>"#
        );

        let doc = cleaned(&html);
        let pick = |id: &str, score: f64| Candidate {
            element: doc.select_first(&format!("#{id}")).unwrap().unwrap(),
            score,
        };
        let ranked = vec![pick("a", 40.0), pick("b", 38.0), pick("c", 36.0), pick("d", 35.0), pick("lede", 12.0)];
        let mut scores: HashMap<NodeId, f64> = ranked.iter().map(|c| (c.element.id(), c.score)).collect();
        scores.insert(pick("wrap", 0.0).element.id(), 20.0);

        let top_id = |n: usize| {
            let config = ReadabilityConfig { max_top_candidates: n, ..Default::default() };
            promote_shared_ancestor(&ranked[..n.min(ranked.len())], &scores, &config).element.attr("id")
        };

        assert_eq!(top_id(1), Some("a"));
        assert_eq!(top_id(3), Some("a"));
        assert_eq!(top_id(5), Some("wrap"));
    }

    #[test]
    fn test_empty_document() {
        let doc = cleaned("<html><body></body></html>");
        let result = extract_content(&doc, &ReadabilityConfig::default());

        assert!(matches!(result, Err(ReadModeError::NoContent)));
    }
}
