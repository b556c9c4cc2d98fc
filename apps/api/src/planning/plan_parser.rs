//! Plan text parser: turns the semi-structured plan text into research
//! bullets and day-banded, field-tagged plan items.
//!
//! Grammar (every anchor optional):
//!
//! ```text
//! ## Research & Context      bullet lines, "Title: content" or free text
//! ## First 90 Days Plan      everything to the end of the text
//!   Days 1-30 / 31-60 / 61-90   band headers; otherwise one "Plan" band
//!     **Title:** ...            item delimiter
//!     **Objective:** / **Experience:** / **Action:**  fields
//! ```
//!
//! Pure and total over all inputs. Anything that cannot be extracted is
//! `None`; a structural failure degrades to an empty render.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum PlanParseError {
    #[error("Invalid {what} range {start}..{end} in plan text")]
    InvalidRange {
        what: &'static str,
        start: usize,
        end: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResearchBullet {
    pub title: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedPlanItem {
    /// 1-based position within its band.
    pub position: usize,
    pub title: Option<String>,
    pub objective: Option<String>,
    pub experience: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DayBand {
    #[serde(rename = "Days 1-30")]
    Days1To30,
    #[serde(rename = "Days 31-60")]
    Days31To60,
    #[serde(rename = "Days 61-90")]
    Days61To90,
    /// Catch-all when no band header is present.
    #[serde(rename = "Plan")]
    Plan,
}

impl DayBand {
    pub fn label(self) -> &'static str {
        match self {
            DayBand::Days1To30 => "Days 1-30",
            DayBand::Days31To60 => "Days 31-60",
            DayBand::Days61To90 => "Days 61-90",
            DayBand::Plan => "Plan",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSection {
    pub label: DayBand,
    pub items: Vec<ParsedPlanItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedPlan {
    pub research: Vec<ResearchBullet>,
    pub sections: Vec<PlanSection>,
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

static RESEARCH_HEADER: Lazy<Regex> = Lazy::new(|| re(r"(?i)##\s*Research\s*&\s*Context\s*\n"));
static PLAN_HEADER: Lazy<Regex> = Lazy::new(|| re(r"(?i)##\s*First\s*90\s*Days\s*Plan\s*\n"));
static HASHES: Lazy<Regex> = Lazy::new(|| re(r"#+"));

static BULLET_MARKER: Lazy<Regex> = Lazy::new(|| re(r"^[-*•]\s*"));
static NUMBERING: Lazy<Regex> = Lazy::new(|| re(r"^\d+\.\s*"));
static TITLED_LINE: Lazy<Regex> = Lazy::new(|| re(r"^([^:]+):\s*(.+)$"));

/// Band headers (must be followed by a colon or newline) and the looser
/// forms that end the previous band.
static BAND_HEADERS: Lazy<[(DayBand, Regex, Regex); 3]> = Lazy::new(|| {
    [
        (
            DayBand::Days1To30,
            re(r"(?i)Days?\s*1\s*[-–]\s*30\s*[:\n]"),
            re(r"(?i)Days?\s*1\s*[-–]\s*30"),
        ),
        (
            DayBand::Days31To60,
            re(r"(?i)Days?\s*31\s*[-–]\s*60\s*[:\n]"),
            re(r"(?i)Days?\s*31\s*[-–]\s*60"),
        ),
        (
            DayBand::Days61To90,
            re(r"(?i)Days?\s*61\s*[-–]\s*90\s*[:\n]"),
            re(r"(?i)Days?\s*61\s*[-–]\s*90"),
        ),
    ]
});

static ITEM_DELIMITER: Lazy<Regex> = Lazy::new(|| re(r"(?i)\*\*Title:\*\*"));
static ANY_FIELD_MARKER: Lazy<Regex> = Lazy::new(|| re(r"(?i)(?:Objective|Experience|Action):"));
static HEADER_ONLY: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)^(Days?\s*\d+\s*[-–]\s*\d+|First\s*\d+\s*Days?\s*Plan)[:\s]*$"));
static STARTS_WITH_FIELD: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)^(Objective|Experience|Action|Title):"));

/// End of a `**Field:**` value: the next bold field marker.
static BOLD_FIELD_END: Lazy<Regex> = Lazy::new(|| re(r"(?i)\*\*[A-Za-z]+:"));
/// End of a plain `Field:` value: a later line starting with a field name.
static PLAIN_FIELD_END: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\n\s*(?:Objective|Experience|Action|Title):"));
static PLAIN_TITLE_LINE: Lazy<Regex> = Lazy::new(|| re(r"(?im)^Title:\s*(.+)$"));

struct FieldPatterns {
    bold: Regex,
    plain: Regex,
}

static FIELDS: Lazy<[FieldPatterns; 4]> = Lazy::new(|| {
    ["Title", "Objective", "Experience", "Action"].map(|name| FieldPatterns {
        bold: re(&format!(r"(?i)\*\*{name}:\*\*")),
        plain: re(&format!(r"(?i){name}:")),
    })
});

const TITLE: usize = 0;
const OBJECTIVE: usize = 1;
const EXPERIENCE: usize = 2;
const ACTION: usize = 3;

/// Parses plan text for rendering. Never fails: a structural error is
/// reported at `warn!` and yields an empty render.
pub fn parse_plan_text(text: &str) -> RenderedPlan {
    match try_parse(text) {
        Ok(rendered) => rendered,
        Err(e) => {
            warn!("Plan text could not be parsed, rendering nothing: {e}");
            RenderedPlan::default()
        }
    }
}

fn try_parse(text: &str) -> Result<RenderedPlan, PlanParseError> {
    let research = match RESEARCH_HEADER.find(text) {
        Some(header) => {
            let body = &text[header.end()..];
            let end = body.find("##").unwrap_or(body.len());
            let section = strip_hashes(slice(body, 0, end, "research")?.trim());
            parse_research_bullets(&section)
        }
        None => Vec::new(),
    };

    let plan_block = match PLAN_HEADER.find(text) {
        Some(header) => strip_hashes(text[header.end()..].trim()),
        None => strip_hashes(text),
    };

    Ok(RenderedPlan {
        research,
        sections: split_bands(&plan_block)?,
    })
}

fn slice<'a>(
    text: &'a str,
    start: usize,
    end: usize,
    what: &'static str,
) -> Result<&'a str, PlanParseError> {
    text.get(start..end)
        .ok_or(PlanParseError::InvalidRange { what, start, end })
}

fn strip_hashes(text: &str) -> String {
    HASHES.replace_all(text, "").into_owned()
}

fn clean_text(text: &str) -> String {
    strip_hashes(text).replace("**", "").trim().to_string()
}

fn parse_research_bullets(section: &str) -> Vec<ResearchBullet> {
    section
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let cleaned = BULLET_MARKER.replace(line.trim(), "").trim().replace("**", "");

            if let Some(caps) = TITLED_LINE.captures(&cleaned) {
                return ResearchBullet {
                    title: Some(caps[1].trim().to_string()),
                    content: caps[2].trim().to_string(),
                };
            }

            let words: Vec<&str> = cleaned.split_whitespace().collect();
            if words.len() > 3 {
                ResearchBullet {
                    title: Some(words[..2].join(" ")),
                    content: words[2..].join(" "),
                }
            } else {
                ResearchBullet {
                    title: None,
                    content: cleaned,
                }
            }
        })
        .filter(|bullet| !bullet.content.is_empty())
        .collect()
}

fn split_bands(plan_block: &str) -> Result<Vec<PlanSection>, PlanParseError> {
    let mut sections = Vec::new();

    for (idx, (band, header, _)) in BAND_HEADERS.iter().enumerate() {
        let Some(found) = header.find(plan_block) else {
            continue;
        };
        let start = found.end();
        let end = BAND_HEADERS[idx + 1..]
            .iter()
            .filter_map(|(_, _, boundary)| boundary.find_at(plan_block, start))
            .map(|m| m.start())
            .min()
            .unwrap_or(plan_block.len());

        let body = slice(plan_block, start, end, band.label())?;
        sections.push(PlanSection {
            label: *band,
            items: parse_items(body),
        });
    }

    if sections.is_empty() {
        sections.push(PlanSection {
            label: DayBand::Plan,
            items: parse_items(plan_block),
        });
    }
    Ok(sections)
}

fn parse_items(band_text: &str) -> Vec<ParsedPlanItem> {
    if band_text.trim().is_empty() {
        return Vec::new();
    }

    ITEM_DELIMITER
        .split(band_text)
        .enumerate()
        .filter_map(|(idx, fragment)| {
            let fragment = fragment.trim();
            if fragment.chars().count() < 5 {
                return None;
            }
            // Text before the first delimiter is usually the band heading.
            if idx == 0 && !ANY_FIELD_MARKER.is_match(fragment) {
                return None;
            }
            if HEADER_ONLY.is_match(fragment) {
                return None;
            }
            parse_item(fragment)
        })
        .enumerate()
        .map(|(i, mut item)| {
            item.position = i + 1;
            item
        })
        .collect()
}

fn parse_item(fragment: &str) -> Option<ParsedPlanItem> {
    let text = strip_hashes(fragment);
    let text = text.trim();

    let objective = extract_field(OBJECTIVE, text);
    let experience = extract_field(EXPERIENCE, text);
    let action = extract_field(ACTION, text);
    let title = extract_title(text);

    if title.is_none() && objective.is_none() && experience.is_none() && action.is_none() {
        return None;
    }

    Some(ParsedPlanItem {
        position: 0,
        title,
        objective,
        experience,
        action,
    })
}

/// Extracts `**Field:** value`, falling back to plain `Field: value`. The
/// first form that finds its marker decides the result, so a marker with an
/// empty value yields `None`.
fn extract_field(field: usize, text: &str) -> Option<String> {
    let patterns = &FIELDS[field];
    if let Some(value) = value_after(text, &patterns.bold, &BOLD_FIELD_END) {
        return value;
    }
    value_after(text, &patterns.plain, &PLAIN_FIELD_END).flatten()
}

/// `None` when the marker is absent; `Some(None)` when it is present but its
/// value is empty.
fn value_after(text: &str, marker: &Regex, terminator: &Regex) -> Option<Option<String>> {
    let found = marker.find(text)?;
    let rest = &text[found.end()..];
    if rest.is_empty() {
        return None;
    }

    // The value is at least one character long, so a terminator right after
    // the marker does not count. Whitespace before the next marker does.
    let end = rest
        .char_indices()
        .nth(1)
        .and_then(|(from, _)| terminator.find_at(rest, from))
        .map(|m| m.start())
        .unwrap_or(rest.len());

    let cleaned = clean_text(&rest[..end]);
    Some((!cleaned.is_empty()).then_some(cleaned))
}

fn extract_title(text: &str) -> Option<String> {
    if let Some(Some(title)) = value_after(text, &FIELDS[TITLE].bold, &BOLD_FIELD_END) {
        return Some(title);
    }

    if let Some(caps) = PLAIN_TITLE_LINE.captures(text) {
        let title = clean_text(&caps[1]);
        if !title.is_empty() {
            return Some(title);
        }
    }

    match ANY_FIELD_MARKER.find(text) {
        Some(first_field) => {
            let before = text[..first_field.start()].trim();
            if before.is_empty() || STARTS_WITH_FIELD.is_match(before) {
                return None;
            }
            let before = clean_text(before);
            let before = NUMBERING.replace(&before, "");
            let title = BULLET_MARKER.replace(&before, "").trim().to_string();
            (!title.is_empty()).then_some(title)
        }
        None => {
            let first_line = text.lines().find(|l| !l.trim().is_empty())?;
            let title = clean_text(first_line);
            (!title.is_empty() && !STARTS_WITH_FIELD.is_match(&title)).then_some(title)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::plan::FALLBACK_PLAN;

    #[test]
    fn test_fallback_template_yields_three_titled_sections() {
        let rendered = parse_plan_text(FALLBACK_PLAN);

        let labels: Vec<DayBand> = rendered.sections.iter().map(|s| s.label).collect();
        assert_eq!(
            labels,
            vec![DayBand::Days1To30, DayBand::Days31To60, DayBand::Days61To90]
        );
        for section in &rendered.sections {
            assert_eq!(section.items.len(), 3);
            assert!(section.items.iter().all(|item| item.title.is_some()));
        }

        let first = &rendered.sections[0].items[0];
        assert_eq!(first.position, 1);
        assert_eq!(first.title.as_deref(), Some("Map the ML infrastructure"));
        assert_eq!(
            first.objective.as_deref(),
            Some("Understand data pipelines, model serving architecture, and monitoring systems.")
        );
        assert_eq!(
            first.action.as_deref(),
            Some("Identify the deployment patterns and MLOps workflows in place.")
        );

        assert_eq!(rendered.research.len(), 3);
        assert_eq!(rendered.research[0].title.as_deref(), Some("Role Focus"));
    }

    #[test]
    fn test_parser_is_total_on_degenerate_input() {
        let empty = parse_plan_text("");
        assert!(empty.research.is_empty());
        assert!(empty.sections.iter().all(|s| s.items.is_empty()));

        let no_headers = parse_plan_text("Just some prose about the role without structure.");
        assert_eq!(no_headers.sections.len(), 1);
        assert_eq!(no_headers.sections[0].label, DayBand::Plan);

        let unbalanced = parse_plan_text("**Title:** **Objective:** **Action:**\n**Experience: ** **");
        assert!(unbalanced.sections.len() <= 1);

        for odd in ["##", "**Title:**", "Days 1-30:", "Days 61-90:\n**Title:**", "•\n-\n*", "é**Title:**ü"] {
            let _ = parse_plan_text(odd);
        }
    }

    #[test]
    fn test_research_bullet_titles() {
        let rendered = parse_plan_text(
            "## Research & Context\n\
             - **Business Model:** Payments for SMBs\n\
             - Heavy focus on real-time fraud detection\n\
             - Short line\n\
             -\n\
             ## First 90 Days Plan\n",
        );

        assert_eq!(
            rendered.research,
            vec![
                ResearchBullet {
                    title: Some("Business Model".to_string()),
                    content: "Payments for SMBs".to_string(),
                },
                ResearchBullet {
                    title: Some("Heavy focus".to_string()),
                    content: "on real-time fraud detection".to_string(),
                },
                ResearchBullet {
                    title: None,
                    content: "Short line".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_research_ends_at_next_header() {
        let rendered = parse_plan_text("## Research & Context\n- A: b\n## Something Else\n- C: d\n");
        assert_eq!(rendered.research.len(), 1);
    }

    #[test]
    fn test_bands_are_case_insensitive_and_singular() {
        let text = "## First 90 Days Plan\n\
                    day 1-30:\n**Title:** One\n**Objective:** First\n\
                    DAYS 31-60:\n**Title:** Two\n**Action:** Second\n";
        let rendered = parse_plan_text(text);

        assert_eq!(rendered.sections.len(), 2);
        assert_eq!(rendered.sections[0].items[0].title.as_deref(), Some("One"));
        assert_eq!(rendered.sections[1].label, DayBand::Days31To60);
        assert_eq!(rendered.sections[1].items[0].action.as_deref(), Some("Second"));
    }

    #[test]
    fn test_text_without_bands_goes_to_plan_band() {
        let text = "**Title:** Learn the stack\n**Objective:** Read code\n\n**Title:** Ship\n**Action:** Deploy";
        let rendered = parse_plan_text(text);

        assert_eq!(rendered.sections.len(), 1);
        assert_eq!(rendered.sections[0].label, DayBand::Plan);
        let positions: Vec<usize> = rendered.sections[0].items.iter().map(|i| i.position).collect();
        assert_eq!(positions, vec![1, 2]);
    }

    #[test]
    fn test_plain_field_markers_are_recognised() {
        let item = parse_item("1. Audit pipelines\nObjective: Know the data\nAction: Read DAGs").unwrap();
        assert_eq!(item.title.as_deref(), Some("Audit pipelines"));
        assert_eq!(item.objective.as_deref(), Some("Know the data"));
        assert_eq!(item.action.as_deref(), Some("Read DAGs"));
        assert_eq!(item.experience, None);
    }

    #[test]
    fn test_empty_field_does_not_borrow_the_next_one() {
        let item = parse_item(
            "Audit the stack\n**Objective:** \n**Experience:** Built ETL at BILL\n**Action:** Read DAGs",
        )
        .unwrap();
        assert_eq!(item.title.as_deref(), Some("Audit the stack"));
        assert_eq!(item.objective, None);
        assert_eq!(item.experience.as_deref(), Some("Built ETL at BILL"));
        assert_eq!(item.action.as_deref(), Some("Read DAGs"));
    }

    #[test]
    fn test_item_without_field_markers_uses_first_line_as_title() {
        let item = parse_item("Meet the team\nand learn the roadmap").unwrap();
        assert_eq!(item.title.as_deref(), Some("Meet the team"));
        assert_eq!(item.objective, None);
    }

    #[test]
    fn test_leading_fragment_with_fields_is_kept() {
        let items = parse_items("**Objective:** Orphan objective\n**Title:** Real item\n**Action:** Go");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, None);
        assert_eq!(items[0].objective.as_deref(), Some("Orphan objective"));
        assert_eq!(items[1].title.as_deref(), Some("Real item"));
    }

    #[test]
    fn test_header_only_and_short_fragments_are_dropped() {
        let items = parse_items("Days 1-30:\n**Title:** abc\n**Title:** Days 31-60:\n**Title:** Keep me\n**Action:** Do it");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title.as_deref(), Some("Keep me"));
    }

    #[test]
    fn test_day_band_serializes_as_label() {
        assert_eq!(serde_json::to_string(&DayBand::Days31To60).unwrap(), "\"Days 31-60\"");
        assert_eq!(serde_json::to_string(&DayBand::Plan).unwrap(), "\"Plan\"");
    }
}
