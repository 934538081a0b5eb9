//! Display names, styled text and CSS class helpers.

use std::sync::LazyLock;

use convert_case::{Case, Casing};
use itertools::Itertools;
use regex::{Captures, Regex};

use crate::config::NameConfig;
use crate::guide::types::ShopKind;

// =============================================================================
// Class display names
// =============================================================================

/// Turns raw class identifiers such as `T3_Male_Holy_Knight_Ewan` into
/// display names such as `Holy Knight (Male Ewan)`.
#[derive(Debug, Clone)]
pub struct DisplayNameNormalizer {
    gender_tokens: Vec<String>,
    filler_tokens: Vec<String>,
    vocabulary: Vec<String>,
}

impl Default for DisplayNameNormalizer {
    fn default() -> Self {
        Self::new(&NameConfig::default())
    }
}

fn is_tier_token(token: &str) -> bool {
    token.len() > 1
        && token.starts_with(['T', 't'])
        && token[1..].chars().all(|c| c.is_ascii_digit())
}

/// Start and length of the first run of `tokens` spelling `candidate` word
/// for word, ignoring case.
fn find_run(tokens: &[&str], candidate: &str) -> Option<(usize, usize)> {
    let words: Vec<&str> = candidate.split_whitespace().collect();
    if words.is_empty() || words.len() > tokens.len() {
        return None;
    }
    (0..=tokens.len() - words.len())
        .find(|&start| {
            tokens[start..start + words.len()]
                .iter()
                .zip(&words)
                .all(|(token, word)| token.eq_ignore_ascii_case(word))
        })
        .map(|start| (start, words.len()))
}

impl DisplayNameNormalizer {
    pub fn new(config: &NameConfig) -> Self {
        Self {
            gender_tokens: config.gender_tokens.clone(),
            filler_tokens: config.filler_tokens.clone(),
            vocabulary: config.class_vocabulary.clone(),
        }
    }

    pub fn normalize(&self, identifier: &str) -> String {
        self.normalize_with_name(identifier, None)
    }

    /// Like [`Self::normalize`], with the record's own name tried as a base
    /// class name ahead of the vocabulary.
    pub fn normalize_with_name(&self, identifier: &str, name: Option<&str>) -> String {
        let tokens: Vec<&str> = identifier
            .split(['_', ' '])
            .filter(|token| !token.is_empty())
            .filter(|token| !is_tier_token(token))
            .filter(|token| !self.filler_tokens.iter().any(|filler| filler == token))
            .collect();

        let name = name.map(strip_markup);
        let candidates = name
            .iter()
            .map(String::as_str)
            .chain(self.vocabulary.iter().map(String::as_str));

        let mut best: Option<(&str, usize, usize)> = None;
        for candidate in candidates {
            if let Some((start, len)) = find_run(&tokens, candidate) {
                if best.is_none_or(|(_, _, best_len)| len > best_len) {
                    best = Some((candidate, start, len));
                }
            }
        }

        let (label, suffix) = match best {
            Some((label, start, len)) => {
                let suffix = tokens[..start]
                    .iter()
                    .chain(&tokens[start + len..])
                    .join(" ");
                (label.split_whitespace().join(" "), suffix)
            }
            None => {
                let (gender, rest): (Vec<&str>, Vec<&str>) = tokens
                    .iter()
                    .copied()
                    .partition(|token| self.gender_tokens.iter().any(|g| g == token));
                if rest.is_empty() {
                    (gender.join(" "), String::new())
                } else {
                    (rest.join(" "), gender.join(" "))
                }
            }
        };

        if suffix.is_empty() {
            label
        } else {
            format!("{label} ({suffix})")
        }
    }
}

// =============================================================================
// Styled text
// =============================================================================

static STYLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(.*?)>(.*?)</>").expect("style tag pattern"));
static EVAL_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{e:.*?\}").expect("eval tag pattern"));
static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<\w+[^>]*>.*?((</\w+>)|/>)").expect("markup pattern")
});
static EMPTY_BRACKETS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\([ \t\r\n]*\)|\s*\[[ \t\r\n]*\]|\s*\{[ \t\r\n]*\}").expect("bracket pattern")
});
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("digit pattern"));

/// Renders engine text markup to HTML.
///
/// `<icon>Sword</>` becomes an icon span, `<red>text</>` a colored span, and
/// both `{br}` and newlines become `<br/>`. `{e:...}` expressions are dropped.
pub fn render_styled_text(raw: &str) -> String {
    let text = STYLE_TAG.replace_all(raw, |caps: &Captures| {
        let tag = &caps[1];
        let content = &caps[2];
        if tag.is_empty() || content.is_empty() {
            String::new()
        } else if tag == "icon" {
            format!(r#"<span class="{}-subIcon"></span>"#, css_class_name(content.trim()))
        } else {
            format!(r#"<span class="lt-color-{tag}">{content}</span>"#)
        }
    });
    let text = EVAL_TAG.replace_all(&text, "");
    text.replace('\n', "<br/>").replace("{br}", "<br/>")
}

/// Removes engine markup from a name, along with brackets it leaves empty.
pub fn strip_markup(raw: &str) -> String {
    let text = MARKUP.replace_all(raw, "");
    EMPTY_BRACKETS.replace_all(&text, "").into_owned()
}

// =============================================================================
// CSS helpers
// =============================================================================

/// CSS-safe class name derived from a nid. `Iron Sword` becomes `Iron-Sword`,
/// `Iron_Sword` becomes `Iron-sword`, and a leading non-letter gets an `xx`
/// prefix.
pub fn css_class_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .map(|c| match c {
            '_' => '-',
            ' ' => '_',
            c => c,
        })
        .collect();
    let cleaned = match cleaned.chars().next() {
        Some(first) if !first.is_alphabetic() => format!("xx{cleaned}"),
        _ => cleaned,
    };
    cleaned.split('_').map(capitalize).join("-")
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Icon classes for a record, e.g. `Iron-sword-item-icon Swords-icon`.
/// Empty when the record has no icon.
pub fn icon_class(nid: &str, icon_nid: Option<&str>, kind: &str) -> String {
    match icon_nid {
        Some(icon) => format!(
            "{}-{kind}-icon {}-icon",
            css_class_name(nid),
            css_class_name(icon)
        ),
        None => String::new(),
    }
}

// =============================================================================
// Ordering keys and shop names
// =============================================================================

/// Left-pads every run of digits to `width`, so `9A_Vendor` sorts before
/// `10B_Vendor` as plain strings.
pub fn pad_digits(text: &str, width: usize) -> String {
    DIGITS
        .replace_all(text, |caps: &Captures| format!("{:0>width$}", &caps[0]))
        .into_owned()
}

enum ShopLocation {
    Chapter(String),
    Place(String),
}

fn shop_location(nid: &str) -> Option<ShopLocation> {
    let mut cleaned = nid.to_string();
    for kind in ShopKind::ALL {
        cleaned = cleaned.replace(kind.nid_marker(), "");
    }
    let parts: Vec<&str> = cleaned
        .split('_')
        .filter(|part| !part.is_empty() && *part != "Global")
        .collect();
    let first = parts.first()?;
    if first.starts_with(|c: char| c.is_ascii_digit()) {
        Some(ShopLocation::Chapter(format!("Chapter {}", parts.join(" "))))
    } else {
        Some(ShopLocation::Place(
            parts.iter().map(|part| part.to_case(Case::Title)).join(" "),
        ))
    }
}

/// Full shop name from the event nids merged into it, e.g.
/// `Chapter 5 / Serafew Vendor`.
pub fn shop_name(nids: &[String], kind: &str) -> String {
    let locations = nids
        .iter()
        .filter_map(|nid| shop_location(nid))
        .map(|location| match location {
            ShopLocation::Chapter(name) | ShopLocation::Place(name) => name,
        })
        .unique()
        .join(" / ");
    if locations.is_empty() {
        kind.to_string()
    } else {
        format!("{locations} {kind}")
    }
}

/// Short shop name: the named places if there are any, chapters otherwise.
pub fn shop_abbreviation(nids: &[String]) -> String {
    let (chapters, places): (Vec<_>, Vec<_>) = nids
        .iter()
        .filter_map(|nid| shop_location(nid))
        .partition(|location| matches!(location, ShopLocation::Chapter(_)));
    let names = if places.is_empty() { chapters } else { places };
    names
        .into_iter()
        .map(|location| match location {
            ShopLocation::Chapter(name) | ShopLocation::Place(name) => name,
        })
        .unique()
        .join(" / ")
}

/// `MyUnit/T2` becomes `Feats (Tier 2)`; other categories keep their path.
pub fn skill_category_name(category: &str) -> String {
    match category.strip_prefix("MyUnit/T") {
        Some(tier) => format!("Feats (Tier {tier})"),
        None => category.to_string(),
    }
}
