//! Street address and cost heuristics for the free-text description column
//!
//! Descriptions are typed by registry clerks and look like
//! `"123 MAIN ST (UNIT 4), $ 1000"` or `"SEE DEED REFERENCE"`. Both heuristics
//! are best effort: when a pattern does not match the field is simply `None`.

const SEE_DEED_MARKER: &str = "SEE DEED";

/// Words that label a lot or unit designation such as `LOT 12-A`
const DESIGNATION_LABELS: &[&str] = &["LOT", "UNIT", "APT", "BLDG", "SUITE", "STE", "PARCEL", "#"];

/// Address and cost recovered from one description
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDescription {
    pub street_address: Option<String>,
    pub cost: Option<f64>,
}

pub fn parse_description(description: &str) -> ParsedDescription {
    ParsedDescription {
        street_address: parse_street_address(description),
        cost: parse_cost(description),
    }
}

/// Cost is whatever follows the last comma, minus leading spaces and `$`.
pub fn parse_cost(description: &str) -> Option<f64> {
    let (_, tail) = description.rsplit_once(',')?;
    tail.trim_start_matches([' ', '$'])
        .trim_end()
        .parse::<f64>()
        .ok()
        .filter(|cost| cost.is_finite())
}

pub fn parse_street_address(description: &str) -> Option<String> {
    let text = strip_cost_segment(description);
    let tokens = tokenize(text);

    let Some(anchor) = tokens
        .iter()
        .rposition(|token| !is_aside(token) && token.chars().any(|c| c.is_ascii_digit()))
    else {
        return text
            .strip_prefix(SEE_DEED_MARKER)
            .map(str::trim)
            .filter(|rest| !rest.is_empty())
            .map(str::to_string);
    };

    let start = if tokens[anchor].contains('-') {
        designation_start(&tokens, anchor)
    } else {
        anchor
    };
    let end = if start < anchor && is_designation_label(&tokens[start]) {
        // "LOT 12-A SEE PLAN": the designation closes the address
        anchor + 1
    } else {
        tokens.len()
    };
    let mut span: Vec<&str> = tokens[start..end].iter().map(String::as_str).collect();

    // Only the first aside is dropped; later ones stay in the address.
    if let Some(aside) = span.iter().position(|token| is_aside(token)) {
        span.remove(aside);
    }

    let address = span.join(" ");
    if address.is_empty() {
        None
    } else {
        Some(address)
    }
}

/// Text before the cost, with surrounding commas and spaces removed
fn strip_cost_segment(description: &str) -> &str {
    let head = if parse_cost(description).is_some() {
        description.rsplit_once(',').map(|(head, _)| head)
    } else {
        description.rsplit_once('$').map(|(head, _)| head)
    };
    head.unwrap_or(description).trim_matches([',', ' '])
}

/// Where the address starts when the last digit-bearing token is hyphenated.
///
/// `12-14 MAIN ST` starts at the range itself, `12 3-A ELM ST` at the bare
/// number before it, `88 BAY ST UNIT 4-B` at the house number before the
/// label, and `LOT 12-A` at the label.
fn designation_start(tokens: &[String], anchor: usize) -> usize {
    let Some(prev) = anchor.checked_sub(1) else {
        return anchor;
    };
    let word = tokens[prev].as_str();
    if !word.is_empty() && word.chars().all(|c| c.is_ascii_digit()) {
        return prev;
    }
    if !is_designation_label(word) {
        return anchor;
    }
    tokens[..prev]
        .iter()
        .rposition(|token| {
            !is_aside(token) && !token.contains('-') && token.chars().any(|c| c.is_ascii_digit())
        })
        .unwrap_or(prev)
}

fn is_designation_label(token: &str) -> bool {
    DESIGNATION_LABELS
        .iter()
        .any(|label| token.eq_ignore_ascii_case(label))
}

fn is_aside(token: &str) -> bool {
    token.contains('(')
}

/// Whitespace tokens, except that a parenthetical aside stays one token
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut open_aside: Option<String> = None;

    for word in text.split_whitespace() {
        match open_aside.as_mut() {
            Some(aside) => {
                aside.push(' ');
                aside.push_str(word);
                if word.contains(')') {
                    tokens.extend(open_aside.take());
                }
            }
            None => match word.find('(') {
                Some(open) if !word[open..].contains(')') => open_aside = Some(word.to_string()),
                _ => tokens.push(word.to_string()),
            },
        }
    }

    // Unclosed aside runs to the end of the text
    tokens.extend(open_aside);
    tokens
}
