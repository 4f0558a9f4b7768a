//! Lucene query syntax helpers: value escaping and best-effort repair of
//! queries a Lucene-based backend refused to parse.

use blender_core::QueryRepair;
use once_cell::sync::Lazy;
use regex::Regex;

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("static lucene pattern")
}

static BOOST: Lazy<Regex> = Lazy::new(|| pattern(r"[^^]+\^[0-9]"));
static FREESTANDING_OPERATOR: Lazy<Regex> = Lazy::new(|| pattern(r"\s+[+-]+$|\s+[+-]+\s+|^[+-]+\s+"));
static FREESTANDING_SLASH: Lazy<Regex> = Lazy::new(|| pattern(r"\s+/+\s+"));
static EDGE_SLASH: Lazy<Regex> = Lazy::new(|| pattern(r"\s+/+$|^/+\s+"));
static PROXIMITY_ONE_END: Lazy<Regex> = Lazy::new(|| pattern(r"~1(\.0*)?$"));
static PROXIMITY_ONE: Lazy<Regex> = Lazy::new(|| pattern(r"~1(\.0*)?\s+"));
static EMPTY_PARENS: Lazy<Regex> = Lazy::new(|| pattern(r"\(\s*\)"));
static COLONS: Lazy<Regex> = Lazy::new(|| pattern(r":+"));
static DANGLING_COLON: Lazy<Regex> = Lazy::new(|| pattern(r":[:\s]+|[:\s]+:"));

const OPERATORS: [&str; 8] = ["AND", "OR", "NOT", "+", "-", "\"", "&&", "||"];
const SPECIAL: &str = "+-&|!(){}[]^\"~*?:\\/";

/// Backslash-escape Lucene syntax characters in a filter value.
pub fn lucene_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if SPECIAL.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Calls `f(ch, quoted, escaped)` for every character, tracking double quotes
/// and backslash escapes.
fn walk(input: &str, mut f: impl FnMut(char, bool, bool)) {
    let mut quoted = false;
    let mut escaped = false;
    for ch in input.chars() {
        if ch == '\\' {
            escaped = !escaped;
        }
        if !escaped && ch == '"' {
            quoted = !quoted;
        }
        f(ch, quoted, escaped);
        if ch != '\\' {
            escaped = false;
        }
    }
}

fn count_unquoted(needle: char, input: &str) -> usize {
    let mut count = 0;
    walk(input, |ch, quoted, escaped| {
        if !quoted && !escaped && ch == needle {
            count += 1;
        }
    });
    count
}

fn remove_unquoted(needles: &[char], input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    walk(input, |ch, quoted, escaped| {
        if quoted || escaped || !needles.contains(&ch) {
            out.push(ch);
        }
    });
    out
}

/// Apply `f` to the parts of `input` outside double quotes.
fn map_unquoted(input: &str, f: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(input.len());
    let mut plain = String::new();
    let mut phrase = String::new();
    let mut in_phrase = false;
    walk(input, |ch, quoted, escaped| {
        if ch == '"' && !escaped {
            if quoted {
                out.push_str(&f(&plain));
                plain.clear();
                in_phrase = true;
                phrase.push(ch);
            } else {
                phrase.push(ch);
                out.push_str(&phrase);
                phrase.clear();
                in_phrase = false;
            }
        } else if in_phrase {
            phrase.push(ch);
        } else {
            plain.push(ch);
        }
    });
    out.push_str(&f(&plain));
    out.push_str(&phrase);
    out
}

/// Repairs common user errors in Lucene query strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuceneQueryRepair;

impl LuceneQueryRepair {
    pub fn new() -> Self {
        Self
    }

    /// The normalized form of `input`; may be empty.
    pub fn normalize(&self, input: &str) -> String {
        let input = normalize_fancy_quotes(input);

        match input.trim() {
            "AND" => return "and".to_string(),
            "OR" => return "or".to_string(),
            "NOT" => return "not".to_string(),
            "*:*" => return String::new(),
            _ => {}
        }
        let stripped = OPERATORS.iter().fold(input.clone(), |s, op| s.replace(op, ""));
        if stripped.trim().is_empty() {
            return String::new();
        }

        let input = normalize_wildcards(&input);
        let input = normalize_parens(&input);
        let input = normalize_boosts(&input);
        let input = normalize_unquoted_text(&input);
        let input = normalize_colons(&input);
        input.trim_matches(|c: char| c == '/' || c == ' ').to_string()
    }
}

impl QueryRepair for LuceneQueryRepair {
    fn repair(&self, query: &str) -> Option<String> {
        let repaired = self.normalize(query);
        if repaired.is_empty() || repaired == query {
            None
        } else {
            Some(repaired)
        }
    }
}

fn normalize_fancy_quotes(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\u{00AB}' | '\u{00BB}' | '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2039}' | '\u{203A}' => '\'',
            other => other,
        })
        .collect()
}

fn normalize_wildcards(input: &str) -> String {
    input
        .strip_prefix(&['*', '?'][..])
        .unwrap_or(input)
        .to_string()
}

fn normalize_parens(input: &str) -> String {
    if count_unquoted('(', input) == count_unquoted(')', input) {
        input.to_string()
    } else {
        remove_unquoted(&['(', ')'], input)
    }
}

fn normalize_boosts(input: &str) -> String {
    let carets = input.matches('^').count();
    if carets > 0 && carets != BOOST.find_iter(input).count() {
        input.replace('^', "")
    } else {
        input.to_string()
    }
}

fn normalize_unquoted_text(input: &str) -> String {
    let input = map_unquoted(input, |s| {
        let s = FREESTANDING_OPERATOR.replace_all(s, " ");
        let s = FREESTANDING_SLASH.replace_all(&s, " \"/\" ");
        let s = EDGE_SLASH.replace_all(&s, " ");
        PROXIMITY_ONE.replace_all(&s, " ").into_owned()
    });
    let mut input = PROXIMITY_ONE_END.replace(&input, "").into_owned();
    loop {
        let next = map_unquoted(&input, |s| EMPTY_PARENS.replace_all(s, "").into_owned());
        if next == input {
            return input;
        }
        input = next;
    }
}

fn normalize_colons(input: &str) -> String {
    let input = COLONS.replace_all(input, ":");
    let input = map_unquoted(&input, |s| DANGLING_COLON.replace_all(s, " ").into_owned());
    input.trim_matches(':').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repair(q: &str) -> Option<String> {
        LuceneQueryRepair::new().repair(q)
    }

    #[test]
    fn leaves_valid_queries_alone() {
        assert_eq!(repair("dune"), None);
        assert_eq!(repair("title:dune AND author:herbert"), None);
        assert_eq!(repair("dune^2"), None);
        assert_eq!(repair("\"(dune\" frank"), None);
    }

    #[test]
    fn lone_operators_become_words() {
        assert_eq!(repair("AND").as_deref(), Some("and"));
        assert_eq!(repair(" NOT ").as_deref(), Some("not"));
    }

    #[test]
    fn operator_only_and_match_all_yield_nothing() {
        assert_eq!(repair("AND OR"), None);
        assert_eq!(repair("+ - \""), None);
        assert_eq!(repair("*:*"), None);
        assert_eq!(LuceneQueryRepair::new().normalize("*:*"), "");
    }

    #[test]
    fn fixes_common_mistakes() {
        assert_eq!(repair("\u{201C}dune\u{201D}").as_deref(), Some("\"dune\""));
        assert_eq!(repair("*dune").as_deref(), Some("dune"));
        assert_eq!(repair("(dune").as_deref(), Some("dune"));
        assert_eq!(repair("dune^").as_deref(), Some("dune"));
        assert_eq!(repair("dune ()").as_deref(), Some("dune"));
        assert_eq!(repair("/dune/").as_deref(), Some("dune"));
        assert_eq!(repair("dune - frank").as_deref(), Some("dune frank"));
        assert_eq!(repair("title:: dune").as_deref(), Some("title dune"));
        assert_eq!(repair("dune~1").as_deref(), Some("dune"));
    }

    #[test]
    fn quoted_text_is_untouched() {
        assert_eq!(
            LuceneQueryRepair::new().normalize("\"a - b ()\" ()"),
            "\"a - b ()\""
        );
    }

    #[test]
    fn escapes_special_characters() {
        assert_eq!(lucene_escape("a:b (c)"), "a\\:b \\(c\\)");
        assert_eq!(lucene_escape("plain words"), "plain words");
    }
}
