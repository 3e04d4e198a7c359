//! Description rewriting.
//!
//! Free-text schema prose is split into sentences and each sentence goes
//! through a fixed pipeline of token rewrites producing the target markup:
//! `I(option)` for parameter references, `C(value)` for literal values and
//! `U(url)` for links. Existing markup and raw URLs are protected spans that no
//! stage rewrites inside, so running the pipeline over its own output changes
//! nothing.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::document::ResourceSchema;
use crate::naming::camel_to_snake;
use crate::option::{OptionNode, OptionTree};
use crate::types::PLACEHOLDER_DESCRIPTION;

/// Proper nouns that look like parameter names but are not.
pub const KEEP_NAMES: &[&str] = &[
    "JavaScript",
    "EventBridge",
    "CloudFormation",
    "CloudWatch",
    "CloudFront",
    "CloudTrail",
    "ACLs",
    "ARNs",
    "XMLHttpRequest",
    "DynamoDB",
    "OpenSearch",
    "ElastiCache",
    "PowerShell",
    "GitHub",
];

/// Upper-case words that stay bare even when declared as choices.
pub const KEEP_VALUES: &[&str] = &["PUT"];

static MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[ICU]\([^)]*\)").expect("markup pattern"));
/// Markup, raw URLs and resource type names such as `AWS::Logs::LogGroup`.
static PROTECTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[ICU]\([^)]*\)|https?://\S+|\b[A-Za-z0-9]+(?:::[A-Za-z0-9]+){2}\b")
        .expect("protected span pattern")
});
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("url pattern"));

/// Dotted paths (`LoggingConfig.DestinationBucketName`) or names with at
/// least two humps (`LogGroupName`).
static NAME_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b[A-Z][a-z][A-Za-z0-9]*(?:\.[A-Z][a-z][A-Za-z0-9]*)+\b|\b(?:[A-Z]+[A-Za-z]+)+(?:[A-Z][a-z]+)+\b",
    )
    .expect("name reference pattern")
});
static PLURAL_ABBREVIATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2,}s$").expect("plural abbreviation pattern"));

static VALUE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][A-Z0-9_]*[A-Z0-9]\b|\b\d+(?:\.\d+)?\b").expect("value token pattern")
});
static VALUE_TRIGGER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:values are|following values|following properties)\s*:")
        .expect("value trigger pattern")
});

static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("bracket pattern"));
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("space run pattern"));
static SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([.,;])").expect("space before punctuation pattern"));
static TRUE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bTRUE\b").expect("true pattern"));

/// Rewrite `text` with an empty enumeration vocabulary.
///
/// ```
/// use cfn_modgen::rewrite;
///
/// assert_eq!(
///     rewrite("Possible values are: 1, 3, 5."),
///     vec!["Possible values are: C(1), C(3), C(5)."]
/// );
/// ```
pub fn rewrite(text: &str) -> Vec<String> {
    DescriptionRewriter::new().rewrite(text)
}

/// Split prose into sentences.
///
/// A boundary is whitespace preceded by a lowercase letter, digit or `)` and a
/// `.` or `?`, and followed by an uppercase letter. Newlines always break.
/// Fragments are trimmed and empty ones dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut push = |fragment: &str| {
        let fragment = fragment.trim();
        if !fragment.is_empty() {
            sentences.push(fragment.to_string());
        }
    };

    for line in text.split('\n') {
        let chars: Vec<(usize, char)> = line.char_indices().collect();
        let mut start = 0;
        let mut i = 0;
        while i < chars.len() {
            let (pos, c) = chars[i];
            let after_terminator = i >= 2
                && matches!(chars[i - 1].1, '.' | '?')
                && is_boundary_lead(chars[i - 2].1);
            if !(c.is_whitespace() && after_terminator) {
                i += 1;
                continue;
            }

            let mut next = i;
            while next < chars.len() && chars[next].1.is_whitespace() {
                next += 1;
            }
            if next < chars.len() && chars[next].1.is_uppercase() {
                push(&line[start..pos]);
                start = chars[next].0;
            }
            i = next;
        }
        push(&line[start..]);
    }
    sentences
}

fn is_boundary_lead(c: char) -> bool {
    c.is_lowercase() || c.is_ascii_digit() || c == ')'
}

/// Wrap parameter-name references as `I(name)`.
pub fn rewrite_names(sentence: &str, keep: &BTreeSet<String>) -> String {
    map_spans(&PROTECTED, sentence, |segment, _| {
        let replacements: Vec<(String, String)> = NAME_REFERENCE
            .find_iter(segment)
            .map(|m| m.as_str())
            .filter(|token| !keep.contains(*token) && !PLURAL_ABBREVIATION.is_match(token))
            .map(|token| (token.to_string(), format!("I({})", reference_name(token))))
            .collect();
        replace_longest_first(segment, replacements)
    })
}

fn reference_name(token: &str) -> String {
    token
        .split('.')
        .map(camel_to_snake)
        .collect::<Vec<_>>()
        .join(".")
}

/// Wrap literal values as `C(value)`.
///
/// Upper-case tokens are wrapped when `vocabulary` declares them or they use
/// the `UPPER_SNAKE` constant style. Numbers are wrapped only after a phrase
/// that introduces a list of values.
pub fn rewrite_values(
    sentence: &str,
    vocabulary: &BTreeSet<String>,
    keep: &BTreeSet<String>,
) -> String {
    let trigger_end = VALUE_TRIGGER.find(sentence).map(|m| m.end());

    map_spans(&PROTECTED, sentence, |segment, offset| {
        VALUE_TOKEN
            .replace_all(segment, |caps: &Captures| {
                let token = &caps[0];
                let start = offset + caps.get(0).map_or(0, |m| m.start());
                let wrap = if token.starts_with(|c: char| c.is_ascii_digit()) {
                    trigger_end.map_or(false, |end| start >= end)
                } else {
                    (vocabulary.contains(token) || token.contains('_')) && !keep.contains(token)
                };
                if wrap {
                    format!("C({})", token)
                } else {
                    token.to_string()
                }
            })
            .into_owned()
    })
}

/// Wrap raw URLs as `U(url)`. Trailing punctuation stays outside the link.
pub fn rewrite_links(sentence: &str) -> String {
    map_spans(&MARKUP, sentence, |segment, _| {
        URL.replace_all(segment, |caps: &Captures| {
            let url = &caps[0];
            let trimmed =
                url.trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | ')' | '"' | '\''));
            format!("U({}){}", trimmed, &url[trimmed.len()..])
        })
        .into_owned()
    })
}

/// Remove `[...]` spans.
pub fn strip_brackets(sentence: &str) -> String {
    map_spans(&MARKUP, sentence, |segment, _| {
        BRACKETED.replace_all(segment, "").into_owned()
    })
}

/// Drop quote characters and collapse stray whitespace.
pub fn clean_up(sentence: &str) -> String {
    let unquoted: String = sentence
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '`'))
        .collect();
    let collapsed = SPACE_RUN.replace_all(&unquoted, " ");
    SPACE_BEFORE_PUNCT
        .replace_all(&collapsed, "${1}")
        .trim()
        .to_string()
}

/// `TRUE` becomes `C(True)`.
pub fn rewrite_booleans(sentence: &str) -> String {
    map_spans(&MARKUP, sentence, |segment, _| {
        TRUE_WORD.replace_all(segment, "C(True)").into_owned()
    })
}

/// Append a period unless the sentence already ends with `.`, `?` or `!`.
pub fn terminate(sentence: &str) -> String {
    if sentence.is_empty() || sentence.ends_with(['.', '?', '!']) {
        sentence.to_string()
    } else {
        format!("{}.", sentence)
    }
}

/// Apply `f` to the text between matches of `spans`, copying the matches
/// verbatim. `f` also receives the byte offset of the segment in `text`.
fn map_spans<F>(spans: &Regex, text: &str, mut f: F) -> String
where
    F: FnMut(&str, usize) -> String,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in spans.find_iter(text) {
        out.push_str(&f(&text[last..m.start()], last));
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&f(&text[last..], last));
    out
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Substitute whole-word occurrences, trying longer originals first so a
/// short reference never rewrites part of a longer one.
fn replace_longest_first(text: &str, mut replacements: Vec<(String, String)>) -> String {
    if replacements.is_empty() {
        return text.to_string();
    }
    replacements.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
    replacements.dedup_by(|a, b| a.0 == b.0);

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut prev: Option<char> = None;
    'scan: while let Some(c) = rest.chars().next() {
        if !prev.map_or(false, is_word) {
            for (from, to) in &replacements {
                let at_word_end = rest
                    .get(from.len()..)
                    .and_then(|tail| tail.chars().next())
                    .map_or(true, |next| !is_word(next));
                if rest.starts_with(from.as_str()) && at_word_end {
                    out.push_str(to);
                    prev = from.chars().last();
                    rest = &rest[from.len()..];
                    continue 'scan;
                }
            }
        }
        out.push(c);
        prev = Some(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Sentence rewriter bound to one schema's enumeration vocabulary.
#[derive(Debug, Clone)]
pub struct DescriptionRewriter {
    vocabulary: BTreeSet<String>,
    keep_names: BTreeSet<String>,
    keep_values: BTreeSet<String>,
}

impl Default for DescriptionRewriter {
    fn default() -> Self {
        Self {
            vocabulary: BTreeSet::new(),
            keep_names: KEEP_NAMES.iter().map(|s| s.to_string()).collect(),
            keep_values: KEEP_VALUES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DescriptionRewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewriter whose vocabulary is every string `enum`/`choices` value
    /// declared anywhere in `schema`.
    pub fn for_schema(schema: &ResourceSchema) -> Self {
        let mut vocabulary = BTreeSet::new();
        for value in schema.properties.values().chain(schema.definitions.values()) {
            collect_vocabulary(value, &mut vocabulary);
        }
        Self::new().with_vocabulary(vocabulary)
    }

    pub fn with_vocabulary<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vocabulary.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn keep_name(mut self, name: impl Into<String>) -> Self {
        self.keep_names.insert(name.into());
        self
    }

    pub fn keep_value(mut self, value: impl Into<String>) -> Self {
        self.keep_values.insert(value.into());
        self
    }

    pub fn vocabulary(&self) -> &BTreeSet<String> {
        &self.vocabulary
    }

    /// Split `text` and rewrite every sentence.
    pub fn rewrite(&self, text: &str) -> Vec<String> {
        split_sentences(text)
            .iter()
            .map(|sentence| self.rewrite_sentence(sentence))
            .filter(|sentence| !sentence.is_empty())
            .collect()
    }

    /// Run one sentence through every stage, in order.
    pub fn rewrite_sentence(&self, sentence: &str) -> String {
        let named = rewrite_names(sentence, &self.keep_names);
        let valued = rewrite_values(&named, &self.vocabulary, &self.keep_values);
        let linked = rewrite_links(&valued);
        let cleaned = clean_up(&strip_brackets(&linked));
        terminate(&rewrite_booleans(&cleaned))
    }

    /// Rewrite every description in `tree`, filling missing ones with the
    /// placeholder sentence.
    pub fn rewrite_tree(&self, tree: OptionTree) -> OptionTree {
        tree.into_iter()
            .map(|(name, node)| (name, self.rewrite_option(node)))
            .collect()
    }

    fn rewrite_option(&self, mut node: OptionNode) -> OptionNode {
        let sentences: Vec<String> = node
            .description
            .iter()
            .flat_map(|text| self.rewrite(text))
            .collect();
        node.description = if sentences.is_empty() {
            vec![PLACEHOLDER_DESCRIPTION.to_string()]
        } else {
            sentences
        };
        node.suboptions = node.suboptions.map(|tree| self.rewrite_tree(tree));
        node
    }
}

/// Collect string `enum`/`choices` values found anywhere under `value`.
pub fn collect_vocabulary(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if let ("enum" | "choices", Value::Array(items)) = (key.as_str(), child) {
                    out.extend(items.iter().filter_map(Value::as_str).map(str::to_string));
                }
                collect_vocabulary(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_vocabulary(item, out);
            }
        }
        _ => {}
    }
}
