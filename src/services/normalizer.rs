// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::config::CommitFormat;
use crate::domain::{CommitType, ParsedCommit};
use crate::error::{Error, Result};

const FENCE: &str = "```";

/// Fence tags whose blocks are diagrams rather than prose.
const DIAGRAM_LANGS: &[&str] = &[
    "mermaid", "plantuml", "puml", "dot", "graphviz", "d2", "flowchart",
];

/// Subject break points, tried when a subject is too long.
const BREAK_TOKENS: &[&str] = &[". ", ", ", " - ", " and "];

/// A break must start within this many characters of the subject content.
const MAX_BREAK_OFFSET: usize = 50;

pub const EMPTY_SUBJECT_WARNING: &str = "subject line is empty";
pub const DESCRIPTION_RECOMMENDED_WARNING: &str = "description recommended for this type";

/// Meta-commentary that models like to wrap around the message, as
/// `(pattern, replacement)`. Section patterns keep their terminating blank
/// line through `$1`.
const DEFAULT_STRIP_PATTERNS: &[(&str, &str)] = &[
    (r"(?im)^[ \t]*looking at the (?:staged )?(?:diff|changes)[^\n]*", ""),
    (r"(?i)\Athis is a [a-z]+[^\n]*", ""),
    (r"(?im)^[ \t]*based on the (?:staged )?(?:diff|changes)[^\n]*", ""),
    (r"(?im)^[ \t]*the changes include[^\n]*", ""),
    (r"(?is)#{2,3}[ \t]*analysis.*?(\n\n|\z)", "$1"),
    (r"(?is)#{2,3}[ \t]*summary.*?(\n\n|\z)", "$1"),
    (
        r"(?is)- \*\*(?:core project files|configuration files|documentation|dependencies)\*\*.*?(\n\n|\z)",
        "$1",
    ),
    (
        r"(?ism)^[ \t]*(?:graph|flowchart)[ \t]+(?:td|tb|bt|lr|rl)\b.*?(\n\n|\z)",
        "$1",
    ),
    (
        r"(?im)^[ \t]*here(?:'s| is) (?:the |a |your |my )?(?:suggested |proposed )?commit(?: message)?[^\n:]*:[ \t]*",
        "",
    ),
    (
        r"(?im)^[ \t]*(?:(?:suggested|proposed) commit(?: message)?|commit message)[ \t]*:[ \t]*",
        "",
    ),
];

struct StripPattern {
    regex: Regex,
    replacement: &'static str,
}

static DEFAULT_PATTERNS: LazyLock<Vec<StripPattern>> = LazyLock::new(|| {
    DEFAULT_STRIP_PATTERNS
        .iter()
        .map(|(pattern, replacement)| StripPattern {
            regex: Regex::new(pattern).unwrap(),
            replacement: *replacement,
        })
        .collect()
});

static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

static BOLD_BULLET_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)[-*][ \t]*\*\*[^*\n]+?(?::\*\*|\*\*[ \t]*:)[ \t]*").unwrap()
});

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^\n]*?)\*\*").unwrap());

static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());

static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]*)`").unwrap());

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}(?:[ \t]+|$)").unwrap());

static COMMIT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]+(?:\([^)]+\))?!?:").unwrap());

static CONVENTIONAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]+)(?:\([^)\n]+\))?!?:\s+\S").unwrap());

static TYPE_AND_SCOPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]+)(\([^)\n]*\))?").unwrap());

/// Turns a free-text model reply into a conventional commit.
///
/// Never fails: anything wrong with the reply ends up in
/// [`ParsedCommit::warnings`].
pub struct ResponseNormalizer {
    max_subject_length: usize,
    recommend_description: bool,
    unwrap_fenced_reply: bool,
    strip_quotes: bool,
    extra_patterns: Vec<Regex>,
}

impl ResponseNormalizer {
    pub fn new(max_subject_length: usize) -> Self {
        Self {
            max_subject_length,
            recommend_description: true,
            unwrap_fenced_reply: false,
            strip_quotes: false,
            extra_patterns: Vec::new(),
        }
    }

    pub fn from_format(format: &CommitFormat) -> Result<Self> {
        Self::new(format.max_subject_length)
            .with_description_hint(format.require_body_for_features)
            .with_fenced_reply_unwrap(format.unwrap_fenced_reply)
            .with_quote_stripping(format.strip_quotes)
            .with_extra_patterns(&format.extra_strip_patterns)
    }

    /// Add user-supplied strip patterns, matched case-insensitively.
    pub fn with_extra_patterns(mut self, patterns: &[String]) -> Result<Self> {
        for pattern in patterns {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| Error::Config(format!("invalid strip pattern '{pattern}': {e}")))?;
            self.extra_patterns.push(regex);
        }
        Ok(self)
    }

    pub fn with_description_hint(mut self, enabled: bool) -> Self {
        self.recommend_description = enabled;
        self
    }

    /// Keep the body of a reply that is one fenced block holding a commit
    /// line, instead of deleting it with the other fences.
    pub fn with_fenced_reply_unwrap(mut self, enabled: bool) -> Self {
        self.unwrap_fenced_reply = enabled;
        self
    }

    /// Drop one pair of quotes wrapped around the whole reply.
    pub fn with_quote_stripping(mut self, enabled: bool) -> Self {
        self.strip_quotes = enabled;
        self
    }

    pub fn normalize(&self, raw: &str) -> ParsedCommit {
        let cleaned = self.clean(raw);
        let (subject, description) = self.split_message(&cleaned);
        debug!(
            raw_len = raw.len(),
            cleaned_len = cleaned.len(),
            subject_len = subject.chars().count(),
            has_description = description.is_some(),
            "normalized model reply"
        );
        self.validate(subject, description)
    }

    // ─── Cleaning ───

    fn clean(&self, raw: &str) -> String {
        let raw = raw.trim();
        let mut text = if self.strip_quotes {
            Self::unquote(raw)
        } else {
            raw
        }
        .to_string();

        text = Self::remove_fenced_blocks(&text, true);
        let sole_body = self
            .unwrap_fenced_reply
            .then(|| Self::sole_fence_body(&text))
            .flatten();
        text = match sole_body {
            Some(body) => body,
            None => Self::remove_fenced_blocks(&text, false),
        };
        text = Self::collapse_blank_lines(&text);

        for pattern in DEFAULT_PATTERNS.iter() {
            text = pattern
                .regex
                .replace_all(&text, pattern.replacement)
                .into_owned();
            text = Self::collapse_blank_lines(&text);
        }
        for regex in &self.extra_patterns {
            text = regex.replace_all(&text, "").into_owned();
            text = Self::collapse_blank_lines(&text);
        }

        text = BOLD_BULLET_LABEL.replace_all(&text, "$1").into_owned();
        text = BOLD.replace_all(&text, "$1").into_owned();
        text = ITALIC.replace_all(&text, "$1").into_owned();
        text = INLINE_CODE.replace_all(&text, "$1").into_owned();
        text = HEADING.replace_all(&text, "").into_owned();

        text.trim().to_string()
    }

    fn unquote(text: &str) -> &str {
        for quote in ['"', '\''] {
            if text.len() >= 2
                && let Some(inner) = text
                    .strip_prefix(quote)
                    .and_then(|t| t.strip_suffix(quote))
            {
                return inner.trim();
            }
        }
        text
    }

    fn collapse_blank_lines(text: &str) -> String {
        BLANK_RUN.replace_all(text, "\n\n").into_owned()
    }

    /// Delete fenced blocks, fences included. An unclosed fence swallows
    /// the rest of the text.
    fn remove_fenced_blocks(text: &str, diagrams_only: bool) -> String {
        let mut output = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = Self::find_opening_fence(rest, diagrams_only) {
            output.push_str(&rest[..start]);
            let after_open = &rest[start + FENCE.len()..];
            match after_open.find(FENCE) {
                Some(end) => rest = &after_open[end + FENCE.len()..],
                None => {
                    rest = "";
                    break;
                }
            }
        }

        output.push_str(rest);
        output
    }

    fn find_opening_fence(text: &str, diagrams_only: bool) -> Option<usize> {
        if !diagrams_only {
            return text.find(FENCE);
        }
        text.match_indices(FENCE).map(|(i, _)| i).find(|&i| {
            let tag: String = text[i + FENCE.len()..]
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase();
            DIAGRAM_LANGS.contains(&tag.as_str())
        })
    }

    /// When the whole reply is one fenced block holding a commit message,
    /// return its body instead of deleting it.
    fn sole_fence_body(text: &str) -> Option<String> {
        let inner = text.strip_prefix(FENCE)?.strip_suffix(FENCE)?;
        if inner.contains(FENCE) {
            return None;
        }
        // Drop the info string on the opening line
        let body = inner.split_once('\n').map_or("", |(_, body)| body);
        body.lines()
            .any(|line| COMMIT_LINE.is_match(line.trim()))
            .then(|| body.trim().to_string())
    }

    // ─── Subject / description ───

    fn split_message(&self, cleaned: &str) -> (String, Option<String>) {
        let lines: Vec<&str> = cleaned.split('\n').collect();
        let start = lines
            .iter()
            .position(|line| COMMIT_LINE.is_match(line.trim()))
            .unwrap_or(0);
        let relevant = lines[start..].join("\n");

        let (head, tail) = match relevant.split_once("\n\n") {
            Some((head, tail)) => (head, Some(tail)),
            None => (relevant.as_str(), None),
        };

        let subject = head
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let description = tail
            .map(str::trim)
            .filter(|body| !body.is_empty())
            .map(str::to_string);

        if subject.chars().count() > self.max_subject_length && subject.contains(':') {
            return Self::shorten_subject(&subject, description);
        }

        (subject, description)
    }

    /// Cut an overlong subject at its earliest natural break and move the
    /// remainder to the front of the description.
    fn shorten_subject(subject: &str, description: Option<String>) -> (String, Option<String>) {
        let Some((header, content)) = subject.split_once(':') else {
            return (subject.to_string(), description);
        };
        let content = content.trim();

        let best = BREAK_TOKENS
            .iter()
            .filter_map(|token| content.find(token).map(|idx| (idx, token.len())))
            .filter(|&(idx, _)| idx > 0 && content[..idx].chars().count() < MAX_BREAK_OFFSET)
            .min_by_key(|&(idx, _)| idx);

        let Some((idx, token_len)) = best else {
            return (subject.to_string(), description);
        };

        let shortened = format!("{header}: {}", &content[..idx]);
        let remainder = content[idx + token_len..].trim();

        let description = match (remainder.is_empty(), description) {
            (true, description) => description,
            (false, Some(existing)) => Some(format!("{remainder}\n{existing}")),
            (false, None) => Some(remainder.to_string()),
        };

        debug!(
            from = subject.chars().count(),
            to = shortened.chars().count(),
            "shortened overlong subject"
        );

        (shortened, description)
    }

    // ─── Validation ───

    /// Check the subject and collect warnings.
    ///
    /// Length and format problems make the commit invalid. The
    /// "description recommended" warning is soft and only applies to
    /// unscoped feat, fix, refactor and perf subjects. `feat(api): add x`
    /// passes without a body while `feat: add x` is flagged, so a scoped
    /// feature never gets the body reminder.
    fn validate(&self, subject: String, description: Option<String>) -> ParsedCommit {
        if subject.trim().is_empty() {
            return ParsedCommit {
                subject: String::new(),
                description: None,
                is_valid: false,
                warnings: vec![EMPTY_SUBJECT_WARNING.to_string()],
            };
        }

        let mut warnings = Vec::new();
        let mut is_valid = true;

        let length = subject.chars().count();
        if length > self.max_subject_length {
            warnings.push(format!(
                "subject line is too long ({length} chars, max {})",
                self.max_subject_length
            ));
            is_valid = false;
        }

        match CONVENTIONAL.captures(&subject) {
            Some(caps) if CommitType::parse(&caps[1]).is_none() => {
                warnings.push(format!(
                    "subject does not follow conventional commit format: unknown type '{}' (expected one of {})",
                    &caps[1],
                    CommitType::ALL.join(", ")
                ));
                is_valid = false;
            }
            Some(_) => {}
            None => {
                warnings.push(
                    "subject does not follow conventional commit format (type(scope): description)"
                        .to_string(),
                );
                is_valid = false;
            }
        }

        let wants_description = TYPE_AND_SCOPE.captures(&subject).is_some_and(|caps| {
            caps.get(2).is_none()
                && CommitType::parse(&caps[1]).is_some_and(|t| t.wants_description())
        });

        if self.recommend_description && wants_description && description.is_none() {
            warnings.push(DESCRIPTION_RECOMMENDED_WARNING.to_string());
        }

        ParsedCommit {
            subject,
            description,
            is_valid,
            warnings,
        }
    }
}
