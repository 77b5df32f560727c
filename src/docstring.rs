//! Doc-comment parser — free text in, description plus `:param` entries out.
//!
//! Only `:param` tags are recognized. `:param str foo: help` yields an entry
//! with type `str`, name `foo`, description `help`; other `:`-tags such as
//! `:return:` or `:raises ValueError:` are skipped. Malformed input never
//! fails, it degrades to an empty description and fewer entries.

use regex::Regex;
use std::sync::LazyLock;

static RE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:param\s+(?:(?P<type>\S+)\s+)?(?P<name>\S+?):\s*(?P<description>.+)?$").unwrap()
});

/// One parsed parameter-documentation entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDoc {
    /// Free-form type token, when the tag carried one.
    pub type_name: Option<String>,
    pub name: String,
    /// Help text; `None` when nothing followed the colon.
    pub description: Option<String>,
}

/// Parse result: leading description plus `:param` entries in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocString {
    pub description: String,
    pub params: Vec<ParamDoc>,
}

/// Parse a raw doc comment.
///
/// The description is every leading non-blank line up to the first `:`-tag
/// line, trimmed and joined with `\n`. After that, `:param` lines open
/// entries and plain lines continue the previous entry's description.
pub fn parse(text: &str) -> DocString {
    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;

    // Description phase: blank lines are skipped without ending the phase;
    // the first tag line is left for the parameter phase.
    let mut description: Vec<&str> = Vec::new();
    while i < lines.len() {
        let line = lines[i].trim();
        if line.starts_with(':') {
            break;
        }
        i += 1;
        if line.is_empty() {
            continue;
        }
        description.push(line);
    }

    // Parameter phase.
    let mut params: Vec<ParamDoc> = Vec::new();
    while i < lines.len() {
        let line = lines[i].trim();
        i += 1;
        if line.is_empty() {
            continue;
        }

        if !line.starts_with(':') {
            // Continuation of the previous entry, if there is one.
            if let Some(last) = params.last_mut() {
                match &mut last.description {
                    Some(text) => {
                        text.push('\n');
                        text.push_str(line);
                    }
                    None => last.description = Some(line.to_string()),
                }
            }
            continue;
        }

        if let Some(caps) = RE_PARAM.captures(line) {
            params.push(ParamDoc {
                type_name: caps.name("type").map(|m| m.as_str().to_string()),
                name: caps["name"].to_string(),
                description: caps.name("description").map(|m| m.as_str().to_string()),
            });
        }
        // Any other tag is ignored and is not a continuation target.
    }

    DocString {
        description: description.join("\n"),
        params,
    }
}
