use crate::error::{PatchError, PatchResult};
use rampatch_archive::Archive;
use regex::bytes::{Regex, RegexBuilder};
use tracing::trace;

/// One line of an entry, without its `\n`. Lines are raw bytes so entries that are not UTF-8
/// survive an edit unchanged.
pub type Line = Vec<u8>;

/// Compile a pattern for matching lines.
///
/// Unicode mode is off: `.` and `\S` match any byte other than `\n` or ASCII whitespace, so a
/// Latin-1 byte never stops a pattern from matching.
pub fn line_regex(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).unicode(false).build()
}

/// Split contents into lines on `\n`.
///
/// A trailing newline yields a trailing empty line, so `join_lines(split_lines(s)) == s`.
pub fn split_lines(contents: &[u8]) -> Vec<Line> {
    contents.split(|b| *b == b'\n').map(<[u8]>::to_vec).collect()
}

pub fn join_lines(lines: &[Line]) -> Vec<u8> {
    lines.join(&b'\n')
}

/// Read an entry as lines. Fails with `EntryNotFound` when the entry is absent.
pub fn read_lines(archive: &dyn Archive, path: &str) -> PatchResult<Vec<Line>> {
    let bytes = archive
        .read(path)
        .ok_or_else(|| PatchError::entry_not_found(path))?;
    Ok(split_lines(bytes))
}

pub fn write_lines(archive: &mut dyn Archive, path: &str, lines: &[Line]) {
    archive.write(path, join_lines(lines));
}

/// Splice `new_lines` in front of every line matching `anchor` whose predecessor matches
/// `preceding`.
///
/// The inserted lines land between the preceding line and the anchor. Inserted lines are never
/// rescanned, and the predecessor of the line after an anchor is the anchor itself. The first
/// line is checked against an empty predecessor.
pub fn insert_after_match(
    lines: Vec<Line>,
    anchor: &Regex,
    preceding: &Regex,
    new_lines: &[&str],
) -> Vec<Line> {
    let mut out: Vec<Line> = Vec::with_capacity(lines.len() + new_lines.len());
    let mut previous = Line::new();

    for line in lines {
        if anchor.is_match(&line) && preceding.is_match(&previous) {
            trace!(
                anchor = %String::from_utf8_lossy(&line),
                "inserting {} lines",
                new_lines.len()
            );
            out.extend(new_lines.iter().map(|l| l.as_bytes().to_vec()));
        }
        previous.clone_from(&line);
        out.push(line);
    }

    out
}

pub fn append_lines(lines: &mut Vec<Line>, new_lines: &[&str]) {
    lines.extend(new_lines.iter().map(|l| l.as_bytes().to_vec()));
}

/// Drop every line matching `pattern`. Returns the number of removed lines.
pub fn remove_matching(lines: &mut Vec<Line>, pattern: &Regex) -> usize {
    let before = lines.len();
    lines.retain(|line| !pattern.is_match(line));
    before - lines.len()
}

/// Rewrite every line matching `pattern` with `replacement` (regex `$n` expansion).
///
/// Returns the number of rewritten lines.
pub fn replace_matching(lines: &mut [Line], pattern: &Regex, replacement: &str) -> usize {
    let mut count = 0;
    for line in lines.iter_mut() {
        if pattern.is_match(line) {
            *line = pattern
                .replace_all(line, replacement.as_bytes())
                .into_owned();
            count += 1;
        }
    }
    count
}

/// One line substitution: lines matching `pattern` are rewritten with `replacement`.
#[derive(Debug, Clone)]
pub struct LineRule {
    pub pattern: Regex,
    pub replacement: String,
}

impl LineRule {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: line_regex(pattern)?,
            replacement: replacement.into(),
        })
    }
}

/// Apply `rules` in order, each over the whole sequence. Returns the number of rewrites.
pub fn apply_rules(lines: &mut [Line], rules: &[LineRule]) -> usize {
    rules
        .iter()
        .map(|rule| replace_matching(lines, &rule.pattern, &rule.replacement))
        .sum()
}
