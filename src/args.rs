//! Positional argument rewriting on macro lines
//!
//! A line such as `\newcommand{\Title}{Report}` is split into segments that
//! alternate between literal text and argument content. Delimiters stay in the
//! literal segments, so joining all segments gives back the exact line.

use crate::error::{Error, Result};

/// A run of text that is either argument content or everything else
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub is_argument: bool,
}

impl Segment {
    fn literal(text: String) -> Self {
        Self {
            text,
            is_argument: false,
        }
    }

    fn argument(text: String) -> Self {
        Self {
            text,
            is_argument: true,
        }
    }
}

fn push_literal(segments: &mut Vec<Segment>, text: String) {
    if text.is_empty() {
        return;
    }
    match segments.last_mut() {
        Some(last) if !last.is_argument => last.text.push_str(&text),
        _ => segments.push(Segment::literal(text)),
    }
}

/// Split `line` into literal and argument segments
///
/// Arguments do not nest: inside an argument, `open` is ordinary text and the
/// first `close` ends the argument. A group left open at the end of the line
/// is kept as literal text.
///
/// # Returns
/// * `Err(Error::MalformedLine)` - `close` found outside any argument
pub fn segments(line: &str, open: char, close: char) -> Result<Vec<Segment>> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut inside = false;

    for (pos, ch) in line.char_indices() {
        if !inside && ch == open {
            buf.push(ch);
            push_literal(&mut out, std::mem::take(&mut buf));
            inside = true;
        } else if inside && ch == close {
            out.push(Segment::argument(std::mem::take(&mut buf)));
            buf.push(ch);
            inside = false;
        } else if !inside && ch == close {
            return Err(Error::MalformedLine {
                line: line.to_string(),
                close,
                position: pos,
            });
        } else {
            buf.push(ch);
        }
    }
    push_literal(&mut out, buf);

    Ok(out)
}

/// Join segments back into a line
pub fn join(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.text.as_str()).collect()
}

/// Number of closed argument groups on a line
pub fn count_arguments(line: &str, open: char, close: char) -> Result<usize> {
    Ok(segments(line, open, close)?
        .iter()
        .filter(|s| s.is_argument)
        .count())
}

fn nth_argument(segs: &[Segment], index: usize, line: &str) -> Result<usize> {
    if index < 1 {
        return Err(Error::InvalidArgumentIndex { index });
    }
    let found = segs.iter().filter(|s| s.is_argument).count();
    segs.iter()
        .enumerate()
        .filter(|(_, s)| s.is_argument)
        .nth(index - 1)
        .map(|(i, _)| i)
        .ok_or_else(|| Error::ArgumentNotFound {
            index,
            found,
            line: line.trim_end().to_string(),
        })
}

/// Read the content of the `index`-th (1-based) brace argument
pub fn argument(line: &str, index: usize) -> Result<String> {
    let mut segs = segments(line, '{', '}')?;
    let at = nth_argument(&segs, index, line)?;
    Ok(std::mem::take(&mut segs[at].text))
}

/// Replace the content of the `index`-th (1-based) brace argument
pub fn replace_argument(line: &str, index: usize, value: &str) -> Result<String> {
    replace_argument_with(line, index, value, '{', '}')
}

/// Replace the content of the `index`-th (1-based) argument delimited by
/// `open` and `close`, keeping every other byte of the line
///
/// # Returns
/// * `Err(Error::InvalidArgumentIndex)` - `index` is 0
/// * `Err(Error::MalformedLine)` - unbalanced `close`
/// * `Err(Error::ArgumentNotFound)` - fewer than `index` closed arguments
pub fn replace_argument_with(line: &str, index: usize, value: &str, open: char, close: char) -> Result<String> {
    if index < 1 {
        return Err(Error::InvalidArgumentIndex { index });
    }
    let mut segs = segments(line, open, close)?;
    let at = nth_argument(&segs, index, line)?;
    segs[at].text = value.to_string();
    Ok(join(&segs))
}
