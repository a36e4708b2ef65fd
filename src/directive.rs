//! Inline directives carried by template source lines
//!
//! Directives are whitespace-delimited tokens such as ` !NL` or ` !STRIP`
//! written on the line they control. Parsing removes every recognized token at
//! once and records it in a [`DirectiveSet`], so the surviving text never
//! depends on the order the tokens were written in.

use crate::args;
use crate::lines::split_terminator;

/// Prefix of a line that pulls another file in
pub const INCLUDE_PREFIX: &str = "\\input{";

/// Reserved comment tag marking an include line the composer must inline
pub const INCLUDE_TAG: &str = "!INCLUDE";

/// A per-line directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// `!NL`: blank line after this one
    Newline,
    /// `!DISTNL`: blank line after this one, distributable builds only
    DistNewline,
    /// `!DELCOM`: drop this line's comment
    DeleteComment,
    /// `!STRIP`: strip surrounding whitespace
    Strip,
    /// `!PREVNL`: blank line before this one
    PrevNewline,
    /// `!PREVDISTNL`: blank line before this one, distributable builds only
    PrevDistNewline,
}

impl Directive {
    pub const ALL: [Directive; 6] = [
        Directive::Newline,
        Directive::DistNewline,
        Directive::DeleteComment,
        Directive::Strip,
        Directive::PrevNewline,
        Directive::PrevDistNewline,
    ];

    /// Token name without the leading `!`
    pub fn name(&self) -> &'static str {
        match self {
            Directive::Newline => "NL",
            Directive::DistNewline => "DISTNL",
            Directive::DeleteComment => "DELCOM",
            Directive::Strip => "STRIP",
            Directive::PrevNewline => "PREVNL",
            Directive::PrevDistNewline => "PREVDISTNL",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }

    fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "!{}", self.name())
    }
}

/// Set of directives found on one line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectiveSet(u8);

impl DirectiveSet {
    pub fn insert(&mut self, directive: Directive) {
        self.0 |= directive.bit();
    }

    pub fn contains(&self, directive: Directive) -> bool {
        self.0 & directive.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Whether a blank line follows the line
    pub fn newline_after(&self, dist: bool) -> bool {
        self.contains(Directive::Newline) || (dist && self.contains(Directive::DistNewline))
    }

    /// Whether a blank line precedes the line
    pub fn newline_before(&self, dist: bool) -> bool {
        self.contains(Directive::PrevNewline) || (dist && self.contains(Directive::PrevDistNewline))
    }
}

/// A source line with its directives removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// Line body without directive tokens
    pub body: String,
    /// Original terminator, empty on an unterminated last line
    pub terminator: String,
    pub directives: DirectiveSet,
}

/// Strip recognized directive tokens from `line`
///
/// A token is recognized when it is preceded by a space or tab, spelled as one
/// of the [`Directive`] names, and followed by whitespace or the end of the
/// line. Anything else, such as `!FOO` or `a!NL`, is left in the text.
pub fn parse_line(line: &str) -> ParsedLine {
    let (body, terminator) = split_terminator(line);
    let bytes = body.as_bytes();
    let mut directives = DirectiveSet::default();
    let mut out = String::with_capacity(body.len());
    let mut copied = 0;
    let mut cursor = 0;

    while let Some(offset) = body[cursor..].find('!') {
        let bang = cursor + offset;
        let name_start = bang + 1;
        let name_len = bytes[name_start..]
            .iter()
            .take_while(|b| b.is_ascii_uppercase())
            .count();
        let name_end = name_start + name_len;

        let preceded = bang > 0 && matches!(bytes[bang - 1], b' ' | b'\t');
        let followed = name_end == bytes.len() || bytes[name_end].is_ascii_whitespace();

        match Directive::from_name(&body[name_start..name_end]) {
            Some(directive) if preceded && followed => {
                out.push_str(&body[copied..bang - 1]);
                copied = name_end;
                directives.insert(directive);
            }
            _ => {}
        }
        cursor = name_start;
    }
    out.push_str(&body[copied..]);

    ParsedLine {
        body: out,
        terminator: terminator.to_string(),
        directives,
    }
}

/// Parameters of a nested include, written as `<STRIP,DELCOM,NL,NODIST>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncludeParams {
    pub strip: bool,
    pub delete_comments: bool,
    pub newline: bool,
    pub no_dist: bool,
}

/// A nested include line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub name: String,
    pub params: IncludeParams,
}

/// Recognize `\input{name} % !INCLUDE <PARAMS>`
///
/// Plain `\input{...}` lines without the tag are not nested includes and are
/// emitted like any other line. Unknown parameters are ignored.
pub fn parse_include(line: &str) -> Option<Include> {
    let trimmed = line.trim();
    if !trimmed.starts_with(INCLUDE_PREFIX) {
        return None;
    }
    let close = trimmed.find('}')?;
    let name = args::argument(&trimmed[..=close], 1).ok()?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let rest = trimmed[close + 1..].trim_start().strip_prefix('%')?;
    let rest = rest.trim_start().strip_prefix(INCLUDE_TAG)?;

    let mut params = IncludeParams::default();
    let rest = rest.trim_start();
    if let Some(list) = rest.strip_prefix('<').and_then(|r| r.split_once('>')).map(|(l, _)| l) {
        for param in list.split(',').map(|p| p.trim().to_ascii_uppercase()) {
            match param.as_str() {
                "STRIP" => params.strip = true,
                "DELCOM" => params.delete_comments = true,
                "NL" => params.newline = true,
                "NODIST" => params.no_dist = true,
                _ => {}
            }
        }
    }

    Some(Include {
        name: name.to_string(),
        params,
    })
}
