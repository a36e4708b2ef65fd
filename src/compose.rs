//! Flattening of nested includes into a single output file
//!
//! The composer walks a source line by line, starting after its header
//! banner. Lines tagged as nested includes are replaced by the composed body
//! of the referenced file; every other line is emitted after its directives
//! and, when asked for, its comment and surrounding whitespace are removed.
//!
//! Traversal keeps an explicit stack of open sources instead of recursing, and
//! refuses to open a source that is already on the stack.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::directive::{Directive, parse_include, parse_line};
use crate::error::{Error, Result};
use crate::header::HeaderConfig;
use crate::lines::LineStore;
use crate::table::FileTable;

fn default_imports_marker() -> String {
    "imports".to_string()
}

/// Which whitespace a stripped line loses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StripMode {
    /// Leading and trailing whitespace
    #[default]
    Both,
    /// Trailing whitespace only, indentation is kept
    Trailing,
}

impl StripMode {
    fn apply<'s>(&self, text: &'s str) -> &'s str {
        match self {
            StripMode::Both => text.trim(),
            StripMode::Trailing => text.trim_end(),
        }
    }
}

/// Per-source emission options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    /// Strip whitespace from every line
    pub force_strip: bool,
    pub strip_mode: StripMode,
    /// Remove comments from every line
    pub strip_comments: bool,
    /// Keep a blank last line and end the source with a blank line
    pub force_trailing_blank: bool,
}

/// Settings shared by every source composed for one release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeSettings {
    /// The release's configuration file, whose capitalised section comments
    /// survive comment removal
    #[serde(default)]
    pub config_file: Option<String>,
    /// Sources whose name contains this text always end with a blank line
    #[serde(default = "default_imports_marker")]
    pub imports_marker: String,
    #[serde(default)]
    pub header: HeaderConfig,
}

impl Default for ComposeSettings {
    fn default() -> Self {
        Self {
            config_file: None,
            imports_marker: default_imports_marker(),
            header: HeaderConfig::default(),
        }
    }
}

/// Position of the first unescaped `%` in `text`
pub fn comment_start(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut backslashes = 0;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\\' => backslashes += 1,
            b'%' if backslashes % 2 == 0 => return Some(i),
            _ => backslashes = 0,
        }
    }
    None
}

/// Drop everything from the first unescaped `%` on
///
/// Whitespace before the comment is kept; stripping is a separate step.
pub fn strip_comment(text: &str) -> &str {
    match comment_start(text) {
        Some(at) => &text[..at],
        None => text,
    }
}

/// A comment-only line written in capitals, e.g. `% PAGE MARGINS`
fn is_section_comment(text: &str) -> bool {
    let Some(rest) = text.trim_start().strip_prefix('%') else {
        return false;
    };
    let rest = rest.trim_start_matches('%');
    rest.chars().any(char::is_alphabetic) && !rest.chars().any(char::is_lowercase)
}

struct Frame {
    name: String,
    next: usize,
    options: ComposeOptions,
    is_config: bool,
    emitted: usize,
    /// Blank line owed to the include line that opened this frame
    newline_on_return: bool,
}

enum Step {
    Finish,
    Include {
        name: String,
        options: ComposeOptions,
        before: Vec<String>,
        newline_on_return: bool,
    },
    Emit(Vec<String>),
}

/// Composes sources from a [`FileTable`]
///
/// Sources missing from the table are read from the table's base directory
/// and cached for the lifetime of the composer.
pub struct Composer<'a> {
    table: &'a FileTable,
    settings: &'a ComposeSettings,
    dist: bool,
    fallbacks: HashMap<String, LineStore>,
}

impl<'a> Composer<'a> {
    pub fn new(table: &'a FileTable, settings: &'a ComposeSettings, dist: bool) -> Self {
        Self {
            table,
            settings,
            dist,
            fallbacks: HashMap::new(),
        }
    }

    fn source(&self, name: &str) -> Option<&LineStore> {
        self.table.get(name).or_else(|| self.fallbacks.get(name))
    }

    /// Make `name` available, reading it from disk if the table lacks it
    ///
    /// Returns the key the source is known by, so `main` and `main.tex` name
    /// the same frame.
    fn ensure(&mut self, name: &str) -> Result<String> {
        if let Some(key) = self.table.resolve(name) {
            return Ok(key.to_string());
        }
        if let Some(key) = FileTable::candidates(name)
            .into_iter()
            .find(|n| self.fallbacks.contains_key(n))
        {
            return Ok(key);
        }
        let (key, store) = self.table.read_keyed(name)?;
        debug!(name, key = %key, "loaded include from disk");
        self.fallbacks.insert(key.clone(), store);
        Ok(key)
    }

    fn is_config(&self, name: &str) -> bool {
        self.settings.config_file.as_deref().is_some_and(|config| {
            config == name
                || config.strip_suffix(".tex") == Some(name)
                || name.strip_suffix(".tex") == Some(config)
        })
    }

    fn frame(&self, name: &str, start: usize, options: ComposeOptions, newline_on_return: bool) -> Frame {
        Frame {
            name: name.to_string(),
            next: start,
            options,
            is_config: self.is_config(name),
            emitted: 0,
            newline_on_return,
        }
    }

    /// Flatten `main`: its header verbatim, then its composed body
    pub fn flatten(&mut self, main: &str, options: ComposeOptions) -> Result<LineStore> {
        let main = self.ensure(main)?;
        let store = self.source(&main).ok_or_else(|| Error::missing(&main))?;
        let header_size = self.settings.header.size(store.lines());

        let mut output = LineStore::from_lines(store.lines()[..header_size].to_vec());
        self.compose(&mut output, &main, header_size, options)?;
        Ok(output)
    }

    /// Append the body of `source`, from line `header_size` on, to `output`
    ///
    /// # Returns
    /// * `Err(Error::MissingSourceFile)` - a nested include cannot be resolved
    /// * `Err(Error::CyclicInclusion)` - a source includes itself, directly or not
    pub fn compose(
        &mut self,
        output: &mut LineStore,
        source: &str,
        header_size: usize,
        options: ComposeOptions,
    ) -> Result<()> {
        let source = self.ensure(source)?;
        let mut stack = vec![self.frame(&source, header_size, options, false)];

        while !stack.is_empty() {
            let step = self.step(&mut stack, output);
            match step {
                Step::Emit(lines) => output.extend(lines),
                Step::Finish => {
                    if let Some(frame) = stack.pop() {
                        self.finish(&frame, output);
                    }
                }
                Step::Include {
                    name,
                    options,
                    before,
                    newline_on_return,
                } => {
                    let name = self.ensure(&name)?;
                    if stack.iter().any(|f| f.name == name) {
                        let mut chain: Vec<String> = stack.iter().map(|f| f.name.clone()).collect();
                        chain.push(name);
                        return Err(Error::CyclicInclusion { chain });
                    }
                    output.extend(before);
                    let start = self
                        .source(&name)
                        .map(|s| self.settings.header.size(s.lines()))
                        .unwrap_or(0);
                    debug!(parent = %stack[stack.len() - 1].name, name = %name, start, "inlining include");
                    stack.push(self.frame(&name, start, options, newline_on_return));
                }
            }
        }
        Ok(())
    }

    fn finish(&self, frame: &Frame, output: &mut LineStore) {
        let trailing = frame.options.force_trailing_blank || frame.name.contains(&self.settings.imports_marker);
        if !frame.is_config && trailing {
            output.push("\n");
        }
        if frame.newline_on_return {
            output.push("\n");
        }
        trace!(name = %frame.name, emitted = frame.emitted, "finished source");
    }

    /// Process the next line of the innermost source
    fn step(&self, stack: &mut [Frame], output: &LineStore) -> Step {
        let Some(frame) = stack.last_mut() else {
            return Step::Finish;
        };
        let Some(store) = self.source(&frame.name) else {
            return Step::Finish;
        };
        let lines = store.lines();
        if frame.next >= lines.len() {
            return Step::Finish;
        }

        let index = frame.next;
        frame.next += 1;
        let is_last = index + 1 == lines.len();
        let parsed = parse_line(&lines[index]);
        let directives = parsed.directives;
        let terminator = if parsed.terminator.is_empty() {
            "\n"
        } else {
            parsed.terminator.as_str()
        };
        let mut emit = Vec::new();

        if let Some(include) = parse_include(&parsed.body) {
            if include.params.no_dist && self.dist {
                trace!(name = %include.name, "skipping include in distributable build");
                return Step::Emit(emit);
            }
            if directives.newline_before(self.dist) {
                output_blank(&mut emit);
            }
            let parent = frame.options;
            let options = ComposeOptions {
                force_strip: parent.force_strip || include.params.strip,
                strip_mode: parent.strip_mode,
                strip_comments: parent.strip_comments || include.params.delete_comments,
                force_trailing_blank: include.params.newline,
            };
            frame.emitted += 1;
            return Step::Include {
                name: include.name,
                options,
                before: emit,
                newline_on_return: directives.newline_after(self.dist),
            };
        }

        let delete_comment = frame.options.strip_comments || directives.contains(Directive::DeleteComment);
        let strip = frame.options.force_strip || directives.contains(Directive::Strip);
        let mut body = parsed.body.as_str();

        if delete_comment {
            if frame.is_config && is_section_comment(body) {
                if frame.emitted > 0 && !output.ends_with_blank() {
                    output_blank(&mut emit);
                }
                if directives.newline_before(self.dist) {
                    output_blank(&mut emit);
                }
                emit.push(format!("{}{}", body, terminator));
                if directives.newline_after(self.dist) {
                    output_blank(&mut emit);
                }
                frame.emitted += 1;
                return Step::Emit(emit);
            }
            if body.trim() == "%" {
                return Step::Emit(emit);
            }
            body = strip_comment(body);
        }

        if body.trim().is_empty() && is_last && !frame.options.force_trailing_blank {
            trace!(name = %frame.name, "dropping blank last line");
            return Step::Emit(emit);
        }

        if directives.newline_before(self.dist) {
            output_blank(&mut emit);
        }
        let text = if strip {
            frame.options.strip_mode.apply(body)
        } else {
            body
        };
        emit.push(format!("{}{}", text, terminator));
        if directives.newline_after(self.dist) {
            output_blank(&mut emit);
        }
        frame.emitted += 1;
        Step::Emit(emit)
    }
}

fn output_blank(emit: &mut Vec<String>) {
    emit.push("\n".to_string());
}
