#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const MAIN: &str = "\
% Exam template
% Version: 0.0.0
% License: MIT
%
%
\\documentclass{article}
\\input{config} % !INCLUDE <DELCOM>
\\begin{document}
\\Title
\\end{document}
";

pub const CONFIG: &str = "\
\\newcommand{\\Title}{Report}
\\def\\Abstract{
  A short abstract
}
% PAGE
\\setlength{\\parindent}{0pt} % no indent
";

pub const MANIFEST: &str = r#"{
    "name": "exam",
    "base_dir": "template",
    "files": ["main.tex", "config.tex"],
    "main": "main.tex",
    "output_dir": "dist",
    "stats_file": "stats.json",
    "compose": {"config_file": "config.tex"},
    "transforms": [
        {"op": "delete_block", "file": "config.tex", "marker": "\\def\\Abstract"},
        {"op": "replace_argument", "file": "config.tex", "marker": "\\newcommand{\\Title}", "index": 2, "value": "Exam"}
    ]
}"#;

/// Body expected in `dist/main.tex`, after the stamped header
pub const BODY: &str = "\
\\documentclass{article}
\\newcommand{\\Title}{Exam}

% PAGE
\\setlength{\\parindent}{0pt} \n\
\\begin{document}
\\Title
\\end{document}
";

/// Lay out a release in `root` and return the manifest path
pub fn write_release(root: &Path, manifest: &str) -> PathBuf {
    let template = root.join("template");
    fs::create_dir_all(&template).unwrap();
    fs::write(template.join("main.tex"), MAIN).unwrap();
    fs::write(template.join("config.tex"), CONFIG).unwrap();

    let path = root.join("exam.json");
    fs::write(&path, manifest).unwrap();
    path
}
