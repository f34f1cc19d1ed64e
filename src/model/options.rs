use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgAction, Parser};

use crate::error::PathOpsError;

pub const DEFAULT_MAX_OPS: usize = 500;

/// Inkscape verb performing the boolean operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Union,
    Difference,
    Intersection,
    Exclusion,
    Division,
    Cut,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Union => "SelectionUnion",
            Verb::Difference => "SelectionDiff",
            Verb::Intersection => "SelectionIntersect",
            Verb::Exclusion => "SelectionSymDiff",
            Verb::Division => "SelectionDivide",
            Verb::Cut => "SelectionCutPath",
        }
    }
}

impl FromStr for Verb {
    type Err = PathOpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SelectionUnion" => Ok(Verb::Union),
            "SelectionDiff" => Ok(Verb::Difference),
            "SelectionIntersect" => Ok(Verb::Intersection),
            "SelectionSymDiff" => Ok(Verb::Exclusion),
            "SelectionDivide" => Ok(Verb::Division),
            "SelectionCutPath" => Ok(Verb::Cut),
            other => Err(PathOpsError::UnknownVerb(other.to_string())),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options passed by Inkscape when it launches the extension.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pathops",
    version,
    about = "Apply an Inkscape path operation between the top-most selected object and every other selected object"
)]
pub struct Options {
    /// Id of a selected object (repeatable)
    #[arg(long = "id", value_name = "ID")]
    pub ids: Vec<String>,

    /// Inkscape verb for the path operation
    #[arg(long = "ink_verb", default_value = "SelectionDiff")]
    pub ink_verb: Verb,

    /// Max operations per external run (0 selects the default)
    #[arg(long = "max_ops", default_value_t = DEFAULT_MAX_OPS)]
    pub max_ops: usize,

    /// Recurse beyond one group level
    #[arg(long = "recursive_sel", action = ArgAction::Set, value_parser = parse_inkbool, default_value = "true")]
    pub recursive_sel: bool,

    /// Keep top element when done
    #[arg(long = "keep_top", action = ArgAction::Set, value_parser = parse_inkbool, default_value = "true")]
    pub keep_top: bool,

    /// Default stroke color
    #[arg(long = "default_stroke", default_value = "#000000")]
    pub default_stroke: String,

    /// Default stroke width
    #[arg(long = "default_stroke_width", default_value = "1px")]
    pub default_stroke_width: String,

    /// Dry-run without exec
    #[arg(long = "dry_run", action = ArgAction::Set, value_parser = parse_inkbool, default_value = "false")]
    pub dry_run: bool,

    #[allow(dead_code)] // dialog notebook page, sent by the host and not used
    #[arg(long = "tab", hide = true)]
    pub tab: Option<String>,

    #[allow(dead_code)] // node-tool selection, sent by the host and not used
    #[arg(long = "selected-nodes", hide = true)]
    pub selected_nodes: Vec<String>,

    /// SVG document to process
    pub document: PathBuf,
}

impl Options {
    pub fn chunk_size(&self) -> usize {
        if self.max_ops == 0 {
            DEFAULT_MAX_OPS
        } else {
            self.max_ops
        }
    }
}

/// Inkscape's boolean spelling (`true`/`false`), plus the usual aliases.
pub fn parse_inkbool(value: &str) -> Result<bool, PathOpsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(PathOpsError::InvalidBool(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_host_dialog() {
        let opts = Options::parse_from(["pathops", "drawing.svg"]);
        assert_eq!(opts.ink_verb, Verb::Difference);
        assert_eq!(opts.max_ops, 500);
        assert!(opts.recursive_sel);
        assert!(opts.keep_top);
        assert_eq!(opts.default_stroke, "#000000");
        assert_eq!(opts.default_stroke_width, "1px");
        assert!(!opts.dry_run);
        assert!(opts.ids.is_empty());
        assert_eq!(opts.document, PathBuf::from("drawing.svg"));
    }

    #[test]
    fn parses_host_invocation() {
        let opts = Options::parse_from([
            "pathops",
            "--id=path10",
            "--id=g4",
            "--ink_verb=SelectionCutPath",
            "--max_ops=2",
            "--recursive_sel=false",
            "--keep_top=false",
            "--dry_run=true",
            "--tab=\"options\"",
            "--selected-nodes=path10:0:3",
            "/tmp/ink_ext_XXXXXX.svg",
        ]);
        assert_eq!(opts.ids, vec!["path10", "g4"]);
        assert_eq!(opts.ink_verb, Verb::Cut);
        assert_eq!(opts.chunk_size(), 2);
        assert!(!opts.recursive_sel);
        assert!(!opts.keep_top);
        assert!(opts.dry_run);
        assert_eq!(opts.selected_nodes, vec!["path10:0:3"]);
    }

    #[test]
    fn zero_max_ops_uses_default() {
        let opts = Options::parse_from(["pathops", "--max_ops=0", "a.svg"]);
        assert_eq!(opts.chunk_size(), DEFAULT_MAX_OPS);
    }

    #[test]
    fn rejects_unknown_verb() {
        let res = Options::try_parse_from(["pathops", "--ink_verb=SelectionExplode", "a.svg"]);
        assert!(res.is_err());
    }

    #[test]
    fn inkbool_spellings() {
        assert!(parse_inkbool("true").unwrap());
        assert!(parse_inkbool("True").unwrap());
        assert!(!parse_inkbool("false").unwrap());
        assert!(parse_inkbool("maybe").is_err());
    }
}
