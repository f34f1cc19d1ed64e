use std::fmt;

/// Messages shown to the user on the host's error/debug channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    // -- Aborts
    InsufficientSelection,
    SelectionSetsPresent,
    ProcessFailed(String),

    // -- Dry-run trace
    TopObject(String),
    OthersTotal(usize),
    ChunkStart { index: usize, objects: usize },
    Command(String),
    Summary { chunks: usize, objects: usize },
}

impl Msg {
    /// Whether this message reports an aborted run.
    pub fn is_abort(&self) -> bool {
        matches!(
            self,
            Msg::InsufficientSelection | Msg::SelectionSetsPresent | Msg::ProcessFailed(_)
        )
    }
}

impl fmt::Display for Msg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Msg::InsufficientSelection => f.write_str(
                "This extension requires at least 2 elements of type path, shape or text. \
                 The elements can be part of selected groups, or directly selected.",
            ),
            Msg::SelectionSetsPresent => f.write_str(
                "This document uses Inkscape selection sets. \
                 Modifying the content with a PathOps extension \
                 may cause Inkscape to crash on reload or close. \
                 Please delete the selection sets, \
                 save the document under a new name and \
                 try again in a new Inkscape session.",
            ),
            Msg::ProcessFailed(stderr) => f.write_str(stderr),
            Msg::TopObject(id) => write!(f, "# Top object id: {id}"),
            Msg::OthersTotal(n) => write!(f, "# Other objects total: {n}"),
            Msg::ChunkStart { index, objects } => {
                write!(f, "\n# Processing {index}. chunk with {objects} objects ...")
            }
            Msg::Command(line) => f.write_str(line),
            Msg::Summary { chunks, objects } => {
                write!(f, "\n# {chunks} chunks processed, with {objects} total objects.")
            }
        }
    }
}
