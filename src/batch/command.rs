use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::model::options::Verb;

/// One batch invocation of the host binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl BatchCommand {
    /// For every id: duplicate `top`, select the pair, apply `verb`, deselect.
    /// Then save and quit.
    pub fn path_ops(program: &Path, file: &Path, top: &str, ids: &[String], verb: Verb) -> Self {
        let mut args: Vec<OsString> = Vec::with_capacity(ids.len() * 5 + 4);
        for id in ids {
            args.push(format!("--select={top}").into());
            args.push("--verb=EditDuplicate".into());
            args.push(format!("--select={id}").into());
            args.push(format!("--verb={verb}").into());
            args.push("--verb=EditDeselect".into());
        }
        args.push("--verb=FileSave".into());
        args.push("--verb=FileQuit".into());
        args.push("-f".into());
        args.push(file.as_os_str().to_owned());

        Self {
            program: program.to_path_buf(),
            args,
        }
    }
}

impl fmt::Display for BatchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Split `items` into consecutive runs of at most `max_len` (at least one per run).
pub fn chunks<T>(items: &[T], max_len: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(max_len.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("path{i}")).collect()
    }

    #[test]
    fn chunk_count_and_concatenation() {
        for (n, m) in [(0, 3), (1, 3), (3, 3), (7, 3), (1000, 500), (1001, 500)] {
            let others = ids(n);
            let parts: Vec<&[String]> = chunks(&others, m).collect();
            assert_eq!(parts.len(), n.div_ceil(m), "n={n} m={m}");
            assert!(parts.iter().all(|c| c.len() <= m && !c.is_empty()));
            assert_eq!(parts.concat(), others);
        }
    }

    #[test]
    fn zero_chunk_size_does_not_panic() {
        let others = ids(2);
        assert_eq!(chunks(&others, 0).count(), 2);
    }

    #[test]
    fn argv_layout() {
        let cmd = BatchCommand::path_ops(
            Path::new("inkscape"),
            Path::new("/tmp/doc-pathops.svg"),
            "top",
            &ids(2),
            Verb::Union,
        );
        let args: Vec<String> = cmd
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "--select=top",
                "--verb=EditDuplicate",
                "--select=path0",
                "--verb=SelectionUnion",
                "--verb=EditDeselect",
                "--select=top",
                "--verb=EditDuplicate",
                "--select=path1",
                "--verb=SelectionUnion",
                "--verb=EditDeselect",
                "--verb=FileSave",
                "--verb=FileQuit",
                "-f",
                "/tmp/doc-pathops.svg",
            ]
        );
        assert!(cmd.to_string().starts_with("inkscape --select=top --verb=EditDuplicate"));
    }
}
