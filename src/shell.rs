//! Interactive shell: command tokenization and dispatch
//!
//! Thin collaborator over the namespace core. Each line is tokenized,
//! routed to the matching `Namespace` operation, and the outcome reported
//! as text; a failed command never ends the session. Snapshot commands hand
//! the tree to the writer and persist the resulting document under the
//! configured snapshot directory.

use crate::config::SnapshotSettings;
use crate::error::{SnapshotError, TreeError};
use crate::snapshot::{SnapshotDocument, SnapshotWriter};
use crate::tree::Namespace;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("{0}")]
    Usage(String),
}

/// What the driver should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Print this (possibly empty) text and keep going.
    Output(String),
    /// Clear the screen.
    ClearScreen,
    /// End the session.
    Exit,
}

/// One interactive session: the namespace plus snapshot output settings.
pub struct Shell {
    ns: Namespace,
    snapshot_dir: PathBuf,
    pretty: bool,
    seq: u32,
}

impl Shell {
    pub fn new(settings: &SnapshotSettings) -> Self {
        Self {
            ns: Namespace::new(),
            snapshot_dir: settings.dir.clone(),
            pretty: settings.pretty,
            seq: 0,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.ns
    }

    /// Tokenize and run one command line.
    pub fn execute(&mut self, line: &str) -> Result<Outcome, ShellError> {
        let mut parts = line.trim().splitn(3, char::is_whitespace);
        let cmd = parts.next().unwrap_or("");
        let arg1 = parts.next();
        let rest = parts.next();

        match cmd {
            "" => Ok(Outcome::Output(String::new())),
            "mkdir" => {
                self.ns.create_dir_all(required(arg1, "mkdir <path>")?)?;
                Ok(Outcome::Output(String::new()))
            }
            "touch" => {
                self.ns.touch(required(arg1, "touch <path>")?)?;
                Ok(Outcome::Output(String::new()))
            }
            "rm" => {
                self.ns.remove(required(arg1, "rm <path>")?, false)?;
                Ok(Outcome::Output(String::new()))
            }
            "mv" => {
                let (src, dst) = two_paths(arg1, rest, "mv <src> <dst>")?;
                self.ns.move_or_copy(src, dst, false, true)?;
                Ok(Outcome::Output(String::new()))
            }
            "cp" => {
                let (first, tail) = (required(arg1, "cp [-r] <src> <dst>")?, rest);
                if first == "-r" {
                    let mut tail_parts =
                        tail.unwrap_or("").trim().splitn(2, char::is_whitespace);
                    let src = tail_parts.next().filter(|s| !s.is_empty());
                    let dst = tail_parts.next();
                    let (src, dst) = two_paths(src, dst, "cp -r <src> <dst>")?;
                    self.ns.move_or_copy(src, dst, true, true)?;
                } else {
                    let (src, dst) = two_paths(Some(first), tail, "cp <src> <dst>")?;
                    self.ns.move_or_copy(src, dst, true, false)?;
                }
                Ok(Outcome::Output(String::new()))
            }
            "write" | "append" => {
                let usage = "write|append <path> <text>";
                let path = required(arg1, usage)?;
                let data = rest.unwrap_or("");
                self.ns.write(path, data, cmd == "append")?;
                Ok(Outcome::Output(String::new()))
            }
            "cat" => {
                let data = self.ns.read(required(arg1, "cat <path>")?)?;
                Ok(Outcome::Output(data.to_string()))
            }
            "ls" => {
                let path = arg1.unwrap_or(".");
                let mut lines = Vec::new();
                for node in self.ns.list(path)? {
                    if node.is_dir() {
                        lines.push(format!("{}/", node.name));
                    } else {
                        lines.push(node.name.clone());
                    }
                }
                Ok(Outcome::Output(lines.join("\n")))
            }
            "cd" => {
                self.ns.change_dir(required(arg1, "cd <path>")?)?;
                Ok(Outcome::Output(String::new()))
            }
            "pwd" => Ok(Outcome::Output(self.ns.cwd_path())),
            "snapshot" => self.snapshot(arg1),
            "clear" => Ok(Outcome::ClearScreen),
            "help" => Ok(Outcome::Output(HELP.to_string())),
            "exit" | "quit" => Ok(Outcome::Exit),
            other => Err(ShellError::Usage(format!(
                "unknown command `{}` (try `help`)",
                other
            ))),
        }
    }

    fn snapshot(&mut self, mode: Option<&str>) -> Result<Outcome, ShellError> {
        let doc = match mode {
            Some("full") => SnapshotDocument::Full(SnapshotWriter::full(&mut self.ns)),
            Some("inc") | Some("incremental") => SnapshotWriter::incremental(&mut self.ns),
            _ => {
                return Err(ShellError::Usage(
                    "snapshot full|inc".to_string(),
                ))
            }
        };
        self.seq += 1;
        let name = match &doc {
            SnapshotDocument::Full(_) => format!("full-{:04}.json", self.seq),
            SnapshotDocument::Incremental(_) => format!("inc-{:04}.json", self.seq),
        };
        let target = self.snapshot_dir.join(&name);
        std::fs::create_dir_all(&self.snapshot_dir).map_err(SnapshotError::Io)?;
        std::fs::write(&target, doc.to_json(self.pretty)?).map_err(SnapshotError::Io)?;
        info!(path = %target.display(), "snapshot written");
        Ok(Outcome::Output(format!("wrote {}", target.display())))
    }
}

fn required<'a>(arg: Option<&'a str>, usage: &str) -> Result<&'a str, ShellError> {
    arg.filter(|a| !a.is_empty())
        .ok_or_else(|| ShellError::Usage(format!("usage: {}", usage)))
}

fn two_paths<'a>(
    first: Option<&'a str>,
    rest: Option<&'a str>,
    usage: &str,
) -> Result<(&'a str, &'a str), ShellError> {
    let src = required(first, usage)?;
    let dst = required(rest.map(str::trim), usage)?;
    if dst.split_whitespace().count() != 1 {
        return Err(ShellError::Usage(format!("usage: {}", usage)));
    }
    Ok((src, dst))
}

const HELP: &str = "\
Commands:
  mkdir <path>            create directories along <path>
  touch <path>            create an empty file or refresh its timestamp
  write <path> <text>     set a file's contents (creates the file)
  append <path> <text>    append to a file's contents (creates the file)
  cat <path>              print a file's contents
  ls [path]               list a directory, directories first
  cd <path>               change the current directory
  pwd                     print the current directory
  rm <path>               remove a file or empty directory
  mv <src> <dst>          move/rename a node
  cp [-r] <src> <dst>     copy a file (or a directory with -r)
  snapshot full|inc       write a snapshot document
  clear                   clear the screen
  help                    this text
  exit                    end the session";
