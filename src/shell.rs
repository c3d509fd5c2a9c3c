// FILE: src/shell.rs
//! Interactive shell: one `SeekState` (and so one search session) per run.
//!
//! Lines are parsed into a `ShellCommand` through a closed command table
//! before anything runs. Command errors are printed and the loop continues.

use crate::engine::VariantCount;
use crate::error::{Result, SeekError};
use crate::opener::Opener;
use crate::state::SeekState;
use crate::storage::RegistryCommand;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Search,
    Find,
    Open,
    Session,
    Paths,
    Fetch,
    Build,
    Update,
    Help,
    Quit,
}

const COMMANDS: &[(&str, CommandKind, &str)] = &[
    ("search", CommandKind::Search, "search [-b] [-a] QUERY   fuzzy search (-b: 30 per variant, -a: apps only)"),
    ("find", CommandKind::Find, "find NAME                 search by exact name"),
    ("open", CommandKind::Open, "open NAME [#N] | @LABEL   open a result (N-th path) or a default path"),
    ("session", CommandKind::Session, "session                   show the last results"),
    ("paths", CommandKind::Paths, "paths get|add|modify|delete [NAME] [PATH]"),
    ("fetch", CommandKind::Fetch, "fetch                     crawl all roots into the catalog"),
    ("build", CommandKind::Build, "build [--resume]          embed catalog names"),
    ("update", CommandKind::Update, "update                    re-crawl and embed new names"),
    ("help", CommandKind::Help, "help                      this list"),
    ("quit", CommandKind::Quit, "quit                      leave the shell"),
];

impl CommandKind {
    pub fn lookup(word: &str) -> Result<Self> {
        let key = word.to_ascii_lowercase();
        COMMANDS
            .iter()
            .find(|(name, _, _)| *name == key)
            .map(|(_, kind, _)| *kind)
            .ok_or_else(|| SeekError::InvalidArgument(format!("Unknown command '{}'. Try 'help'.", word)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    /// A name from the current session, with an optional 0-based path index.
    Result { name: String, choice: Option<usize> },
    /// A default-path label.
    Default(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Search { query: String, count: VariantCount, apps_only: bool },
    Find { name: String },
    Open(OpenTarget),
    Session,
    Paths(RegistryCommand),
    Fetch,
    Build { resume: bool },
    Update,
    Help,
    Quit,
}

impl ShellCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        let Some(word) = line.split_whitespace().next() else {
            return Ok(None);
        };
        let rest = line[word.len()..].trim();

        let command = match CommandKind::lookup(word)? {
            CommandKind::Search => parse_search(rest)?,
            CommandKind::Find => Self::Find { name: required(rest, "name")? },
            CommandKind::Open => Self::Open(parse_open(rest)?),
            CommandKind::Session => Self::Session,
            CommandKind::Paths => {
                let mut parts = rest.splitn(3, char::is_whitespace);
                let op = parts.next().filter(|s| !s.is_empty()).unwrap_or("get");
                Self::Paths(RegistryCommand::new(op, parts.next(), parts.next())?)
            }
            CommandKind::Fetch => Self::Fetch,
            CommandKind::Build => match rest {
                "" => Self::Build { resume: false },
                "--resume" | "-r" => Self::Build { resume: true },
                other => {
                    return Err(SeekError::InvalidArgument(format!(
                        "Unknown build option '{}' (expected --resume)",
                        other
                    )))
                }
            },
            CommandKind::Update => Self::Update,
            CommandKind::Help => Self::Help,
            CommandKind::Quit => Self::Quit,
        };
        Ok(Some(command))
    }
}

fn required(value: &str, what: &str) -> Result<String> {
    if value.is_empty() {
        Err(SeekError::InvalidArgument(format!("Missing {}", what)))
    } else {
        Ok(value.to_string())
    }
}

fn parse_search(rest: &str) -> Result<ShellCommand> {
    let mut count = VariantCount::default();
    let mut apps_only = false;
    let mut tokens = rest.split_whitespace().peekable();

    while let Some(flag) = tokens.peek().copied() {
        match flag {
            "-b" | "--broad" => count = VariantCount::Broad,
            "-a" | "--app" => apps_only = true,
            "-n" => {
                tokens.next();
                let n = tokens
                    .peek()
                    .copied()
                    .ok_or_else(|| SeekError::InvalidArgument("-n needs 10 or 30".into()))?;
                count = n.parse()?;
            }
            _ => break,
        }
        tokens.next();
    }

    let query = tokens.collect::<Vec<_>>().join(" ");
    Ok(ShellCommand::Search { query: required(&query, "query")?, count, apps_only })
}

fn parse_open(rest: &str) -> Result<OpenTarget> {
    if let Some(label) = rest.strip_prefix('@') {
        return Ok(OpenTarget::Default(required(label.trim(), "label")?));
    }

    // A trailing "#N" picks the N-th path (1-based).
    if let Some((name, pick)) = rest.rsplit_once(" #") {
        if let Ok(n) = pick.trim().parse::<usize>() {
            if n == 0 {
                return Err(SeekError::InvalidArgument("Path numbers start at 1".into()));
            }
            return Ok(OpenTarget::Result { name: required(name.trim(), "name")?, choice: Some(n - 1) });
        }
    }
    Ok(OpenTarget::Result { name: required(rest, "name")?, choice: None })
}

/// Print names with their numbered paths.
pub fn render_hits<W: Write>(out: &mut W, hits: &[(String, Vec<String>)]) -> std::io::Result<()> {
    for (i, (name, paths)) in hits.iter().enumerate() {
        writeln!(out, "{:>3}. {}", i + 1, name)?;
        if paths.len() > 1 {
            for (j, path) in paths.iter().enumerate() {
                writeln!(out, "       #{} {}", j + 1, path)?;
            }
        } else if let Some(path) = paths.first() {
            writeln!(out, "       {}", path)?;
        }
    }
    Ok(())
}

pub struct Shell<'a> {
    state: &'a mut SeekState,
    opener: &'a dyn Opener,
}

impl<'a> Shell<'a> {
    pub fn new(state: &'a mut SeekState, opener: &'a dyn Opener) -> Self {
        Self { state, opener }
    }

    /// Read commands until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> Result<()> {
        write!(out, "seekfs> ")?;
        out.flush()?;

        for line in input.lines() {
            let line = line?;
            let keep_going = match ShellCommand::parse(&line) {
                Ok(Some(command)) => match self.execute(command, &mut out) {
                    Ok(more) => more,
                    Err(e) => {
                        tracing::debug!("[Shell] Command failed: {}", e);
                        writeln!(out, "error: {}", e)?;
                        true
                    }
                },
                Ok(None) => true,
                Err(e) => {
                    writeln!(out, "error: {}", e)?;
                    true
                }
            };
            if !keep_going {
                return Ok(());
            }
            write!(out, "seekfs> ")?;
            out.flush()?;
        }
        Ok(())
    }

    /// Run one command. Returns false when the shell should stop.
    pub fn execute<W: Write>(&mut self, command: ShellCommand, out: &mut W) -> Result<bool> {
        match command {
            ShellCommand::Search { query, count, apps_only } => {
                let outcome = self.state.search(&query, count, apps_only)?;
                if !outcome.index_available {
                    writeln!(out, "Vector index not built. Run 'fetch' then 'build'.")?;
                }
                render_hits(out, &outcome.hits)?;
            }
            ShellCommand::Find { name } => {
                let outcome = self.state.find(&name)?;
                render_hits(out, &outcome.hits)?;
            }
            ShellCommand::Open(OpenTarget::Result { name, choice }) => {
                let path = self.state.open_name(&name, choice, self.opener)?;
                writeln!(out, "Opened {}", path.display())?;
            }
            ShellCommand::Open(OpenTarget::Default(label)) => {
                let path = self.state.open_default(&label, self.opener)?;
                writeln!(out, "Opened {}", path.display())?;
            }
            ShellCommand::Session => render_hits(out, &self.state.session_hits())?,
            ShellCommand::Paths(cmd) => {
                for (name, path) in self.state.registry(cmd)? {
                    writeln!(out, "{} = {}", name, path)?;
                }
            }
            ShellCommand::Fetch => {
                let names = self.state.fetch(None)?;
                writeln!(out, "Catalogued {} names", names)?;
            }
            ShellCommand::Build { resume } => {
                let n = self.state.build(resume)?;
                writeln!(out, "Embedded {} names", n)?;
            }
            ShellCommand::Update => {
                let added = self.state.update(None)?;
                writeln!(out, "{} new names", added.len())?;
            }
            ShellCommand::Help => {
                for (_, _, usage) in COMMANDS {
                    writeln!(out, "  {}", usage)?;
                }
            }
            ShellCommand::Quit => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::HashEmbedder;
    use crate::opener::testing::RecordingOpener;
    use crate::state::testing::state;
    use std::io::Cursor;
    use std::sync::Arc;

    #[test]
    fn test_unknown_command_is_invalid() {
        assert!(matches!(ShellCommand::parse("launch chrome"), Err(SeekError::InvalidArgument(_))));
        assert_eq!(ShellCommand::parse("   ").unwrap(), None);
        assert_eq!(ShellCommand::parse("QUIT").unwrap(), Some(ShellCommand::Quit));
    }

    #[test]
    fn test_parse_search_flags() {
        assert_eq!(
            ShellCommand::parse("search -b -a web browser").unwrap(),
            Some(ShellCommand::Search {
                query: "web browser".into(),
                count: VariantCount::Broad,
                apps_only: true
            })
        );
        assert_eq!(
            ShellCommand::parse("search -n 10 notes").unwrap(),
            Some(ShellCommand::Search { query: "notes".into(), count: VariantCount::Narrow, apps_only: false })
        );
        assert!(ShellCommand::parse("search -n 20 notes").is_err());
        assert!(ShellCommand::parse("search -a").is_err());
    }

    #[test]
    fn test_parse_build_options() {
        assert_eq!(ShellCommand::parse("build").unwrap(), Some(ShellCommand::Build { resume: false }));
        assert_eq!(ShellCommand::parse("build --resume").unwrap(), Some(ShellCommand::Build { resume: true }));
        assert_eq!(ShellCommand::parse("build -r").unwrap(), Some(ShellCommand::Build { resume: true }));
        assert!(matches!(ShellCommand::parse("build foo"), Err(SeekError::InvalidArgument(_))));
    }

    #[test]
    fn test_parse_open_targets() {
        assert_eq!(
            ShellCommand::parse("open Google Chrome.lnk #2").unwrap(),
            Some(ShellCommand::Open(OpenTarget::Result { name: "Google Chrome.lnk".into(), choice: Some(1) }))
        );
        assert_eq!(
            ShellCommand::parse("open report.pdf").unwrap(),
            Some(ShellCommand::Open(OpenTarget::Result { name: "report.pdf".into(), choice: None }))
        );
        assert_eq!(
            ShellCommand::parse("open @desktop").unwrap(),
            Some(ShellCommand::Open(OpenTarget::Default("desktop".into())))
        );
        assert!(ShellCommand::parse("open x #0").is_err());
    }

    #[test]
    fn test_parse_paths_validates_arguments() {
        assert_eq!(ShellCommand::parse("paths").unwrap(), Some(ShellCommand::Paths(RegistryCommand::Get)));
        assert_eq!(
            ShellCommand::parse("paths add editor /opt/My Editor/editor").unwrap(),
            Some(ShellCommand::Paths(RegistryCommand::Add {
                name: "editor".into(),
                path: "/opt/My Editor/editor".into()
            }))
        );
        assert!(matches!(ShellCommand::parse("paths add editor"), Err(SeekError::InvalidArgument(_))));
        assert!(matches!(ShellCommand::parse("paths rename a b"), Err(SeekError::InvalidArgument(_))));
    }

    #[test]
    fn test_session_run() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("notes.txt"), "x").unwrap();
        let data = tempfile::tempdir().unwrap();
        let mut st = state(data.path(), root.path(), Arc::new(HashEmbedder::new()));
        let opener = RecordingOpener::default();

        let input = Cursor::new("session\nbogus\nfetch\nbuild\nfind notes.txt\nopen notes.txt\nquit\nsession\n");
        let mut out = Vec::new();
        Shell::new(&mut st, &opener).run(input, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1. none"));
        assert!(text.contains("error: Invalid argument: Unknown command 'bogus'"));
        assert!(text.contains("Embedded 1 names"));
        assert_eq!(opener.opened(), vec![root.path().join("notes.txt")]);
    }
}
