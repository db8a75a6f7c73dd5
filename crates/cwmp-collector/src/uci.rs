//! UCI configuration access.
//!
//! One [`ConfigStore`] capability, two back-ends: [`UciFile`] parses and
//! writes the OpenWrt text format directly, [`UciCli`] drives the `uci`
//! binary through the executor. The refresh jobs persist parameter
//! snapshots into `/etc/config/tr069` through whichever is selected.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::exec::Executor;
use crate::CollectorError;

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, section: &str, option: &str) -> Result<Option<String>, CollectorError>;
    async fn set(&mut self, section: &str, option: &str, value: &str)
    -> Result<(), CollectorError>;
    /// Flushes pending changes to the backing store.
    async fn commit(&mut self) -> Result<(), CollectorError>;
}

/// One `config <type> "<name>"` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UciSection {
    pub section_type: String,
    pub name: String,
    pub options: BTreeMap<String, String>,
    pub lists: Vec<(String, String)>,
}

/// The pure text back-end.
#[derive(Debug, Clone, Default)]
pub struct UciFile {
    path: Option<PathBuf>,
    pub package: String,
    pub sections: Vec<UciSection>,
}

impl UciFile {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            path: None,
            package: package.into(),
            sections: Vec::new(),
        }
    }

    /// Loads a UCI file; a missing file yields an empty package so the
    /// first snapshot can create it.
    pub async fn load(path: impl AsRef<Path>, package: &str) -> Result<Self, CollectorError> {
        let path = path.as_ref();
        let mut parsed = match tokio::fs::read_to_string(path).await {
            Ok(text) => Self::parse(&text)?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Self::new(package),
            Err(error) => return Err(error.into()),
        };
        if parsed.package.is_empty() {
            parsed.package = package.to_owned();
        }
        parsed.path = Some(path.to_owned());
        Ok(parsed)
    }

    /// Parses the `package/config/option/list` format. `#` comments and
    /// blank lines are ignored; values may be quoted with `'` or `"`.
    pub fn parse(text: &str) -> Result<Self, CollectorError> {
        let mut file = Self::default();
        for (number, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let rest = rest.trim();
            match keyword {
                "package" => file.package = unquote(rest).to_owned(),
                "config" => {
                    let (section_type, name) =
                        rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                    file.sections.push(UciSection {
                        section_type: unquote(section_type).to_owned(),
                        name: unquote(name.trim()).to_owned(),
                        ..UciSection::default()
                    });
                }
                "option" | "list" => {
                    let section =
                        file.sections
                            .last_mut()
                            .ok_or_else(|| CollectorError::UciParse {
                                line: number + 1,
                                reason: format!("{keyword} outside of a config section"),
                            })?;
                    let (key, value) = rest
                        .split_once(char::is_whitespace)
                        .ok_or_else(|| CollectorError::UciParse {
                            line: number + 1,
                            reason: format!("{keyword} without a value"),
                        })?;
                    let value = unquote(value.trim()).to_owned();
                    if keyword == "option" {
                        section.options.insert(unquote(key).to_owned(), value);
                    } else {
                        section.lists.push((unquote(key).to_owned(), value));
                    }
                }
                other => {
                    return Err(CollectorError::UciParse {
                        line: number + 1,
                        reason: format!("unknown keyword {other:?}"),
                    });
                }
            }
        }
        Ok(file)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "package {}", self.package);
        for section in &self.sections {
            let _ = writeln!(out);
            let _ = writeln!(out, "config {} '{}'", section.section_type, section.name);
            for (key, value) in &section.options {
                let _ = writeln!(out, "\toption {key} '{value}'");
            }
            for (key, value) in &section.lists {
                let _ = writeln!(out, "\tlist {key} '{value}'");
            }
        }
        out
    }

    fn section_mut(&mut self, name: &str) -> &mut UciSection {
        if let Some(position) = self.sections.iter().position(|s| s.name == name) {
            return &mut self.sections[position];
        }
        self.sections.push(UciSection {
            section_type: "snapshot".to_owned(),
            name: name.to_owned(),
            ..UciSection::default()
        });
        self.sections.last_mut().unwrap_or_else(|| unreachable!())
    }
}

fn unquote(raw: &str) -> &str {
    let raw = raw.trim();
    if raw.len() >= 2 {
        let bytes = raw.as_bytes();
        if (bytes[0] == b'\'' && bytes[raw.len() - 1] == b'\'')
            || (bytes[0] == b'"' && bytes[raw.len() - 1] == b'"')
        {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

#[async_trait]
impl ConfigStore for UciFile {
    async fn get(&self, section: &str, option: &str) -> Result<Option<String>, CollectorError> {
        Ok(self
            .sections
            .iter()
            .find(|s| s.name == section)
            .and_then(|s| s.options.get(option))
            .cloned())
    }

    async fn set(
        &mut self,
        section: &str,
        option: &str,
        value: &str,
    ) -> Result<(), CollectorError> {
        self.section_mut(section)
            .options
            .insert(option.to_owned(), value.to_owned());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), CollectorError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, self.render()).await?;
        debug!(path = %path.display(), sections = self.sections.len(), "wrote UCI snapshot");
        Ok(())
    }
}

/// Back-end that shells out to the `uci` binary.
pub struct UciCli {
    executor: Executor,
    package: String,
}

impl UciCli {
    pub fn new(executor: Executor, package: impl Into<String>) -> Self {
        Self {
            executor,
            package: package.into(),
        }
    }
}

#[async_trait]
impl ConfigStore for UciCli {
    async fn get(&self, section: &str, option: &str) -> Result<Option<String>, CollectorError> {
        let path = format!("{}.{}.{}", self.package, section, option);
        let result = self.executor.execute("uci", &["get", &path]).await?;
        if result.success && !result.text.is_empty() {
            Ok(Some(result.text))
        } else {
            Ok(None)
        }
    }

    async fn set(
        &mut self,
        section: &str,
        option: &str,
        value: &str,
    ) -> Result<(), CollectorError> {
        let assignment = format!("{}.{}.{}={}", self.package, section, option, value);
        let result = self.executor.execute("uci", &["set", &assignment]).await?;
        if result.success {
            Ok(())
        } else {
            Err(CollectorError::Unavailable("uci"))
        }
    }

    async fn commit(&mut self) -> Result<(), CollectorError> {
        let result = self
            .executor
            .execute("uci", &["commit", &self.package])
            .await?;
        if result.success {
            Ok(())
        } else {
            Err(CollectorError::Unavailable("uci"))
        }
    }
}
