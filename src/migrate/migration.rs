use crate::error::Error;
use crate::Result;
use std::collections::BTreeMap;

const UP_MARKER: &str = "-- migrate:up";
const DOWN_MARKER: &str = "-- migrate:down";

/// A migration step read from a `.sql` file.
///
/// The file is split in two sections introduced by `-- migrate:up` and
/// `-- migrate:down` comment lines. A file without markers is a forward-only step.
#[derive(Clone, Debug, PartialEq)]
pub struct SqlMigration {
    pub name: String,
    pub up: String,
    pub down: String,
}

enum Section {
    None,
    Up,
    Down,
}

impl SqlMigration {
    pub fn parse(name: &str, contents: &str) -> Result<Self> {
        let has_markers = contents
            .lines()
            .any(|l| l.trim() == UP_MARKER || l.trim() == DOWN_MARKER);
        if !has_markers {
            return Ok(Self {
                name: name.to_string(),
                up: contents.trim().to_string(),
                down: String::new(),
            });
        }

        let mut section = Section::None;
        let mut up = vec![];
        let mut down = vec![];
        for line in contents.lines() {
            match line.trim() {
                UP_MARKER => section = Section::Up,
                DOWN_MARKER => section = Section::Down,
                trimmed => match section {
                    Section::Up => up.push(line),
                    Section::Down => down.push(line),
                    Section::None if trimmed.is_empty() || trimmed.starts_with("--") => (),
                    Section::None => {
                        return Err(Error::invalid_migration(
                            name,
                            "statements found before the first section marker",
                        ));
                    }
                },
            }
        }

        Ok(Self {
            name: name.to_string(),
            up: up.join("\n").trim().to_string(),
            down: down.join("\n").trim().to_string(),
        })
    }

    /// Replaces every `{{key}}` placeholder with the corresponding parameter.
    pub fn bind_params(mut self, params: &BTreeMap<String, String>) -> Self {
        for (key, value) in params {
            let placeholder = format!("{{{{{}}}}}", key);
            self.up = self.up.replace(&placeholder, value);
            self.down = self.down.replace(&placeholder, value);
        }

        self
    }
}
