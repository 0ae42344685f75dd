//! Validation of proposed document names
//!
//! Rules run in order and the first failure wins: length, path safety,
//! uniqueness, extension. The result is advisory; callers must refuse to
//! create when a rejection is returned, the store does not re-check.

use std::fmt;

use super::document::DocumentName;
use super::error::StoreResult;
use super::file_system::DocumentStore;

/// Longest accepted name, in characters
pub const MAX_NAME_LENGTH: usize = 100;

/// Why a proposed name was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameRejection {
    /// Empty or longer than [`MAX_NAME_LENGTH`]
    Required,
    /// Would escape the store root or name a hidden file
    Unsafe,
    /// Already present in the store
    AlreadyExists,
    /// Extension has no registered renderer
    UnsupportedExtension { allowed: Vec<String> },
}

impl fmt::Display for NameRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("A name is required."),
            Self::Unsafe => {
                f.write_str("File name may not contain path separators, '..' or start with a dot.")
            }
            Self::AlreadyExists => f.write_str("File name already exists."),
            Self::UnsupportedExtension { allowed } => {
                write!(f, "File extension must be {}.", join_choices(allowed))
            }
        }
    }
}

/// ".txt", ".md" -> ".txt or .md"; three or more get commas
fn join_choices(choices: &[String]) -> String {
    match choices {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}

/// Checks names against the store and its renderer table
pub struct NameValidator<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> NameValidator<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// `Ok(None)` when the name may be created, otherwise the first rejection.
    /// Only store I/O failures surface as `Err`.
    pub fn check(&self, name: &str) -> StoreResult<Option<NameRejection>> {
        let length = name.chars().count();
        if !(1..=MAX_NAME_LENGTH).contains(&length) {
            return Ok(Some(NameRejection::Required));
        }

        if DocumentName::parse(name).is_err() {
            return Ok(Some(NameRejection::Unsafe));
        }

        if self.store.list()?.iter().any(|existing| existing == name) {
            return Ok(Some(NameRejection::AlreadyExists));
        }

        let renderers = self.store.renderers();
        if !renderers.accepts(name) {
            let allowed = renderers.extensions().map(|ext| format!(".{ext}")).collect();
            return Ok(Some(NameRejection::UnsupportedExtension { allowed }));
        }

        Ok(None)
    }
}
