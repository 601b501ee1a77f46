//! File organization handlers.

use std::path::{Path, PathBuf};

use super::{HandlerContext, HandlerResult, HandlerSet};
use crate::error::{CollabError, HandlerError};
use crate::types::EntityKind;

fn unquote(text: &str) -> &str {
    text.trim().trim_matches(|c| c == '"' || c == '\'')
}

impl HandlerSet {
    /// Two path operands: `move X to Y`, `rename X to Y`.
    fn path_pair(&self, ctx: &HandlerContext<'_>) -> Result<(String, String), HandlerError> {
        if ctx.captures.is_some() {
            let from = ctx.group(1).ok_or(HandlerError::MissingParameter("source path"))?;
            let to = ctx.group(2).ok_or(HandlerError::MissingParameter("destination"))?;
            return Ok((unquote(from).to_string(), unquote(to).to_string()));
        }
        let mut paths = self.entities(ctx, EntityKind::Path).into_iter().map(|e| e.value);
        match (paths.next(), paths.next()) {
            (Some(from), Some(to)) => Ok((from, to)),
            (Some(_), None) => Err(HandlerError::MissingParameter("destination")),
            _ => Err(HandlerError::MissingParameter("source path")),
        }
    }

    fn single_path(&self, ctx: &HandlerContext<'_>) -> Result<String, HandlerError> {
        self.param(ctx, 1, EntityKind::Path)
            .map(|p| unquote(&p).to_string())
            .filter(|p| !p.is_empty())
            .ok_or(HandlerError::MissingParameter("path"))
    }

    pub(super) fn organize_files(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let target = ctx.group(1).unwrap_or(ctx.normalized);
        let (label, folder): (&str, Option<&PathBuf>) = if target.contains("desktop") {
            ("Desktop", self.folders.desktop.as_ref())
        } else {
            ("Downloads", self.folders.downloads.as_ref())
        };
        let folder = folder.ok_or_else(|| CollabError::NotFound(format!("{label} folder")))?;

        let stats = self.collab.files.organize_directory(folder)?;
        if stats.organized_files == 0 {
            return Ok(format!("Your {label} folder is already tidy."));
        }
        let mut reply = format!(
            "Organized {} file{} in your {label} folder. Much better now!",
            stats.organized_files,
            if stats.organized_files == 1 { "" } else { "s" }
        );
        if stats.errors > 0 {
            reply.push_str(&format!(" {} could not be moved.", stats.errors));
        }
        Ok(reply)
    }

    pub(super) fn move_file(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let (from, to) = self.path_pair(ctx)?;
        self.collab.files.move_path(Path::new(&from), Path::new(&to))?;
        Ok(format!("Moved {from} to {to}."))
    }

    pub(super) fn delete_file(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let path = self.single_path(ctx)?;
        self.collab.files.delete_path(Path::new(&path))?;
        Ok(format!("Deleted {path}."))
    }

    pub(super) fn rename_file(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let (from, to) = self.path_pair(ctx)?;
        // The new name stays in the same folder
        if to.contains(['/', '\\']) {
            return Ok("The new name can't contain a folder. Try moving the file instead.".to_string());
        }
        self.collab.files.rename_path(Path::new(&from), &to)?;
        Ok(format!("Renamed {from} to {to}."))
    }

    pub(super) fn create_folder(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let path = self.single_path(ctx)?;
        self.collab.files.create_folder(Path::new(&path))?;
        Ok(format!("Created folder '{path}'."))
    }
}
