//! The notes server: a flat directory of `<slug>.txt` files.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use conduit_config::schema::NotesConfig;
use conduit_registry::{
    from_fn, CapabilityHandler, CapabilityRegistry, HandlerFault, HandlerOutput, Invocation,
};
use conduit_types::{ArgumentSpec, CapabilityDescriptor, PromptArgument};

use crate::error::ServerError;
use crate::locks::KeyedLocks;

pub const SERVER_NAME: &str = "mcp-notes-server";

/// URI scheme prefix for notes.
pub const NOTE_SCHEME: &str = "note://";

/// Returned by the resource when no file exists for the slug.
pub const NOT_FOUND_TEXT: &str = "Note not found.";

/// File-backed note storage. The directory is created on first write.
#[derive(Debug)]
pub struct NoteStore {
    dir: PathBuf,
    locks: KeyedLocks,
}

impl NoteStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: KeyedLocks::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Saves `content` (trimmed) under `slug`, replacing any previous note.
    pub async fn write(&self, slug: &str, content: &str) -> Result<(), ServerError> {
        let path = self.path_for(slug)?;
        let _guard = self.locks.lock(slug).await;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, content.trim()).await?;
        info!(%slug, path = %path.display(), "note saved");
        Ok(())
    }

    /// Reads the note, or `None` if it was never written.
    pub async fn read(&self, slug: &str) -> Result<Option<String>, ServerError> {
        let path = self.path_for(slug)?;
        let _guard = self.locks.lock(slug).await;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Sorted `note://<slug>` URIs, keeping those that start with `root`.
    pub async fn list(&self, root: Option<&str>) -> Result<Vec<String>, ServerError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut uris = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                uris.push(format!("{NOTE_SCHEME}{stem}"));
            }
        }
        uris.sort();

        match root.filter(|r| !r.is_empty()) {
            Some(root) => Ok(uris.into_iter().filter(|u| u.starts_with(root)).collect()),
            None => Ok(uris),
        }
    }

    fn path_for(&self, slug: &str) -> Result<PathBuf, ServerError> {
        validate_slug(slug)?;
        Ok(self.dir.join(format!("{slug}.txt")))
    }
}

/// A slug must name exactly one file inside the notes directory.
pub fn validate_slug(slug: &str) -> Result<(), ServerError> {
    let bad = slug.is_empty()
        || slug == "."
        || slug == ".."
        || slug.contains(['/', '\\', '\0']);
    if bad {
        return Err(ServerError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

/// Prompt text asking for advice on `topic`.
pub fn suggest_note_text(topic: &str) -> String {
    format!("Write a short, thoughtful note for someone who needs advice about: {topic}")
}

struct WriteNote(Arc<NoteStore>);

#[async_trait]
impl CapabilityHandler for WriteNote {
    async fn invoke(&self, inv: Invocation) -> Result<HandlerOutput, HandlerFault> {
        let slug = inv.str_arg("slug").unwrap_or_default();
        let content = inv.str_arg("content").unwrap_or_default();
        if slug.is_empty() || content.is_empty() {
            return Err(HandlerFault::failed("Missing slug or content."));
        }
        self.0.write(slug, content).await?;
        Ok(HandlerOutput::Text(format!("Note '{slug}' saved.")))
    }
}

struct ListNotes(Arc<NoteStore>);

#[async_trait]
impl CapabilityHandler for ListNotes {
    async fn invoke(&self, inv: Invocation) -> Result<HandlerOutput, HandlerFault> {
        let uris = self.0.list(inv.str_arg("root")).await?;
        debug!(count = uris.len(), "listed notes");
        Ok(HandlerOutput::TextList(uris))
    }
}

struct ReadNote(Arc<NoteStore>);

#[async_trait]
impl CapabilityHandler for ReadNote {
    async fn invoke(&self, inv: Invocation) -> Result<HandlerOutput, HandlerFault> {
        let slug = inv.binding("slug")?;
        let text = self
            .0
            .read(slug)
            .await?
            .unwrap_or_else(|| NOT_FOUND_TEXT.to_string());
        Ok(HandlerOutput::Text(text))
    }
}

/// Registers the notes capabilities over the configured directory.
pub fn registry(config: &NotesConfig) -> Result<CapabilityRegistry, ServerError> {
    let store = Arc::new(NoteStore::new(config.directory.clone()));
    let mut builder = CapabilityRegistry::builder();
    builder
        .register(
            CapabilityDescriptor::tool(
                "write_note",
                "Save a note to the local notes directory.",
                &[
                    ArgumentSpec::required("slug", "string", "Unique slug for the note"),
                    ArgumentSpec::required("content", "string", "Content of the note"),
                ],
            ),
            Arc::new(WriteNote(Arc::clone(&store))),
        )?
        .register(
            CapabilityDescriptor::tool(
                "list_notes",
                "List all saved notes.",
                &[ArgumentSpec::optional("root", "string", "Optional root URI filter")],
            ),
            Arc::new(ListNotes(Arc::clone(&store))),
        )?
        .register(
            CapabilityDescriptor::resource(
                "note",
                "A saved note, addressed by slug.",
                "note://{slug}",
                Some("text/plain"),
            ),
            Arc::new(ReadNote(store)),
        )?
        .register(
            CapabilityDescriptor::prompt(
                "suggest_note_prompt",
                "Ask for a short note of advice on a topic.",
                vec![PromptArgument::new("topic", "What the advice is about", true)],
            ),
            from_fn(|inv| Ok(HandlerOutput::Text(suggest_note_text(inv.required_str("topic")?)))),
        )?;
    Ok(builder.build())
}
