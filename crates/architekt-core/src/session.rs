//! One user's editing session: the live editor plus the gateways that snapshot or
//! replace it.
//!
//! Gateway calls are the only suspension points. The editor lock is taken only for
//! synchronous work and never held across an await, so edits made while a call is in
//! flight land on the live diagram, and a response that resolves later replaces the whole
//! diagram (last writer wins, no cancellation).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::check::Issue;
use crate::editor::{Editor, EditorError, Trust};
use crate::gateway::{DesignGenerator, GatewayError, ValidationReport};
use crate::store::{DesignStore, DesignSummary, StoreError};

pub const DEFAULT_DESIGN_NAME: &str = "Untitled Design";

/// File name offered for exported designs.
pub const EXPORT_FILE_NAME: &str = "architekt-design.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A transient, user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    fn info(title: &str, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.to_string(),
            description: description.into(),
        }
    }

    fn error(title: &str, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.to_string(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error("no generation service configured")]
    NoGenerator,

    #[error("prompt is empty")]
    EmptyPrompt,
}

pub struct Session {
    owner: String,
    editor: Arc<Mutex<Editor>>,
    store: Arc<dyn DesignStore>,
    generator: Option<Arc<dyn DesignGenerator>>,
    notices: Mutex<Vec<Notice>>,
}

impl Session {
    pub fn new(owner: impl Into<String>, store: Arc<dyn DesignStore>) -> Self {
        Self {
            owner: owner.into(),
            editor: Arc::new(Mutex::new(Editor::new())),
            store,
            generator: None,
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn DesignGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Lock the editor for synchronous work. Do not hold the guard across an await.
    pub fn editor(&self) -> MutexGuard<'_, Editor> {
        self.editor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drain pending notifications, oldest first.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }

    /// Snapshot the current diagram into the store.
    pub async fn save(&self, name: Option<&str>) -> Result<String, SessionError> {
        let snapshot = self.editor().diagram().clone();
        let name = name.filter(|n| !n.trim().is_empty()).unwrap_or(DEFAULT_DESIGN_NAME);

        match self.store.save(&self.owner, name, &snapshot).await {
            Ok(id) => {
                info!(owner = %self.owner, %id, "design saved");
                self.notify(Notice::info(
                    "Design Saved",
                    "Your architecture has been saved successfully.",
                ));
                Ok(id)
            }
            Err(e) => {
                warn!(owner = %self.owner, error = %e, "save failed");
                self.notify(Notice::error(
                    "Save Failed",
                    "Could not save your design. Please try again.",
                ));
                Err(e.into())
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<DesignSummary>, SessionError> {
        self.store.list(&self.owner).await.map_err(|e| {
            warn!(owner = %self.owner, error = %e, "listing designs failed");
            self.notify(Notice::error(
                "Load Failed",
                "Could not load your saved designs. Please try again later.",
            ));
            e.into()
        })
    }

    /// Replace the live diagram with a stored design, then run advisory validation.
    /// Returns the schema issues tolerated in the loaded design.
    pub async fn load(&self, design_id: &str) -> Result<Vec<Issue>, SessionError> {
        let diagram = match self.store.load(&self.owner, design_id).await {
            Ok(diagram) => diagram,
            Err(e) => {
                warn!(owner = %self.owner, design_id, error = %e, "load failed");
                self.notify(Notice::error("Load Failed", e.to_string()));
                return Err(e.into());
            }
        };
        let snapshot = diagram.clone();

        let applied = self.editor().replace(diagram, Trust::Stored);
        let issues = match applied {
            Ok(issues) => issues,
            Err(e) => {
                self.notify(Notice::error("Load Failed", e.to_string()));
                return Err(e.into());
            }
        };

        if let Some(generator) = &self.generator {
            match generator.validate(&snapshot).await {
                Ok(report) if report.is_valid => {
                    self.notify(Notice::info("Design Validated", "The loaded design is valid."));
                }
                Ok(report) => {
                    self.notify(Notice::error(
                        "Design Validation Failed",
                        report.validation_feedback,
                    ));
                }
                Err(e) => {
                    warn!(design_id, error = %e, "validation failed");
                    self.notify(Notice::error(
                        "Error",
                        "An error occurred during design validation.",
                    ));
                }
            }
        }

        Ok(issues)
    }

    /// Replace the live diagram with one generated from `prompt`. On any failure the
    /// current diagram is left untouched.
    pub async fn generate(&self, prompt: &str) -> Result<(), SessionError> {
        if prompt.trim().is_empty() {
            self.notify(Notice::error(
                "AI Generation Error",
                "Please enter a prompt to generate a design.",
            ));
            return Err(SessionError::EmptyPrompt);
        }
        let Some(generator) = &self.generator else {
            self.notify(Notice::error(
                "AI Generation Error",
                "No AI provider is configured.",
            ));
            return Err(SessionError::NoGenerator);
        };

        let result = match generator.generate(prompt).await {
            Ok(diagram) => self
                .editor()
                .replace(diagram, Trust::Generated)
                .map_err(SessionError::from),
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(_) => {
                self.notify(Notice::info(
                    "Design Generated",
                    "A new design has been generated by AI.",
                ));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "generation failed");
                self.notify(Notice::error(
                    "AI Generation Error",
                    "Could not generate design. The model may have returned an invalid format.",
                ));
                Err(e)
            }
        }
    }

    /// Run the advisory validation on the current diagram without changing it.
    pub async fn validate(&self) -> Result<ValidationReport, SessionError> {
        let Some(generator) = &self.generator else {
            return Err(SessionError::NoGenerator);
        };
        let snapshot = self.editor().diagram().clone();
        let report = generator.validate(&snapshot).await?;
        debug!(is_valid = report.is_valid, "design validated");
        Ok(report)
    }

    /// The export file body.
    pub fn export(&self) -> Result<String, SessionError> {
        let json = self.editor().export()?;
        self.notify(Notice::info(
            "Design Exported",
            format!("Your design has been exported as {EXPORT_FILE_NAME}."),
        ));
        Ok(json)
    }

    /// Load an export file into the live diagram.
    pub fn import(&self, raw: &str) -> Result<Vec<Issue>, SessionError> {
        let imported = self.editor().import(raw);
        imported.map_err(|e| {
            self.notify(Notice::error("Import Failed", e.to_string()));
            e.into()
        })
    }
}
