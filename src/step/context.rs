//! Handle passed to a running step body

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::common::{Error, Result};

use super::log::Attachment;

/// Per-step handle for attachments and in-body skips
///
/// Clones share the same attachment list, so a body can move copies into
/// spawned sub-tasks.
#[derive(Debug, Clone)]
pub struct StepContext {
    step: Arc<str>,
    attachments: Arc<Mutex<Vec<Attachment>>>,
}

impl StepContext {
    pub(crate) fn new(step: &str) -> Self {
        Self {
            step: Arc::from(step),
            attachments: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Name of the step this context belongs to
    pub fn step_name(&self) -> &str {
        &self.step
    }

    /// Attach a named artifact to the step
    pub fn attach(
        &self,
        name: impl Into<String>,
        body: impl Into<String>,
        content_type: impl Into<String>,
    ) {
        let attachment = Attachment {
            name: name.into(),
            body: body.into(),
            content_type: content_type.into(),
        };
        tracing::debug!(step = %self.step, attachment = %attachment.name, "Attachment added");
        self.lock().push(attachment);
    }

    /// Attach a value serialized as pretty JSON
    pub fn attach_json<T: Serialize>(&self, name: impl Into<String>, value: &T) -> Result<()> {
        let body = serde_json::to_string_pretty(value)?;
        self.attach(name, body, "application/json");
        Ok(())
    }

    /// Skip the rest of the step when `condition` holds
    ///
    /// Use with `?` so that the body stops right away:
    /// `ctx.skip(!is_mobile, "only runs on mobile layouts")?;`
    pub fn skip(&self, condition: bool, reason: impl Into<String>) -> Result<()> {
        if condition {
            Err(Error::SkipRequested(reason.into()))
        } else {
            Ok(())
        }
    }

    pub(crate) fn take_attachments(&self) -> Vec<Attachment> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Attachment>> {
        // A panicking body cannot leave the list half-written, so poisoning is ignored
        self.attachments.lock().unwrap_or_else(|e| e.into_inner())
    }
}
