// ABOUTME: Diagnostics accumulator for non-fatal warnings during publishing.
// ABOUTME: Collects failures that shouldn't fail a run but must stay visible.

/// Collects non-fatal warnings during an invocation.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings of one kind.
    pub fn of_kind(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

/// A non-fatal warning collected during an invocation.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// The image could not be re-published under the requested version label.
    ///
    /// The primary tag is already published, so the run continues, but the
    /// label the operator asked for does not exist in the registry.
    pub fn version_tag(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::VersionTag,
            message: message.into(),
        }
    }

    /// An additional tag requested by the operator could not be applied.
    pub fn additional_tag(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::AdditionalTag,
            message: message.into(),
        }
    }

    /// The environment stack exposes no services to roll out.
    pub fn no_services(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::NoServices,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Re-tagging the published image with the version label failed.
    VersionTag,
    /// Applying an operator-requested extra tag failed.
    AdditionalTag,
    /// Topology resolution found nothing to deploy.
    NoServices,
}
