//! # Filter Pipeline
//!
//! Ordered curation stages applied to contacts as they enter or leave the
//! graph. Stages run by ascending priority and each decides from the
//! [`FilterContext`] whether it applies. A failing stage is logged and
//! leaves the contact as the previous stage produced it; later stages and
//! the rest of the batch still run.
//!
//! Pipelines are plain values owned by the caller.

mod filters;

pub use filters::{FEMALE_TERMS, Filter, MALE_TERMS};

use crate::contact::Contact;

/// Which workflow a pipeline serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineMode {
    Import,
    Export,
    Curation,
}

impl PipelineMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Export => "export",
            Self::Curation => "curation",
        }
    }
}

/// Per-run information handed to every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterContext {
    pub mode: PipelineMode,
}

impl FilterContext {
    #[must_use]
    pub const fn new(mode: PipelineMode) -> Self {
        Self { mode }
    }
}

/// Priority-ordered list of stages.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    name: String,
    filters: Vec<Filter>,
}

impl FilterPipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: Vec::new(),
        }
    }

    /// The stock pipeline for `mode`: UID assignment, then gender inference.
    #[must_use]
    pub fn standard(mode: PipelineMode) -> Self {
        let mut pipeline = Self::new(mode.as_str());
        pipeline.register(Filter::GenderInference);
        pipeline.register(Filter::UidAssignment);
        pipeline
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stages in execution order.
    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Add a stage, keeping the list sorted by priority.
    ///
    /// Stages with equal priority keep registration order.
    pub fn register(&mut self, filter: Filter) {
        self.filters.push(filter);
        self.filters.sort_by_key(|f| f.priority());
        tracing::debug!(pipeline = %self.name, filter = filter.name(), priority = filter.priority(), "filter registered");
    }

    /// Run every applicable stage on one contact.
    #[must_use]
    pub fn run(&self, mut contact: Contact, context: &FilterContext) -> Contact {
        for filter in &self.filters {
            if !filter.should_run(context) {
                continue;
            }
            tracing::trace!(pipeline = %self.name, filter = filter.name(), contact = %contact.fn_name, "running filter");
            let before = contact.clone();
            if let Err(err) = filter.apply(&mut contact, context) {
                tracing::error!(pipeline = %self.name, filter = filter.name(), contact = %before.fn_name, error = %err, "filter failed");
                contact = before;
            }
        }
        contact
    }

    #[must_use]
    pub fn run_batch(&self, contacts: Vec<Contact>, context: &FilterContext) -> Vec<Contact> {
        contacts
            .into_iter()
            .map(|contact| self.run(contact, context))
            .collect()
    }
}
