//! Render-pass state.
//!
//! A [`DocumentSession`] holds everything that must be consistent across
//! one document: unique stylesheet counters, which definitions already
//! emitted their global stylesheets, the accumulated dependency map and the
//! render cache. Create one per top-level render, or reuse one across
//! several renders that share an id space. Sessions are used sequentially;
//! they are not meant to be shared between threads.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::change::ChangeReason;
use crate::component::{ComponentDefinition, ComponentId, ComponentInstance, DefinitionId};
use crate::deps::{build_map, TagNameMap};
use crate::error::RenderError;
use crate::template::{
    CoercedText, Memoized, Memoizer, PendingText, RenderResult, TemplateDefinition, TemplaterId,
};

/// Session state to restore when a render call fails.
///
/// Unique counters are not part of it: indices drawn by a failed call are
/// skipped, never reused.
#[derive(Debug)]
pub(crate) struct Checkpoint {
    emitted_globals: HashSet<DefinitionId>,
    pending: usize,
}

/// State of one render pass.
#[derive(Debug)]
pub struct DocumentSession {
    unique_counters: HashMap<DefinitionId, u32>,
    emitted_globals: HashSet<DefinitionId>,
    tag_map: TagNameMap,
    memoizer: Memoizer,
    templater: TemplaterId,
    pending: Vec<PendingText>,
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSession {
    /// Creates an empty session with its own cache namespace.
    pub fn new() -> Self {
        Self {
            unique_counters: HashMap::new(),
            emitted_globals: HashSet::new(),
            tag_map: TagNameMap::new(),
            memoizer: Memoizer::new(),
            templater: TemplaterId::next(),
            pending: Vec::new(),
        }
    }

    /// Returns the next unique stylesheet index for a definition.
    ///
    /// Indices start at 0 and are never handed out twice in a session.
    pub fn next_unique_index(&mut self, definition: DefinitionId) -> u32 {
        let counter = self.unique_counters.entry(definition).or_insert(0);
        let index = *counter;
        *counter += 1;
        index
    }

    /// Returns true if the definition's global stylesheets were emitted.
    pub fn is_global_emitted(&self, definition: DefinitionId) -> bool {
        self.emitted_globals.contains(&definition)
    }

    /// Records that the definition's global stylesheets were emitted.
    /// Returns true the first time.
    pub fn mark_global_emitted(&mut self, definition: DefinitionId) -> bool {
        self.emitted_globals.insert(definition)
    }

    /// Adds a definition and its dependency graph to the tag map.
    pub fn register(&mut self, definition: &Arc<ComponentDefinition>) -> usize {
        build_map(definition, &mut self.tag_map)
    }

    /// Returns the accumulated tag map.
    pub fn tag_map(&self) -> &TagNameMap {
        &self.tag_map
    }

    /// Looks up the definition registered for a tag name.
    pub fn lookup(&self, tag_name: &str) -> Option<Arc<ComponentDefinition>> {
        self.tag_map.get(tag_name).cloned()
    }

    /// Returns the session's cache namespace.
    pub fn templater(&self) -> TemplaterId {
        self.templater
    }

    /// Returns the render cache.
    pub fn memoizer(&self) -> &Memoizer {
        &self.memoizer
    }

    /// Renders a template through the session's cache.
    pub fn render(
        &mut self,
        template: &TemplateDefinition,
        reason: ChangeReason,
        component: &ComponentInstance,
    ) -> Result<Memoized<RenderResult>, RenderError> {
        self.memoizer
            .render(template, reason, component, self.templater)
    }

    /// Renders a template to text through the session's cache, recording
    /// any deferred payloads written into the text.
    pub fn render_text(
        &mut self,
        template: &TemplateDefinition,
        reason: ChangeReason,
        component: &ComponentInstance,
    ) -> Result<Memoized<CoercedText>, RenderError> {
        let rendered = self
            .memoizer
            .render_text(template, reason, component, self.templater)?;
        if let Some(text) = &rendered.value {
            self.pending.extend(text.pending.iter().cloned());
        }
        Ok(rendered)
    }

    /// Returns the deferred payloads serialized so far, leaving none behind.
    ///
    /// Their placeholders are already in the output; the caller delivers
    /// the resolved text to the live document.
    pub fn take_pending(&mut self) -> Vec<PendingText> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            emitted_globals: self.emitted_globals.clone(),
            pending: self.pending.len(),
        }
    }

    /// Forgets global sheets and deferred payloads recorded after
    /// `checkpoint`; none of them reached any output.
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.emitted_globals = checkpoint.emitted_globals;
        self.pending.truncate(checkpoint.pending);
    }

    /// Purges the cache entries of a torn-down instance.
    pub fn end_instance(&mut self, component: ComponentId) -> usize {
        self.memoizer.release_component(component)
    }
}
