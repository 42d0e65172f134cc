// src/events.rs

//! Lifecycle events emitted by the documentation collector.

use doxweave_dom::{Document, NodeId};
use std::sync::Arc;

/// Emitted once before any entity. Carries the documents exposed to every
/// template as globals.
#[derive(Debug, Clone)]
pub struct BuildStartEvent {
    /// The configuration document and its `project` element.
    pub config: Arc<Document>,
    pub project: NodeId,
    pub index: Arc<Document>,
    pub source_tree: Arc<Document>,
}

impl BuildStartEvent {
    /// An event whose project node is the configuration's document element.
    pub fn new(config: Arc<Document>, index: Arc<Document>, source_tree: Arc<Document>) -> Self {
        let project = config.root_element().unwrap_or(NodeId::ROOT);
        BuildStartEvent {
            config,
            project,
            index,
            source_tree,
        }
    }

    pub fn with_project(mut self, project: NodeId) -> Self {
        self.project = project;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ClassEndEvent {
    pub class: Arc<Document>,
}

#[derive(Debug, Clone)]
pub struct InterfaceEndEvent {
    pub interface: Arc<Document>,
}

#[derive(Debug, Clone)]
pub struct TraitEndEvent {
    pub unit: Arc<Document>,
}

/// Emitted once after the last entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildEndEvent;
