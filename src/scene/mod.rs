//! Scene model and transaction adapters.
//!
//! The host editor owns the scene; the bridge only calls into it. Two
//! seams are injected into every protocol session:
//!
//! - [`SceneAdapter`] — read and mutate elements, textures, projects and
//!   toolbar actions
//! - [`TransactionAdapter`] — group a batch of mutations under one
//!   labelled, undoable edit and trigger a redraw on commit
//!
//! Handlers never reach into process-wide globals. The in-memory
//! implementations ([`InMemoryScene`], [`EditJournal`]) back the
//! standalone binary and the test suites; a host embedding replaces them
//! with adapters onto its real scene engine and undo system.
//!
//! # Concurrency
//!
//! `InMemoryScene` locks per adapter call, not per protocol exchange.
//! Two interleaved exchanges mutating the same scene can therefore race
//! between calls — accepted behaviour, mirroring the host's single
//! cooperative event loop with no transaction isolation.

pub mod model;
pub mod resolve;

use std::sync::Mutex;

use uuid::Uuid;

use crate::error::SceneError;
use crate::scene::model::{BarItem, Direction, Element, Project, Texture, UvQuad};

/// Read/mutate surface of the host's scene model.
pub trait SceneAdapter: Send + Sync {
    /// Snapshot of all scene elements in creation order.
    fn elements(&self) -> Vec<Element>;

    /// Appends elements to the scene.
    fn add_elements(&self, elements: Vec<Element>);

    /// Looks up a single element by uuid.
    fn element_by_uuid(&self, uuid: Uuid) -> Option<Element>;

    /// Sets one face's texture and UV rectangle on an element.
    ///
    /// For meshes the face entry is created if absent.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NotFound`] if the element no longer exists.
    fn set_face(
        &self,
        element: Uuid,
        face: Direction,
        texture: Uuid,
        uv: UvQuad,
    ) -> Result<(), SceneError>;

    /// Snapshot of the texture catalogue in creation order.
    fn textures(&self) -> Vec<Texture>;

    /// Appends a texture to the catalogue.
    fn add_texture(&self, texture: Texture);

    /// The fallback texture. Always present.
    fn default_texture(&self) -> Texture;

    /// Snapshot of all open projects.
    fn projects(&self) -> Vec<Project>;

    /// Regenerates and returns a project's thumbnail, by project name.
    ///
    /// Returns `None` if no project has that name.
    fn refresh_thumbnail(&self, name: &str) -> Option<String>;

    /// Looks up a node graph by uuid across all projects, in listing order.
    fn node_graph(&self, uuid: Uuid) -> Option<serde_json::Value>;

    /// All projects' node-graph entries as `(uuid, display name)` pairs.
    fn node_graph_entries(&self) -> Vec<(Uuid, String)>;

    /// Snapshot of the toolbar actions.
    fn bar_items(&self) -> Vec<BarItem>;

    /// Synthesizes a trigger event on the named bar item.
    ///
    /// The `enabled` flag is advisory; the trigger fires regardless.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NotFound`] if no item has that name.
    fn trigger_bar_item(&self, name: &str) -> Result<(), SceneError>;
}

/// Undo-engine seam: groups mutations under one labelled edit.
///
/// `commit` ends the batch and triggers a redraw. A batch already begun
/// is not rolled back if the driving request is cancelled; the commit is
/// the unit of atomicity from the scene's perspective.
pub trait TransactionAdapter: Send + Sync {
    /// Opens a labelled batch of mutations.
    fn begin(&self, label: &str);

    /// Closes the current batch and triggers a redraw.
    fn commit(&self);
}

/// 16×16 white PNG used as the built-in default texture.
const DEFAULT_TEXTURE_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAABAAAAAQCAYAAAAf8/9hAAAAFklEQVR4nGP4TyFgGDVg1IBRA4aLAQBdePwur/3haQAAAABJRU5ErkJggg==";

/// 32×18 dark PNG used as the placeholder project thumbnail.
const PLACEHOLDER_THUMBNAIL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAACAAAAASCAYAAAA6yNxSAAAAJklEQVR4nGNQUlL6P5CYYdQBow4YdcCoA0YdMOqAUQeMOmCgHQAA0bojbkHMeocAAAAASUVORK5CYII=";

/// Name of the built-in default texture.
pub const DEFAULT_TEXTURE_NAME: &str = "default";

#[derive(Debug, Default)]
struct SceneState {
    elements: Vec<Element>,
    textures: Vec<Texture>,
    projects: Vec<Project>,
    bar_items: Vec<BarItem>,
    default_texture: usize,
    thumbnail_refreshes: usize,
    triggered: Vec<String>,
}

/// In-memory scene backing the standalone binary and the test suites.
#[derive(Debug)]
pub struct InMemoryScene {
    state: Mutex<SceneState>,
}

impl InMemoryScene {
    /// Creates a scene holding only the default texture.
    #[must_use]
    pub fn new() -> Self {
        let default_texture = Texture {
            uuid: Uuid::new_v4(),
            name: DEFAULT_TEXTURE_NAME.to_string(),
            width: 16,
            height: 16,
            data: DEFAULT_TEXTURE_PNG.to_string(),
            mime_type: "image/png".to_string(),
            path: None,
        };

        Self {
            state: Mutex::new(SceneState {
                textures: vec![default_texture],
                default_texture: 0,
                ..SceneState::default()
            }),
        }
    }

    /// Host-side edit: opens a project.
    ///
    /// If `project.active` is set, any previously active project is
    /// deactivated — at most one project is active.
    pub fn add_project(&self, project: Project) {
        let mut state = self.lock();
        if project.active {
            for existing in &mut state.projects {
                existing.active = false;
            }
        }
        state.projects.push(project);
    }

    /// Host-side edit: installs a toolbar action.
    pub fn add_bar_item(&self, item: BarItem) {
        self.lock().bar_items.push(item);
    }

    /// Names of bar items triggered so far, in trigger order.
    #[must_use]
    pub fn triggered(&self) -> Vec<String> {
        self.lock().triggered.clone()
    }

    /// How many times a thumbnail has been regenerated.
    #[must_use]
    pub fn thumbnail_refreshes(&self) -> usize {
        self.lock().thumbnail_refreshes
    }

    /// A freshly generated placeholder thumbnail.
    #[must_use]
    pub fn placeholder_thumbnail() -> String {
        PLACEHOLDER_THUMBNAIL_PNG.to_string()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SceneState> {
        // Lock poisoning would require a panic inside an adapter call;
        // recover with the inner state rather than cascading the panic.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for InMemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneAdapter for InMemoryScene {
    fn elements(&self) -> Vec<Element> {
        self.lock().elements.clone()
    }

    fn add_elements(&self, elements: Vec<Element>) {
        self.lock().elements.extend(elements);
    }

    fn element_by_uuid(&self, uuid: Uuid) -> Option<Element> {
        self.lock().elements.iter().find(|e| e.uuid == uuid).cloned()
    }

    fn set_face(
        &self,
        element: Uuid,
        face: Direction,
        texture: Uuid,
        uv: UvQuad,
    ) -> Result<(), SceneError> {
        let mut state = self.lock();
        let target = state
            .elements
            .iter_mut()
            .find(|e| e.uuid == element)
            .ok_or_else(|| SceneError::NotFound {
                kind: "element",
                identifier: element.to_string(),
            })?;

        let entry = target.faces.entry(face).or_default();
        entry.texture = Some(texture);
        entry.uv = uv;
        Ok(())
    }

    fn textures(&self) -> Vec<Texture> {
        self.lock().textures.clone()
    }

    fn add_texture(&self, texture: Texture) {
        self.lock().textures.push(texture);
    }

    fn default_texture(&self) -> Texture {
        let state = self.lock();
        state.textures[state.default_texture].clone()
    }

    fn projects(&self) -> Vec<Project> {
        self.lock().projects.clone()
    }

    fn refresh_thumbnail(&self, name: &str) -> Option<String> {
        let mut state = self.lock();
        let project = state.projects.iter_mut().find(|p| p.name == name)?;
        project.thumbnail = PLACEHOLDER_THUMBNAIL_PNG.to_string();
        let thumbnail = project.thumbnail.clone();
        state.thumbnail_refreshes += 1;
        Some(thumbnail)
    }

    fn node_graph(&self, uuid: Uuid) -> Option<serde_json::Value> {
        let state = self.lock();
        state
            .projects
            .iter()
            .find_map(|p| p.nodes_3d.get(&uuid).cloned())
    }

    fn node_graph_entries(&self) -> Vec<(Uuid, String)> {
        let state = self.lock();
        state
            .projects
            .iter()
            .flat_map(|project| {
                project.nodes_3d.iter().map(move |(uuid, graph)| {
                    let name = graph
                        .get("name")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or(&project.name)
                        .to_string();
                    (*uuid, name)
                })
            })
            .collect()
    }

    fn bar_items(&self) -> Vec<BarItem> {
        self.lock().bar_items.clone()
    }

    fn trigger_bar_item(&self, name: &str) -> Result<(), SceneError> {
        let mut state = self.lock();
        if !state.bar_items.iter().any(|item| item.name == name) {
            return Err(SceneError::NotFound {
                kind: "bar item",
                identifier: name.to_string(),
            });
        }
        state.triggered.push(name.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct JournalState {
    begun: Vec<String>,
    committed: Vec<String>,
    redraws: usize,
}

/// In-memory transaction recorder.
///
/// Stands in for the host's undo engine: remembers every begun and
/// committed edit label and counts redraws, so the transactional pattern
/// of the mutating tools is observable in tests.
#[derive(Debug, Default)]
pub struct EditJournal {
    state: Mutex<JournalState>,
}

impl EditJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels of begun edits, in order.
    #[must_use]
    pub fn begun(&self) -> Vec<String> {
        self.lock().begun.clone()
    }

    /// Labels of committed edits, in order.
    #[must_use]
    pub fn committed(&self) -> Vec<String> {
        self.lock().committed.clone()
    }

    /// Number of redraws triggered by commits.
    #[must_use]
    pub fn redraws(&self) -> usize {
        self.lock().redraws
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, JournalState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl TransactionAdapter for EditJournal {
    fn begin(&self, label: &str) {
        tracing::debug!(label, "transaction begun");
        self.lock().begun.push(label.to_string());
    }

    fn commit(&self) {
        let mut state = self.lock();
        let label = state.begun.last().cloned().unwrap_or_default();
        tracing::debug!(label, "transaction committed, redraw");
        state.committed.push(label);
        state.redraws += 1;
    }
}
