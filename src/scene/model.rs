//! Scene model entities owned by the host editor.
//!
//! These types mirror the host's in-memory scene graph surface as seen by
//! the protocol bridge: elements (cuboids and meshes), textures, projects
//! and toolbar actions. The bridge reads and mutates them only through the
//! [`SceneAdapter`](super::SceneAdapter) seam.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A 3-vector used for origins, corners, vertices and rotations.
pub type Vec3 = [f64; 3];

/// A UV rectangle as `[x1, y1, x2, y2]` in texture space.
pub type UvQuad = [f64; 4];

/// One of the six cardinal faces of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// -Z face.
    North,
    /// +Z face.
    South,
    /// +X face.
    East,
    /// -X face.
    West,
    /// +Y face.
    Up,
    /// -Y face.
    Down,
}

impl Direction {
    /// All six directions in face-table order.
    pub const ALL: [Self; 6] = [
        Self::North,
        Self::South,
        Self::East,
        Self::West,
        Self::Up,
        Self::Down,
    ];

    /// Returns the lowercase face name used in URIs and results.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-face texture binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// Assigned texture, if any.
    pub texture: Option<Uuid>,
    /// UV rectangle mapped onto the face.
    pub uv: UvQuad,
}

impl Face {
    /// An unmapped face covering the full texture.
    #[must_use]
    pub const fn unmapped() -> Self {
        Self {
            texture: None,
            uv: [0.0, 0.0, 1.0, 1.0],
        }
    }
}

impl Default for Face {
    fn default() -> Self {
        Self::unmapped()
    }
}

/// Geometry variant of a scene element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// An axis-aligned box between two corners.
    Cuboid {
        /// Lower corner.
        from: Vec3,
        /// Upper corner.
        to: Vec3,
    },
    /// An arbitrary vertex set.
    Mesh {
        /// Mesh vertices in local space.
        vertices: Vec<Vec3>,
    },
}

impl ElementKind {
    /// Returns the variant name used in the `element` resource.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Cuboid { .. } => "cuboid",
            Self::Mesh { .. } => "mesh",
        }
    }
}

/// A scene node.
///
/// The `uuid` is unique and immutable; `name` is mutable and not
/// guaranteed unique. Elements are created by the placement tools and
/// destroyed only by host-side edits outside the bridge's control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique, immutable identity.
    pub uuid: Uuid,
    /// Display name.
    pub name: String,
    /// Pivot point.
    pub origin: Vec3,
    /// Euler rotation in degrees.
    pub rotation: Vec3,
    /// Geometry variant.
    #[serde(flatten)]
    pub kind: ElementKind,
    /// Face table mapping each direction to its texture binding.
    pub faces: IndexMap<Direction, Face>,
}

impl Element {
    /// Creates a cuboid with a fresh uuid and all six faces unmapped.
    #[must_use]
    pub fn cuboid(name: impl Into<String>, origin: Vec3, from: Vec3, to: Vec3, rotation: Vec3) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            origin,
            rotation,
            kind: ElementKind::Cuboid { from, to },
            faces: Direction::ALL
                .into_iter()
                .map(|d| (d, Face::unmapped()))
                .collect(),
        }
    }

    /// Creates a mesh with a fresh uuid and an empty face table.
    ///
    /// Vertices are added first, then faces; see the `place_mesh` tool.
    #[must_use]
    pub fn mesh(name: impl Into<String>, origin: Vec3, rotation: Vec3) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            origin,
            rotation,
            kind: ElementKind::Mesh {
                vertices: Vec::new(),
            },
            faces: IndexMap::new(),
        }
    }

    /// The element's resource address.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("element://{}", self.uuid)
    }
}

/// A texture in the host's catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Texture {
    /// Unique identity.
    pub uuid: Uuid,
    /// Display name.
    pub name: String,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Base64-encoded pixel data.
    pub data: String,
    /// MIME type of the encoded data.
    pub mime_type: String,
    /// Originating file path or URL, if the texture was loaded.
    pub path: Option<String>,
}

impl Texture {
    /// The texture's resource address.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("texture://{}", self.uuid)
    }
}

/// An open project in the host editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identity.
    pub uuid: Uuid,
    /// Display name; the `screenshot` resource addresses projects by it.
    pub name: String,
    /// Cached base64 PNG thumbnail.
    pub thumbnail: String,
    /// Opaque per-project node graphs keyed by uuid, insertion-ordered.
    pub nodes_3d: IndexMap<Uuid, serde_json::Value>,
    /// Whether this is the active project. At most one project is active.
    pub active: bool,
}

/// A named, triggerable toolbar action.
///
/// Read-only from the bridge's perspective except for the trigger effect;
/// `enabled` is advisory state mirrored from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarItem {
    /// Unique action name; the `toolbar` resource addresses items by it.
    pub name: String,
    /// Icon identifier.
    pub icon: String,
    /// Hover tooltip.
    pub tooltip: String,
    /// Whether the host currently enables the action.
    pub enabled: bool,
}
