//! Tool registry and handlers.
//!
//! Each tool is registered with a unique name, a declarative JSON-Schema
//! parameter description (served by `tools/list`), and a handler. The
//! dispatch layer deserialises and validates arguments into a typed
//! parameter struct *before* the handler runs; invalid shapes never reach
//! a handler. Handler failures surface as tool results flagged
//! `isError`, not as protocol errors.
//!
//! State-changing tools group their mutations under one labelled edit via
//! the [`TransactionAdapter`], which triggers a redraw on commit.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::SceneError;
use crate::mcp::protocol::{JsonRpcError, RequestId};
use crate::scene::model::{Direction, Element, Texture, UvQuad, Vec3};
use crate::scene::resolve::{resolve, Resolution};
use crate::scene::{SceneAdapter, TransactionAdapter};

/// Smallest accepted texture edge, in pixels.
const TEXTURE_MIN_EDGE: u32 = 16;
/// Largest accepted texture edge, in pixels.
const TEXTURE_MAX_EDGE: u32 = 4096;

/// A tool definition for the tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
    /// Inline image content.
    #[serde(rename_all = "camelCase")]
    Image {
        /// Base64-encoded image bytes.
        data: String,
        /// MIME type of the encoded bytes.
        mime_type: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }
}

/// One cuboid entry for `place_cubes`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CubeSpec {
    /// Display name.
    pub name: String,
    /// Pivot point.
    pub origin: Vec3,
    /// Lower corner.
    pub from: Vec3,
    /// Upper corner.
    pub to: Vec3,
    /// Euler rotation in degrees.
    pub rotation: Vec3,
}

/// Parameters for `place_cubes`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaceCubesParams {
    /// Cuboids to construct, in placement order.
    pub elements: Vec<CubeSpec>,
}

/// One face entry: a direction plus its UV rectangle.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaceSpec {
    /// Which face.
    pub face: Direction,
    /// UV rectangle as `[x1, y1, x2, y2]`.
    pub uv: UvQuad,
}

/// Parameters for `place_mesh`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaceMeshParams {
    /// Display name.
    pub name: String,
    /// Mesh vertices in local space.
    pub vertices: Vec<Vec3>,
    /// Face table entries, applied after the vertices.
    pub faces: Vec<FaceSpec>,
    /// Pivot point. Defaults to the world origin.
    #[serde(default)]
    pub origin: Option<Vec3>,
    /// Euler rotation in degrees. Defaults to no rotation.
    #[serde(default)]
    pub rotation: Option<Vec3>,
}

/// Parameters for `assign_texture`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignTextureParams {
    /// Texture to assign, by uuid or name.
    pub texture: String,
    /// Target elements, each by uuid or name.
    pub elements: Vec<String>,
    /// Faces to update on every target element.
    pub faces: Vec<FaceSpec>,
}

/// Parameters for `load_texture`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadTextureParams {
    /// File path or http(s) URL of the image to load.
    pub path: String,
}

/// Parameters for `create_texture`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTextureParams {
    /// Display name.
    pub name: String,
    /// Pixel width, 16..=4096.
    pub width: u32,
    /// Pixel height, 16..=4096.
    pub height: u32,
    /// Base64-encoded image data.
    pub data: String,
}

impl CreateTextureParams {
    /// Range and shape checks beyond what serde enforces.
    ///
    /// Returns a field-level message on failure.
    fn validate(&self) -> Result<(), String> {
        if !(TEXTURE_MIN_EDGE..=TEXTURE_MAX_EDGE).contains(&self.width) {
            return Err(format!(
                "width must be in {TEXTURE_MIN_EDGE}..={TEXTURE_MAX_EDGE}, got {}",
                self.width
            ));
        }
        if !(TEXTURE_MIN_EDGE..=TEXTURE_MAX_EDGE).contains(&self.height) {
            return Err(format!(
                "height must be in {TEXTURE_MIN_EDGE}..={TEXTURE_MAX_EDGE}, got {}",
                self.height
            ));
        }
        if BASE64_STANDARD.decode(&self.data).is_err() {
            return Err("data is not valid base64".to_string());
        }
        Ok(())
    }
}

/// Parameters for `use_bar_item`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UseBarItemParams {
    /// Name of the bar item to trigger.
    pub name: String,
}

/// The tool registry bound to one protocol session.
///
/// Holds the injected scene and transaction adapters; handlers never
/// touch global state.
pub struct ToolRegistry {
    scene: Arc<dyn SceneAdapter>,
    transactions: Arc<dyn TransactionAdapter>,
}

impl ToolRegistry {
    /// Creates a registry over the given adapters.
    #[must_use]
    pub fn new(scene: Arc<dyn SceneAdapter>, transactions: Arc<dyn TransactionAdapter>) -> Self {
        Self {
            scene,
            transactions,
        }
    }

    /// Dispatches one tool call.
    ///
    /// Arguments are deserialised and validated here, before the handler
    /// runs. Handler failures become `isError` results; only argument
    /// validation produces a JSON-RPC error.
    ///
    /// # Errors
    ///
    /// Returns an invalid-params error if the arguments do not match the
    /// tool's schema.
    pub async fn dispatch(
        &self,
        id: &RequestId,
        name: &str,
        arguments: &Value,
    ) -> Result<ToolCallResult, JsonRpcError> {
        tracing::debug!(tool = name, "dispatching tool call");

        let outcome = match name {
            "place_cubes" => self.call_place_cubes(parse_args(id, name, arguments)?),
            "place_mesh" => self.call_place_mesh(parse_args(id, name, arguments)?),
            "assign_texture" => self.call_assign_texture(parse_args(id, name, arguments)?),
            "load_texture" => {
                self.call_load_texture(parse_args(id, name, arguments)?)
                    .await
            }
            "create_texture" => {
                let params: CreateTextureParams = parse_args(id, name, arguments)?;
                params.validate().map_err(|message| {
                    JsonRpcError::invalid_params(
                        id.clone(),
                        format!("Invalid {name} arguments: {message}"),
                    )
                })?;
                self.call_create_texture(params)
            }
            "use_bar_item" => self.call_use_bar_item(parse_args(id, name, arguments)?),
            "list_textures" => {
                require_no_args(id, name, arguments)?;
                self.call_list_textures()
            }
            _ => Ok(ToolCallResult::error(format!("Unknown tool: {name}"))),
        };

        Ok(outcome.unwrap_or_else(|e| {
            tracing::debug!(tool = name, error = %e, "tool call failed");
            ToolCallResult::error(e.to_string())
        }))
    }

    /// Constructs one cuboid per entry and appends them to the scene
    /// under a single labelled edit.
    fn call_place_cubes(&self, params: PlaceCubesParams) -> Result<ToolCallResult, SceneError> {
        self.transactions.begin("Place cubes");

        let cubes: Vec<Element> = params
            .elements
            .into_iter()
            .map(|spec| Element::cuboid(spec.name, spec.origin, spec.from, spec.to, spec.rotation))
            .collect();

        let placed: Vec<Value> = cubes
            .iter()
            .map(|cube| {
                json!({
                    "name": &cube.name,
                    "uuid": cube.uuid,
                    "uri": cube.uri(),
                })
            })
            .collect();

        self.scene.add_elements(cubes);
        self.transactions.commit();

        Ok(ToolCallResult::text(pretty(&json!({
            "placed": placed,
        }))))
    }

    /// Constructs a mesh, adds its vertices then its faces, and appends
    /// it to the scene under a single labelled edit.
    fn call_place_mesh(&self, params: PlaceMeshParams) -> Result<ToolCallResult, SceneError> {
        self.transactions.begin("Place mesh");

        let mut mesh = Element::mesh(
            params.name,
            params.origin.unwrap_or([0.0; 3]),
            params.rotation.unwrap_or([0.0; 3]),
        );
        if let crate::scene::model::ElementKind::Mesh { vertices } = &mut mesh.kind {
            *vertices = params.vertices;
        }
        for spec in params.faces {
            let face = mesh.faces.entry(spec.face).or_default();
            face.uv = spec.uv;
        }

        let uuid = mesh.uuid;
        let uri = mesh.uri();
        self.scene.add_elements(vec![mesh]);
        self.transactions.commit();

        Ok(ToolCallResult::text(pretty(&json!({
            "uuid": uuid,
            "uri": uri,
        }))))
    }

    /// Resolves the texture and every target element, then sets the
    /// texture and UV on each (element, face) pair.
    fn call_assign_texture(
        &self,
        params: AssignTextureParams,
    ) -> Result<ToolCallResult, SceneError> {
        let textures = self.scene.textures();
        let texture = resolve_required(&textures, &params.texture, "texture")?;

        let elements = self.scene.elements();
        let mut targets: Vec<Element> = Vec::with_capacity(params.elements.len());
        for identifier in &params.elements {
            targets.push(resolve_required(&elements, identifier, "element")?.clone());
        }

        self.transactions.begin("Assign texture");

        let mut assignments: Vec<Value> = Vec::with_capacity(targets.len() * params.faces.len());
        for target in &targets {
            for spec in &params.faces {
                self.scene
                    .set_face(target.uuid, spec.face, texture.uuid, spec.uv)?;
                assignments.push(json!({
                    "element": &target.name,
                    "uuid": target.uuid,
                    "face": spec.face,
                    "texture": texture.uuid,
                    "uv": spec.uv,
                }));
            }
        }

        self.transactions.commit();

        Ok(ToolCallResult::text(pretty(&json!({
            "assignments": assignments,
        }))))
    }

    /// Fetches image bytes from a file path or http(s) URL, probes the
    /// format and dimensions, and appends the texture to the catalogue.
    ///
    /// No timeout bounds the fetch.
    async fn call_load_texture(
        &self,
        params: LoadTextureParams,
    ) -> Result<ToolCallResult, SceneError> {
        let path = params.path;

        let bytes = if path.starts_with("http://") || path.starts_with("https://") {
            let response = reqwest::get(&path)
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|source| SceneError::TextureFetch {
                    url: path.clone(),
                    source,
                })?;
            response
                .bytes()
                .await
                .map_err(|source| SceneError::TextureFetch {
                    url: path.clone(),
                    source,
                })?
                .to_vec()
        } else {
            tokio::fs::read(&path)
                .await
                .map_err(|source| SceneError::TextureLoad {
                    path: path.clone(),
                    source,
                })?
        };

        let decoded =
            image::load_from_memory(&bytes).map_err(|source| SceneError::TextureDecode {
                source_name: path.clone(),
                source,
            })?;
        let mime_type = image::guess_format(&bytes)
            .map_or_else(|_| "image/png".to_string(), |f| f.to_mime_type().to_string());

        let texture = Texture {
            uuid: Uuid::new_v4(),
            name: texture_name_from_path(&path),
            width: decoded.width(),
            height: decoded.height(),
            data: BASE64_STANDARD.encode(&bytes),
            mime_type,
            path: Some(path),
        };
        let uuid = texture.uuid;
        self.scene.add_texture(texture);

        Ok(ToolCallResult::text(format!(
            "Texture loaded successfully with UUID: {uuid}"
        )))
    }

    /// Constructs a texture from raw base64 data and appends it to the
    /// catalogue.
    fn call_create_texture(&self, params: CreateTextureParams) -> Result<ToolCallResult, SceneError> {
        let texture = Texture {
            uuid: Uuid::new_v4(),
            name: params.name,
            width: params.width,
            height: params.height,
            data: params.data,
            mime_type: "image/png".to_string(),
            path: None,
        };
        let uuid = texture.uuid;
        let data = texture.data.clone();
        let mime_type = texture.mime_type.clone();
        self.scene.add_texture(texture);

        Ok(ToolCallResult {
            content: vec![
                ToolContent::Text {
                    text: format!("Texture created successfully with UUID: {uuid}"),
                },
                ToolContent::Image { data, mime_type },
            ],
            is_error: false,
        })
    }

    /// Synthesizes a trigger event on the named bar item.
    fn call_use_bar_item(&self, params: UseBarItemParams) -> Result<ToolCallResult, SceneError> {
        self.scene.trigger_bar_item(&params.name)?;
        Ok(ToolCallResult::text(format!(
            "Triggered bar item: {}",
            params.name
        )))
    }

    /// Lists the texture catalogue. No mutation.
    fn call_list_textures(&self) -> Result<ToolCallResult, SceneError> {
        let textures: Vec<Value> = self
            .scene
            .textures()
            .into_iter()
            .map(|t| {
                json!({
                    "name": &t.name,
                    "uuid": t.uuid,
                    "uri": t.uri(),
                })
            })
            .collect();

        Ok(ToolCallResult::text(pretty(&json!({
            "textures": textures,
        }))))
    }

    /// Returns the list of available tools.
    #[allow(clippy::too_many_lines)]
    #[must_use]
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "place_cubes".to_string(),
                description: Some(
                    "Place cuboid elements in the scene. Each entry names the cuboid and gives \
                     its pivot origin, two opposite corners (from/to) and a rotation. All \
                     coordinates are in scene units. Returns the uuid and resource address of \
                     every placed cuboid."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "elements": {
                            "type": "array",
                            "description": "Cuboids to place, in order",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "name": { "type": "string", "description": "Display name" },
                                    "origin": {
                                        "type": "array",
                                        "items": { "type": "number" },
                                        "minItems": 3,
                                        "maxItems": 3,
                                        "description": "Pivot point [x, y, z]"
                                    },
                                    "from": {
                                        "type": "array",
                                        "items": { "type": "number" },
                                        "minItems": 3,
                                        "maxItems": 3,
                                        "description": "Lower corner [x, y, z]"
                                    },
                                    "to": {
                                        "type": "array",
                                        "items": { "type": "number" },
                                        "minItems": 3,
                                        "maxItems": 3,
                                        "description": "Upper corner [x, y, z]"
                                    },
                                    "rotation": {
                                        "type": "array",
                                        "items": { "type": "number" },
                                        "minItems": 3,
                                        "maxItems": 3,
                                        "description": "Euler rotation in degrees [x, y, z]"
                                    }
                                },
                                "required": ["name", "origin", "from", "to", "rotation"]
                            }
                        }
                    },
                    "required": ["elements"]
                }),
            },
            ToolDefinition {
                name: "place_mesh".to_string(),
                description: Some(
                    "Place a mesh element in the scene. Vertices are added first, then face \
                     entries mapping a cardinal face to its UV rectangle. Texture assignment \
                     happens separately via assign_texture. Returns the created uuid."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "Display name" },
                        "vertices": {
                            "type": "array",
                            "description": "Mesh vertices in local space",
                            "items": {
                                "type": "array",
                                "items": { "type": "number" },
                                "minItems": 3,
                                "maxItems": 3
                            }
                        },
                        "faces": {
                            "type": "array",
                            "description": "Face table entries",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "face": {
                                        "type": "string",
                                        "enum": ["north", "south", "east", "west", "up", "down"],
                                        "description": "Which face"
                                    },
                                    "uv": {
                                        "type": "array",
                                        "items": { "type": "number" },
                                        "minItems": 4,
                                        "maxItems": 4,
                                        "description": "UV rectangle [x1, y1, x2, y2]"
                                    }
                                },
                                "required": ["face", "uv"]
                            }
                        },
                        "origin": {
                            "type": "array",
                            "items": { "type": "number" },
                            "minItems": 3,
                            "maxItems": 3,
                            "description": "Optional pivot point, default [0, 0, 0]"
                        },
                        "rotation": {
                            "type": "array",
                            "items": { "type": "number" },
                            "minItems": 3,
                            "maxItems": 3,
                            "description": "Optional Euler rotation in degrees, default [0, 0, 0]"
                        }
                    },
                    "required": ["name", "vertices", "faces"]
                }),
            },
            ToolDefinition {
                name: "assign_texture".to_string(),
                description: Some(
                    "Assign a texture to faces of one or more elements. The texture and every \
                     element may be referenced by uuid or by exact name (uuid wins when both \
                     match). Every listed face is updated on every listed element."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "texture": {
                            "type": "string",
                            "description": "Texture uuid or name"
                        },
                        "elements": {
                            "type": "array",
                            "description": "Target elements, each a uuid or name",
                            "items": { "type": "string" }
                        },
                        "faces": {
                            "type": "array",
                            "description": "Faces to update on every element",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "face": {
                                        "type": "string",
                                        "enum": ["north", "south", "east", "west", "up", "down"],
                                        "description": "Which face"
                                    },
                                    "uv": {
                                        "type": "array",
                                        "items": { "type": "number" },
                                        "minItems": 4,
                                        "maxItems": 4,
                                        "description": "UV rectangle [x1, y1, x2, y2]"
                                    }
                                },
                                "required": ["face", "uv"]
                            }
                        }
                    },
                    "required": ["texture", "elements", "faces"]
                }),
            },
            ToolDefinition {
                name: "load_texture".to_string(),
                description: Some(
                    "Load a texture from a file path or http(s) URL. The image format and \
                     dimensions are probed from the fetched bytes. Returns the new texture's \
                     UUID."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "File path or http(s) URL of the image"
                        }
                    },
                    "required": ["path"]
                }),
            },
            ToolDefinition {
                name: "create_texture".to_string(),
                description: Some(
                    "Create a new texture from raw data. Requires name, width, height \
                     (both 16..=4096) and base64-encoded image data. Returns the new \
                     texture's UUID and the image inline."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "Display name" },
                        "width": {
                            "type": "integer",
                            "minimum": 16,
                            "maximum": 4096,
                            "description": "Pixel width"
                        },
                        "height": {
                            "type": "integer",
                            "minimum": 16,
                            "maximum": 4096,
                            "description": "Pixel height"
                        },
                        "data": {
                            "type": "string",
                            "description": "Base64-encoded image data"
                        }
                    },
                    "required": ["name", "width", "height", "data"]
                }),
            },
            ToolDefinition {
                name: "use_bar_item".to_string(),
                description: Some(
                    "Trigger a toolbar action by name, as if clicked in the editor.".to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "Name of the bar item to trigger"
                        }
                    },
                    "required": ["name"]
                }),
            },
            ToolDefinition {
                name: "list_textures".to_string(),
                description: Some(
                    "List every texture in the catalogue with its name, uuid and resource \
                     address. No parameters."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {}
                }),
            },
        ]
    }
}

/// Deserialises tool arguments into their typed parameter struct.
fn parse_args<T: DeserializeOwned>(
    id: &RequestId,
    tool: &str,
    arguments: &Value,
) -> Result<T, JsonRpcError> {
    serde_json::from_value(arguments.clone()).map_err(|e| {
        JsonRpcError::invalid_params(id.clone(), format!("Invalid {tool} arguments: {e}"))
    })
}

/// Rejects non-empty argument objects for parameterless tools.
fn require_no_args(id: &RequestId, tool: &str, arguments: &Value) -> Result<(), JsonRpcError> {
    let empty = match arguments {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        Ok(())
    } else {
        Err(JsonRpcError::invalid_params(
            id.clone(),
            format!("Invalid {tool} arguments: expected no arguments"),
        ))
    }
}

/// Resolves an identifier or converts the failure into a scene error
/// naming the collection searched.
fn resolve_required<'a, T: crate::scene::resolve::Identified>(
    items: &'a [T],
    identifier: &str,
    kind: &'static str,
) -> Result<&'a T, SceneError> {
    match resolve(items, identifier) {
        Resolution::Found(item) => Ok(item),
        Resolution::NotFound => Err(SceneError::NotFound {
            kind,
            identifier: identifier.to_string(),
        }),
        Resolution::Ambiguous { matches } => Err(SceneError::Ambiguous {
            kind,
            identifier: identifier.to_string(),
            matches,
        }),
    }
}

/// Derives a texture display name from the last path or URL segment.
fn texture_name_from_path(path: &str) -> String {
    let segment = path
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(path);
    segment
        .rsplit_once('.')
        .map_or(segment, |(stem, _)| stem)
        .to_string()
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{EditJournal, InMemoryScene};

    fn registry() -> (Arc<InMemoryScene>, Arc<EditJournal>, ToolRegistry) {
        let scene = Arc::new(InMemoryScene::new());
        let journal = Arc::new(EditJournal::new());
        let registry = ToolRegistry::new(scene.clone(), journal.clone());
        (scene, journal, registry)
    }

    fn id() -> RequestId {
        RequestId::Number(1)
    }

    #[tokio::test]
    async fn place_cubes_appends_and_commits() {
        let (scene, journal, registry) = registry();

        let args = json!({
            "elements": [
                {"name": "a", "origin": [0, 0, 0], "from": [0, 0, 0], "to": [16, 16, 16], "rotation": [0, 0, 0]},
                {"name": "b", "origin": [8, 8, 8], "from": [0, 0, 0], "to": [8, 8, 8], "rotation": [0, 45, 0]}
            ]
        });
        let result = registry.dispatch(&id(), "place_cubes", &args).await.unwrap();

        assert!(!result.is_error);
        assert_eq!(scene.elements().len(), 2);
        assert_eq!(journal.committed(), ["Place cubes"]);
        assert_eq!(journal.redraws(), 1);
    }

    #[tokio::test]
    async fn place_cubes_rejects_malformed_tuple_before_handler() {
        let (scene, journal, registry) = registry();

        let args = json!({
            "elements": [
                {"name": "a", "origin": [0, 0], "from": [0, 0, 0], "to": [1, 1, 1], "rotation": [0, 0, 0]}
            ]
        });
        let err = registry
            .dispatch(&id(), "place_cubes", &args)
            .await
            .unwrap_err();

        assert_eq!(err.error.code, -32602);
        // Fails closed: the scene was never touched.
        assert!(scene.elements().is_empty());
        assert!(journal.begun().is_empty());
    }

    #[tokio::test]
    async fn create_texture_rejects_out_of_range_width() {
        let (scene, _, registry) = registry();

        let args = json!({"name": "t", "width": 8, "height": 64, "data": "AAAA"});
        let err = registry
            .dispatch(&id(), "create_texture", &args)
            .await
            .unwrap_err();

        assert_eq!(err.error.code, -32602);
        assert!(err.error.message.contains("width"));
        assert_eq!(scene.textures().len(), 1); // only the default
    }

    #[tokio::test]
    async fn create_texture_rejects_invalid_base64() {
        let (_, _, registry) = registry();

        let args = json!({"name": "t", "width": 64, "height": 64, "data": "not base64!!"});
        let err = registry
            .dispatch(&id(), "create_texture", &args)
            .await
            .unwrap_err();
        assert!(err.error.message.contains("base64"));
    }

    #[tokio::test]
    async fn create_texture_returns_inline_image() {
        let (scene, _, registry) = registry();

        let args = json!({"name": "noise", "width": 16, "height": 16, "data": "AAAA"});
        let result = registry
            .dispatch(&id(), "create_texture", &args)
            .await
            .unwrap();

        assert!(!result.is_error);
        assert_eq!(result.content.len(), 2);
        assert!(matches!(&result.content[1], ToolContent::Image { data, .. } if data == "AAAA"));
        assert_eq!(scene.textures().len(), 2);
    }

    #[tokio::test]
    async fn assign_texture_not_found_is_an_error_result() {
        let (_, journal, registry) = registry();

        let args = json!({
            "texture": "missing",
            "elements": [],
            "faces": []
        });
        let result = registry
            .dispatch(&id(), "assign_texture", &args)
            .await
            .unwrap();

        assert!(result.is_error);
        let ToolContent::Text { text } = &result.content[0] else {
            panic!("expected text content");
        };
        assert!(text.contains("texture not found: missing"));
        assert!(journal.begun().is_empty());
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_result() {
        let (_, _, registry) = registry();
        let result = registry
            .dispatch(&id(), "explode_scene", &json!({}))
            .await
            .unwrap();
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn list_textures_rejects_stray_arguments() {
        let (_, _, registry) = registry();
        let err = registry
            .dispatch(&id(), "list_textures", &json!({"stray": 1}))
            .await
            .unwrap_err();
        assert_eq!(err.error.code, -32602);
    }

    #[tokio::test]
    async fn load_texture_from_file_probes_dimensions() {
        let (scene, _, registry) = registry();

        // A real PNG on disk: re-use the default texture's bytes.
        let bytes = BASE64_STANDARD.decode(scene.default_texture().data).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stone.png");
        std::fs::write(&path, &bytes).unwrap();

        let args = json!({"path": path.to_string_lossy()});
        let result = registry.dispatch(&id(), "load_texture", &args).await.unwrap();
        assert!(!result.is_error);

        let loaded = scene
            .textures()
            .into_iter()
            .find(|t| t.name == "stone")
            .unwrap();
        assert_eq!((loaded.width, loaded.height), (16, 16));
        assert_eq!(loaded.mime_type, "image/png");
        assert_eq!(loaded.path.as_deref(), Some(path.to_string_lossy().as_ref()));
    }

    #[tokio::test]
    async fn load_texture_missing_file_is_an_error_result() {
        let (_, _, registry) = registry();
        let args = json!({"path": "/nonexistent/missing.png"});
        let result = registry.dispatch(&id(), "load_texture", &args).await.unwrap();
        assert!(result.is_error);
    }

    #[test]
    fn texture_names_derive_from_final_segment() {
        assert_eq!(texture_name_from_path("/a/b/stone.png"), "stone");
        assert_eq!(texture_name_from_path("https://host/img/dirt.jpeg"), "dirt");
        assert_eq!(texture_name_from_path("bare"), "bare");
    }

    #[test]
    fn definitions_cover_the_full_catalogue() {
        let names: Vec<_> = ToolRegistry::definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(
            names,
            [
                "place_cubes",
                "place_mesh",
                "assign_texture",
                "load_texture",
                "create_texture",
                "use_bar_item",
                "list_textures"
            ]
        );
    }
}
