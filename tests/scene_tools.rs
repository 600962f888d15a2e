//! End-to-end tool behaviour over a shared scene.
//!
//! Every exchange goes through a fresh ephemeral session, the way the
//! front door drives them, so these tests also cover the property that
//! scene state persists across requests while protocol state does not.

use std::sync::Arc;

use serde_json::{json, Value};

use modelbench_mcp::mcp::server::McpSession;
use modelbench_mcp::mcp::transport::HttpTransport;
use modelbench_mcp::scene::model::Direction;
use modelbench_mcp::scene::{EditJournal, InMemoryScene, SceneAdapter};

struct Fixture {
    scene: Arc<InMemoryScene>,
    journal: Arc<EditJournal>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            scene: Arc::new(InMemoryScene::new()),
            journal: Arc::new(EditJournal::new()),
        }
    }

    async fn exchange(&self, body: &Value) -> Value {
        let mut session = McpSession::new(self.scene.clone(), self.journal.clone());
        session.bind().unwrap();

        let transport = HttpTransport::new();
        let reply = transport
            .handle_request(&mut session, &body.to_string())
            .await
            .unwrap();
        session.close();

        serde_json::from_str(&reply.body.expect("expected a reply body")).unwrap()
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Value {
        self.exchange(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        }))
        .await
    }

    /// Parses the JSON payload out of a tool result's first text block.
    fn tool_payload(body: &Value) -> Value {
        let text = body["result"]["content"][0]["text"].as_str().unwrap();
        serde_json::from_str(text).unwrap()
    }
}

fn cube_spec(name: &str) -> Value {
    json!({
        "name": name,
        "origin": [0, 0, 0],
        "from": [0, 0, 0],
        "to": [16, 16, 16],
        "rotation": [0, 0, 0]
    })
}

#[tokio::test]
async fn place_cubes_grows_the_scene_by_exactly_n() {
    let fixture = Fixture::new();

    let body = fixture
        .call_tool(
            "place_cubes",
            json!({ "elements": [cube_spec("a"), cube_spec("b"), cube_spec("c")] }),
        )
        .await;

    let placed = Fixture::tool_payload(&body)["placed"].clone();
    assert_eq!(placed.as_array().unwrap().len(), 3);
    assert_eq!(fixture.scene.elements().len(), 3);

    // Every returned uuid resolves via the element resource.
    for entry in placed.as_array().unwrap() {
        let uri = entry["uri"].as_str().unwrap();
        let body = fixture
            .exchange(&json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "resources/read",
                "params": { "uri": uri }
            }))
            .await;

        let contents = body["result"]["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1, "placed cube must be readable at {uri}");
        let element: Value =
            serde_json::from_str(contents[0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(element["uuid"], entry["uuid"]);
        assert_eq!(element["name"], entry["name"]);
    }
}

#[tokio::test]
async fn place_cubes_commits_one_labelled_edit() {
    let fixture = Fixture::new();
    fixture
        .call_tool("place_cubes", json!({ "elements": [cube_spec("a")] }))
        .await;

    assert_eq!(fixture.journal.begun(), ["Place cubes"]);
    assert_eq!(fixture.journal.committed(), ["Place cubes"]);
    assert_eq!(fixture.journal.redraws(), 1);
}

#[tokio::test]
async fn place_mesh_adds_vertices_then_faces() {
    let fixture = Fixture::new();

    let body = fixture
        .call_tool(
            "place_mesh",
            json!({
                "name": "sail",
                "vertices": [[0, 0, 0], [4, 0, 0], [2, 4, 0]],
                "faces": [
                    { "face": "north", "uv": [0, 0, 1, 1] },
                    { "face": "south", "uv": [0, 0, 0.5, 0.5] }
                ]
            }),
        )
        .await;

    let payload = Fixture::tool_payload(&body);
    let uuid = uuid::Uuid::parse_str(payload["uuid"].as_str().unwrap()).unwrap();

    let mesh = fixture.scene.element_by_uuid(uuid).unwrap();
    assert_eq!(mesh.faces.len(), 2);
    assert_eq!(mesh.faces[&Direction::South].uv, [0.0, 0.0, 0.5, 0.5]);
    assert_eq!(fixture.journal.committed(), ["Place mesh"]);
}

#[tokio::test]
async fn assign_texture_updates_exactly_m_by_k_faces() {
    let fixture = Fixture::new();

    fixture
        .call_tool(
            "place_cubes",
            json!({ "elements": [cube_spec("left"), cube_spec("right")] }),
        )
        .await;

    let body = fixture
        .call_tool(
            "assign_texture",
            json!({
                "texture": "default",
                "elements": ["left", "right"],
                "faces": [
                    { "face": "up", "uv": [0, 0, 1, 1] },
                    { "face": "down", "uv": [0, 0, 0.25, 0.25] },
                    { "face": "north", "uv": [0.5, 0.5, 1, 1] }
                ]
            }),
        )
        .await;

    // 2 elements x 3 faces = 6 assignments.
    let assignments = Fixture::tool_payload(&body)["assignments"].clone();
    assert_eq!(assignments.as_array().unwrap().len(), 6);

    let texture = fixture.scene.default_texture().uuid;
    for element in fixture.scene.elements() {
        for dir in [Direction::Up, Direction::Down, Direction::North] {
            assert_eq!(element.faces[&dir].texture, Some(texture));
        }
        // Untouched faces stay unmapped.
        assert_eq!(element.faces[&Direction::East].texture, None);
        assert_eq!(element.faces[&Direction::Down].uv, [0.0, 0.0, 0.25, 0.25]);
    }

    assert_eq!(
        fixture.journal.committed(),
        ["Place cubes", "Assign texture"]
    );
}

#[tokio::test]
async fn assign_texture_prefers_uuid_over_name() {
    let fixture = Fixture::new();

    fixture
        .call_tool("place_cubes", json!({ "elements": [cube_spec("target")] }))
        .await;
    let target_uuid = fixture.scene.elements()[0].uuid;

    // A decoy whose *name* is the target's uuid string.
    fixture
        .call_tool(
            "place_cubes",
            json!({ "elements": [cube_spec(&target_uuid.to_string())] }),
        )
        .await;

    fixture
        .call_tool(
            "assign_texture",
            json!({
                "texture": "default",
                "elements": [target_uuid.to_string()],
                "faces": [{ "face": "up", "uv": [0, 0, 1, 1] }]
            }),
        )
        .await;

    let target = fixture.scene.element_by_uuid(target_uuid).unwrap();
    assert!(target.faces[&Direction::Up].texture.is_some());

    let decoy = fixture
        .scene
        .elements()
        .into_iter()
        .find(|e| e.uuid != target_uuid)
        .unwrap();
    assert!(decoy.faces[&Direction::Up].texture.is_none());
}

#[tokio::test]
async fn assign_texture_reports_ambiguous_names() {
    let fixture = Fixture::new();
    fixture
        .call_tool(
            "place_cubes",
            json!({ "elements": [cube_spec("twin"), cube_spec("twin")] }),
        )
        .await;

    let body = fixture
        .call_tool(
            "assign_texture",
            json!({
                "texture": "default",
                "elements": ["twin"],
                "faces": [{ "face": "up", "uv": [0, 0, 1, 1] }]
            }),
        )
        .await;

    assert_eq!(body["result"]["isError"], true);
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("ambiguous"));
    assert!(text.contains("2 name matches"));
}

#[tokio::test]
async fn create_texture_is_visible_to_the_next_request() {
    let fixture = Fixture::new();

    let body = fixture
        .call_tool(
            "create_texture",
            json!({"name": "noise", "width": 32, "height": 32, "data": "AAAA"}),
        )
        .await;
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    let uuid = text.rsplit(' ').next().unwrap();

    // A separate exchange, as the front door would issue it.
    let listing = fixture.call_tool("list_textures", json!({})).await;
    let textures = Fixture::tool_payload(&listing)["textures"].clone();
    assert!(textures
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["uuid"] == uuid));
}

#[tokio::test]
async fn use_bar_item_triggers_the_named_action() {
    let fixture = Fixture::new();
    fixture
        .scene
        .add_bar_item(modelbench_mcp::scene::model::BarItem {
            name: "toggle_grid".to_string(),
            icon: "grid_on".to_string(),
            tooltip: "Toggle the grid overlay".to_string(),
            enabled: true,
        });

    let body = fixture
        .call_tool("use_bar_item", json!({"name": "toggle_grid"}))
        .await;

    assert!(body.get("error").is_none());
    assert_eq!(fixture.scene.triggered(), ["toggle_grid"]);
}

#[tokio::test]
async fn disabled_bar_items_still_trigger() {
    // The enabled flag is advisory; the trigger is synthesized anyway.
    let fixture = Fixture::new();
    fixture
        .scene
        .add_bar_item(modelbench_mcp::scene::model::BarItem {
            name: "export".to_string(),
            icon: "save".to_string(),
            tooltip: "Export the project".to_string(),
            enabled: false,
        });

    fixture
        .call_tool("use_bar_item", json!({"name": "export"}))
        .await;
    assert_eq!(fixture.scene.triggered(), ["export"]);
}

#[tokio::test]
async fn list_textures_mutates_nothing() {
    let fixture = Fixture::new();
    fixture.call_tool("list_textures", json!({})).await;

    assert!(fixture.journal.begun().is_empty());
    assert_eq!(fixture.journal.redraws(), 0);
    assert_eq!(fixture.scene.textures().len(), 1);
}
