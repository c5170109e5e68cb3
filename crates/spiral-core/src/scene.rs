//! Scene-side types shared with the frontends.
//!
//! The core never talks to a renderer. It hands out transforms and a typed
//! description of what each stone looks like; the web and native frontends
//! map those onto their own draw calls.

use crate::constants::{
    FALLBACK_STONE_COLOR, FALLBACK_STONE_METALNESS, FALLBACK_STONE_ROUGHNESS, FALLBACK_STONE_SIZE,
    MODEL_SCALE,
};
use crate::error::{Result, SpiralError};
use glam::{Mat4, Quat, Vec3};
use serde::Deserialize;
use std::sync::Arc;

/// Position + orientation + scale, decomposed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.orientation, self.position)
    }

    pub fn from_matrix(m: &Mat4) -> Self {
        let (scale, orientation, position) = m.to_scale_rotation_translation();
        Self {
            position,
            orientation,
            scale,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshNode {
    pub name: String,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupNode {
    pub name: String,
    pub scale: Vec3,
    pub children: Vec<SceneNode>,
}

/// Node of a loaded model.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneNode {
    Mesh(MeshNode),
    Group(GroupNode),
    Other { name: String },
}

impl SceneNode {
    pub fn mesh(name: impl Into<String>) -> Self {
        SceneNode::Mesh(MeshNode {
            name: name.into(),
            cast_shadow: false,
            receive_shadow: false,
        })
    }

    pub fn group(name: impl Into<String>, children: Vec<SceneNode>) -> Self {
        SceneNode::Group(GroupNode {
            name: name.into(),
            scale: Vec3::ONE,
            children,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            SceneNode::Mesh(m) => &m.name,
            SceneNode::Group(g) => &g.name,
            SceneNode::Other { name } => name,
        }
    }

    /// Turn on shadow casting/receiving for every mesh in the subtree.
    pub fn enable_shadows(&mut self) {
        match self {
            SceneNode::Mesh(m) => {
                m.cast_shadow = true;
                m.receive_shadow = true;
            }
            SceneNode::Group(g) => {
                for child in &mut g.children {
                    child.enable_shadows();
                }
            }
            SceneNode::Other { .. } => {}
        }
    }

    pub fn mesh_count(&self) -> usize {
        match self {
            SceneNode::Mesh(_) => 1,
            SceneNode::Group(g) => g.children.iter().map(SceneNode::mesh_count).sum(),
            SceneNode::Other { .. } => 0,
        }
    }

    /// Root scale of the node; only groups carry one.
    pub fn scale(&self) -> Vec3 {
        match self {
            SceneNode::Group(g) => g.scale,
            SceneNode::Mesh(_) | SceneNode::Other { .. } => Vec3::ONE,
        }
    }
}

/// Shadows on, uniform model scale applied at a group root.
pub fn prepare_model(mut node: SceneNode) -> SceneNode {
    node.enable_shadows();
    let mut root = match node {
        SceneNode::Group(g) => g,
        other => GroupNode {
            name: other.name().to_string(),
            scale: Vec3::ONE,
            children: vec![other],
        },
    };
    root.scale = Vec3::splat(MODEL_SCALE);
    SceneNode::Group(root)
}

/// Stand-in geometry used while (or because) the model is unavailable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FallbackPrimitive {
    pub size: Vec3,
    pub color: [f32; 3],
    pub roughness: f32,
    pub metalness: f32,
}

impl Default for FallbackPrimitive {
    fn default() -> Self {
        Self {
            size: Vec3::from(FALLBACK_STONE_SIZE),
            color: FALLBACK_STONE_COLOR,
            roughness: FALLBACK_STONE_ROUGHNESS,
            metalness: FALLBACK_STONE_METALNESS,
        }
    }
}

/// What a single stone renders as.
#[derive(Clone, Debug)]
pub enum AssetRef {
    Model(Arc<SceneNode>),
    Fallback(FallbackPrimitive),
}

impl AssetRef {
    pub fn is_fallback(&self) -> bool {
        matches!(self, AssetRef::Fallback(_))
    }
}

/// Load state of the stone model. `Failed` is terminal for the page lifetime.
#[derive(Clone, Debug, Default)]
pub enum AssetSlot {
    #[default]
    Pending,
    Ready(Arc<SceneNode>),
    Failed,
}

impl AssetSlot {
    /// Loaded or given up; either way placement may proceed.
    pub fn is_settled(&self) -> bool {
        !matches!(self, AssetSlot::Pending)
    }

    pub fn model(&self) -> Option<Arc<SceneNode>> {
        match self {
            AssetSlot::Ready(node) => Some(node.clone()),
            AssetSlot::Pending | AssetSlot::Failed => None,
        }
    }
}

/// Asynchronous model source. Implemented by the frontends (fetch, file).
#[allow(async_fn_in_trait)]
pub trait ModelLoader {
    async fn load(&self, path: &str) -> Result<SceneNode>;
}

// ---------------- Binary glTF container ----------------

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_HEADER_LEN: usize = 12;
const GLB_CHUNK_JSON: u32 = 0x4E4F_534A;
const MAX_NODE_DEPTH: usize = 64;

#[derive(Deserialize, Default)]
struct GltfDoc {
    #[serde(default)]
    scene: Option<usize>,
    #[serde(default)]
    scenes: Vec<GltfScene>,
    #[serde(default)]
    nodes: Vec<GltfNode>,
}

#[derive(Deserialize, Default)]
struct GltfScene {
    #[serde(default)]
    nodes: Vec<usize>,
}

#[derive(Deserialize, Default)]
struct GltfNode {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    mesh: Option<usize>,
    #[serde(default)]
    children: Vec<usize>,
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Build the node hierarchy of a `.glb` file from its container header and
/// JSON chunk. Geometry buffers are left to the renderer.
pub fn scene_from_glb(path: &str, bytes: &[u8]) -> Result<SceneNode> {
    let fail = |reason: &str| SpiralError::AssetLoad {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    if bytes.len() < GLB_HEADER_LEN || &bytes[0..4] != GLB_MAGIC {
        return Err(fail("not a binary glTF file"));
    }
    let version = read_u32(bytes, 4).ok_or_else(|| fail("truncated header"))?;
    if version != 2 {
        return Err(fail(&format!("unsupported glTF version {version}")));
    }
    let declared = read_u32(bytes, 8).ok_or_else(|| fail("truncated header"))? as usize;
    if declared > bytes.len() {
        return Err(fail("declared length exceeds file size"));
    }
    let chunk_len = read_u32(bytes, 12).ok_or_else(|| fail("missing JSON chunk"))? as usize;
    let chunk_type = read_u32(bytes, 16).ok_or_else(|| fail("missing JSON chunk"))?;
    if chunk_type != GLB_CHUNK_JSON {
        return Err(fail("first chunk is not JSON"));
    }
    let chunk_end = 20usize
        .checked_add(chunk_len)
        .filter(|&end| end <= declared)
        .ok_or_else(|| fail("JSON chunk out of bounds"))?;
    let json = bytes
        .get(20..chunk_end)
        .ok_or_else(|| fail("JSON chunk out of bounds"))?;
    let doc: GltfDoc =
        serde_json::from_slice(json).map_err(|e| fail(&format!("bad JSON chunk: {e}")))?;

    let roots: Vec<usize> = match doc.scenes.get(doc.scene.unwrap_or(0)) {
        Some(scene) => scene.nodes.clone(),
        None => (0..doc.nodes.len()).collect(),
    };
    let children = roots
        .into_iter()
        .filter_map(|i| convert_node(&doc.nodes, i, 0))
        .collect();
    Ok(SceneNode::group(path, children))
}

fn convert_node(nodes: &[GltfNode], index: usize, depth: usize) -> Option<SceneNode> {
    if depth > MAX_NODE_DEPTH {
        return None;
    }
    let node = nodes.get(index)?;
    let name = node
        .name
        .clone()
        .unwrap_or_else(|| format!("node{index}"));
    let mut children: Vec<SceneNode> = node
        .children
        .iter()
        .filter_map(|&c| convert_node(nodes, c, depth + 1))
        .collect();
    match (node.mesh, children.is_empty()) {
        (Some(_), true) => Some(SceneNode::mesh(name)),
        (Some(_), false) => {
            children.insert(0, SceneNode::mesh(format!("{name}.mesh")));
            Some(SceneNode::group(name, children))
        }
        (None, false) => Some(SceneNode::group(name, children)),
        (None, true) => Some(SceneNode::Other { name }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glb(json: &str) -> Vec<u8> {
        let mut body = json.as_bytes().to_vec();
        while body.len() % 4 != 0 {
            body.push(b' ');
        }
        let total = 12 + 8 + body.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(GLB_MAGIC);
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&GLB_CHUNK_JSON.to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn glb_hierarchy_maps_to_typed_nodes() {
        let bytes = glb(
            r#"{"scene":0,"scenes":[{"nodes":[0]}],
                "nodes":[{"name":"Root","children":[1,2]},{"name":"Rock","mesh":0},{"name":"Empty"}]}"#,
        );
        let scene = scene_from_glb("stone.glb", &bytes).unwrap();
        assert_eq!(scene.mesh_count(), 1);
        let SceneNode::Group(root) = &scene else {
            panic!("expected group root")
        };
        let SceneNode::Group(inner) = &root.children[0] else {
            panic!("expected group for Root")
        };
        assert_eq!(inner.children[0].name(), "Rock");
        assert!(matches!(inner.children[1], SceneNode::Other { .. }));
    }

    #[test]
    fn rejects_non_glb_and_bad_versions() {
        assert!(scene_from_glb("x", b"PNG\0garbage").is_err());
        let mut bytes = glb("{}");
        bytes[4] = 1;
        assert!(scene_from_glb("x", &bytes).is_err());
    }

    #[test]
    fn rejects_length_beyond_file() {
        let mut bytes = glb("{}");
        let too_long = (bytes.len() as u32 + 10).to_le_bytes();
        bytes[8..12].copy_from_slice(&too_long);
        assert!(scene_from_glb("x", &bytes).is_err());
    }

    #[test]
    fn rejects_chunk_longer_than_the_file() {
        let mut bytes = glb("{}");
        bytes[12..16].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            scene_from_glb("x", &bytes),
            Err(SpiralError::AssetLoad { .. })
        ));

        let mut bytes = glb(r#"{"nodes":[]}"#);
        let declared = (bytes.len() as u32 - 4).to_le_bytes();
        bytes[8..12].copy_from_slice(&declared);
        assert!(scene_from_glb("x", &bytes).is_err());
    }
}
