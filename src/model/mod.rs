// MODEL: scene data (transforms, camera, geometry, lights)
pub mod transform;
pub mod camera;
pub mod mesh;
pub mod light;
pub mod renderable;
pub mod scene;

pub use transform::Transform;
pub use camera::Camera;
pub use mesh::{ImportFlags, MeshImporter, ObjImporter, SubMesh};
pub use light::{DirectionalLight, LightManager, MAX_DIRECTIONAL_LIGHTS};
pub use renderable::{Renderable, RenderableKind, UploadContext};
pub use scene::Scene;
