pub mod device;
pub mod framebuffer;
pub mod geometry;
pub mod gl;
pub mod import;
pub mod lights;
pub mod mesh;
pub mod model;
pub mod registry;
pub mod shader;
pub mod texture;
pub mod vertex;

#[cfg(test)]
pub(crate) mod recording;

pub use device::Device;
pub use framebuffer::{Framebuffer, FramebufferError, TargetAttachment};
pub use geometry::{GeometryError, InstancedGeometry, StaticGeometry};
pub use gl::GlDevice;
pub use mesh::{Mesh, MeshError};
pub use model::{Model, ModelError, ModelOptions};
pub use registry::{RegistryError, ShaderRegistry};
pub use shader::{Shader, ShaderError, ShaderSource};
pub use texture::{ChannelLayout, Texture, TextureError, TextureKind};
pub use vertex::Vertex;
