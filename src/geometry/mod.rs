/// 几何体加载模块
///
/// 包含顶点定义、CPU 侧网格数据以及 OBJ 加载器。
///
/// # 架构设计
///
/// ```text
/// 文件 (OBJ)
///     ↓
/// ObjLoader
///     ↓
/// MeshData (CPU侧数据)
///     ↓
/// GpuMesh (上传到GPU)
/// ```

pub mod vertex;
pub mod mesh;
pub mod loaders;

// 重新导出常用类型
pub use vertex::{Vertex, VertexAttribute};
pub use mesh::MeshData;
