//! mesh_upload - OBJ 网格加载与上传
//!
//! 读取单形状、已三角化的 Wavefront OBJ 文件，展开为交错顶点
//! `{position, normal, texcoord}` 和顺序索引，并上传到顶点数组、顶点缓冲区和索引缓冲区。
//!
//! # 模块结构
//!
//! - `core`: 日志、配置、错误处理
//! - `geometry`: 顶点定义、CPU 侧网格数据、OBJ 加载器
//! - `gfx`: 图形设备接口（OpenGL 实现和内存实现）
//! - `renderer`: GPU 侧网格
//!
//! # 使用示例
//!
//! ```no_run
//! use mesh_upload::gfx::HeadlessDevice;
//! use mesh_upload::renderer::GpuMesh;
//!
//! let device = HeadlessDevice::new();
//! let mesh = GpuMesh::load(&device, "assets/triangles.obj")?;
//! assert_eq!(mesh.vertex_count() % 3, 0);
//! # Ok::<(), mesh_upload::core::MeshUploadError>(())
//! ```

pub mod core;
pub mod geometry;
pub mod gfx;
pub mod renderer;
