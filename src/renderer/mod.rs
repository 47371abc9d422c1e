//! 渲染资源模块
//!
//! 目前只包含 `GpuMesh`：把 CPU 侧网格上传到图形设备并管理句柄的生命周期。
//! 绘制调用不在本模块范围内，调用方通过句柄和顶点数量自行绘制。

pub mod gpu_mesh;

pub use gpu_mesh::GpuMesh;
