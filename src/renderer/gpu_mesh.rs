//! GPU 侧网格
//!
//! 把 `MeshData` 上传到一个顶点数组、一个顶点缓冲区和一个索引缓冲区，
//! 并以作用域所有权管理这三个句柄：`GpuMesh` 被丢弃或调用 `release` 时释放。

use std::mem::ManuallyDrop;
use std::path::Path;

use crate::core::error::{GraphicsError, MeshLoadError, Result};
use crate::geometry::loaders::load_mesh;
use crate::geometry::mesh::MeshData;
use crate::geometry::vertex::Vertex;
use crate::gfx::device::{BufferTarget, BufferUsage, GraphicsDevice, NO_ERROR};
use crate::{engine_debug, engine_info, engine_warn, gl_check};

/// 上传前最多清理的残留错误数量
const MAX_STALE_ERRORS: usize = 8;

/// 已上传到设备的网格
///
/// 持有设备的借用，因此不会比设备活得更久。
///
/// # 使用示例
///
/// ```rust,no_run
/// use mesh_upload::gfx::HeadlessDevice;
/// use mesh_upload::renderer::GpuMesh;
///
/// let device = HeadlessDevice::new();
/// let mesh = GpuMesh::load(&device, "assets/triangles.obj")?;
/// println!("{} 个顶点", mesh.vertex_count());
/// mesh.release()?;
/// # Ok::<(), mesh_upload::core::MeshUploadError>(())
/// ```
#[derive(Debug)]
pub struct GpuMesh<'d, D: GraphicsDevice> {
    device: &'d D,
    vertex_array: D::VertexArray,
    vertex_buffer: D::Buffer,
    index_buffer: D::Buffer,
    vertex_count: u32,
}

/// 上传过程中已创建的句柄，失败返回时统一删除
struct PendingHandles<'d, D: GraphicsDevice> {
    device: &'d D,
    vertex_array: Option<D::VertexArray>,
    vertex_buffer: Option<D::Buffer>,
    index_buffer: Option<D::Buffer>,
}

impl<'d, D: GraphicsDevice> PendingHandles<'d, D> {
    fn new(device: &'d D) -> Self {
        Self {
            device,
            vertex_array: None,
            vertex_buffer: None,
            index_buffer: None,
        }
    }

    /// 上传成功，句柄所有权转交给 `GpuMesh`
    fn disarm(&mut self) {
        self.vertex_array = None;
        self.vertex_buffer = None;
        self.index_buffer = None;
    }
}

impl<D: GraphicsDevice> Drop for PendingHandles<'_, D> {
    fn drop(&mut self) {
        let any = self.vertex_array.is_some()
            || self.vertex_buffer.is_some()
            || self.index_buffer.is_some();
        if !any {
            return;
        }

        self.device.bind_vertex_array(None);
        self.device.bind_buffer(BufferTarget::Array, None);
        if let Some(buffer) = self.vertex_buffer.take() {
            self.device.delete_buffer(buffer);
        }
        if let Some(buffer) = self.index_buffer.take() {
            self.device.delete_buffer(buffer);
        }
        if let Some(vertex_array) = self.vertex_array.take() {
            self.device.delete_vertex_array(vertex_array);
        }
        // 清掉清理过程中产生的错误，调用方已经拿到了第一个错误
        let _ = self.device.get_error();
        engine_debug!("Released partially uploaded mesh handles");
    }
}

impl<'d, D: GraphicsDevice> GpuMesh<'d, D> {
    /// 加载模型文件并上传
    pub fn load(device: &'d D, path: impl AsRef<Path>) -> Result<Self> {
        let mesh_data = load_mesh(path.as_ref())?;
        Self::upload(device, &mesh_data)
    }

    /// 上传 CPU 侧网格数据
    ///
    /// 创建顶点数组并在其绑定状态下创建索引缓冲区和顶点缓冲区，以 `StaticDraw` 上传，
    /// 然后配置三个浮点属性（0 = 位置，1 = 法线，2 = 纹理坐标，跨度 32 字节）。
    /// 每次调用之后都检查设备错误标志；任何一步失败时，已创建的句柄都会被删除。
    pub fn upload(device: &'d D, mesh_data: &MeshData) -> Result<Self> {
        mesh_data
            .validate()
            .map_err(MeshLoadError::ValidationError)?;
        let vertex_count = u32::try_from(mesh_data.vertex_count()).map_err(|_| {
            MeshLoadError::ValidationError(format!(
                "{} vertices exceed the 32-bit index range",
                mesh_data.vertex_count()
            ))
        })?;

        drain_stale_errors(device);
        engine_debug!(vertices = vertex_count, "Uploading mesh");

        let mut pending = PendingHandles::new(device);

        // 顶点数组必须先绑定，索引缓冲区的绑定记录在其中
        let vertex_array = device
            .create_vertex_array()
            .map_err(GraphicsError::ResourceCreation)?;
        pending.vertex_array = Some(vertex_array);
        gl_check!(device, "glGenVertexArrays")?;
        device.bind_vertex_array(Some(vertex_array));
        gl_check!(device, "glBindVertexArray")?;

        let index_buffer = device
            .create_buffer()
            .map_err(GraphicsError::ResourceCreation)?;
        pending.index_buffer = Some(index_buffer);
        gl_check!(device, "glGenBuffers")?;
        device.bind_buffer(BufferTarget::ElementArray, Some(index_buffer));
        gl_check!(device, "glBindBuffer")?;
        device.buffer_data(
            BufferTarget::ElementArray,
            mesh_data.index_bytes(),
            BufferUsage::StaticDraw,
        );
        gl_check!(device, "glBufferData")?;

        let vertex_buffer = device
            .create_buffer()
            .map_err(GraphicsError::ResourceCreation)?;
        pending.vertex_buffer = Some(vertex_buffer);
        gl_check!(device, "glGenBuffers")?;
        device.bind_buffer(BufferTarget::Array, Some(vertex_buffer));
        gl_check!(device, "glBindBuffer")?;
        device.buffer_data(
            BufferTarget::Array,
            mesh_data.vertex_bytes(),
            BufferUsage::StaticDraw,
        );
        gl_check!(device, "glBufferData")?;

        for attribute in Vertex::ATTRIBUTES {
            device.vertex_attrib_pointer_f32(
                attribute.location,
                attribute.components,
                Vertex::STRIDE,
                attribute.offset,
            );
            gl_check!(device, "glVertexAttribPointer")?;
        }
        for attribute in Vertex::ATTRIBUTES {
            device.enable_vertex_attrib_array(attribute.location);
            gl_check!(device, "glEnableVertexAttribArray")?;
        }

        // 先解绑顶点数组，避免解绑索引缓冲区时把它从顶点数组中摘掉
        device.bind_vertex_array(None);
        gl_check!(device, "glBindVertexArray")?;
        device.bind_buffer(BufferTarget::Array, None);
        gl_check!(device, "glBindBuffer")?;

        pending.disarm();

        engine_info!(
            vertices = vertex_count,
            vertex_array = ?vertex_array,
            vertex_buffer = ?vertex_buffer,
            index_buffer = ?index_buffer,
            "Mesh uploaded"
        );

        Ok(Self {
            device,
            vertex_array,
            vertex_buffer,
            index_buffer,
            vertex_count,
        })
    }

    pub fn device(&self) -> &'d D {
        self.device
    }

    pub fn vertex_array(&self) -> D::VertexArray {
        self.vertex_array
    }

    pub fn vertex_buffer(&self) -> D::Buffer {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> D::Buffer {
        self.index_buffer
    }

    /// 顶点数量，等于 3 × 三角形数
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// 索引数量，与顶点数量相同
    pub fn index_count(&self) -> u32 {
        self.vertex_count
    }

    /// 显式释放三个句柄，并报告删除过程中的设备错误
    pub fn release(self) -> Result<()> {
        let this = ManuallyDrop::new(self);
        drain_stale_errors(this.device);
        this.delete_handles();
        gl_check!(this.device, "glDeleteBuffers")?;
        Ok(())
    }

    fn delete_handles(&self) {
        self.device.delete_buffer(self.vertex_buffer);
        self.device.delete_buffer(self.index_buffer);
        self.device.delete_vertex_array(self.vertex_array);
        engine_debug!(vertex_array = ?self.vertex_array, "Mesh handles released");
    }
}

impl<D: GraphicsDevice> Drop for GpuMesh<'_, D> {
    fn drop(&mut self) {
        self.delete_handles();
        let code = self.device.get_error();
        if code != NO_ERROR {
            engine_warn!(code, "Device reported an error while releasing mesh handles");
        }
    }
}

/// 清理上一次调用残留的错误标志，避免把它归咎于本次上传
fn drain_stale_errors<D: GraphicsDevice>(device: &D) {
    for _ in 0..MAX_STALE_ERRORS {
        let code = device.get_error();
        if code == NO_ERROR {
            return;
        }
        engine_warn!(code, "Discarding stale device error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::MeshUploadError;
    use crate::gfx::device::{INVALID_VALUE, OUT_OF_MEMORY};
    use crate::gfx::HeadlessDevice;

    fn two_triangles() -> MeshData {
        let mut mesh = MeshData::new();
        for i in 0..6 {
            let f = i as f32;
            mesh.push_vertex(Vertex::new([f, f + 0.5, -f], [0.0, 0.0, 1.0], [f / 6.0, 1.0]));
        }
        mesh
    }

    #[test]
    fn test_upload_two_triangles() {
        let device = HeadlessDevice::new();
        let mesh_data = two_triangles();
        let mesh = GpuMesh::upload(&device, &mesh_data).unwrap();

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.index_count(), 6);

        let vertices = device.buffer_contents(mesh.vertex_buffer()).unwrap();
        let floats: Vec<f32> = bytemuck::pod_collect_to_vec(&vertices);
        assert_eq!(floats.len(), 6 * 8);
        assert_eq!(&floats[8..16], &[1.0, 1.5, -1.0, 0.0, 0.0, 1.0, 1.0 / 6.0, 1.0]);

        let indices = device.buffer_contents(mesh.index_buffer()).unwrap();
        let indices: Vec<u32> = bytemuck::pod_collect_to_vec(&indices);
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);

        assert_eq!(device.buffer_usage(mesh.vertex_buffer()), Some(BufferUsage::StaticDraw));
        assert_eq!(device.buffer_usage(mesh.index_buffer()), Some(BufferUsage::StaticDraw));
    }

    #[test]
    fn test_upload_configures_attribute_layout() {
        let device = HeadlessDevice::new();
        let mesh = GpuMesh::upload(&device, &two_triangles()).unwrap();
        let state = device.vertex_array_state(mesh.vertex_array()).unwrap();

        assert_eq!(state.element_buffer, Some(mesh.index_buffer()));
        for (location, components, offset) in [(0, 3, 0), (1, 3, 12), (2, 2, 24)] {
            let attribute = state.attributes[location];
            let pointer = attribute.pointer.unwrap();
            assert!(attribute.enabled);
            assert_eq!(pointer.buffer, Some(mesh.vertex_buffer()));
            assert_eq!(pointer.components, components);
            assert_eq!(pointer.stride, 32);
            assert_eq!(pointer.offset, offset);
        }
        assert!(!state.attributes[3].enabled);
    }

    #[test]
    fn test_upload_leaves_bindings_clear() {
        let device = HeadlessDevice::new();
        let _mesh = GpuMesh::upload(&device, &two_triangles()).unwrap();

        assert_eq!(device.bound_vertex_array(), None);
        assert_eq!(device.bound_buffer(BufferTarget::Array), None);
    }

    #[test]
    fn test_drop_releases_handles() {
        let device = HeadlessDevice::new();
        {
            let _mesh = GpuMesh::upload(&device, &two_triangles()).unwrap();
            assert_eq!(device.live_vertex_arrays(), 1);
            assert_eq!(device.live_buffers(), 2);
        }
        assert_eq!(device.live_vertex_arrays(), 0);
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn test_release_is_explicit_shutdown() {
        let device = HeadlessDevice::new();
        let mesh = GpuMesh::upload(&device, &two_triangles()).unwrap();
        let vertex_buffer = mesh.vertex_buffer();

        mesh.release().unwrap();

        assert_eq!(device.buffer_contents(vertex_buffer), None);
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn test_api_error_carries_code_and_location() {
        let device = HeadlessDevice::new().with_max_vertex_attribs(2);
        let err = GpuMesh::upload(&device, &two_triangles()).unwrap_err();

        match err {
            MeshUploadError::Graphics(GraphicsError::ApiCall { code, call, file, line }) => {
                assert_eq!(code, INVALID_VALUE);
                assert_eq!(call, "glVertexAttribPointer");
                assert!(file.ends_with("gpu_mesh.rs"));
                assert!(line > 0);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(device.live_vertex_arrays(), 0);
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn test_out_of_memory_frees_partial_upload() {
        // 索引缓冲区放得下，顶点缓冲区放不下
        let device = HeadlessDevice::new().with_memory_limit(64);
        let err = GpuMesh::upload(&device, &two_triangles()).unwrap_err();

        assert!(matches!(
            err,
            MeshUploadError::Graphics(GraphicsError::ApiCall { code: OUT_OF_MEMORY, .. })
        ));
        assert_eq!(device.live_vertex_arrays(), 0);
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn test_creation_failure_frees_partial_upload() {
        let device = HeadlessDevice::new().with_object_limit(2);
        let err = GpuMesh::upload(&device, &two_triangles()).unwrap_err();

        assert!(matches!(
            err,
            MeshUploadError::Graphics(GraphicsError::ResourceCreation(_))
        ));
        assert_eq!(device.live_vertex_arrays(), 0);
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn test_stale_error_is_not_blamed_on_upload() {
        let device = HeadlessDevice::new();
        device.enable_vertex_attrib_array(0);

        assert!(GpuMesh::upload(&device, &two_triangles()).is_ok());
    }

    #[test]
    fn test_upload_rejects_shared_indices() {
        let device = HeadlessDevice::new();
        let mut mesh_data = two_triangles();
        mesh_data.indices[5] = 0;

        assert!(matches!(
            GpuMesh::upload(&device, &mesh_data),
            Err(MeshUploadError::MeshLoading(MeshLoadError::ValidationError(_)))
        ));
        assert_eq!(device.live_vertex_arrays(), 0);
    }
}
