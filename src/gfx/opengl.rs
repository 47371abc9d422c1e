//! OpenGL 后端
//!
//! 通过 `glow` 调用真实的 OpenGL 驱动。上下文由调用方创建（glutin、SDL 等），
//! 这里只负责把 [`GraphicsDevice`] 的调用转发给驱动。

use glow::HasContext;

use super::device::{BufferTarget, BufferUsage, GraphicsDevice};

/// 持有一个 `glow::Context` 的 OpenGL 设备
pub struct GlowDevice {
    gl: glow::Context,
}

impl GlowDevice {
    /// 包装一个已经创建好的上下文
    ///
    /// # Safety
    ///
    /// 在设备的整个生命周期内，`gl` 对应的上下文必须在调用线程上保持为当前上下文，
    /// 并且支持顶点数组对象（OpenGL 3.0+ 或 OpenGL ES 3.0+）。
    pub unsafe fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    /// 访问底层上下文，用于本接口之外的绘制调用
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }
}

impl GraphicsDevice for GlowDevice {
    type VertexArray = glow::VertexArray;
    type Buffer = glow::Buffer;

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        // SAFETY: 构造时保证上下文为当前上下文
        unsafe { self.gl.create_vertex_array() }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { self.gl.bind_vertex_array(vertex_array) }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { self.gl.delete_vertex_array(vertex_array) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { self.gl.create_buffer() }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>) {
        unsafe { self.gl.bind_buffer(target.gl_enum(), buffer) }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(target.gl_enum(), data, usage.gl_enum())
        }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn vertex_attrib_pointer_f32(&self, location: u32, components: i32, stride: i32, offset: i32) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                location,
                components,
                glow::FLOAT,
                false,
                stride,
                offset,
            )
        }
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(location) }
    }

    fn get_error(&self) -> u32 {
        unsafe { self.gl.get_error() }
    }
}
