//! 图形设备的统一抽象接口
//!
//! 加载器需要的图形 API 调用都通过显式传入的设备完成，不依赖隐式的当前上下文。
//! 接口形状与 OpenGL 的缓冲/顶点数组调用一一对应：
//! 调用本身不返回错误，错误码通过 `get_error` 查询。

use std::fmt::Debug;

/// 无错误
pub const NO_ERROR: u32 = glow::NO_ERROR;
/// 数值参数非法
pub const INVALID_VALUE: u32 = glow::INVALID_VALUE;
/// 当前状态下不允许该操作
pub const INVALID_OPERATION: u32 = glow::INVALID_OPERATION;
/// 显存不足
pub const OUT_OF_MEMORY: u32 = glow::OUT_OF_MEMORY;

/// 缓冲区绑定点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// 顶点缓冲区
    Array,
    /// 索引缓冲区（绑定状态记录在当前顶点数组中）
    ElementArray,
}

impl BufferTarget {
    pub fn gl_enum(self) -> u32 {
        match self {
            BufferTarget::Array => glow::ARRAY_BUFFER,
            BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// 缓冲区数据的使用提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// 上传一次，之后不再修改
    StaticDraw,
    /// 经常修改
    DynamicDraw,
    /// 每帧重新上传
    StreamDraw,
}

impl BufferUsage {
    pub fn gl_enum(self) -> u32 {
        match self {
            BufferUsage::StaticDraw => glow::STATIC_DRAW,
            BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
            BufferUsage::StreamDraw => glow::STREAM_DRAW,
        }
    }
}

/// 图形设备接口
///
/// 所有方法都以 `&self` 调用，与 GL 入口点一致；设备假定只在单线程中使用。
pub trait GraphicsDevice {
    /// 顶点数组句柄
    type VertexArray: Copy + Eq + Debug;
    /// 缓冲区句柄
    type Buffer: Copy + Eq + Debug;

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);

    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>);
    /// 为绑定在 `target` 上的缓冲区分配存储并上传 `data`
    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    fn delete_buffer(&self, buffer: Self::Buffer);

    /// 以当前绑定的顶点缓冲区为来源，配置一个非归一化的浮点属性
    fn vertex_attrib_pointer_f32(&self, location: u32, components: i32, stride: i32, offset: i32);
    fn enable_vertex_attrib_array(&self, location: u32);

    /// 返回并清除最早记录的错误码，没有错误时返回 [`NO_ERROR`]
    fn get_error(&self) -> u32;
}

/// 查询设备错误标志，非零时返回带调用名和源码位置的 `GraphicsError::ApiCall`
///
/// ```rust,ignore
/// device.bind_vertex_array(Some(vao));
/// gl_check!(device, "glBindVertexArray")?;
/// ```
#[macro_export]
macro_rules! gl_check {
    ($device:expr, $call:literal) => {{
        let code = $crate::gfx::GraphicsDevice::get_error($device);
        if code == $crate::gfx::device::NO_ERROR {
            Ok(())
        } else {
            Err($crate::core::error::GraphicsError::ApiCall {
                code,
                call: $call,
                file: file!(),
                line: line!(),
            })
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gl_enums() {
        assert_eq!(BufferTarget::Array.gl_enum(), 0x8892);
        assert_eq!(BufferTarget::ElementArray.gl_enum(), 0x8893);
        assert_eq!(BufferUsage::StaticDraw.gl_enum(), 0x88E4);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(NO_ERROR, 0);
        assert_eq!(INVALID_VALUE, 0x0501);
        assert_eq!(INVALID_OPERATION, 0x0502);
    }
}
