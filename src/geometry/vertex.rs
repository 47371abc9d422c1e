/// 顶点定义模块
///
/// 定义交错存储的顶点结构及其在 GPU 上的属性布局。

use bytemuck::{Pod, Zeroable};

/// 交错顶点
///
/// 内存布局与GPU兼容，使用 `#[repr(C)]` 保证顺序和对齐。
///
/// # 内存布局
///
/// - position: 12 bytes (3 * f32)
/// - normal: 12 bytes (3 * f32)
/// - texcoord: 8 bytes (2 * f32)
/// - **总计**: 32 bytes（8 个浮点数）
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// 顶点位置 (x, y, z)
    pub position: [f32; 3],

    /// 法线向量 (nx, ny, nz)
    pub normal: [f32; 3],

    /// 纹理坐标 (u, v)
    pub texcoord: [f32; 2],
}

/// 单个浮点顶点属性的描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// 着色器中的 location
    pub location: u32,
    /// 分量个数
    pub components: i32,
    /// 在顶点内的字节偏移
    pub offset: i32,
}

impl Vertex {
    /// 顶点跨度（字节）
    pub const STRIDE: i32 = std::mem::size_of::<Vertex>() as i32;

    /// 法线相对顶点起始的偏移
    pub const NORMAL_OFFSET: i32 = 3 * std::mem::size_of::<f32>() as i32;

    /// 纹理坐标相对顶点起始的偏移
    pub const TEXCOORD_OFFSET: i32 = 6 * std::mem::size_of::<f32>() as i32;

    /// 固定的属性布局：0 = 位置，1 = 法线，2 = 纹理坐标
    pub const ATTRIBUTES: [VertexAttribute; 3] = [
        VertexAttribute { location: 0, components: 3, offset: 0 },
        VertexAttribute { location: 1, components: 3, offset: Self::NORMAL_OFFSET },
        VertexAttribute { location: 2, components: 2, offset: Self::TEXCOORD_OFFSET },
    ];

    #[inline]
    pub fn new(position: [f32; 3], normal: [f32; 3], texcoord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_vertex_size() {
        // 3*4 + 3*4 + 2*4 = 32 bytes
        assert_eq!(size_of::<Vertex>(), 32);
        assert_eq!(Vertex::STRIDE, 8 * 4);
    }

    #[test]
    fn test_vertex_alignment() {
        assert_eq!(std::mem::align_of::<Vertex>(), 4);
    }

    #[test]
    fn test_attribute_layout() {
        let layout: Vec<(u32, i32, i32)> = Vertex::ATTRIBUTES
            .iter()
            .map(|a| (a.location, a.components, a.offset))
            .collect();
        assert_eq!(layout, vec![(0, 3, 0), (1, 3, 12), (2, 2, 24)]);
    }

    #[test]
    fn test_vertex_bytes_are_interleaved() {
        let vertex = Vertex::new([1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0]);
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&vertex));

        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }
}
