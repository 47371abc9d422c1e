/// 网格数据结构模块
///
/// 定义CPU侧的网格数据容器，存放展开后的交错顶点和顺序索引。

use super::vertex::Vertex;

/// CPU侧网格数据
///
/// 每个面顶点都是独立的顶点记录，不做共享或去重，
/// 因此索引数组恒为 `0..N-1`。
///
/// # 架构说明
///
/// - **CPU侧**: `MeshData` 存储在内存中的原始数据
/// - **GPU侧**: `GpuMesh` 将 `MeshData` 上传到缓冲区
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// 顶点数组
    pub vertices: Vec<Vertex>,

    /// 索引数组，每3个索引定义一个三角形
    pub indices: Vec<u32>,

    /// 网格名称（可选），来自文件中的对象名
    pub name: Option<String>,
}

impl MeshData {
    /// 创建一个空的网格数据
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建一个带容量预分配的网格数据
    pub fn with_capacity(vertex_capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_capacity),
            indices: Vec::with_capacity(vertex_capacity),
            name: None,
        }
    }

    /// 追加一个新顶点，并追加下一个顺序索引
    #[inline]
    pub fn push_vertex(&mut self, vertex: Vertex) {
        let index = self.indices.len() as u32;
        self.vertices.push(vertex);
        self.indices.push(index);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// 顶点数据的字节视图（交错布局，每个顶点 32 字节）
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// 索引数据的字节视图（每个索引 4 字节）
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// 验证网格数据的有效性
    ///
    /// 检查：
    /// - 索引数量是3的倍数
    /// - 索引数量与顶点数量一致
    /// - 索引恰为 `0..N-1`
    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err(format!(
                "索引数量必须是3的倍数，当前为: {}",
                self.indices.len()
            ));
        }

        if self.indices.len() != self.vertices.len() {
            return Err(format!(
                "索引数量 {} 与顶点数量 {} 不一致",
                self.indices.len(),
                self.vertices.len()
            ));
        }

        if let Some((i, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(i, &index)| index as usize != i)
        {
            return Err(format!("索引 {} 处的值应为 {}，实际为 {}", i, i, index));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
        let mut mesh = MeshData::new();
        mesh.push_vertex(Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]));
        mesh.push_vertex(Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]));
        mesh.push_vertex(Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]));
        mesh
    }

    #[test]
    fn test_mesh_data_creation() {
        let mesh = MeshData::new();

        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.index_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.name.is_none());
    }

    #[test]
    fn test_push_vertex_appends_sequential_index() {
        let mesh = triangle();

        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_byte_views() {
        let mesh = triangle();

        assert_eq!(mesh.vertex_bytes().len(), 3 * 32);
        assert_eq!(mesh.index_bytes().len(), 3 * 4);
    }

    #[test]
    fn test_validation_invalid_index_count() {
        let mut mesh = triangle();
        mesh.push_vertex(Vertex::default());

        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_shared_indices() {
        let mut mesh = triangle();
        mesh.indices[2] = 0;

        let err = mesh.validate().unwrap_err();
        assert!(err.contains("索引 2"));
    }
}
