/// OBJ 文件加载器
///
/// 使用 tobj crate 加载 Wavefront OBJ 格式的单形状三角网格。
/// 每个面顶点都展开为一个独立的交错顶点，索引数组为 `0..N-1`。
use super::MeshLoader;
use crate::core::error::{MeshLoadError, Result};
use crate::geometry::mesh::MeshData;
use crate::geometry::vertex::Vertex;
use crate::{engine_debug, engine_info, engine_warn};
use std::path::Path;

/// OBJ 格式加载器
///
/// # 要求
///
/// - 文件中恰好包含一个形状（object/group），同一形状内切换材质不算新形状
/// - 所有面都是三角形，不做自动三角化
/// - 位置、法线、纹理坐标各自独立索引
///
/// # 使用示例
///
/// ```rust,no_run
/// use mesh_upload::geometry::loaders::{MeshLoader, ObjLoader};
/// use std::path::Path;
///
/// let mesh = ObjLoader::load_from_file(Path::new("model.obj"))?;
/// println!("加载了 {} 个顶点", mesh.vertex_count());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ObjLoader;

/// 保持面的原始顶点数，各属性使用各自的索引流
fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: false,
        single_index: false,
        ..Default::default()
    }
}

impl MeshLoader for ObjLoader {
    fn load_from_file(path: &Path) -> Result<MeshData> {
        if !path.exists() {
            return Err(MeshLoadError::FileNotFound(path.to_path_buf()).into());
        }

        let label = path.display().to_string();
        let (models, materials) = tobj::load_obj(path, &load_options())
            .map_err(|e| MeshLoadError::ParseError {
                path: label.clone(),
                reason: e.to_string(),
            })?;

        // 材质不参与上传，加载失败只作为诊断信息
        if let Err(e) = materials {
            engine_warn!(file = %label, "Warning parsing file {} : {}", label, e);
        }

        build_mesh(&label, models)
    }

    fn load_from_memory(data: &[u8]) -> Result<MeshData> {
        let mut reader = data;
        let (models, _materials) =
            tobj::load_obj_buf(&mut reader, &load_options(), |_| {
                Ok((Vec::new(), Default::default()))
            })
            .map_err(|e| MeshLoadError::ParseError {
                path: "<memory>".to_string(),
                reason: e.to_string(),
            })?;

        build_mesh("<memory>", models)
    }

    fn supported_extensions() -> &'static [&'static str] {
        &["obj"]
    }
}

/// 检查形状数量并展开唯一的形状
fn build_mesh(label: &str, models: Vec<tobj::Model>) -> Result<MeshData> {
    let parsed = models.len();
    let models = merge_material_splits(models);
    if models.len() < parsed {
        engine_debug!(file = %label, pieces = parsed, shapes = models.len(), "Merged material splits");
    }

    if models.len() != 1 {
        return Err(MeshLoadError::ShapeCount {
            expected: 1,
            found: models.len(),
        }
        .into());
    }

    let model = &models[0];
    let mesh_data = expand_model(label, model)?;

    mesh_data
        .validate()
        .map_err(MeshLoadError::ValidationError)?;

    engine_info!(
        file = %label,
        shape = %model.name,
        vertices = mesh_data.vertex_count(),
        triangles = mesh_data.triangle_count(),
        "OBJ mesh loaded"
    );

    Ok(mesh_data)
}

/// 合并相邻的同名模型
///
/// tobj 在一个对象内每遇到一次 `usemtl` 切换就输出一个同名的新模型，
/// 每个模型的属性数组都单独重映射过。材质不参与上传，这里把它们拼回一个形状。
fn merge_material_splits(models: Vec<tobj::Model>) -> Vec<tobj::Model> {
    let mut merged: Vec<tobj::Model> = Vec::with_capacity(models.len());
    for model in models {
        match merged.last_mut() {
            Some(last) if last.name == model.name => append_mesh(&mut last.mesh, model.mesh),
            _ => merged.push(model),
        }
    }
    merged
}

/// 把 `src` 追加到 `dst`，各索引流按 `dst` 已有的属性数量偏移
fn append_mesh(dst: &mut tobj::Mesh, mut src: tobj::Mesh) {
    let position_base = (dst.positions.len() / 3) as u32;
    let normal_base = (dst.normals.len() / 3) as u32;
    let texcoord_base = (dst.texcoords.len() / 2) as u32;

    // 空的 face_arities 表示全是三角形，只要有一方不是就得显式展开
    if !dst.face_arities.is_empty() || !src.face_arities.is_empty() {
        for mesh in [&mut *dst, &mut src] {
            if mesh.face_arities.is_empty() {
                mesh.face_arities = vec![3; mesh.indices.len() / 3];
            }
        }
    }

    dst.indices.extend(src.indices.iter().map(|i| i + position_base));
    dst.normal_indices.extend(src.normal_indices.iter().map(|i| i + normal_base));
    dst.texcoord_indices.extend(src.texcoord_indices.iter().map(|i| i + texcoord_base));
    dst.face_arities.append(&mut src.face_arities);

    dst.positions.append(&mut src.positions);
    dst.vertex_color.append(&mut src.vertex_color);
    dst.normals.append(&mut src.normals);
    dst.texcoords.append(&mut src.texcoords);
}

/// 某个属性的数据与索引流
struct Attribute<'a> {
    name: &'static str,
    data: &'a [f32],
    indices: &'a [u32],
    components: usize,
}

impl<'a> Attribute<'a> {
    /// 索引流不存在时返回 `None`，调用方以零填充
    ///
    /// tobj 会用上一个索引补齐缺少该属性的面，所以单个模型的索引流要么为空要么完整。
    /// 只有合并后的材质分段一部分有该属性、一部分没有时才会出现长度不符。
    fn stream(
        name: &'static str,
        data: &'a [f32],
        indices: &'a [u32],
        components: usize,
        face_vertex_count: usize,
        label: &str,
    ) -> Result<Option<Self>> {
        if indices.is_empty() {
            engine_warn!(file = %label, "Warning parsing file {} : no {} data, filling with zeros", label, name);
            return Ok(None);
        }
        if indices.len() != face_vertex_count {
            return Err(MeshLoadError::ValidationError(format!(
                "{} index stream has {} entries for {} face vertices",
                name,
                indices.len(),
                face_vertex_count
            ))
            .into());
        }
        Ok(Some(Self {
            name,
            data,
            indices,
            components,
        }))
    }

    /// 读取第 `slot` 个面顶点的属性，越界时报错
    ///
    /// 文件中的越界索引在 tobj 解析阶段就会变成 `ParseError`，这里防的是手工构造的模型。
    fn fetch<const N: usize>(&self, slot: usize, face: usize) -> Result<[f32; N]> {
        debug_assert_eq!(N, self.components);
        let index = self.indices[slot];
        let len = self.data.len() / self.components;
        if index as usize >= len {
            return Err(MeshLoadError::IndexOutOfBounds {
                attribute: self.name,
                face,
                index,
                len,
            }
            .into());
        }
        let start = index as usize * self.components;
        let mut out = [0.0; N];
        out.copy_from_slice(&self.data[start..start + N]);
        Ok(out)
    }
}

/// 把一个形状展开为交错顶点
///
/// 每个面必须恰好有 3 个顶点。`face_arities` 为空表示全部是三角形。
fn expand_model(label: &str, model: &tobj::Model) -> Result<MeshData> {
    let mesh = &model.mesh;
    let face_vertex_count = mesh.indices.len();

    let face_count = if mesh.face_arities.is_empty() {
        if face_vertex_count % 3 != 0 {
            return Err(MeshLoadError::NotTriangulated {
                face: face_vertex_count / 3,
                vertices: (face_vertex_count % 3) as u32,
            }
            .into());
        }
        face_vertex_count / 3
    } else {
        if let Some((face, &arity)) = mesh
            .face_arities
            .iter()
            .enumerate()
            .find(|&(_, &arity)| arity != 3)
        {
            return Err(MeshLoadError::NotTriangulated {
                face,
                vertices: arity,
            }
            .into());
        }
        mesh.face_arities.len()
    };

    let positions = Attribute {
        name: "position",
        data: &mesh.positions,
        indices: &mesh.indices,
        components: 3,
    };
    let normals = Attribute::stream(
        "normal",
        &mesh.normals,
        &mesh.normal_indices,
        3,
        face_vertex_count,
        label,
    )?;
    let texcoords = Attribute::stream(
        "texcoord",
        &mesh.texcoords,
        &mesh.texcoord_indices,
        2,
        face_vertex_count,
        label,
    )?;

    let mut mesh_data = MeshData::with_capacity(face_vertex_count);
    mesh_data.name = Some(model.name.clone());

    for face in 0..face_count {
        for corner in 0..3 {
            let slot = face * 3 + corner;
            let position = positions.fetch::<3>(slot, face)?;
            let normal = match &normals {
                Some(attr) => attr.fetch::<3>(slot, face)?,
                None => [0.0; 3],
            };
            let texcoord = match &texcoords {
                Some(attr) => attr.fetch::<2>(slot, face)?,
                None => [0.0; 2],
            };
            mesh_data.push_vertex(Vertex::new(position, normal, texcoord));
        }
    }

    Ok(mesh_data)
}
