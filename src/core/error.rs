//! 错误处理模块
//!
//! 定义了加载与上传流程中使用的统一错误类型。
//!
//! # 设计原则
//!
//! - 为每种错误类型提供清晰的上下文信息
//! - 支持错误链（error source）
//! - 易于模式匹配和错误处理

use std::fmt;
use std::path::PathBuf;

/// 统一的 Result 类型
///
/// 所有可能返回错误的函数都应该使用这个类型。
pub type Result<T> = std::result::Result<T, MeshUploadError>;

/// 顶层错误类型
#[derive(Debug)]
pub enum MeshUploadError {
    /// 配置错误
    Config(ConfigError),

    /// 图形 API 错误
    Graphics(GraphicsError),

    /// 网格加载错误
    MeshLoading(MeshLoadError),

    /// IO 错误
    Io(std::io::Error),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 图形 API 相关的错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// 资源创建失败（驱动拒绝分配句柄）
    ResourceCreation(String),

    /// 图形 API 调用后错误标志非零
    ///
    /// 携带错误码、失败的调用名以及检查点所在的源文件和行号。
    ApiCall {
        code: u32,
        call: &'static str,
        file: &'static str,
        line: u32,
    },
}

/// 网格加载相关的错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshLoadError {
    /// 文件不存在
    FileNotFound(PathBuf),

    /// 不支持的文件格式
    UnsupportedFormat(String),

    /// 解析失败
    ParseError { path: String, reason: String },

    /// 形状数量不符合要求
    ShapeCount { expected: usize, found: usize },

    /// 存在非三角形的面
    NotTriangulated { face: usize, vertices: u32 },

    /// 属性索引越界
    IndexOutOfBounds {
        attribute: &'static str,
        face: usize,
        index: u32,
        len: usize,
    },

    /// 数据验证失败
    ValidationError(String),
}

impl fmt::Display for MeshUploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshUploadError::Config(e) => write!(f, "Configuration error: {}", e),
            MeshUploadError::Graphics(e) => write!(f, "Graphics error: {}", e),
            MeshUploadError::MeshLoading(e) => write!(f, "Mesh loading error: {}", e),
            MeshUploadError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::ResourceCreation(msg) => write!(f, "Resource creation failed: {}", msg),
            GraphicsError::ApiCall { code, call, file, line } => write!(
                f,
                "{} failed with {:#06x} in file: {} at line: {}",
                call, code, file, line
            ),
        }
    }
}

impl fmt::Display for MeshLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshLoadError::FileNotFound(path) => write!(f, "Mesh file not found: {}", path.display()),
            MeshLoadError::UnsupportedFormat(msg) => write!(f, "Unsupported mesh format: {}", msg),
            MeshLoadError::ParseError { path, reason } => {
                write!(f, "Cannot load file: {} ({})", path, reason)
            }
            MeshLoadError::ShapeCount { expected, found } => {
                write!(f, "Expected {} shape(s), found {}", expected, found)
            }
            MeshLoadError::NotTriangulated { face, vertices } => write!(
                f,
                "Mesh is not triangulated: face {} has {} vertices",
                face, vertices
            ),
            MeshLoadError::IndexOutOfBounds { attribute, face, index, len } => write!(
                f,
                "Face {} references {} index {} but only {} are defined",
                face, attribute, index, len
            ),
            MeshLoadError::ValidationError(msg) => write!(f, "Mesh validation failed: {}", msg),
        }
    }
}

impl std::error::Error for MeshUploadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MeshUploadError::Config(e) => Some(e),
            MeshUploadError::Graphics(e) => Some(e),
            MeshUploadError::MeshLoading(e) => Some(e),
            MeshUploadError::Io(e) => Some(e),
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for GraphicsError {}
impl std::error::Error for MeshLoadError {}

// 实现 From trait 以便于错误转换
impl From<std::io::Error> for MeshUploadError {
    fn from(err: std::io::Error) -> Self {
        MeshUploadError::Io(err)
    }
}

impl From<ConfigError> for MeshUploadError {
    fn from(err: ConfigError) -> Self {
        MeshUploadError::Config(err)
    }
}

impl From<GraphicsError> for MeshUploadError {
    fn from(err: GraphicsError) -> Self {
        MeshUploadError::Graphics(err)
    }
}

impl From<MeshLoadError> for MeshUploadError {
    fn from(err: MeshLoadError) -> Self {
        MeshUploadError::MeshLoading(err)
    }
}
