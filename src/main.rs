//! mesh_upload 命令行工具
//!
//! 加载配置中的 OBJ 模型，上传到内存设备，并输出网格信息。
//!
//! # 使用方法
//!
//! ```bash
//! # 使用 config.toml 中的模型
//! cargo run
//!
//! # 命令行覆盖
//! cargo run -- --mesh assets/triangles.obj --log-level debug
//! ```

use anyhow::{Context, Result};
use mesh_upload::core::{log, Config};
use mesh_upload::gfx::HeadlessDevice;
use mesh_upload::renderer::GpuMesh;
use mesh_upload::{app_error, app_info};

/// 初始化流程
///
/// 1. 加载配置文件（config.toml），不存在时使用默认配置
/// 2. 应用命令行参数覆盖
/// 3. 验证配置并初始化日志系统
/// 4. 加载并上传网格，输出统计信息后释放
fn main() {
    let mut config = Config::from_file_or_default("config.toml");
    config.apply_args(std::env::args());

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    log::init_from_config(&config.logging);
    app_info!(version = env!("CARGO_PKG_VERSION"), "mesh_upload starting");

    if let Err(e) = run(&config) {
        app_error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<()> {
    let device = HeadlessDevice::new();
    let mesh = GpuMesh::load(&device, &config.mesh.path)
        .with_context(|| format!("failed to load mesh {}", config.mesh.path))?;

    app_info!(
        path = %config.mesh.path,
        vertices = mesh.vertex_count(),
        triangles = mesh.vertex_count() / 3,
        vertex_array = ?mesh.vertex_array(),
        vertex_buffer = ?mesh.vertex_buffer(),
        index_buffer = ?mesh.index_buffer(),
        "Mesh ready"
    );

    mesh.release().context("failed to release mesh handles")?;
    Ok(())
}
