//! 图形设备模块
//!
//! - `device`：设备接口、缓冲区目标/用途枚举和 `gl_check!` 错误检查宏
//! - `opengl`：基于 `glow` 的 OpenGL 实现
//! - `headless`：内存中的设备，用于测试和无窗口工具

pub mod device;
pub mod headless;
pub mod opengl;

pub use device::{BufferTarget, BufferUsage, GraphicsDevice};
pub use headless::HeadlessDevice;
pub use opengl::GlowDevice;
