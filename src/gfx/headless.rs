//! 无窗口的内存设备
//!
//! 在内存中模拟 OpenGL 的缓冲区、顶点数组和错误标志，遵循与驱动相同的绑定和报错规则。
//! 用于测试和没有窗口/上下文的工具场景，并提供查询上传内容的接口。

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::num::NonZeroU32;

use super::device::{
    BufferTarget, BufferUsage, GraphicsDevice, INVALID_OPERATION, INVALID_VALUE, NO_ERROR,
    OUT_OF_MEMORY,
};

/// 默认的顶点属性槽数量（GL 规范要求的最小值）
pub const DEFAULT_MAX_VERTEX_ATTRIBS: u32 = 16;

/// 顶点数组句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadlessVertexArray(NonZeroU32);

/// 缓冲区句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadlessBuffer(NonZeroU32);

/// 一个属性槽的指针配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribPointer {
    /// 配置时绑定在 `Array` 上的缓冲区
    pub buffer: Option<HeadlessBuffer>,
    pub components: i32,
    pub stride: i32,
    pub offset: i32,
}

/// 一个属性槽的状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeState {
    pub pointer: Option<AttribPointer>,
    pub enabled: bool,
}

/// 顶点数组对象记录的状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexArrayState {
    /// 绑定的索引缓冲区
    pub element_buffer: Option<HeadlessBuffer>,
    /// 属性槽，长度等于设备的最大属性数
    pub attributes: Vec<AttributeState>,
}

#[derive(Debug, Clone)]
struct BufferState {
    data: Vec<u8>,
    usage: Option<BufferUsage>,
}

#[derive(Debug)]
struct State {
    next_name: u32,
    vertex_arrays: BTreeMap<HeadlessVertexArray, VertexArrayState>,
    buffers: BTreeMap<HeadlessBuffer, BufferState>,
    bound_vertex_array: Option<HeadlessVertexArray>,
    bound_array_buffer: Option<HeadlessBuffer>,
    error: u32,
    max_vertex_attribs: u32,
    object_limit: Option<usize>,
    memory_limit: Option<usize>,
}

impl State {
    /// 只保留最早的错误，与驱动行为一致
    fn record(&mut self, code: u32) {
        if self.error == NO_ERROR {
            self.error = code;
        }
    }

    fn allocate_name(&mut self) -> Result<NonZeroU32, String> {
        let live = self.vertex_arrays.len() + self.buffers.len();
        if self.object_limit.is_some_and(|limit| live >= limit) {
            return Err(format!("object limit reached ({} live objects)", live));
        }
        self.next_name += 1;
        NonZeroU32::new(self.next_name).ok_or_else(|| "object names exhausted".to_string())
    }

    fn bound_buffer(&self, target: BufferTarget) -> Option<HeadlessBuffer> {
        match target {
            BufferTarget::Array => self.bound_array_buffer,
            BufferTarget::ElementArray => self
                .bound_vertex_array
                .and_then(|vao| self.vertex_arrays.get(&vao))
                .and_then(|state| state.element_buffer),
        }
    }

    fn bound_vertex_array_mut(&mut self) -> Option<&mut VertexArrayState> {
        let vao = self.bound_vertex_array?;
        self.vertex_arrays.get_mut(&vao)
    }

    fn used_memory(&self) -> usize {
        self.buffers.values().map(|b| b.data.len()).sum()
    }
}

/// 内存中的图形设备
///
/// 与 GL 一致的规则：
/// - 绑定不存在的名字记录 `INVALID_OPERATION`
/// - 没有顶点数组绑定时绑定索引缓冲区、设置或启用属性记录 `INVALID_OPERATION`
/// - 目标上没有缓冲区时上传数据记录 `INVALID_OPERATION`
/// - 属性槽越界或分量数不在 1..=4 记录 `INVALID_VALUE`
/// - 名字从不复用
#[derive(Debug)]
pub struct HeadlessDevice {
    state: RefCell<State>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State {
                next_name: 0,
                vertex_arrays: BTreeMap::new(),
                buffers: BTreeMap::new(),
                bound_vertex_array: None,
                bound_array_buffer: None,
                error: NO_ERROR,
                max_vertex_attribs: DEFAULT_MAX_VERTEX_ATTRIBS,
                object_limit: None,
                memory_limit: None,
            }),
        }
    }

    /// 限制属性槽数量
    pub fn with_max_vertex_attribs(self, max: u32) -> Self {
        self.state.borrow_mut().max_vertex_attribs = max;
        self
    }

    /// 限制同时存活的对象数量，超出时创建失败
    pub fn with_object_limit(self, limit: usize) -> Self {
        self.state.borrow_mut().object_limit = Some(limit);
        self
    }

    /// 限制所有缓冲区的总字节数，超出时上传记录 `OUT_OF_MEMORY`
    pub fn with_memory_limit(self, bytes: usize) -> Self {
        self.state.borrow_mut().memory_limit = Some(bytes);
        self
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn bound_vertex_array(&self) -> Option<HeadlessVertexArray> {
        self.state.borrow().bound_vertex_array
    }

    pub fn bound_buffer(&self, target: BufferTarget) -> Option<HeadlessBuffer> {
        self.state.borrow().bound_buffer(target)
    }

    /// 缓冲区的内容，句柄已删除时返回 `None`
    pub fn buffer_contents(&self, buffer: HeadlessBuffer) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).map(|b| b.data.clone())
    }

    /// 最近一次上传使用的提示
    pub fn buffer_usage(&self, buffer: HeadlessBuffer) -> Option<BufferUsage> {
        self.state.borrow().buffers.get(&buffer).and_then(|b| b.usage)
    }

    pub fn vertex_array_state(&self, vertex_array: HeadlessVertexArray) -> Option<VertexArrayState> {
        self.state.borrow().vertex_arrays.get(&vertex_array).cloned()
    }
}

impl GraphicsDevice for HeadlessDevice {
    type VertexArray = HeadlessVertexArray;
    type Buffer = HeadlessBuffer;

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let name = HeadlessVertexArray(state.allocate_name()?);
        let slots = state.max_vertex_attribs as usize;
        state.vertex_arrays.insert(
            name,
            VertexArrayState {
                element_buffer: None,
                attributes: vec![AttributeState::default(); slots],
            },
        );
        Ok(name)
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        match vertex_array {
            Some(vao) if !state.vertex_arrays.contains_key(&vao) => state.record(INVALID_OPERATION),
            _ => state.bound_vertex_array = vertex_array,
        }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if state.vertex_arrays.remove(&vertex_array).is_some()
            && state.bound_vertex_array == Some(vertex_array)
        {
            state.bound_vertex_array = None;
        }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let name = HeadlessBuffer(state.allocate_name()?);
        state.buffers.insert(
            name,
            BufferState {
                data: Vec::new(),
                usage: None,
            },
        );
        Ok(name)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if let Some(b) = buffer {
            if !state.buffers.contains_key(&b) {
                state.record(INVALID_OPERATION);
                return;
            }
        }
        match target {
            BufferTarget::Array => state.bound_array_buffer = buffer,
            BufferTarget::ElementArray => match state.bound_vertex_array_mut() {
                Some(vao_state) => vao_state.element_buffer = buffer,
                None => state.record(INVALID_OPERATION),
            },
        }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let Some(buffer) = state.bound_buffer(target) else {
            state.record(INVALID_OPERATION);
            return;
        };

        let previous = state.buffers.get(&buffer).map_or(0, |b| b.data.len());
        let projected = state.used_memory() - previous + data.len();
        if state.memory_limit.is_some_and(|limit| projected > limit) {
            state.record(OUT_OF_MEMORY);
            return;
        }

        if let Some(entry) = state.buffers.get_mut(&buffer) {
            entry.data = data.to_vec();
            entry.usage = Some(usage);
        }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if state.buffers.remove(&buffer).is_none() {
            return;
        }
        // 删除会解除当前上下文中的绑定
        if state.bound_array_buffer == Some(buffer) {
            state.bound_array_buffer = None;
        }
        if let Some(vao_state) = state.bound_vertex_array_mut() {
            if vao_state.element_buffer == Some(buffer) {
                vao_state.element_buffer = None;
            }
        }
    }

    fn vertex_attrib_pointer_f32(&self, location: u32, components: i32, stride: i32, offset: i32) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if location >= state.max_vertex_attribs || !(1..=4).contains(&components) || stride < 0 {
            state.record(INVALID_VALUE);
            return;
        }
        let array_buffer = state.bound_array_buffer;
        if array_buffer.is_none() && offset != 0 {
            state.record(INVALID_OPERATION);
            return;
        }
        match state.bound_vertex_array_mut() {
            Some(vao_state) => {
                vao_state.attributes[location as usize].pointer = Some(AttribPointer {
                    buffer: array_buffer,
                    components,
                    stride,
                    offset,
                });
            }
            None => state.record(INVALID_OPERATION),
        }
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if location >= state.max_vertex_attribs {
            state.record(INVALID_VALUE);
            return;
        }
        match state.bound_vertex_array_mut() {
            Some(vao_state) => vao_state.attributes[location as usize].enabled = true,
            None => state.record(INVALID_OPERATION),
        }
    }

    fn get_error(&self) -> u32 {
        std::mem::replace(&mut self.state.borrow_mut().error, NO_ERROR)
    }
}
