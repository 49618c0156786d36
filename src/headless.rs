//! CPU-only [`GpuBackend`] that records what the frame loop asked for.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::backend::{CompositeMode, GpuBackend, KernelParams, SceneBindings};

#[derive(Debug, PartialEq, Eq)]
pub struct HeadlessBuffer {
    id: u64,
    stride: u32,
}

impl HeadlessBuffer {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn stride(&self) -> u32 {
        self.stride
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct HeadlessTarget {
    id: u64,
    pub width: u32,
    pub height: u32,
}

impl HeadlessTarget {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRecord {
    pub target_id: u64,
    pub target_size: (u32, u32),
    pub params: KernelParams,
    pub bound_mask: u32,
    pub groups: [u32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeRecord {
    pub target_id: u64,
    pub mode: CompositeMode,
    pub sample_count: u32,
}

#[derive(Debug)]
struct StoredBuffer {
    label: String,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    buffers: FxHashMap<u64, StoredBuffer>,
    targets: FxHashSet<u64>,
    buffers_created: u64,
    writes: u64,
    targets_created: u64,
    dispatches: Vec<DispatchRecord>,
    composites: Vec<CompositeRecord>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    #[must_use]
    pub fn contents(&self, buffer: &HeadlessBuffer) -> Option<&[u8]> {
        self.buffers.get(&buffer.id).map(|b| b.bytes.as_slice())
    }

    #[must_use]
    pub fn label(&self, buffer: &HeadlessBuffer) -> Option<&str> {
        self.buffers.get(&buffer.id).map(|b| b.label.as_str())
    }

    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    #[must_use]
    pub fn live_targets(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn buffers_created(&self) -> u64 {
        self.buffers_created
    }

    // in-place writes only
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.writes
    }

    #[must_use]
    pub fn targets_created(&self) -> u64 {
        self.targets_created
    }

    #[must_use]
    pub fn dispatches(&self) -> &[DispatchRecord] {
        &self.dispatches
    }

    #[must_use]
    pub fn composites(&self) -> &[CompositeRecord] {
        &self.composites
    }

    #[must_use]
    pub fn last_dispatch(&self) -> Option<&DispatchRecord> {
        self.dispatches.last()
    }

    #[must_use]
    pub fn last_composite(&self) -> Option<&CompositeRecord> {
        self.composites.last()
    }
}

impl GpuBackend for HeadlessBackend {
    type Buffer = HeadlessBuffer;
    type Target = HeadlessTarget;

    fn create_storage_buffer(&mut self, label: &str, contents: &[u8], stride: u32) -> HeadlessBuffer {
        let id = self.allocate_id();
        self.buffers.insert(
            id,
            StoredBuffer {
                label: label.to_owned(),
                bytes: contents.to_vec(),
            },
        );
        self.buffers_created += 1;
        HeadlessBuffer { id, stride }
    }

    fn write_storage_buffer(&mut self, buffer: &HeadlessBuffer, contents: &[u8]) {
        match self.buffers.get_mut(&buffer.id) {
            Some(stored) => {
                debug_assert_eq!(stored.bytes.len(), contents.len());
                stored.bytes.clear();
                stored.bytes.extend_from_slice(contents);
                self.writes += 1;
            }
            None => log::warn!("Write to released buffer {}", buffer.id),
        }
    }

    fn release_storage_buffer(&mut self, buffer: HeadlessBuffer) {
        if self.buffers.remove(&buffer.id).is_none() {
            log::warn!("Release of unknown buffer {}", buffer.id);
        }
    }

    fn create_accumulation_target(&mut self, width: u32, height: u32) -> HeadlessTarget {
        let id = self.allocate_id();
        self.targets.insert(id);
        self.targets_created += 1;
        HeadlessTarget { id, width, height }
    }

    fn release_accumulation_target(&mut self, target: HeadlessTarget) {
        if !self.targets.remove(&target.id) {
            log::warn!("Release of unknown target {}", target.id);
        }
    }

    fn dispatch(
        &mut self,
        target: &HeadlessTarget,
        params: &KernelParams,
        scene: SceneBindings<'_, HeadlessBuffer>,
        groups: [u32; 2],
    ) {
        self.dispatches.push(DispatchRecord {
            target_id: target.id,
            target_size: (target.width, target.height),
            params: *params,
            bound_mask: scene.bound_mask(),
            groups,
        });
    }

    fn composite(&mut self, target: &HeadlessTarget, mode: CompositeMode, sample_count: u32) {
        self.composites.push(CompositeRecord {
            target_id: target.id,
            mode,
            sample_count,
        });
    }
}
