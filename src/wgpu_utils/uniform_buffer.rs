// src/wgpu_utils/uniform_buffer.rs - Typed uniform buffers
use std::marker::PhantomData;

fn short_type_name<Content>() -> &'static str {
    let type_name = std::any::type_name::<Content>();
    let pos = type_name.rfind(':').unwrap_or(0);
    if pos > 0 {
        &type_name[(pos + 1)..]
    } else {
        type_name
    }
}

/// Rounds `size` up to the next multiple of `alignment`.
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return size;
    }
    size.div_ceil(alignment) * alignment
}

/// Uniform buffer holding exactly one `Content`
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    previous_content: Vec<u8>,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    /// Create a new uniform buffer
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("UniformBuffer: {}", short_type_name::<Content>())),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        UniformBuffer {
            buffer,
            content_type: PhantomData,
            previous_content: Vec::new(),
        }
    }

    /// Update buffer content (skips the write when nothing changed)
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: Content) {
        let new_content = bytemuck::bytes_of(&content);
        if self.previous_content == new_content {
            return;
        }
        queue.write_buffer(&self.buffer, 0, new_content);
        self.previous_content = new_content.to_vec();
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

/// Fixed-length uniform array, e.g. one entry per light slot
pub struct ArrayBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    capacity: usize,
}

impl<Content: bytemuck::Pod> ArrayBuffer<Content> {
    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("ArrayBuffer<{}>", short_type_name::<Content>())),
            size: (capacity * std::mem::size_of::<Content>()) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        ArrayBuffer {
            buffer,
            content_type: PhantomData,
            capacity,
        }
    }

    /// Writes `data` from the first element. Entries past the capacity are
    /// dropped.
    pub fn update_data(&mut self, queue: &wgpu::Queue, data: &[Content]) {
        if data.len() > self.capacity {
            log::warn!(
                "{} entries written to ArrayBuffer of capacity {}, extra entries dropped",
                data.len(),
                self.capacity
            );
        }
        let len = data.len().min(self.capacity);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&data[..len]));
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Uniform buffer addressed with dynamic offsets, one aligned slot per draw
///
/// Grows (and hands out a new `wgpu::Buffer`) when a frame needs more slots
/// than it holds; callers rebuild their bind group when [`Self::write`]
/// reports growth.
pub struct DynamicUniformBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    stride: u64,
    capacity: usize,
    staging: Vec<u8>,
}

impl<Content: bytemuck::Pod> DynamicUniformBuffer<Content> {
    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let stride = aligned_stride(
            std::mem::size_of::<Content>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let capacity = capacity.max(1);
        Self {
            buffer: Self::allocate(device, stride, capacity),
            content_type: PhantomData,
            stride,
            capacity,
            staging: Vec::new(),
        }
    }

    fn allocate(device: &wgpu::Device, stride: u64, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!(
                "DynamicUniformBuffer<{}>",
                short_type_name::<Content>()
            )),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Uploads one slot per entry. Returns true if the buffer was replaced.
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, items: &[Content]) -> bool {
        let grown = items.len() > self.capacity;
        if grown {
            self.capacity = items.len().next_power_of_two();
            self.buffer = Self::allocate(device, self.stride, self.capacity);
            log::debug!(
                "DynamicUniformBuffer<{}> grown to {} slots",
                short_type_name::<Content>(),
                self.capacity
            );
        }
        if items.is_empty() {
            return grown;
        }

        let item_size = std::mem::size_of::<Content>();
        self.staging.clear();
        self.staging.resize(self.stride as usize * items.len(), 0);
        for (index, item) in items.iter().enumerate() {
            let start = index * self.stride as usize;
            self.staging[start..start + item_size].copy_from_slice(bytemuck::bytes_of(item));
        }
        queue.write_buffer(&self.buffer, 0, &self.staging);
        grown
    }

    /// Dynamic offset of `slot`.
    pub fn offset(&self, slot: u32) -> wgpu::DynamicOffset {
        (slot as u64 * self.stride) as wgpu::DynamicOffset
    }

    /// Binds one `Content`-sized window; the offset selects the slot.
    pub fn binding_resource(&self) -> wgpu::BindingResource {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(std::mem::size_of::<Content>() as u64),
        })
    }
}
