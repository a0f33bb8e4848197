use crate::color::Color;
use crate::scene::entity::EntityId;
use glam::{Vec2, Vec3, Vec4};
use num_enum::IntoPrimitive;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[repr(u32)]
pub enum InstanceFlag {
    #[default]
    None = 0,
    HighlightWeak = 1,
    HighlightStrong = 2,
}

/// One sprite quad of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// Entity that produced the quad.
    pub entity: EntityId,
    /// Top left corner in display coordinates, layer in `z`.
    pub position: Vec3,
    pub tex_min: Vec2,
    pub tex_max: Vec2,
    pub sprite_size: Vec2,
    pub color: Vec4,
    /// Light at the top, right, bottom and left corner.
    pub corner_light: [Vec4; 4],
    pub flags: InstanceFlag,
}

impl Instance {
    pub fn new(
        entity: EntityId,
        position: Vec3,
        tex_min: Vec2,
        tex_max: Vec2,
        sprite_size: Vec2,
        color: Color,
    ) -> Self {
        Self {
            entity,
            position,
            tex_min,
            tex_max,
            sprite_size,
            color: color.to_vec4(),
            corner_light: [Vec4::ONE; 4],
            flags: InstanceFlag::None,
        }
    }

    pub fn with_corner_light(mut self, corners: [Color; 4]) -> Self {
        self.corner_light = corners.map(Color::to_vec4);
        self
    }

    pub fn with_flags(mut self, flags: InstanceFlag) -> Self {
        self.flags = flags;
        self
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            position: self.position.into(),
            tex_min: self.tex_min.into(),
            tex_max: self.tex_max.into(),
            sprite_size: self.sprite_size.into(),
            color: self.color.into(),
            corner_light: self.corner_light.map(Into::into),
            flags: self.flags.into(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub position: [f32; 3],
    pub tex_min: [f32; 2],
    pub tex_max: [f32; 2],
    pub sprite_size: [f32; 2],
    pub color: [f32; 4],
    pub corner_light: [[f32; 4]; 4],
    pub flags: u32,
}

impl InstanceRaw {
    const ATTRIBUTES: [wgpu::VertexAttribute; 10] = wgpu::vertex_attr_array![
        5 => Float32x3,
        6 => Float32x2,
        7 => Float32x2,
        8 => Float32x2,
        9 => Float32x4,
        10 => Float32x4,
        11 => Float32x4,
        12 => Float32x4,
        13 => Float32x4,
        14 => Uint32,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Text drawn on top of the sprites, e.g. name tags and stack counts.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub entity: EntityId,
    pub text: String,
    /// Center of the text baseline in display coordinates.
    pub x: i32,
    pub y: i32,
    pub color: Color,
}

/// Everything rendered during one frame, in drawing order.
#[derive(Debug, Default, Clone)]
pub struct RenderBatch {
    pub instances: Vec<Instance>,
    pub labels: Vec<TextLabel>,
}

impl RenderBatch {
    pub fn push(&mut self, instance: Instance) {
        self.instances.push(instance);
    }

    pub fn push_label(&mut self, label: TextLabel) {
        self.labels.push(label);
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty() && self.labels.is_empty()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.labels.clear();
    }

    pub fn to_raw(&self) -> Vec<InstanceRaw> {
        self.instances.iter().map(Instance::to_raw).collect()
    }
}
