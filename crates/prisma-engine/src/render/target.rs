use winit::dpi::PhysicalSize;

/// Color format used by every offscreen target.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Depth format used by offscreen targets that request a depth buffer.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// An offscreen color (+ optional depth) buffer.
///
/// Written by one pass, sampled as a texture by a later pass in the same
/// frame. Owned by the component that renders into it; `resize` recreates the
/// textures when the viewport changes.
pub struct OffscreenTarget {
    label: &'static str,
    with_depth: bool,
    size: PhysicalSize<u32>,
    color_view: wgpu::TextureView,
    depth_view: Option<wgpu::TextureView>,
}

impl OffscreenTarget {
    /// Creates a target sized to `size`.
    ///
    /// Zero dimensions are invalid for texture allocation and are clamped to
    /// a minimum of 1 texel; callers observing a zero-sized viewport get a
    /// degenerate but valid target until the next real resize.
    pub fn new(
        device: &wgpu::Device,
        label: &'static str,
        size: PhysicalSize<u32>,
        with_depth: bool,
    ) -> Self {
        let size = clamp_extent(size);
        let (color_view, depth_view) = create_views(device, label, size, with_depth);

        Self {
            label,
            with_depth,
            size,
            color_view,
            depth_view,
        }
    }

    /// Recreates the textures for a new viewport size.
    pub fn resize(&mut self, device: &wgpu::Device, new_size: PhysicalSize<u32>) {
        let new_size = clamp_extent(new_size);
        if new_size == self.size {
            return;
        }

        let (color_view, depth_view) = create_views(device, self.label, new_size, self.with_depth);
        self.size = new_size;
        self.color_view = color_view;
        self.depth_view = depth_view;
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.color_view
    }

    /// Returns the depth view, if this target was created with a depth buffer.
    pub fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.depth_view.as_ref()
    }
}

fn create_views(
    device: &wgpu::Device,
    label: &'static str,
    size: PhysicalSize<u32>,
    with_depth: bool,
) -> (wgpu::TextureView, Option<wgpu::TextureView>) {
    let extent = wgpu::Extent3d {
        width: size.width,
        height: size.height,
        depth_or_array_layers: 1,
    };

    let color = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: COLOR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());

    let depth_view = with_depth.then(|| {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: extent,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    });

    (color_view, depth_view)
}

/// Clamps a viewport size to the minimum valid texture extent.
pub fn clamp_extent(size: PhysicalSize<u32>) -> PhysicalSize<u32> {
    PhysicalSize::new(size.width.max(1), size.height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_extent_rejects_zero_dimensions() {
        assert_eq!(clamp_extent(PhysicalSize::new(0, 0)), PhysicalSize::new(1, 1));
        assert_eq!(clamp_extent(PhysicalSize::new(0, 720)), PhysicalSize::new(1, 720));
        assert_eq!(clamp_extent(PhysicalSize::new(1280, 0)), PhysicalSize::new(1280, 1));
    }

    #[test]
    fn clamp_extent_passes_valid_sizes_through() {
        assert_eq!(
            clamp_extent(PhysicalSize::new(1280, 720)),
            PhysicalSize::new(1280, 720)
        );
    }
}
