/// Resource categories tracked by the renderer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    Program,
    Geometry,
    Framebuffer,
}

/// Running counters for one resource table.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ResourceStats {
    /// Every successful acquisition, cache hits included.
    pub acquired: u64,
    /// Cache misses that reached the device.
    pub created: u64,
    pub destroyed: u64,
}

impl ResourceStats {
    /// Device objects currently alive.
    #[inline]
    pub fn live(&self) -> u64 {
        self.created - self.destroyed
    }
}
