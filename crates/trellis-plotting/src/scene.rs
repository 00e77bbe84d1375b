//! Domain-to-scene coordinate transforms.
//!
//! Controllers speak two coordinate systems: domain coordinates stored
//! in item properties, and scene coordinates the view works in. A
//! [`SceneAdapter`] is the pluggable, invertible bridge between the two.

/// Two-way transform between domain and scene coordinates.
///
/// Implementations must be inverse-consistent:
/// `from_scene_x(to_scene_x(v)) == v` (up to floating point), same for y.
pub trait SceneAdapter: Send + Sync {
    /// Maps a domain x coordinate into the scene.
    fn to_scene_x(&self, x: f64) -> f64;
    /// Maps a domain y coordinate into the scene.
    fn to_scene_y(&self, y: f64) -> f64;
    /// Maps a scene x coordinate back into the domain.
    fn from_scene_x(&self, x: f64) -> f64;
    /// Maps a scene y coordinate back into the domain.
    fn from_scene_y(&self, y: f64) -> f64;
}

/// The trivial transform: scene coordinates equal domain coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityAdapter;

impl SceneAdapter for IdentityAdapter {
    fn to_scene_x(&self, x: f64) -> f64 {
        x
    }

    fn to_scene_y(&self, y: f64) -> f64 {
        y
    }

    fn from_scene_x(&self, x: f64) -> f64 {
        x
    }

    fn from_scene_y(&self, y: f64) -> f64 {
        y
    }
}

/// Uniform affine transform: `scene = domain * scale + offset` on both
/// axes.
#[derive(Debug, Clone, Copy)]
pub struct LinearAdapter {
    /// Multiplier, must be non-zero for the transform to be invertible.
    pub scale: f64,
    /// Additive offset.
    pub offset: f64,
}

impl SceneAdapter for LinearAdapter {
    fn to_scene_x(&self, x: f64) -> f64 {
        x * self.scale + self.offset
    }

    fn to_scene_y(&self, y: f64) -> f64 {
        y * self.scale + self.offset
    }

    fn from_scene_x(&self, x: f64) -> f64 {
        (x - self.offset) / self.scale
    }

    fn from_scene_y(&self, y: f64) -> f64 {
        (y - self.offset) / self.scale
    }
}
