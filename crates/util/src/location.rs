use std::fmt;
use std::hash::{Hash, Hasher};

/// A position inside a world, including the view direction.
///
/// `world` is `None` when the position is not bound to a loaded world.
#[derive(Debug, Clone, Default)]
pub struct Location {
    pub world: Option<String>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

impl Location {
    pub fn new(world: Option<String>, x: f64, y: f64, z: f64, yaw: f32, pitch: f32) -> Self {
        Self { world, x, y, z, yaw, pitch }
    }

    /// Location without a view direction.
    pub fn at(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self::new(Some(world.into()), x, y, z, 0.0, 0.0)
    }

    pub fn world_name(&self) -> Option<&str> {
        self.world.as_deref()
    }

    /// Block coordinates of this location.
    pub fn block(&self) -> (i64, i64, i64) {
        (self.x.floor() as i64, self.y.floor() as i64, self.z.floor() as i64)
    }
}

// Coordinates compare by bit pattern so that equal locations hash equally.
impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.world == other.world
            && self.x.to_bits() == other.x.to_bits()
            && self.y.to_bits() == other.y.to_bits()
            && self.z.to_bits() == other.z.to_bits()
            && self.yaw.to_bits() == other.yaw.to_bits()
            && self.pitch.to_bits() == other.pitch.to_bits()
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.world.hash(state);
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
        self.z.to_bits().hash(state);
        self.yaw.to_bits().hash(state);
        self.pitch.to_bits().hash(state);
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@({}, {}, {}) yaw={} pitch={}",
            self.world.as_deref().unwrap_or("<unloaded>"),
            self.x,
            self.y,
            self.z,
            self.yaw,
            self.pitch
        )
    }
}
