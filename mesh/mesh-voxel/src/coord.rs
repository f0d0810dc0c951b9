//! Integer voxel coordinates.

/// A discrete 3D coordinate in voxel space.
///
/// Signed so the lattice extends in every direction from the world origin.
///
/// # Example
///
/// ```
/// use mesh_voxel::VoxelCoord;
///
/// let coord = VoxelCoord::new(-1, 2, 3);
/// assert_eq!(coord.as_array(), [-1, 2, 3]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct VoxelCoord {
    /// X index.
    pub x: i32,
    /// Y index.
    pub y: i32,
    /// Z index.
    pub z: i32,
}

impl VoxelCoord {
    /// Creates a new voxel coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the coordinate as an array.
    #[must_use]
    pub const fn as_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// The 6 face-adjacent neighbours.
    #[must_use]
    pub const fn face_neighbors(self) -> [Self; 6] {
        let Self { x, y, z } = self;
        [
            Self::new(x - 1, y, z),
            Self::new(x + 1, y, z),
            Self::new(x, y - 1, z),
            Self::new(x, y + 1, z),
            Self::new(x, y, z - 1),
            Self::new(x, y, z + 1),
        ]
    }
}

impl From<[i32; 3]> for VoxelCoord {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}
