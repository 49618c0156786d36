use glam::Vec3;

// object space, triangle-list indices from zero
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub label: String,
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(label: impl Into<String>, positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        let mesh = Self {
            label: label.into(),
            positions,
            indices,
        };
        debug_assert!(mesh.is_well_formed(), "mesh {:?} has dangling indices", mesh.label);
        mesh
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.indices
            .iter()
            .all(|&i| (i as usize) < self.positions.len())
    }
}

// 1x1 plane in XZ, centred on the origin, facing +Y
pub fn create_plane() -> Mesh {
    let positions = vec![
        [-0.5, 0.0, 0.5],
        [0.5, 0.0, 0.5],
        [-0.5, 0.0, -0.5],
        [0.5, 0.0, -0.5],
    ];
    let indices = vec![0, 1, 2, 2, 1, 3];

    Mesh::new("Plane", positions, indices)
}

// Unit cube, four vertices per face so faces stay flat-shaded
pub fn create_cube() -> Mesh {
    let mut positions = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    let mut v_idx = 0;

    let sides: [[[f32; 3]; 4]; 6] = [
        [
            [-0.5, -0.5, 0.5],
            [0.5, -0.5, 0.5],
            [0.5, 0.5, 0.5],
            [-0.5, 0.5, 0.5],
        ], // Front
        [
            [0.5, -0.5, -0.5],
            [-0.5, -0.5, -0.5],
            [-0.5, 0.5, -0.5],
            [0.5, 0.5, -0.5],
        ], // Back
        [
            [-0.5, 0.5, 0.5],
            [0.5, 0.5, 0.5],
            [0.5, 0.5, -0.5],
            [-0.5, 0.5, -0.5],
        ], // Top
        [
            [-0.5, -0.5, -0.5],
            [0.5, -0.5, -0.5],
            [0.5, -0.5, 0.5],
            [-0.5, -0.5, 0.5],
        ], // Bottom
        [
            [0.5, -0.5, 0.5],
            [0.5, -0.5, -0.5],
            [0.5, 0.5, -0.5],
            [0.5, 0.5, 0.5],
        ], // Right
        [
            [-0.5, -0.5, -0.5],
            [-0.5, -0.5, 0.5],
            [-0.5, 0.5, 0.5],
            [-0.5, 0.5, -0.5],
        ], // Left
    ];

    for quad in sides {
        positions.extend_from_slice(&quad);
        indices.extend_from_slice(&[v_idx, v_idx + 1, v_idx + 2, v_idx, v_idx + 2, v_idx + 3]);
        v_idx += 4;
    }

    Mesh::new("Cube", positions, indices)
}

// 2 units tall
pub fn create_crystal() -> Mesh {
    let mut positions = Vec::new();
    let mut indices = Vec::new();

    let top_tip = Vec3::new(0.0, 1.0, 0.0);
    let top_ring = [
        Vec3::new(0.3, 0.5, 0.3),
        Vec3::new(-0.3, 0.5, 0.3),
        Vec3::new(-0.3, 0.5, -0.3),
        Vec3::new(0.3, 0.5, -0.3),
    ];
    let bottom_ring = [
        Vec3::new(0.3, -0.5, 0.3),
        Vec3::new(-0.3, -0.5, 0.3),
        Vec3::new(-0.3, -0.5, -0.3),
        Vec3::new(0.3, -0.5, -0.3),
    ];
    let bottom_tip = Vec3::new(0.0, -1.0, 0.0);

    let mut add_face = |p0: Vec3, p1: Vec3, p2: Vec3| {
        let base = positions.len() as u32;
        positions.push(p0.to_array());
        positions.push(p1.to_array());
        positions.push(p2.to_array());
        indices.extend_from_slice(&[base, base + 1, base + 2]);
    };

    // upper pyramid, CCW seen from outside
    for i in 0..4 {
        add_face(top_tip, top_ring[(i + 1) % 4], top_ring[i]);
    }

    for i in 0..4 {
        let i_next = (i + 1) % 4;
        add_face(top_ring[i], top_ring[i_next], bottom_ring[i_next]);
        add_face(top_ring[i], bottom_ring[i_next], bottom_ring[i]);
    }

    for i in 0..4 {
        add_face(bottom_tip, bottom_ring[i], bottom_ring[(i + 1) % 4]);
    }

    Mesh::new("Crystal", positions, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_well_formed() {
        for mesh in [create_plane(), create_cube(), create_crystal()] {
            assert!(mesh.is_well_formed(), "{}", mesh.label);
        }
    }

    #[test]
    fn cube_has_flat_faces() {
        let cube = create_cube();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
    }

    #[test]
    fn crystal_triangle_count() {
        assert_eq!(create_crystal().triangle_count(), 16);
    }
}
