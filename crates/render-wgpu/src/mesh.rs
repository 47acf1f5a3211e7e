use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};
use std::f32::consts::{PI, TAU};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct GridVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Unit cube centred on the origin.
pub(crate) fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    // (normal, tangent u, tangent v) per face; corners wind counter-clockwise.
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let base = vertices.len() as u16;
        for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let p = normal * 0.5 + u * su + v * sv;
            vertices.push(Vertex {
                position: p.to_array(),
                normal: normal.to_array(),
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    (vertices, indices)
}

/// UV sphere with `segments` slices and stacks.
pub(crate) fn sphere_mesh(radius: f32, segments: u16) -> (Vec<Vertex>, Vec<u16>) {
    let rings = segments.max(3);
    let mut vertices = Vec::with_capacity(((rings + 1) * (rings + 1)) as usize);
    for stack in 0..=rings {
        let phi = PI * stack as f32 / rings as f32;
        for slice in 0..=rings {
            let theta = TAU * slice as f32 / rings as f32;
            let normal = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            vertices.push(Vertex {
                position: (normal * radius).to_array(),
                normal: normal.to_array(),
            });
        }
    }

    let stride = rings + 1;
    let mut indices = Vec::with_capacity((rings * rings * 6) as usize);
    for stack in 0..rings {
        for slice in 0..rings {
            let a = stack * stride + slice;
            let b = a + stride;
            indices.extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
        }
    }
    (vertices, indices)
}

/// Grid lines on the XZ plane, moved by `placement`.
pub(crate) fn grid_mesh(half_extent: i32, spacing: f32, placement: Mat4) -> Vec<GridVertex> {
    let mut verts = Vec::new();
    let color = [0.25, 0.25, 0.25, 1.0];
    let extent = half_extent as f32 * spacing;
    let mut line = |a: Vec3, b: Vec3| {
        for p in [a, b] {
            verts.push(GridVertex {
                position: placement.transform_point3(p).to_array(),
                color,
            });
        }
    };

    for i in -half_extent..=half_extent {
        let offset = i as f32 * spacing;
        line(Vec3::new(-extent, 0.0, offset), Vec3::new(extent, 0.0, offset));
        line(Vec3::new(offset, 0.0, -extent), Vec3::new(offset, 0.0, extent));
    }
    verts
}

/// Placement matrix of the floor from a position and XYZ Euler angles.
pub(crate) fn floor_placement(position: Vec3, rotation: Vec3) -> Mat4 {
    let rot = Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z);
    Mat4::from_rotation_translation(rot, position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_six_quads() {
        let (verts, indices) = cube_mesh();
        assert_eq!(verts.len(), 24);
        assert_eq!(indices.len(), 36);
        for v in &verts {
            assert!(v.position.iter().all(|c| c.abs() == 0.5));
        }
    }

    #[test]
    fn cube_faces_wind_outward() {
        let (verts, indices) = cube_mesh();
        for tri in indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|i| Vec3::from_array(verts[tri[i] as usize].position));
            let n = Vec3::from_array(verts[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(n) > 0.0);
        }
    }

    #[test]
    fn sphere_vertices_on_radius() {
        let (verts, indices) = sphere_mesh(0.5, 30);
        assert_eq!(verts.len(), 31 * 31);
        assert_eq!(indices.len(), 30 * 30 * 6);
        for v in &verts {
            assert!((Vec3::from_array(v.position).length() - 0.5).abs() < 1e-5);
        }
        assert!(indices.iter().all(|&i| (i as usize) < verts.len()));
    }

    #[test]
    fn grid_follows_placement() {
        let placement = floor_placement(Vec3::new(0.0, -3.0, 0.0), Vec3::ZERO);
        let verts = grid_mesh(2, 1.0, placement);
        assert_eq!(verts.len(), 5 * 4);
        assert!(verts.iter().all(|v| v.position[1] == -3.0));
    }
}
