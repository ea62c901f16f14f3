//! Shared scene fixtures for the export scenario tests

use starforge_core::{Transform, Vec2, Vec3};
use starforge_scene::{
    Collection, ObjectData, ObjectId, PolyMesh, Polygon, Scene, SceneObject, UvLayer,
};

/// A unit cube: 8 vertices, 6 quad faces, one material, one UV channel.
pub fn cube_mesh() -> PolyMesh {
    let positions = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(0.0, 1.0, 1.0),
    ];

    let faces: [([u32; 4], Vec3); 6] = [
        ([0, 3, 2, 1], Vec3::new(0.0, 0.0, -1.0)),
        ([4, 5, 6, 7], Vec3::new(0.0, 0.0, 1.0)),
        ([0, 1, 5, 4], Vec3::new(0.0, -1.0, 0.0)),
        ([1, 2, 6, 5], Vec3::new(1.0, 0.0, 0.0)),
        ([2, 3, 7, 6], Vec3::new(0.0, 1.0, 0.0)),
        ([3, 0, 4, 7], Vec3::new(-1.0, 0.0, 0.0)),
    ];

    let mut loops = Vec::new();
    let mut polygons = Vec::new();
    let mut loop_normals = Vec::new();
    let mut uvs = Vec::new();
    for (corners, normal) in &faces {
        polygons.push(Polygon {
            loop_start: loops.len() as u32,
            loop_total: 4,
            material_index: 0,
        });
        loops.extend_from_slice(corners);
        loop_normals.extend(std::iter::repeat(*normal).take(4));
        uvs.extend_from_slice(&[
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ]);
    }

    PolyMesh {
        positions,
        loops,
        polygons,
        loop_normals,
        uv_layers: vec![UvLayer {
            name: "UVMap".into(),
            data: uvs,
        }],
        materials: vec!["cube_mat".into()],
        ..Default::default()
    }
}

/// A scene with one selected cube mesh object.
pub fn cube_scene() -> Scene {
    Scene {
        objects: vec![SceneObject {
            name: "cube".into(),
            data: ObjectData::Mesh(cube_mesh()),
            matrix_world: Transform::IDENTITY,
            properties: Default::default(),
            children: Vec::new(),
        }],
        selected: vec![ObjectId(0)],
        ..Default::default()
    }
}

fn quad_object(name: &str, size: f32, offset: Vec3) -> SceneObject {
    SceneObject {
        name: name.into(),
        data: ObjectData::Mesh(PolyMesh {
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(size, 0.0, 0.0),
                Vec3::new(size, size, 0.0),
                Vec3::new(0.0, size, 0.0),
            ],
            loops: vec![0, 1, 2, 3],
            polygons: vec![Polygon {
                loop_start: 0,
                loop_total: 4,
                material_index: 0,
            }],
            loop_normals: vec![Vec3::new(0.0, 0.0, 1.0); 4],
            ..Default::default()
        }),
        matrix_world: Transform::from_translation(offset),
        properties: Default::default(),
        children: Vec::new(),
    }
}

/// An upright doorway quad in the authoring XZ plane.
fn portal_object(name: &str, offset: Vec3) -> SceneObject {
    SceneObject {
        name: name.into(),
        data: ObjectData::Mesh(PolyMesh {
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 2.0),
                Vec3::new(0.0, 0.0, 2.0),
            ],
            loops: vec![0, 1, 2, 3],
            polygons: vec![Polygon {
                loop_start: 0,
                loop_total: 4,
                material_index: 0,
            }],
            loop_normals: vec![Vec3::new(0.0, 1.0, 0.0); 4],
            ..Default::default()
        }),
        matrix_world: Transform::from_translation(offset),
        properties: Default::default(),
        children: Vec::new(),
    }
}

/// Two cells sharing one portal object, both with floors.
///
/// Object arena: 0 = shared portal, 1 = floor of r0, 2 = floor of r1.
pub fn two_cell_scene() -> Scene {
    let cell = |name: &str, floor: u32| Collection {
        name: name.into(),
        objects: vec![ObjectId(floor)],
        children: vec![Collection {
            name: format!("Portals_{name}"),
            objects: vec![ObjectId(0)],
            ..Default::default()
        }],
        ..Default::default()
    };

    Scene {
        objects: vec![
            portal_object("shared_portal", Vec3::new(2.0, 1.0, 0.0)),
            quad_object("Floor_r0", 2.0, Vec3::ZERO),
            quad_object("Floor_r1", 2.0, Vec3::new(2.0, 0.0, 0.0)),
        ],
        collections: vec![Collection {
            name: "house".into(),
            children: vec![cell("r0", 1), cell("r1", 2)],
            ..Default::default()
        }],
        active_collection: Some("house".into()),
        ..Default::default()
    }
}
