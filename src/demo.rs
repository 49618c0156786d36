use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::error::Result;
use crate::geometry;
use crate::scene::{
    EntityKey, ObjectProperties, SceneContext, ShadingModel, SurfaceMaterial, Transform,
};

#[derive(Debug, Clone, Copy)]
pub struct DemoScene {
    pub bobbing_light: EntityKey,
    pub focus: Vec3,
    base_height: f32,
}

impl DemoScene {
    // one sphere per shading model
    pub fn build(scene: &mut SceneContext) -> Result<Self> {
        let plane = Arc::new(geometry::create_plane());
        let cube = Arc::new(geometry::create_cube());
        let crystal = Arc::new(geometry::create_crystal());

        let white = SurfaceMaterial::new([0.73, 0.73, 0.73, 1.0]);
        let lambertian = ObjectProperties::default();

        // Floor
        scene.spawn_mesh_object(
            Arc::clone(&plane),
            Transform::from_translation(Vec3::new(0.0, -1.0, 0.0)).with_uniform_scale(8.0),
            &white,
            lambertian,
        )?;
        // Back wall
        scene.spawn_mesh_object(
            plane,
            Transform::from_translation(Vec3::new(0.0, 1.0, -3.0))
                .with_rotation(Quat::from_rotation_x(FRAC_PI_2))
                .with_uniform_scale(8.0),
            &SurfaceMaterial::new([0.12, 0.45, 0.15, 1.0]),
            lambertian,
        )?;

        // Tall box, rough metal
        scene.spawn_mesh_object(
            cube,
            Transform::from_translation(Vec3::new(-1.6, -0.4, -1.2))
                .with_rotation(Quat::from_rotation_y(0.4))
                .with_scale(Vec3::new(0.6, 1.2, 0.6)),
            &SurfaceMaterial::new([0.8, 0.8, 0.8, 1.0]).metallic(1.0).glossiness(0.6),
            ObjectProperties::new(ShadingModel::Metal),
        )?;

        scene.spawn_mesh_object(
            crystal,
            Transform::from_translation(Vec3::new(1.6, -0.5, -1.0)).with_uniform_scale(0.5),
            &SurfaceMaterial::new([0.5, 0.8, 1.0, 1.0]),
            ObjectProperties::new(ShadingModel::glass()),
        )?;

        // Spheres, left to right
        let row = [
            (
                SurfaceMaterial::new([0.65, 0.05, 0.05, 1.0]),
                ObjectProperties::default(),
            ),
            (
                SurfaceMaterial::new([0.9, 0.75, 0.4, 1.0]).metallic(1.0).glossiness(0.95),
                ObjectProperties::new(ShadingModel::Metal),
            ),
            (
                SurfaceMaterial::new([1.0, 1.0, 1.0, 1.0]),
                ObjectProperties::new(ShadingModel::glass()),
            ),
            (
                SurfaceMaterial::new([0.2, 0.3, 0.9, 1.0]),
                // over-bright diffuse
                ObjectProperties::default().colour_multiplier(1.5),
            ),
        ];
        for (i, (material, properties)) in row.iter().enumerate() {
            let x = -1.5 + i as f32;
            scene.spawn_sphere(
                Transform::from_translation(Vec3::new(x, -0.6, 0.0)).with_uniform_scale(0.8),
                material,
                *properties,
            )?;
        }

        let base_height = 1.2;
        let bobbing_light = scene.spawn_sphere(
            Transform::from_translation(Vec3::new(0.0, base_height, -0.5)).with_uniform_scale(0.5),
            &SurfaceMaterial::new([1.0, 1.0, 1.0, 1.0]).emission([1.0, 0.85, 0.6]),
            ObjectProperties::new(ShadingModel::Emissive { power: 8.0 }),
        )?;

        log::info!("Demo scene: {} entities", scene.len());

        Ok(Self {
            bobbing_light,
            focus: Vec3::new(0.0, -0.3, -0.5),
            base_height,
        })
    }

    // time in seconds
    pub fn animate(&self, scene: &mut SceneContext, time: f32) {
        if let Some(transform) = scene.transform_mut(self.bobbing_light) {
            transform.translation.y = self.base_height + 0.3 * (time * PI * 0.25).sin();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_has_every_shape_kind() {
        let mut scene = SceneContext::new();
        let demo = DemoScene::build(&mut scene).unwrap();

        assert_eq!(scene.registry().spheres().len(), 5);
        assert_eq!(scene.registry().mesh_objects().len(), 4);
        assert!(scene.registry().is_sphere(demo.bobbing_light));
    }

    #[test]
    fn animate_moves_the_light() {
        let mut scene = SceneContext::new();
        let demo = DemoScene::build(&mut scene).unwrap();

        demo.animate(&mut scene, 2.0);
        let y = scene.entity(demo.bobbing_light).unwrap().transform.translation.y;
        assert!((y - 1.5).abs() < 1e-4);
    }
}
