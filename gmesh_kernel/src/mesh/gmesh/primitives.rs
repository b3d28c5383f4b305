// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Primitive shape builders. These only go through the public construction
//! API (`add_vertex` / `add_face` / `combine`), never through the cycle
//! internals, so they double as a workout for the kernel.

use serde::{Deserialize, Serialize};

use super::edit_ops;
use crate::prelude::*;

/// Grid planes support between 2x2 and 11x11 vertices.
pub const MIN_PLANE_VERTEX_COUNT: u32 = 2;
pub const MAX_PLANE_VERTEX_COUNT: u32 = 11;

fn check_axis_count(axis: &str, count: u32) -> Result<()> {
    if !(MIN_PLANE_VERTEX_COUNT..=MAX_PLANE_VERTEX_COUNT).contains(&count) {
        return Err(KernelError::InvalidArgument(format!(
            "{axis} vertex count must be between {MIN_PLANE_VERTEX_COUNT} and \
             {MAX_PLANE_VERTEX_COUNT}, got {count}"
        ))
        .into());
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaneParams {
    /// Number of vertices along each axis of the grid.
    pub vertex_count: UVec2,
    pub translation: Vec3,
    /// XYZ euler rotation, in degrees.
    pub rotation: Vec3,
    pub scale: Vec2,
}

impl Default for PlaneParams {
    fn default() -> Self {
        Self {
            vertex_count: UVec2::new(2, 2),
            translation: Vec3::ZERO,
            // An unrotated grid lies in the XZ plane; the default makes the
            // surface normal face +Z instead.
            rotation: Vec3::new(90.0, 0.0, 0.0),
            scale: Vec2::ONE,
        }
    }
}

impl PlaneParams {
    pub fn validate(&self) -> Result<()> {
        check_axis_count("x", self.vertex_count.x)?;
        check_axis_count("y", self.vertex_count.y)?;
        if !(self.translation.is_finite() && self.rotation.is_finite() && self.scale.is_finite()) {
            return Err(KernelError::InvalidArgument(
                "plane transform parameters must be finite".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeParams {
    /// Number of vertices along each axis, per face grid.
    pub vertex_count: UVec3,
    pub scale: Vec3,
}

impl Default for CubeParams {
    fn default() -> Self {
        Self {
            vertex_count: UVec3::new(2, 2, 2),
            scale: Vec3::ONE,
        }
    }
}

impl CubeParams {
    pub fn validate(&self) -> Result<()> {
        check_axis_count("x", self.vertex_count.x)?;
        check_axis_count("y", self.vertex_count.y)?;
        check_axis_count("z", self.vertex_count.z)?;
        if !self.scale.is_finite() {
            return Err(KernelError::InvalidArgument(
                "cube scale must be finite".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

pub struct Triangle;
impl Triangle {
    pub fn build(a: Vec3, b: Vec3, c: Vec3) -> Result<GMesh> {
        let mut mesh = GMesh::new();
        mesh.add_face_from_positions(&[a, b, c])?;
        Ok(mesh)
    }
}

pub struct Quad;
impl Quad {
    pub fn build(center: Vec3, normal: Vec3, right: Vec3, size: Vec2) -> Result<GMesh> {
        let normal = normal.normalize();
        let right = right.normalize();
        let forward = normal.cross(right);

        let hsize = size * 0.5;

        let v1 = center + hsize.x * right + hsize.y * forward;
        let v2 = center - hsize.x * right + hsize.y * forward;
        let v3 = center - hsize.x * right - hsize.y * forward;
        let v4 = center + hsize.x * right - hsize.y * forward;

        let mut mesh = GMesh::new();
        mesh.add_face_from_positions(&[v1, v2, v3, v4])?;
        Ok(mesh)
    }
}

pub struct Plane;
impl Plane {
    /// Builds an `(nx-1) * (ny-1)` grid of quads. Before the params'
    /// transform is applied the grid is a unit square in the XZ plane,
    /// centered on the origin, with its normal along +Y.
    pub fn build(params: &PlaneParams) -> Result<GMesh> {
        params.validate()?;
        let UVec2 { x: nx, y: ny } = params.vertex_count;

        let mut mesh = GMesh::new();
        let mut grid = Vec::with_capacity((nx * ny) as usize);
        for row in 0..ny {
            for col in 0..nx {
                let fx = col as f32 / (nx - 1) as f32 - 0.5;
                let fz = row as f32 / (ny - 1) as f32 - 0.5;
                grid.push(mesh.add_vertex(Vec3::new(fx, 0.0, fz)));
            }
        }
        for row in 0..ny - 1 {
            for col in 0..nx - 1 {
                let i = (row * nx + col) as usize;
                let step = nx as usize;
                mesh.add_face(&[grid[i], grid[i + step], grid[i + step + 1], grid[i + 1]])?;
            }
        }

        edit_ops::transform(
            &mut mesh,
            params.translation,
            degrees_to_radians(params.rotation),
            Vec3::new(params.scale.x, 1.0, params.scale.y),
        )?;
        Ok(mesh)
    }
}

pub struct Cube;
impl Cube {
    /// Builds a cube out of six grid planes combined with welding, so every
    /// interior edge of the result is manifold.
    pub fn build(params: &CubeParams) -> Result<GMesh> {
        params.validate()?;
        let UVec3 { x: nx, y: ny, z: nz } = params.vertex_count;

        let side = |counts: UVec2, rotation: Vec3, translation: Vec3| -> Result<GMesh> {
            Plane::build(&PlaneParams {
                vertex_count: counts,
                translation,
                rotation,
                scale: Vec2::ONE,
            })
        };

        let half = 0.5;
        let sides = [
            // Top and bottom, normals +Y / -Y.
            side(UVec2::new(nx, nz), Vec3::ZERO, Vec3::new(0.0, half, 0.0))?,
            side(UVec2::new(nx, nz), Vec3::new(180.0, 0.0, 0.0), Vec3::new(0.0, -half, 0.0))?,
            // Front and back, normals +Z / -Z.
            side(UVec2::new(nx, ny), Vec3::new(90.0, 0.0, 0.0), Vec3::new(0.0, 0.0, half))?,
            side(UVec2::new(nx, ny), Vec3::new(-90.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -half))?,
            // Right and left, normals +X / -X.
            side(UVec2::new(ny, nz), Vec3::new(0.0, 0.0, -90.0), Vec3::new(half, 0.0, 0.0))?,
            side(UVec2::new(ny, nz), Vec3::new(0.0, 0.0, 90.0), Vec3::new(-half, 0.0, 0.0))?,
        ];

        let mut cube = edit_ops::combine(&sides, Some(edit_ops::DEFAULT_WELD_DISTANCE))?;
        edit_ops::transform(&mut cube, Vec3::ZERO, Vec3::ZERO, params.scale)?;
        Ok(cube)
    }
}

fn degrees_to_radians(degrees: Vec3) -> Vec3 {
    Vec3::new(
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    )
}
