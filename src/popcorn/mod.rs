//! Popcorn particle physics
//!
//! Each manual action launches a popcorn kernel: a circular rigid body with
//! sideways scatter, a strong upward impulse, and a little spin. Kernels
//! bounce off three static boundaries (floor + side walls, rebuilt on
//! viewport resize) and pile up. The registry is a fixed-capacity ring:
//! past `MAX_KERNELS` the oldest kernel's body is removed and its visual
//! handle handed back to the caller for release.

use std::collections::VecDeque;

use rand::Rng;
use rand_pcg::Pcg32;
use rapier2d::prelude::*;

use crate::consts::*;

/// Opaque handle to a visual owned by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualHandle(pub u32);

/// Snapshot of a body's placement, in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

/// A live kernel: rigid body paired with its visual
#[derive(Debug, Clone, Copy)]
struct Kernel {
    body: RigidBodyHandle,
    visual: VisualHandle,
}

/// The physics world. Screen coordinates: +y is down, gravity is +y.
pub struct PopcornWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    boundaries: Vec<ColliderHandle>,
    kernels: VecDeque<Kernel>,
}

impl PopcornWorld {
    /// Create a world bounded to the given viewport size
    pub fn new(width: f32, height: f32) -> Self {
        let mut world = Self {
            gravity: vector![0.0, GRAVITY_Y],
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            boundaries: Vec::new(),
            kernels: VecDeque::with_capacity(MAX_KERNELS),
        };
        world.resize(width, height);
        world
    }

    /// Rebuild the static boundaries for a new viewport size. Live kernels
    /// are untouched.
    pub fn resize(&mut self, width: f32, height: f32) {
        for handle in self.boundaries.drain(..) {
            self.colliders
                .remove(handle, &mut self.islands, &mut self.bodies, false);
        }

        let half = BOUNDARY_HALF_THICKNESS;
        // Floor surface sits exactly at the viewport bottom
        let floor = ColliderBuilder::cuboid(width / 2.0 + half * 2.0, half)
            .translation(vector![width / 2.0, height + half])
            .friction(KERNEL_FRICTION)
            .build();
        // Walls extend above the viewport so high launches stay contained
        let left = ColliderBuilder::cuboid(half, height * 2.0)
            .translation(vector![-half, height * 0.5])
            .build();
        let right = ColliderBuilder::cuboid(half, height * 2.0)
            .translation(vector![width + half, height * 0.5])
            .build();

        self.boundaries.push(self.colliders.insert(floor));
        self.boundaries.push(self.colliders.insert(left));
        self.boundaries.push(self.colliders.insert(right));
    }

    /// Launch a kernel at `(x, y)` and register it with its visual. When
    /// the ring is full the oldest kernel's body is destroyed first and its
    /// visual handle returned so the caller can release it.
    pub fn spawn(
        &mut self,
        x: f32,
        y: f32,
        visual: VisualHandle,
        rng: &mut Pcg32,
    ) -> Option<VisualHandle> {
        let evicted = if self.kernels.len() >= MAX_KERNELS {
            self.kernels.pop_front().map(|oldest| {
                self.bodies.remove(
                    oldest.body,
                    &mut self.islands,
                    &mut self.colliders,
                    &mut self.impulse_joints,
                    &mut self.multibody_joints,
                    true,
                );
                oldest.visual
            })
        } else {
            None
        };

        let vx = rng.random_range(-SCATTER_VX..=SCATTER_VX);
        let vy = -rng.random_range(LAUNCH_SPEED_MIN..=LAUNCH_SPEED_MAX);
        let spin = rng.random_range(-SPIN_MAX..=SPIN_MAX);

        let body = RigidBodyBuilder::dynamic()
            .translation(vector![x, y])
            .linvel(vector![vx, vy])
            .angvel(spin)
            .ccd_enabled(true)
            .build();
        let body_handle = self.bodies.insert(body);

        let collider = ColliderBuilder::ball(KERNEL_RADIUS)
            .restitution(KERNEL_RESTITUTION)
            .friction(KERNEL_FRICTION)
            .density(KERNEL_DENSITY)
            .build();
        self.colliders
            .insert_with_parent(collider, body_handle, &mut self.bodies);

        self.kernels.push_back(Kernel {
            body: body_handle,
            visual,
        });
        evicted
    }

    /// Advance the simulation by one timestep
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Current pose of every live kernel, oldest first
    pub fn poses(&self) -> impl Iterator<Item = (VisualHandle, Pose)> + '_ {
        self.kernels.iter().filter_map(|kernel| {
            self.bodies.get(kernel.body).map(|body| {
                (
                    kernel.visual,
                    Pose {
                        x: body.translation().x,
                        y: body.translation().y,
                        angle: body.rotation().angle(),
                    },
                )
            })
        })
    }

    pub fn live_count(&self) -> usize {
        self.kernels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const W: f32 = 800.0;
    const H: f32 = 600.0;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(42)
    }

    #[test]
    fn test_spawn_registers_kernel_at_origin() {
        let mut world = PopcornWorld::new(W, H);
        let mut rng = rng();

        world.spawn(400.0, 100.0, VisualHandle(0), &mut rng);
        assert_eq!(world.live_count(), 1);

        let (visual, pose) = world.poses().next().expect("kernel pose");
        assert_eq!(visual, VisualHandle(0));
        assert_eq!(pose.x, 400.0);
        assert_eq!(pose.y, 100.0);
    }

    #[test]
    fn test_kernels_settle_inside_boundaries() {
        let mut world = PopcornWorld::new(W, H);
        let mut rng = rng();

        for i in 0..8 {
            world.spawn(100.0 + i as f32 * 80.0, H / 2.0, VisualHandle(i), &mut rng);
            // Half a second apart so kernels don't spawn overlapping
            for _ in 0..30 {
                world.step(crate::consts::SIM_DT);
            }
        }
        // Ten more simulated seconds: everything should have landed
        for _ in 0..600 {
            world.step(crate::consts::SIM_DT);
        }

        for (_, pose) in world.poses() {
            assert!(
                pose.x > -KERNEL_SIZE && pose.x < W + KERNEL_SIZE,
                "kernel escaped sideways: x = {}",
                pose.x
            );
            assert!(
                pose.y < H + KERNEL_SIZE,
                "kernel fell through the floor: y = {}",
                pose.y
            );
            assert!(pose.y > H / 2.0, "kernel never came down: y = {}", pose.y);
        }
    }

    #[test]
    fn test_ring_evicts_oldest_first() {
        let mut world = PopcornWorld::new(W, H);
        let mut rng = rng();

        for i in 0..MAX_KERNELS as u32 {
            assert_eq!(world.spawn(100.0, 100.0, VisualHandle(i), &mut rng), None);
        }
        assert_eq!(world.live_count(), MAX_KERNELS);

        // Three more: the three oldest visuals come back in spawn order
        for i in 0..3u32 {
            let evicted = world.spawn(
                100.0,
                100.0,
                VisualHandle(MAX_KERNELS as u32 + i),
                &mut rng,
            );
            assert_eq!(evicted, Some(VisualHandle(i)));
        }
        assert_eq!(world.live_count(), MAX_KERNELS);
    }

    #[test]
    fn test_resize_preserves_kernels() {
        let mut world = PopcornWorld::new(W, H);
        let mut rng = rng();

        world.spawn(100.0, 100.0, VisualHandle(0), &mut rng);
        world.resize(1024.0, 768.0);

        assert_eq!(world.live_count(), 1);
        // Still steps fine against the rebuilt boundaries
        for _ in 0..60 {
            world.step(crate::consts::SIM_DT);
        }
        assert!(world.poses().next().is_some());
    }

    #[test]
    fn test_launch_is_upward_with_sideways_scatter() {
        let mut rng = rng();
        let mut world = PopcornWorld::new(W, H);
        world.spawn(400.0, 300.0, VisualHandle(0), &mut rng);

        // A short moment later the kernel is above its spawn point
        for _ in 0..6 {
            world.step(crate::consts::SIM_DT);
        }
        let (_, pose) = world.poses().next().expect("kernel pose");
        assert!(pose.y < 300.0, "kernel did not launch upward: y = {}", pose.y);
    }
}
