//! Chill Clicker - an idle/clicker game with physics-simulated popcorn
//!
//! Core modules:
//! - `game`: Economy model and idle accrual clock (pure, natively tested)
//! - `popcorn`: Rapier-backed particle simulation
//! - `persistence`: Save/load, autosave, cross-tab sync
//! - `audio`: Web Audio pop synthesis and ambient music (wasm only)

pub mod game;
pub mod persistence;
pub mod popcorn;

#[cfg(target_arch = "wasm32")]
pub mod audio;

pub use game::{AccrualClock, GameState};
pub use persistence::{Persistence, SaveRecord};
pub use popcorn::{PopcornWorld, VisualHandle};

/// Game tuning constants
pub mod consts {
    /// Fixed physics timestep (60 Hz, Rapier default)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum physics substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Chill points granted per second by one generator
    pub const GENERATOR_RATE: u64 = 1;
    /// Cost of one auto-popper generator
    pub const GENERATOR_COST: f64 = 250.0;
    /// Cost of one click-power upgrade
    pub const CLICK_UPGRADE_COST: f64 = 100.0;

    /// Accrual clock polling cadence
    pub const ACCRUAL_POLL_MS: i32 = 100;
    /// Autosave cadence
    pub const AUTOSAVE_INTERVAL_MS: f64 = 10_000.0;

    /// Kernel visual size in CSS pixels (collision radius is half)
    pub const KERNEL_SIZE: f32 = 20.0;
    /// Collision radius of a popcorn kernel
    pub const KERNEL_RADIUS: f32 = KERNEL_SIZE / 2.0;
    /// Maximum live kernels; the oldest is evicted past this
    pub const MAX_KERNELS: usize = 256;

    /// Downward gravity in px/s^2 (screen coordinates, +y is down)
    pub const GRAVITY_Y: f32 = 900.0;
    /// Sideways scatter: launch vx is uniform in +/- this range, px/s
    pub const SCATTER_VX: f32 = 150.0;
    /// Upward launch speed range, px/s
    pub const LAUNCH_SPEED_MIN: f32 = 420.0;
    pub const LAUNCH_SPEED_MAX: f32 = 700.0;
    /// Spin: launch angular velocity is uniform in +/- this range, rad/s
    pub const SPIN_MAX: f32 = 6.0;
    /// Kernel material, tuned so kernels pile instead of bouncing away
    pub const KERNEL_RESTITUTION: f32 = 0.35;
    pub const KERNEL_FRICTION: f32 = 0.6;
    pub const KERNEL_DENSITY: f32 = 1.0;
    /// Half-thickness of the static floor/wall colliders
    pub const BOUNDARY_HALF_THICKNESS: f32 = 50.0;
}
