use glam::{EulerRot, Quat, Vec3};
use log::info;
use serde::{Deserialize, Serialize};

use crate::parser::SensorVectors;

/// Which sensor component feeds a logical channel. The physical mounting
/// orientation of the IMU relative to the prop is arbitrary, so every
/// deployment reconciles it here instead of in code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    NegX,
    NegY,
    NegZ,
}

impl Axis {
    /// Project a vector onto the configured sensor axis, sign included.
    pub fn extract(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
            Axis::NegX => -v.x,
            Axis::NegY => -v.y,
            Axis::NegZ => -v.z,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SaberConfig {
    pub yaw_sensitivity: f32,
    pub roll_sensitivity: f32,
    pub horizontal_sensitivity: f32,
    pub vertical_sensitivity: f32,
    /// Lerp factor per tick pulling the position back toward the rest pose.
    pub return_to_origin_speed: f32,
    pub max_horizontal_offset: f32,
    pub max_vertical_offset: f32,
    pub yaw_axis: Axis,
    pub roll_axis: Axis,
    pub horizontal_axis: Axis,
    pub vertical_axis: Axis,
}

impl Default for SaberConfig {
    fn default() -> Self {
        Self {
            yaw_sensitivity: 1.0,
            roll_sensitivity: 1.0,
            horizontal_sensitivity: 0.05,
            vertical_sensitivity: 0.05,
            return_to_origin_speed: 0.1,
            max_horizontal_offset: 0.5,
            max_vertical_offset: 0.5,
            yaw_axis: Axis::Z,
            roll_axis: Axis::X,
            horizontal_axis: Axis::X,
            vertical_axis: Axis::Y,
        }
    }
}

/// Integrates angular rate into yaw/roll angles and acceleration into a
/// clamped 2D offset from a calibrated rest pose.
pub struct Saber {
    config: SaberConfig,
    initial_position: Vec3,
    initial_rotation: Quat,
    acceleration: Vec3,
    angular_rate: Vec3,
    yaw_angle: f32,
    roll_angle: f32,
    offset: Vec3,
    position: Vec3,
    rotation: Quat,
}

impl Saber {
    pub fn new(config: SaberConfig, initial_position: Vec3, initial_rotation: Quat) -> Self {
        let mut saber = Self {
            config,
            initial_position,
            initial_rotation,
            acceleration: Vec3::ZERO,
            angular_rate: Vec3::ZERO,
            yaw_angle: 0.0,
            roll_angle: 0.0,
            offset: Vec3::ZERO,
            position: initial_position,
            rotation: initial_rotation,
        };
        saber.calibrate();
        saber
    }

    /// Store the latest sample for the next tick. No integration happens
    /// here; arrival rate (serial) is decoupled from tick rate (frame).
    pub fn set_sensor_data(&mut self, vectors: SensorVectors) {
        self.acceleration = vectors.acceleration;
        self.angular_rate = vectors.angular_rate;
    }

    pub fn tick(&mut self, dt: f32) {
        self.integrate_rotation(dt);
        self.integrate_offset(dt);

        // Euler(0, yaw, roll) composed onto the calibrated frame. The
        // composition order is load-bearing: swapping it changes on-device
        // feel.
        self.rotation = Quat::from_euler(
            EulerRot::YXZ,
            self.yaw_angle.to_radians(),
            0.0,
            self.roll_angle.to_radians(),
        ) * self.initial_rotation;

        let target = self.initial_position + self.offset;
        self.position = self.position.lerp(target, self.config.return_to_origin_speed);
    }

    fn integrate_rotation(&mut self, dt: f32) {
        let yaw_rate = self.config.yaw_axis.extract(self.angular_rate);
        let roll_rate = self.config.roll_axis.extract(self.angular_rate);

        // Angles accumulate unbounded in degrees; quaternion construction is
        // periodic, so no wrap-around is needed.
        self.yaw_angle += yaw_rate * dt * self.config.yaw_sensitivity;
        self.roll_angle += roll_rate * dt * self.config.roll_sensitivity;
    }

    fn integrate_offset(&mut self, dt: f32) {
        let horizontal = self.config.horizontal_axis.extract(self.acceleration);
        let vertical = self.config.vertical_axis.extract(self.acceleration);

        self.offset.x += horizontal * dt * self.config.horizontal_sensitivity;
        self.offset.y += vertical * dt * self.config.vertical_sensitivity;
        self.offset.z = 0.0;

        // Hard clamp after integration; a large spike may land exactly on
        // the bound.
        self.offset.x = self
            .offset
            .x
            .clamp(-self.config.max_horizontal_offset, self.config.max_horizontal_offset);
        self.offset.y = self
            .offset
            .y
            .clamp(-self.config.max_vertical_offset, self.config.max_vertical_offset);
    }

    /// Define the current physical sensor orientation as the logical rest
    /// state. Snaps the pose immediately (no smoothing) and is idempotent.
    pub fn calibrate(&mut self) {
        self.yaw_angle = 0.0;
        self.roll_angle = 0.0;
        self.offset = Vec3::ZERO;
        self.position = self.initial_position;
        self.rotation = self.initial_rotation;
        info!("saber calibrated; rotation and 2D position reset");
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn yaw_angle(&self) -> f32 {
        self.yaw_angle
    }

    pub fn roll_angle(&self) -> f32 {
        self.roll_angle
    }
}
