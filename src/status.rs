use std::fs;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Pose and counters exposed to the host's rendering/physics layer,
/// rewritten periodically as a JSON document.
#[derive(Serialize, Deserialize, Clone)]
pub struct LiveStatus {
    pub timestamp: f64,
    pub start_time: String,
    pub uptime_seconds: u64,
    pub serial_connected: bool,
    pub samples_accepted: u64,
    pub parse_failures: u64,
    pub calibrations: u64,
    pub position: Vec3,
    pub rotation: Quat,
    pub yaw_angle: f32,
    pub roll_angle: f32,
    pub offset: Vec3,
    pub obstacles_active: usize,
    pub obstacles_spawned: u64,
    pub obstacles_destroyed: u64,
}

impl LiveStatus {
    pub fn new() -> Self {
        Self {
            timestamp: current_timestamp(),
            start_time: Utc::now().to_rfc3339(),
            uptime_seconds: 0,
            serial_connected: false,
            samples_accepted: 0,
            parse_failures: 0,
            calibrations: 0,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            yaw_angle: 0.0,
            roll_angle: 0.0,
            offset: Vec3::ZERO,
            obstacles_active: 0,
            obstacles_spawned: 0,
            obstacles_destroyed: 0,
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for LiveStatus {
    fn default() -> Self {
        Self::new()
    }
}

pub fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
