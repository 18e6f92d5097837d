use log::warn;

use crate::parser;
use crate::saber::Saber;
use crate::serial_link::SharedLineBuffer;

/// Per-frame glue between ingestion and integration: drain the shared slot,
/// parse, forward, then advance the integrator by the frame's `dt`.
pub struct FrameDriver {
    buffer: SharedLineBuffer,
    saber: Saber,
    samples_accepted: u64,
    parse_failures: u64,
}

impl FrameDriver {
    pub fn new(buffer: SharedLineBuffer, saber: Saber) -> Self {
        Self {
            buffer,
            saber,
            samples_accepted: 0,
            parse_failures: 0,
        }
    }

    pub fn tick(&mut self, dt: f32) {
        // take() swaps the slot under the same lock the reader publishes
        // with; parsing happens outside the critical section.
        if let Some(line) = self.buffer.take() {
            match parser::parse_line(&line) {
                Ok(vectors) => {
                    self.saber.set_sensor_data(vectors);
                    self.samples_accepted += 1;
                }
                Err(e) => {
                    // A bad line skips the update; the integrator keeps
                    // running on the previous sample.
                    warn!("{e}");
                    self.parse_failures += 1;
                }
            }
        }
        self.saber.tick(dt);
    }

    pub fn saber(&self) -> &Saber {
        &self.saber
    }

    pub fn saber_mut(&mut self) -> &mut Saber {
        &mut self.saber
    }

    pub fn samples_accepted(&self) -> u64 {
        self.samples_accepted
    }

    pub fn parse_failures(&self) -> u64 {
        self.parse_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saber::{Axis, SaberConfig};
    use approx::assert_relative_eq;
    use glam::{Quat, Vec3};

    fn driver_with_yaw_on_y() -> (SharedLineBuffer, FrameDriver) {
        let buffer = SharedLineBuffer::new();
        let config = SaberConfig {
            yaw_axis: Axis::Y,
            yaw_sensitivity: 1.0,
            ..SaberConfig::default()
        };
        let saber = Saber::new(config, Vec3::ZERO, Quat::IDENTITY);
        (buffer.clone(), FrameDriver::new(buffer, saber))
    }

    #[test]
    fn published_line_reaches_the_integrator() {
        let (buffer, mut driver) = driver_with_yaw_on_y();
        buffer.publish("1.0,0.0,0.0,0.0,10.0,0.0".to_string());
        driver.tick(0.1);
        assert_relative_eq!(driver.saber().yaw_angle(), 1.0);
        assert_eq!(driver.samples_accepted(), 1);
        assert_eq!(driver.parse_failures(), 0);
    }

    #[test]
    fn malformed_line_is_discarded_and_previous_sample_reused() {
        let (buffer, mut driver) = driver_with_yaw_on_y();
        buffer.publish("1.0,0.0,0.0,0.0,10.0,0.0".to_string());
        driver.tick(0.1);

        buffer.publish("not,a,sample".to_string());
        driver.tick(0.1);

        // The bad line was counted and skipped; integration continued with
        // the last good vectors.
        assert_eq!(driver.parse_failures(), 1);
        assert_eq!(driver.samples_accepted(), 1);
        assert_relative_eq!(driver.saber().yaw_angle(), 2.0);
    }

    #[test]
    fn empty_buffer_still_advances_the_integrator() {
        let (_buffer, mut driver) = driver_with_yaw_on_y();
        driver.tick(0.1);
        assert_eq!(driver.samples_accepted(), 0);
        assert_eq!(driver.saber().yaw_angle(), 0.0);
    }

    #[test]
    fn calibrate_after_motion_restores_initial_pose() {
        let initial_position = Vec3::new(0.5, 1.0, 0.0);
        let initial_rotation = Quat::from_rotation_y(0.3);
        let buffer = SharedLineBuffer::new();
        let saber = Saber::new(SaberConfig::default(), initial_position, initial_rotation);
        let mut driver = FrameDriver::new(buffer.clone(), saber);

        buffer.publish("9.0,-3.0,0.0,20.0,35.0,-10.0".to_string());
        for _ in 0..20 {
            driver.tick(0.05);
        }

        buffer.publish("0,0,0,0,0,0".to_string());
        driver.tick(0.05);
        driver.saber_mut().calibrate();

        assert_eq!(driver.saber().position(), initial_position);
        assert_eq!(driver.saber().rotation(), initial_rotation);
        assert_eq!(driver.saber().offset(), Vec3::ZERO);
    }
}
