use glam::Vec3;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    /// Seconds of accumulated tick time between spawns.
    pub spawn_interval: f32,
    /// Units per second along -X.
    pub movement_speed: f32,
    /// Obstacles past this X coordinate are removed.
    pub despawn_x: f32,
    /// An obstacle within this distance of the saber is destroyed.
    pub collision_radius: f32,
    pub spawn_points: Vec<Vec3>,
    /// Number of obstacle variants to pick from.
    pub kinds: u32,
    /// Fixed RNG seed for reproducible runs; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            spawn_interval: 1.5,
            movement_speed: 5.0,
            despawn_x: -4.0,
            collision_radius: 0.6,
            spawn_points: vec![
                Vec3::new(6.0, -0.5, 0.0),
                Vec3::new(6.0, 0.0, 0.0),
                Vec3::new(6.0, 0.5, 0.0),
            ],
            kinds: 3,
            seed: None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Obstacle {
    pub position: Vec3,
    pub kind: u32,
}

/// Spawns obstacles on a timer, slides them toward the saber, and removes
/// them on despawn or collision. Thin gameplay glue around the motion core.
pub struct ObstacleField {
    config: ObstacleConfig,
    rng: StdRng,
    timer: f32,
    obstacles: Vec<Obstacle>,
    spawned: u64,
    destroyed: u64,
}

impl ObstacleField {
    pub fn new(config: ObstacleConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            timer: 0.0,
            obstacles: Vec::new(),
            spawned: 0,
            destroyed: 0,
        }
    }

    pub fn tick(&mut self, dt: f32, saber_position: Vec3) {
        self.timer += dt;
        if self.timer >= self.config.spawn_interval {
            self.spawn();
            self.timer = 0.0;
        }

        let step = Vec3::NEG_X * (self.config.movement_speed * dt);
        for obstacle in &mut self.obstacles {
            obstacle.position += step;
        }

        let mut i = 0;
        while i < self.obstacles.len() {
            let obstacle = self.obstacles[i];
            if obstacle.position.x < self.config.despawn_x {
                self.obstacles.swap_remove(i);
                continue;
            }
            if obstacle.position.distance(saber_position) <= self.config.collision_radius {
                debug!(
                    "obstacle kind {} sliced at {:?}",
                    obstacle.kind, obstacle.position
                );
                self.destroyed += 1;
                self.obstacles.swap_remove(i);
                continue;
            }
            i += 1;
        }
    }

    fn spawn(&mut self) {
        if self.config.spawn_points.is_empty() {
            return;
        }
        let point = self.config.spawn_points
            [self.rng.gen_range(0..self.config.spawn_points.len())];
        let kind = self.rng.gen_range(0..self.config.kinds.max(1));
        self.obstacles.push(Obstacle {
            position: point,
            kind,
        });
        self.spawned += 1;
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn active(&self) -> usize {
        self.obstacles.len()
    }

    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    pub fn destroyed(&self) -> u64 {
        self.destroyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_config() -> ObstacleConfig {
        ObstacleConfig {
            spawn_interval: 1.0,
            seed: Some(7),
            ..ObstacleConfig::default()
        }
    }

    // Saber far away from every obstacle path.
    const NO_SABER: Vec3 = Vec3::new(100.0, 100.0, 0.0);

    #[test]
    fn spawns_on_the_configured_cadence() {
        let mut field = ObstacleField::new(test_config());
        field.tick(0.5, NO_SABER);
        assert_eq!(field.active(), 0);
        field.tick(0.5, NO_SABER);
        assert_eq!(field.active(), 1);
        field.tick(1.0, NO_SABER);
        assert_eq!(field.spawned(), 2);
    }

    #[test]
    fn obstacles_move_left_at_configured_speed() {
        let mut field = ObstacleField::new(test_config());
        field.tick(1.0, NO_SABER);
        let x_after_spawn = field.obstacles()[0].position.x;
        field.tick(0.5, NO_SABER);
        // One spawn already happened; this tick only moves it.
        assert_relative_eq!(field.obstacles()[0].position.x, x_after_spawn - 2.5);
    }

    #[test]
    fn obstacles_despawn_past_the_boundary() {
        let mut field = ObstacleField::new(test_config());
        field.tick(1.0, NO_SABER);
        assert_eq!(field.active(), 1);
        // 6.0 -> below -4.0 takes just over 2 seconds at speed 5; tick in
        // sub-interval steps so only one more spawn fires.
        for _ in 0..4 {
            field.tick(0.6, NO_SABER);
        }
        assert!(field.obstacles().iter().all(|o| o.position.x >= -4.0));
        assert!(field.active() < field.spawned() as usize);
    }

    #[test]
    fn collision_destroys_and_counts() {
        let config = ObstacleConfig {
            spawn_points: vec![Vec3::new(1.0, 0.0, 0.0)],
            spawn_interval: 1.0,
            movement_speed: 1.0,
            seed: Some(7),
            ..ObstacleConfig::default()
        };
        let mut field = ObstacleField::new(config);
        field.tick(1.0, NO_SABER);
        assert_eq!(field.active(), 1);

        // Saber sits right on the obstacle's path.
        let saber = field.obstacles()[0].position;
        field.tick(0.01, saber);
        assert_eq!(field.active(), 0);
        assert_eq!(field.destroyed(), 1);
    }

    #[test]
    fn empty_spawn_points_never_panics() {
        let config = ObstacleConfig {
            spawn_points: Vec::new(),
            spawn_interval: 0.5,
            ..ObstacleConfig::default()
        };
        let mut field = ObstacleField::new(config);
        field.tick(2.0, NO_SABER);
        assert_eq!(field.active(), 0);
    }
}
