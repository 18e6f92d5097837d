// Motion-controlled saber prop core
// Serial IMU ingestion -> orientation/offset integration -> obstacle gameplay

pub mod config;
pub mod driver;
pub mod game;
pub mod parser;
pub mod saber;
pub mod serial_link;
pub mod status;

pub use config::AppConfig;
pub use driver::FrameDriver;
pub use game::{Obstacle, ObstacleConfig, ObstacleField};
pub use parser::{parse_line, ParseError, SensorVectors};
pub use saber::{Axis, Saber, SaberConfig};
pub use serial_link::{SerialError, SerialReceiver, SharedLineBuffer};
pub use status::LiveStatus;
