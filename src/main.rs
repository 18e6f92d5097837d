use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use glam::{Quat, Vec3};
use log::{error, info, warn};
use tokio::time::{interval, Duration};

use saber_motion_rs::config::AppConfig;
use saber_motion_rs::driver::FrameDriver;
use saber_motion_rs::game::ObstacleField;
use saber_motion_rs::saber::Saber;
use saber_motion_rs::serial_link::{spawn_mock_feed, SerialReceiver, SharedLineBuffer};
use saber_motion_rs::status::{current_timestamp, LiveStatus};

const STATUS_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "saber_motion")]
#[command(about = "Serial IMU driven saber prop with obstacle gameplay", long_about = None)]
struct Args {
    /// Duration in seconds (0 = continuous)
    #[arg(value_name = "SECONDS", default_value = "0")]
    duration: u64,

    /// Path to a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial port override
    #[arg(long)]
    port: Option<String>,

    /// Baud rate override
    #[arg(long)]
    baud: Option<u32>,

    /// Frame rate in Hz
    #[arg(long, default_value = "60")]
    tick_hz: u32,

    /// Replace the serial link with a synthetic sensor feed
    #[arg(long)]
    mock: bool,

    /// Output directory for live status
    #[arg(long, default_value = "saber_sessions")]
    output_dir: PathBuf,
}

enum KeyCommand {
    Calibrate,
    Quit,
    None,
}

fn poll_keys(calibrate_key: char) -> Result<KeyCommand> {
    let mut command = KeyCommand::None;
    while event::poll(Duration::ZERO)? {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(KeyCommand::Quit);
                }
                KeyCode::Char('q') | KeyCode::Esc => return Ok(KeyCommand::Quit),
                KeyCode::Char(ch) if ch.eq_ignore_ascii_case(&calibrate_key) => {
                    command = KeyCommand::Calibrate;
                }
                _ => {}
            }
        }
    }
    Ok(command)
}

fn snapshot(
    driver: &FrameDriver,
    field: &ObstacleField,
    start: Instant,
    start_time: &str,
    serial_connected: bool,
    calibrations: u64,
) -> LiveStatus {
    let saber = driver.saber();
    LiveStatus {
        timestamp: current_timestamp(),
        start_time: start_time.to_string(),
        uptime_seconds: start.elapsed().as_secs(),
        serial_connected,
        samples_accepted: driver.samples_accepted(),
        parse_failures: driver.parse_failures(),
        calibrations,
        position: saber.position(),
        rotation: saber.rotation(),
        yaw_angle: saber.yaw_angle(),
        roll_angle: saber.roll_angle(),
        offset: saber.offset(),
        obstacles_active: field.active(),
        obstacles_spawned: field.spawned(),
        obstacles_destroyed: field.destroyed(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(port) = &args.port {
        config.serial.port = port.clone();
    }
    if let Some(baud) = args.baud {
        config.serial.baud_rate = baud;
    }

    info!(
        "saber motion starting: port={} baud={} tick={}Hz duration={}s",
        config.serial.port, config.serial.baud_rate, args.tick_hz, args.duration
    );

    std::fs::create_dir_all(&args.output_dir)?;
    let status_path = args.output_dir.join("live_status.json");

    let buffer = SharedLineBuffer::new();
    let mut receiver = None;
    if args.mock {
        spawn_mock_feed(buffer.clone());
    } else {
        match SerialReceiver::open(&config.serial.port, config.serial.baud_rate, buffer.clone()) {
            Ok(mut opened) => {
                opened.start();
                receiver = Some(opened);
            }
            // A missing device disables ingestion; the game keeps running
            // on stale (zero) sensor data.
            Err(e) => error!("{e}; continuing without sensor input"),
        }
    }

    let saber = Saber::new(config.saber.clone(), Vec3::ZERO, Quat::IDENTITY);
    let mut driver = FrameDriver::new(buffer, saber);
    let mut field = ObstacleField::new(config.obstacles.clone());

    let raw_input = match enable_raw_mode() {
        Ok(()) => true,
        Err(e) => {
            warn!("no interactive terminal ({e}); calibrate key disabled");
            false
        }
    };

    let start = Instant::now();
    let start_time = chrono::Utc::now().to_rfc3339();
    let mut calibrations = 0u64;
    let tick_hz = args.tick_hz.max(1);
    let mut ticker = interval(Duration::from_secs_f64(1.0 / f64::from(tick_hz)));
    let mut last_tick = Instant::now();
    let mut last_status = Instant::now();

    'frame: loop {
        ticker.tick().await;
        let now = Instant::now();
        let dt = now.duration_since(last_tick).as_secs_f32();
        last_tick = now;

        if args.duration > 0 && start.elapsed().as_secs() >= args.duration {
            info!("duration reached, stopping");
            break 'frame;
        }

        if raw_input {
            match poll_keys(config.calibrate_key)? {
                KeyCommand::Quit => break 'frame,
                KeyCommand::Calibrate => {
                    driver.saber_mut().calibrate();
                    calibrations += 1;
                }
                KeyCommand::None => {}
            }
        }

        driver.tick(dt);
        field.tick(dt, driver.saber().position());

        if last_status.elapsed() >= STATUS_INTERVAL {
            let serial_connected =
                args.mock || receiver.as_ref().is_some_and(|r| r.is_reading());
            let status = snapshot(
                &driver,
                &field,
                start,
                &start_time,
                serial_connected,
                calibrations,
            );
            if let Err(e) = status.save(&status_path) {
                warn!("could not write {}: {e}", status_path.display());
            }
            last_status = now;
        }
    }

    let serial_connected = args.mock || receiver.as_ref().is_some_and(|r| r.is_reading());
    let status = snapshot(
        &driver,
        &field,
        start,
        &start_time,
        serial_connected,
        calibrations,
    );
    if let Err(e) = status.save(&status_path) {
        warn!("could not write {}: {e}", status_path.display());
    }

    if let Some(mut receiver) = receiver {
        receiver.close().await;
    }
    if raw_input {
        let _ = disable_raw_mode();
    }

    info!(
        "session ended: {} samples accepted, {} parse failures, {} obstacles destroyed",
        driver.samples_accepted(),
        driver.parse_failures(),
        field.destroyed()
    );
    Ok(())
}
