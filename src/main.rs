use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use rs_cartesian_servo::adapter::KinematicsAdapter;
use rs_cartesian_servo::config::ServoConfig;
use rs_cartesian_servo::controller::{Controller, JointCommand, JointFeedback};
use rs_cartesian_servo::kinematic_traits::{Joints, Pose};
use rs_cartesian_servo::kinematics_impl::URKinematics;
use rs_cartesian_servo::parameters::ur_kinematics::Parameters;
use rs_cartesian_servo::pose_queue::PoseQueue;
use rs_cartesian_servo::selector::select;
use rs_cartesian_servo::simulation::SimulatedArm;
use rs_cartesian_servo::trajectory::{GoTrigger, LoggingClient, TrajectoryBuffer};
use rs_cartesian_servo::transform_buffer::TransformBuffer;
use rs_cartesian_servo::utils::{dump_joints, dump_solutions, format_pose, pose_from_parts};

/// Where the simulated arm starts.
const START: Joints = [0.3, -1.2, 1.4, -0.8, 1.1, 0.5];

#[derive(Parser)]
#[command(name = "rs-cartesian-servo", version, about = "Cartesian servo controller for UR arms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve inverse kinematics for one pose of ee_link in base_link
    Solve {
        /// Robot preset (ur3, ur5, ur10, ur5e)
        #[arg(long, default_value = "ur5")]
        robot: String,
        /// YAML configuration, its robot section overrides --robot
        #[arg(long)]
        config: Option<PathBuf>,
        /// x y z qx qy qz qw
        #[arg(long, num_args = 7, allow_hyphen_values = true, required = true)]
        pose: Vec<f64>,
        /// Previous joints in radians, the nearest solution is selected
        #[arg(long, num_args = 6, allow_hyphen_values = true)]
        seed: Option<Vec<f64>>,
    },
    /// Run the controller against a simulated arm
    Simulate {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 5.0)]
        seconds: f64,
        /// Target as x,y,z,qx,qy,qz,qw, may repeat
        #[arg(long, value_parser = parse_target, allow_hyphen_values = true)]
        target: Vec<Pose>,
        /// Probability that a pose broadcast of the simulated arm is lost
        #[arg(long, default_value_t = 0.0)]
        dropout: f64,
        /// At the end, send the final joints as a trajectory goal (logged only)
        #[arg(long)]
        go: bool,
    },
}

fn parse_target(text: &str) -> Result<Pose, String> {
    let values: Vec<f64> = text
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("'{}': {}", v, e)))
        .collect::<Result<_, _>>()?;
    if values.len() != 7 {
        return Err(format!("expected 7 comma separated values, got {}", values.len()));
    }
    Ok(pose_from_parts([values[0], values[1], values[2]], [values[3], values[4], values[5], values[6]]))
}

fn load_config(config: Option<&PathBuf>) -> Result<ServoConfig> {
    match config {
        Some(path) => ServoConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to read configuration {}", path.display())),
        None => Ok(ServoConfig::default()),
    }
}

fn solve(robot: &str, config: Option<&PathBuf>, pose: &[f64], seed: Option<&[f64]>) -> Result<()> {
    let parameters = match config {
        Some(_) => load_config(config)?.robot,
        None => Parameters::by_name(robot).with_context(|| format!("Unknown robot '{}'", robot))?,
    };
    let solver = URKinematics::new(parameters);
    debug!("Robot parameters {:?}", solver.parameters());
    let adapter = KinematicsAdapter::new(Arc::new(solver));
    let target = pose_from_parts([pose[0], pose[1], pose[2]], [pose[3], pose[4], pose[5], pose[6]]);

    let candidates = adapter.solve(&target);
    println!("Solutions for {} (degrees):", format_pose(&target));
    dump_solutions(&candidates);

    let seed: Joints = match seed {
        Some(values) => <Joints>::try_from(values).context("Seed must have 6 values")?,
        None => [0.0; 6],
    };
    if let Some(selected) = select(&candidates, &seed) {
        println!("Selected:");
        dump_joints(&selected);
    }
    Ok(())
}

/// Run time of the simulation, finite and not negative.
fn checked_run_time(seconds: f64) -> Result<Duration> {
    if !(seconds.is_finite() && seconds >= 0.0) {
        bail!("Seconds must be a finite, non-negative number, got {}", seconds);
    }
    Duration::try_from_secs_f64(seconds).with_context(|| format!("Run time {} s is too long", seconds))
}

fn simulate(config: Option<&PathBuf>, seconds: f64, targets: Vec<Pose>, dropout: f64, go: bool)
            -> Result<()> {
    if !(0.0..=1.0).contains(&dropout) {
        bail!("Dropout must be between 0 and 1, got {}", dropout);
    }
    let run_time = checked_run_time(seconds)?;
    let config = load_config(config)?;
    let settings = config.controller;
    let adapter = KinematicsAdapter::new(Arc::new(URKinematics::new(config.robot)));
    let transforms = Arc::new(TransformBuffer::new(settings.max_transform_age));
    let feedback = JointFeedback::new();
    let queue = PoseQueue::new();

    let mut arm = SimulatedArm::new(adapter.clone(), transforms.clone(), feedback.clone(), START)
        .with_dropout(dropout, 42)
        .with_frames(&settings.base_frame, &settings.ee_frame);
    arm.broadcast();
    let start = arm.pose();
    info!("Simulated arm starts at {}", format_pose(&start));

    let targets = if targets.is_empty() {
        let mut up = start;
        up.translation.vector.z += 0.05;
        let mut aside = up;
        aside.translation.vector.y += 0.05;
        vec![up, aside]
    } else {
        targets
    };

    let stop = Arc::new(AtomicBool::new(false));
    let (sender, receiver) = mpsc::channel::<JointCommand>();

    let controller_stop = stop.clone();
    // New targets discard whatever was assembled for the go trigger.
    let trajectory = TrajectoryBuffer::new();
    let mut controller = Controller::new(settings, transforms, queue.clone(), adapter, feedback)
        .context("Invalid controller configuration")?
        .with_trajectory_buffer(trajectory.clone());
    let controller_thread = thread::spawn(move || {
        let mut sender = sender;
        controller.run(&mut sender, &controller_stop);
    });

    let arm_stop = stop.clone();
    let arm_thread = thread::spawn(move || {
        while !arm_stop.load(Ordering::Relaxed) {
            if let Ok(command) = receiver.recv_timeout(Duration::from_millis(50)) {
                arm.apply(&command);
            }
        }
        arm
    });

    // Spread targets over the run.
    let spacing = run_time / (targets.len() as u32 + 1);
    let producer_stop = stop.clone();
    let producer = thread::spawn(move || {
        for target in targets {
            if producer_stop.load(Ordering::Relaxed) {
                break;
            }
            info!("Enqueuing {}", format_pose(&target));
            queue.enqueue(target);
            thread::sleep(spacing);
        }
    });

    thread::sleep(run_time);
    stop.store(true, Ordering::Relaxed);
    producer.join().map_err(|_| anyhow::anyhow!("Target producer panicked"))?;
    controller_thread.join().map_err(|_| anyhow::anyhow!("Controller panicked"))?;
    let arm = arm_thread.join().map_err(|_| anyhow::anyhow!("Simulated arm panicked"))?;

    println!("Final pose: {}", format_pose(&arm.pose()));
    println!("Final joints (degrees):");
    dump_joints(&arm.joints());

    if go {
        trajectory.push(arm.joints(), Duration::ZERO);
        let mut trigger = GoTrigger::new(trajectory, Box::new(LoggingClient::default()));
        trigger.on_go(true);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Solve { robot, config, pose, seed } => {
            solve(&robot, config.as_ref(), &pose, seed.as_deref())
        }
        Commands::Simulate { config, seconds, target, dropout, go } => {
            simulate(config.as_ref(), seconds, target, dropout, go)
        }
    }
}
