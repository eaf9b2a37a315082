//! Position and attitude resolution tool
//!
//! Resolves Earth from the built-in VSOP87 series over a range of dates and
//! prints its state in the chosen working frame, followed by a ranking of a
//! few bodies against the camera.
//!
//! Usage:
//!   cargo run --bin resolve_info -- [--start JD] [--days N] [--step D] [--low] [--frame NAME]

use std::sync::Arc;
use std::time::Instant;

use clap::{ArgAction, Parser, ValueEnum};
use log::info;
use nalgebra::{UnitQuaternion, Vector3};
use starframe::attitude::{AttitudeSample, AttitudeServer};
use starframe::constants::{AU_KM, RAD2DEG};
use starframe::coordinates::Spherical;
use starframe::ranking::RankingPass;
use starframe::series::vsop87;
use starframe::{
    set_global_accuracy, AccuracyMode, BodyDescriptor, Frame, JulianDate,
    PositionAttitudeResolver, ResolverConfig,
};

/// Type alias for the error type used throughout this binary
type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum WorkingFrame {
    Render,
    Ecliptic,
    Equatorial,
    Galactic,
}

impl From<WorkingFrame> for Frame {
    fn from(frame: WorkingFrame) -> Self {
        match frame {
            WorkingFrame::Render => Frame::Render,
            WorkingFrame::Ecliptic => Frame::EclipticJ2000,
            WorkingFrame::Equatorial => Frame::EquatorialJ2000,
            WorkingFrame::Galactic => Frame::Galactic,
        }
    }
}

/// Position and attitude resolution tool
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Resolves body positions and attitudes and ranks them by camera distance",
    long_about = None
)]
struct Args {
    /// First Julian date to resolve
    #[arg(long, default_value_t = 2_451_545.0)]
    start: f64,

    /// Number of days to cover
    #[arg(long, default_value_t = 365.0)]
    days: f64,

    /// Step between resolved dates, in days
    #[arg(long, default_value_t = 30.0)]
    step: f64,

    /// Use the low accuracy series mode
    #[arg(long, action = ArgAction::SetTrue)]
    low: bool,

    /// Working frame of the printed vectors
    #[arg(long, value_enum, default_value_t = WorkingFrame::Render)]
    frame: WorkingFrame,

    /// Camera position in the working frame, in AU
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    camera: Option<Vec<f64>>,
}

impl Args {
    /// Number of steps after the start date
    fn step_count(&self) -> Result<usize> {
        if !(self.step.is_finite() && self.step > 0.0) {
            let message = format!("--step must be a positive number of days, got {}", self.step);
            return Err(message.into());
        }
        if !self.days.is_finite() {
            return Err(format!("--days must be finite, got {}", self.days).into());
        }
        Ok((self.days / self.step).floor().max(0.0) as usize)
    }
}

/// Prints a section header with a title and separator line
fn print_section_header(title: &str) {
    println!("\n{}:", title);
    println!("-------------------------------------------------------");
}

fn demo_spacecraft(start: JulianDate) -> Result<BodyDescriptor> {
    let attitude = AttitudeServer::new(vec![
        AttitudeSample::new(start, UnitQuaternion::identity()),
        AttitudeSample::new(
            start + 10.0,
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::PI),
        ),
    ])?;
    Ok(BodyDescriptor::fixed("spacecraft", Vector3::new(1.2, 0.0, 0.0), Frame::EclipticJ2000)
        .with_attitude(Arc::new(attitude)))
}

fn display_states(
    resolver: &PositionAttitudeResolver,
    args: &Args,
    camera: &Vector3<f64>,
) -> Result<()> {
    print_section_header(&format!("Earth in {} frame", resolver.working_frame()));
    println!(
        "{:>14} {:>12} {:>12} {:>12} {:>11} {:>10}",
        "JD", "x (AU)", "y (AU)", "z (AU)", "r (AU)", "v (km/s)"
    );

    let earth = BodyDescriptor::series("Earth", vsop87::earth());
    let steps = args.step_count()?;
    let timer = Instant::now();
    for i in 0..=steps {
        let time = JulianDate::new(args.start + i as f64 * args.step);
        let resolved = resolver.resolve(&earth, time, camera)?;
        let p = resolved.state.position;
        let speed = resolved.state.velocity.norm() * AU_KM / 86_400.0;
        println!(
            "{:>14.4} {:>12.8} {:>12.8} {:>12.8} {:>11.8} {:>10.4}",
            time.jd(),
            p.x,
            p.y,
            p.z,
            p.norm(),
            speed
        );
    }
    info!("Resolved {} dates in {:?}", steps + 1, timer.elapsed());

    let ecliptic = PositionAttitudeResolver::new(
        resolver.config().with_working_frame(Frame::EclipticJ2000),
    );
    let at_start = ecliptic.resolve(&earth, JulianDate::new(args.start), camera)?;
    let lbr = Spherical::from_cartesian(&at_start.state.position);
    println!(
        "\nHeliocentric ecliptic at start: L = {:.6}°, B = {:.6}°, R = {:.8} AU",
        lbr.lon * RAD2DEG,
        lbr.lat * RAD2DEG,
        lbr.radius
    );
    Ok(())
}

fn display_ranking(
    resolver: &PositionAttitudeResolver,
    args: &Args,
    camera: &Vector3<f64>,
) -> Result<()> {
    let start = JulianDate::new(args.start);
    let bodies = vec![
        BodyDescriptor::series("Earth", vsop87::earth()),
        BodyDescriptor::fixed("Sun", Vector3::zeros(), Frame::EclipticJ2000),
        BodyDescriptor::fixed("galactic marker", Vector3::new(0.0, 0.0, 2.0), Frame::Galactic),
        demo_spacecraft(start)?,
    ];

    let resolved: Vec<_> = resolver
        .resolve_all(&bodies, start + 5.0, camera)
        .into_iter()
        .filter_map(|r| r.ok())
        .collect();
    let pass = RankingPass::from_keys(&resolved, |b| b.rank_key);

    print_section_header("Near to far");
    for (rank, body) in pass.near_first().iter().enumerate() {
        let attitude = body
            .attitude
            .map(|a| format!("{:.2}° about axis", a.orientation.angle() * RAD2DEG))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>2}. {:<16} {:>12.6} AU   attitude {}",
            rank + 1,
            body.name,
            body.rank_key,
            attitude
        );
    }

    print_section_header("Far to near");
    let names: Vec<&str> = pass.far_first().iter().map(|b| b.name.as_str()).collect();
    println!("{}", names.join(", "));
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    args.step_count()?;

    let mode = if args.low { AccuracyMode::Low } else { AccuracyMode::High };
    set_global_accuracy(mode);

    let config = ResolverConfig::default()
        .with_global_accuracy()
        .with_working_frame(args.frame.into());
    let resolver = PositionAttitudeResolver::new(config);

    let camera = match args.camera.as_deref() {
        Some([x, y, z]) => Vector3::new(*x, *y, *z),
        _ => Vector3::zeros(),
    };
    info!("Accuracy {:?}, camera at {:?}", mode, camera);

    display_states(&resolver, &args, &camera)?;
    display_ranking(&resolver, &args, &camera)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_count() {
        let args = Args::try_parse_from(["resolve_info", "--days", "90", "--step", "30"]).unwrap();
        assert_eq!(args.step_count().unwrap(), 3);

        let args = Args::try_parse_from(["resolve_info", "--days=-5"]).unwrap();
        assert_eq!(args.step_count().unwrap(), 0);
    }

    #[test]
    fn test_non_positive_step_rejected() {
        for step in ["--step=0", "--step=-1", "--step=NaN"] {
            let args = Args::try_parse_from(["resolve_info", step]).unwrap();
            assert!(args.step_count().is_err(), "step {} accepted", step);
        }
        let args = Args::try_parse_from(["resolve_info", "--days=inf"]).unwrap();
        assert!(args.step_count().is_err());
    }
}
