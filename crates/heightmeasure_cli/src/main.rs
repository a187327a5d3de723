//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `heightmeasure_core` linkage.
//! - Replay one scripted two-point measurement and print its CSV export.

use heightmeasure_core::{
    ControllerConfig, MeasurementController, Point3D, RecordStore, ScreenPoint,
};
use std::error::Error;
use std::time::Instant;

const FEET: Point3D = Point3D::new(0.0, 0.0, -1.2);
const HEAD: Point3D = Point3D::new(0.02, 1.75, -1.2);

fn main() -> Result<(), Box<dyn Error>> {
    println!("heightmeasure_core ping={}", heightmeasure_core::ping());
    println!("heightmeasure_core version={}", heightmeasure_core::core_version());

    let mut controller =
        MeasurementController::new(RecordStore::in_memory(), ControllerConfig::default());
    controller.set_viewport(390.0, 844.0);

    let now = Instant::now();
    let mut scripted = [FEET, HEAD].into_iter();
    for _ in 0..2 {
        let hit = scripted.next();
        let adapter = move |_: ScreenPoint| hit;
        controller.add_point_from(&adapter, now)?;
    }

    if let Some((centimeters, feet_inches)) = controller.measurement_labels() {
        println!("height={centimeters} ({feet_inches})");
    }
    controller.save_measurement(None, Some("cli smoke".to_string()), now)?;

    print!("{}", controller.store().export_csv()?);
    Ok(())
}
