//! Render the synthesized motion-law channels to motion_law.png.

use camcore::CamParams;
use motion::synthesize;
use plotters::coord::Shift;
use plotters::prelude::*;

fn draw_channel<DB>(
    area: &DrawingArea<DB, Shift>,
    caption: &str,
    series: &[(f64, f64)],
    color: &RGBColor,
) -> Result<(), Box<dyn std::error::Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (lo, hi) = series
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| {
            (lo.min(y), hi.max(y))
        });
    let pad = ((hi - lo) * 0.05).max(1e-6);
    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 18))
        .margin(8)
        .x_label_area_size(24)
        .y_label_area_size(56)
        .build_cartesian_2d(0.0..360.0, (lo - pad)..(hi + pad))?;
    chart.configure_mesh().draw()?;
    chart.draw_series(LineSeries::new(series.iter().copied(), color))?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let params = CamParams::default();
    let table = synthesize(&params)?;

    let x: Vec<(f64, f64)> = table
        .samples
        .iter()
        .map(|s| (s.theta_deg, s.x_mm))
        .collect();
    let v: Vec<(f64, f64)> = table
        .samples
        .iter()
        .map(|s| (s.theta_deg, s.v_mm_per_omega))
        .collect();
    let a: Vec<(f64, f64)> = table
        .samples
        .iter()
        .map(|s| (s.theta_deg, s.a_mm_per_omega2))
        .collect();

    let root = BitMapBackend::new("motion_law.png", (1280, 960)).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((3, 1));
    draw_channel(&areas[0], "displacement (mm)", &x, &BLUE)?;
    draw_channel(&areas[1], "velocity (mm per unit rate)", &v, &GREEN)?;
    draw_channel(&areas[2], "acceleration (mm per unit rate squared)", &a, &RED)?;
    root.present()?;

    println!("Wrote motion_law.png");
    Ok(())
}
