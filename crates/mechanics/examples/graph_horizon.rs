use mechanics::{BicycleState, HorizonSimulator, PredictedPath, VehicleModelParams};
use plotters::prelude::*;
use simcore::{IntegrationScheme, RungeKutta4};

fn draw_paths(
    filename: &str,
    title: &str,
    paths: &[(String, PredictedPath)],
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(filename, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for (_, path) in paths {
        if let Some((a, b, c, d)) = path.extent() {
            x_min = x_min.min(a);
            x_max = x_max.max(b);
            y_min = y_min.min(c);
            y_max = y_max.max(d);
        }
    }

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("Arial", 28))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min - 0.1..x_max + 0.1, y_min - 0.1..y_max + 0.1)?;

    chart.configure_mesh().x_desc("x [m]").y_desc("y [m]").draw()?;

    for (i, (label, path)) in paths.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(path.points(), &color))?
            .label(label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));
    }

    chart.configure_series_labels().border_style(&BLACK).draw()?;

    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let params = VehicleModelParams::default();
    // Long horizon so the steering lag is visible.
    let euler = HorizonSimulator::new(params, 50, 5.0)?;
    let rk4 = euler.with_integrator(RungeKutta4);

    // 1) Constant steering commands, starting straight.
    let mut sweep = Vec::new();
    for command_deg in [-20.0f64, -10.0, 0.0, 10.0, 20.0] {
        let controls = vec![command_deg.to_radians(); euler.steps()];
        let path = euler.simulate(&BicycleState::zeros(), &controls);
        sweep.push((format!("u = {command_deg:+.0} deg"), path));
    }

    draw_paths(
        "horizon_steering_sweep.png",
        "Predicted Path vs Steering Command",
        &sweep,
    )?;

    // 2) Explicit Euler against RK4 for a hard turn.
    let controls = vec![25.0f64.to_radians(); euler.steps()];
    let comparison = vec![
        (
            format!("{:?}", IntegrationScheme::ExplicitEuler),
            euler.simulate(&BicycleState::zeros(), &controls),
        ),
        (
            format!("{:?}", IntegrationScheme::RungeKutta4),
            rk4.simulate(&BicycleState::zeros(), &controls),
        ),
    ];

    draw_paths(
        "horizon_integrator_comparison.png",
        "Explicit Euler vs RK4",
        &comparison,
    )?;

    println!(
        "Wrote plots: horizon_steering_sweep.png, horizon_integrator_comparison.png"
    );

    Ok(())
}
