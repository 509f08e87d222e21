use std::{error::Error, path::Path};

use gnuplot::{AutoOption::Fix, AxesCommon, Figure, PlotOption::Caption};

use crate::sim::SimulationResult;

// One miss ratio curve per simulated policy
pub fn draw_lines(results: &[SimulationResult], path: &Path) -> Result<(), Box<dyn Error>> {
    let mut fg = Figure::new();

    let width = 1920;
    let height = 1080;

    fg.set_title("Miss ratio curve");
    let axes = fg.axes2d();
    axes.set_x_grid(true)
        .set_y_grid(true)
        .set_y_range(Fix(0.0), Fix(1.0))
        .set_x_label("Cache size (bytes)", &[])
        .set_y_label("Miss ratio", &[]);
    for result in results {
        axes.lines(
            result.points.iter().map(|(x, _)| *x),
            result.points.iter().map(|(_, y)| *y),
            &[Caption(result.label.as_str())],
        );
    }
    fg.save_to_png(path, width, height)
        .map_err(|e| format!("failed to render {}: {e:?}", path.display()))?;
    Ok(())
}
