use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, MarkerShape, Plot, PlotPoints, Points};

use crate::data::model::{Peak, SegmentAnalysis};
use crate::state::{AppState, PlotView};

const FIRST_HALF_COLOR: Color32 = Color32::LIGHT_BLUE;
const SECOND_HALF_COLOR: Color32 = Color32::LIGHT_RED;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the active plot view in the central panel.
pub fn analysis_plot(ui: &mut Ui, state: &AppState) {
    if state.ready_files().is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open .par files to analyze  (File → Open…)");
        });
        return;
    }

    match state.view {
        PlotView::Overlay => overlay_plot(ui, state),
        _ => segment_plot(ui, state),
    }
}

// ---------------------------------------------------------------------------
// Overlay – every file's selected segment
// ---------------------------------------------------------------------------

fn overlay_plot(ui: &mut Ui, state: &AppState) {
    Plot::new("cv_overlay")
        .legend(Legend::default())
        .x_axis_label("Voltage (V)")
        .y_axis_label("Current (A)")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for par in state.ready_files() {
                let segment = par.selected_segment;
                let points = line_points(&par.voltages[segment], &par.currents[segment]);
                let line = Line::new(points)
                    .name(format!("{} #{segment}", par.filename))
                    .color(state.color_map.color_for(&par.filename))
                    .width(1.5);
                plot_ui.line(line);
            }
        });
}

// ---------------------------------------------------------------------------
// Per-segment detail views
// ---------------------------------------------------------------------------

fn segment_plot(ui: &mut Ui, state: &AppState) {
    let Some(par) = state.active_file() else {
        return;
    };
    let segment = par.selected_segment;
    let Some(analysis) = par.analysis(segment) else {
        return;
    };

    let y_label = match state.view {
        PlotView::LogScale | PlotView::Tafel => "log10(|I| mA)",
        _ => "Current (A)",
    };

    Plot::new("cv_segment")
        .legend(Legend::default())
        .x_axis_label("Voltage (V)")
        .y_axis_label(y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| match state.view {
            PlotView::SplitHalf => {
                half_cycle_lines(plot_ui, analysis);
            }
            PlotView::Peaks => {
                half_cycle_lines(plot_ui, analysis);
                if let Some(peak) = analysis.cathodic_peak {
                    plot_ui.points(peak_marker(peak, FIRST_HALF_COLOR));
                }
                if let Some(peak) = analysis.anodic_peak {
                    plot_ui.points(peak_marker(peak, SECOND_HALF_COLOR));
                }
            }
            PlotView::LogScale => {
                let points = scatter_points(
                    &analysis.second_half.voltages,
                    &analysis.log_currents,
                );
                plot_ui.points(
                    Points::new(points)
                        .name(format!("{} #{segment} log", par.filename))
                        .shape(MarkerShape::Square)
                        .radius(2.0)
                        .color(FIRST_HALF_COLOR),
                );
            }
            PlotView::Tafel => {
                let cathodic =
                    scatter_points(&analysis.cathodic.voltages, &analysis.cathodic.log_currents);
                let anodic =
                    scatter_points(&analysis.anodic.voltages, &analysis.anodic.log_currents);
                plot_ui.points(
                    Points::new(cathodic)
                        .name("Cathodic")
                        .radius(2.5)
                        .color(FIRST_HALF_COLOR),
                );
                plot_ui.points(
                    Points::new(anodic)
                        .name("Anodic")
                        .radius(2.5)
                        .color(SECOND_HALF_COLOR),
                );
            }
            PlotView::Overlay => {}
        });
}

fn half_cycle_lines(plot_ui: &mut egui_plot::PlotUi, analysis: &SegmentAnalysis) {
    let first = line_points(&analysis.first_half.voltages, &analysis.first_half.currents);
    let second = line_points(
        &analysis.second_half.voltages,
        &analysis.second_half.currents,
    );
    plot_ui.line(Line::new(first).name("First half").color(FIRST_HALF_COLOR).width(1.5));
    plot_ui.line(
        Line::new(second)
            .name("Second half")
            .color(SECOND_HALF_COLOR)
            .width(1.5),
    );
}

fn peak_marker(peak: Peak, color: Color32) -> Points<'static> {
    Points::new(PlotPoints::from(vec![[peak.voltage, peak.current]]))
        .name(format!("V: {}, I: {}", peak.voltage, peak.current))
        .shape(MarkerShape::Circle)
        .radius(5.0)
        .color(color)
}

// ---------------------------------------------------------------------------
// Point construction
// ---------------------------------------------------------------------------

fn line_points(xs: &[f64], ys: &[f64]) -> PlotPoints<'static> {
    xs.iter().zip(ys.iter()).map(|(&x, &y)| [x, y]).collect()
}

/// Scatter points, skipping non-finite samples (a zero current maps to
/// -inf in the log transform, which cannot be placed on screen).
fn scatter_points(xs: &[f64], ys: &[f64]) -> PlotPoints<'static> {
    xs.iter()
        .zip(ys.iter())
        .filter(|(_, y)| y.is_finite())
        .map(|(&x, &y)| [x, y])
        .collect()
}
