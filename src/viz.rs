//! Correlation heatmap rendering using Plotters

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use ndarray::Array2;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::ExplorerError;

/// Endpoints and midpoint of the diverging palette (cool to warm)
const COOL: RGBColor = RGBColor(59, 76, 192);
const NEUTRAL: RGBColor = RGBColor(221, 221, 221);
const WARM: RGBColor = RGBColor(180, 4, 38);

/// Fill for undefined correlations
const UNDEFINED: RGBColor = RGBColor(200, 200, 200);

/// Map a correlation in [-1, 1] onto the diverging palette
pub fn diverging_color(r: f64) -> RGBColor {
    let t = ((r.clamp(-1.0, 1.0) + 1.0) / 2.0).clamp(0.0, 1.0);
    let (from, to, t) = if t < 0.5 {
        (COOL, NEUTRAL, t * 2.0)
    } else {
        (NEUTRAL, WARM, (t - 0.5) * 2.0)
    };
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

/// Render an annotated correlation heatmap and encode it as PNG
///
/// # Arguments
/// * `names` - Column names, in matrix order
/// * `matrix` - Square correlation matrix; NaN cells are drawn grey without a value
/// * `size` - Image width and height in pixels
///
/// # Returns
/// * PNG bytes
pub fn render_correlation_heatmap(
    names: &[String],
    matrix: &Array2<f64>,
    size: (u32, u32),
) -> crate::Result<Vec<u8>> {
    let (width, height) = size;
    let mut pixels = vec![0u8; width as usize * height as usize * 3];

    {
        let root = BitMapBackend::with_buffer(&mut pixels, size).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;

        let n = names.len();
        let span = n.max(1) as f64;

        let mut chart = ChartBuilder::on(&root)
            .caption("Matrice de corrélation", ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(120)
            .build_cartesian_2d(0f64..span, 0f64..span)
            .map_err(plot_error)?;

        // Row i is drawn from the top so the diagonal runs top-left to bottom-right
        let top = |i: usize| span - (i + 1) as f64;

        chart
            .draw_series(matrix.indexed_iter().map(|((i, j), &r)| {
                let fill = if r.is_nan() { UNDEFINED } else { diverging_color(r) };
                Rectangle::new(
                    [(j as f64, top(i)), (j as f64 + 1.0, top(i) + 1.0)],
                    fill.filled(),
                )
            }))
            .map_err(plot_error)?;

        let annotation = |r: f64| {
            let color = if r.abs() > 0.6 { &WHITE } else { &BLACK };
            TextStyle::from(("sans-serif", 16).into_font())
                .color(color)
                .pos(Pos::new(HPos::Center, VPos::Center))
        };
        chart
            .draw_series(
                matrix
                    .indexed_iter()
                    .filter(|(_, r)| !r.is_nan())
                    .map(|((i, j), &r)| {
                        Text::new(
                            format!("{r:.2}"),
                            (j as f64 + 0.5, top(i) + 0.5),
                            annotation(r),
                        )
                    }),
            )
            .map_err(plot_error)?;

        // Axis labels sit outside the plotting area, so draw them on the root
        let x_label = TextStyle::from(("sans-serif", 14).into_font())
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Top));
        let y_label = TextStyle::from(("sans-serif", 14).into_font())
            .color(&BLACK)
            .pos(Pos::new(HPos::Right, VPos::Center));
        for (i, name) in names.iter().enumerate() {
            let (x, y) = chart.backend_coord(&(i as f64 + 0.5, 0.0));
            root.draw(&Text::new(name.as_str(), (x, y + 8), x_label.clone()))
                .map_err(plot_error)?;

            let (x, y) = chart.backend_coord(&(0.0, top(i) + 0.5));
            root.draw(&Text::new(name.as_str(), (x - 8, y), y_label.clone()))
                .map_err(plot_error)?;
        }

        root.present().map_err(plot_error)?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(&pixels, width, height, ExtendedColorType::Rgb8)?;
    Ok(png)
}

fn plot_error<E: std::fmt::Display>(err: E) -> ExplorerError {
    ExplorerError::Plot {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_diverging_color_endpoints() {
        assert_eq!(diverging_color(-1.0), COOL);
        assert_eq!(diverging_color(0.0), NEUTRAL);
        assert_eq!(diverging_color(1.0), WARM);
        assert_eq!(diverging_color(5.0), WARM);
    }

    #[test]
    fn test_render_correlation_heatmap() {
        let names = vec!["a".to_string(), "b".to_string()];
        let matrix = Array2::from_shape_vec((2, 2), vec![1.0, -0.5, -0.5, 1.0]).unwrap();

        let png = render_correlation_heatmap(&names, &matrix, (400, 300)).unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_render_empty_heatmap() {
        let png = render_correlation_heatmap(&[], &Array2::zeros((0, 0)), (200, 150)).unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_render_undefined_cells() {
        let names = vec!["constant".to_string()];
        let matrix = Array2::from_elem((1, 1), f64::NAN);

        let png = render_correlation_heatmap(&names, &matrix, (200, 150)).unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);
    }
}
