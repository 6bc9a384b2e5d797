//! ROC curve rendering
//!
//! Produces a standalone SVG so evaluation output can be inspected without
//! any plotting dependency. Points are computed by sweeping the score
//! threshold from high to low.

use std::path::Path;

use ndarray::Array1;

use crate::error::Result;

const WIDTH: f64 = 480.0;
const HEIGHT: f64 = 480.0;
const MARGIN: f64 = 48.0;

/// Compute ROC curve points as (fpr, tpr) pairs, anchored at (0,0) and (1,1).
pub fn roc_points(y_true: &Array1<f64>, y_proba: &Array1<f64>) -> Vec<(f64, f64)> {
    let n_pos = y_true.iter().filter(|&&t| t > 0.5).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return vec![(0.0, 0.0), (1.0, 1.0)];
    }

    let mut order: Vec<usize> = (0..y_true.len()).collect();
    order.sort_by(|&a, &b| {
        y_proba[b]
            .partial_cmp(&y_proba[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut points = vec![(0.0, 0.0)];
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut i = 0;

    // Step through distinct score values so ties move diagonally
    while i < order.len() {
        let score = y_proba[order[i]];
        while i < order.len() && y_proba[order[i]] == score {
            if y_true[order[i]] > 0.5 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push((fp as f64 / n_neg as f64, tp as f64 / n_pos as f64));
    }

    if points.last() != Some(&(1.0, 1.0)) {
        points.push((1.0, 1.0));
    }
    points
}

/// Render ROC points to an SVG document.
pub fn render_svg(points: &[(f64, f64)], auc: Option<f64>) -> String {
    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;

    let to_px = |(fpr, tpr): (f64, f64)| {
        let x = MARGIN + fpr * plot_w;
        let y = HEIGHT - MARGIN - tpr * plot_h;
        (x, y)
    };

    let polyline: String = points
        .iter()
        .map(|&p| {
            let (x, y) = to_px(p);
            format!("{:.1},{:.1}", x, y)
        })
        .collect::<Vec<_>>()
        .join(" ");

    let title = match auc {
        Some(auc) => format!("ROC curve (AUC = {:.3})", auc),
        None => "ROC curve".to_string(),
    };

    let (x0, y0) = to_px((0.0, 0.0));
    let (x1, y1) = to_px((1.0, 1.0));

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
         viewBox=\"0 0 {w} {h}\">\n",
        w = WIDTH,
        h = HEIGHT
    ));
    svg.push_str(&format!(
        "  <rect width=\"{}\" height=\"{}\" fill=\"white\"/>\n",
        WIDTH, HEIGHT
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"24\" text-anchor=\"middle\" font-family=\"sans-serif\" \
         font-size=\"14\">{}</text>\n",
        WIDTH / 2.0,
        title
    ));
    // Axes
    svg.push_str(&format!(
        "  <line x1=\"{x0}\" y1=\"{y0}\" x2=\"{x1}\" y2=\"{y0}\" stroke=\"black\"/>\n",
        x0 = x0,
        y0 = y0,
        x1 = x1
    ));
    svg.push_str(&format!(
        "  <line x1=\"{x0}\" y1=\"{y0}\" x2=\"{x0}\" y2=\"{y1}\" stroke=\"black\"/>\n",
        x0 = x0,
        y0 = y0,
        y1 = y1
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-family=\"sans-serif\" \
         font-size=\"12\">False positive rate</text>\n",
        WIDTH / 2.0,
        HEIGHT - 12.0
    ));
    svg.push_str(&format!(
        "  <text x=\"16\" y=\"{}\" text-anchor=\"middle\" font-family=\"sans-serif\" \
         font-size=\"12\" transform=\"rotate(-90 16 {})\">True positive rate</text>\n",
        HEIGHT / 2.0,
        HEIGHT / 2.0
    ));
    // Chance diagonal
    svg.push_str(&format!(
        "  <line x1=\"{x0}\" y1=\"{y0}\" x2=\"{x1}\" y2=\"{y1}\" stroke=\"gray\" \
         stroke-dasharray=\"4 4\"/>\n",
        x0 = x0,
        y0 = y0,
        x1 = x1,
        y1 = y1
    ));
    svg.push_str(&format!(
        "  <polyline points=\"{}\" fill=\"none\" stroke=\"#1f77b4\" stroke-width=\"2\"/>\n",
        polyline
    ));
    svg.push_str("</svg>\n");
    svg
}

/// Compute the ROC curve and write it as an SVG file, creating parents.
pub fn save_roc(
    path: &Path,
    y_true: &Array1<f64>,
    y_proba: &Array1<f64>,
    auc: Option<f64>,
) -> Result<()> {
    let points = roc_points(y_true, y_proba);
    let svg = render_svg(&points, auc);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, svg)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_roc_points_perfect_classifier() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let y_proba = array![0.1, 0.2, 0.8, 0.9];
        let points = roc_points(&y_true, &y_proba);

        assert_eq!(points.first(), Some(&(0.0, 0.0)));
        assert_eq!(points.last(), Some(&(1.0, 1.0)));
        // The curve reaches tpr 1.0 before any false positives
        assert!(points.contains(&(0.0, 1.0)));
    }

    #[test]
    fn test_roc_points_single_class_degenerates() {
        let y_true = array![1.0, 1.0];
        let y_proba = array![0.6, 0.7];
        let points = roc_points(&y_true, &y_proba);
        assert_eq!(points, vec![(0.0, 0.0), (1.0, 1.0)]);
    }

    #[test]
    fn test_render_svg_contains_curve_and_title() {
        let points = vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)];
        let svg = render_svg(&points, Some(0.987));
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("polyline"));
        assert!(svg.contains("AUC = 0.987"));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn test_save_roc_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots/roc.svg");
        let y_true = array![0.0, 1.0];
        let y_proba = array![0.2, 0.8];
        save_roc(&path, &y_true, &y_proba, Some(1.0)).unwrap();
        assert!(path.exists());
    }
}
