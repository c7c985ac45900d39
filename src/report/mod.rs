use std::path::Path;

use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;

use crate::error::{Error, Result};

const CHART_HEIGHT: u32 = 720;
const MIN_CHART_WIDTH: u32 = 640;
const BAR_WIDTH: u32 = 24;

/// Bar chart of word repetitions, one bar per word in the given order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarChart {
    pub title: String,
    pub bars: Vec<(String, u32)>,
}

impl BarChart {
    pub fn new(title: impl Into<String>, bars: Vec<(String, u32)>) -> Self {
        Self {
            title: title.into(),
            bars,
        }
    }

    /// Keeps only words repeated at least `min_count` times.
    pub fn with_min_count(mut self, min_count: u32) -> Self {
        self.bars.retain(|(_, count)| *count >= min_count);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Renders the chart to an SVG file, word labels rotated under the x axis.
    pub fn render_svg(&self, path: impl AsRef<Path>) -> Result<()> {
        let width = MIN_CHART_WIDTH.max(BAR_WIDTH * self.bars.len() as u32 + 120);
        let root = SVGBackend::new(path.as_ref(), (width, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let max_count = self.bars.iter().map(|(_, c)| *c).max().unwrap_or(0);
        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, ("sans-serif", 28))
            .margin(16)
            .x_label_area_size(160)
            .y_label_area_size(56)
            .build_cartesian_2d((0u32..self.bars.len() as u32).into_segmented(), 0u32..max_count + 1)
            .map_err(chart_error)?;

        let label_for = |value: &SegmentValue<u32>| match value {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => self
                .bars
                .get(*i as usize)
                .map(|(word, _)| word.clone())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(self.bars.len().max(1))
            .x_label_formatter(&label_for)
            .x_label_style(("sans-serif", 14).into_font().transform(FontTransform::Rotate90))
            .x_desc("words")
            .y_desc("repetitions")
            .draw()
            .map_err(chart_error)?;

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(BLUE.filled())
                    .margin(2)
                    .data(self.bars.iter().enumerate().map(|(i, (_, count))| (i as u32, *count))),
            )
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
        Ok(())
    }
}

fn chart_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> Error {
    Error::Chart(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars() -> Vec<(String, u32)> {
        vec![
            ("data".to_string(), 5),
            ("analysis".to_string(), 3),
            ("the".to_string(), 1),
            ("graph".to_string(), 1),
        ]
    }

    #[test]
    fn min_count_drops_single_occurrences() {
        let chart = BarChart::new("bar", bars()).with_min_count(2);
        assert_eq!(
            chart.bars,
            vec![("data".to_string(), 5), ("analysis".to_string(), 3)]
        );
    }

    #[test]
    fn filtering_everything_leaves_an_empty_chart() {
        let chart = BarChart::new("bar", bars()).with_min_count(10);
        assert!(chart.is_empty());
        assert_eq!(chart.title, "bar");
    }
}
