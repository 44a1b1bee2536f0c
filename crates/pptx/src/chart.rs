//! Chart part extraction.
//!
//! Only the cached values are read; no formulas are evaluated.

use std::collections::BTreeMap;

use slideview_core::{ChartData, ChartKind, ChartSeries};

use crate::xml::RawNode;

/// Pull the plot data out of a chart part (`c:chartSpace`).
///
/// The first plot-area child naming a known chart kind wins. Returns `None`
/// when the part has no plot area or no recognized chart.
pub fn extract_chart(chart_space: &RawNode) -> Option<ChartData> {
    let plot_area = chart_space.path(&["chart", "plotArea"])?;

    let (kind, plot) = plot_area
        .children
        .iter()
        .find_map(|c| ChartKind::from_local_name(c.local_name()).map(|k| (k, c)))?;

    let series = if kind == ChartKind::ScatterChart {
        plot.children_named("ser").flat_map(scatter_rows).collect()
    } else {
        plot.children_named("ser")
            .enumerate()
            .map(|(index, ser)| category_series(index, ser))
            .collect()
    };

    Some(ChartData { kind, series })
}

fn scatter_rows(ser: &RawNode) -> Vec<ChartSeries> {
    ["xVal", "yVal"]
        .into_iter()
        .map(|axis| ChartSeries::Row {
            values: cache_points(ser.path(&[axis, "numRef", "numCache"]))
                .filter_map(|(_, v)| v.parse().ok())
                .collect(),
        })
        .collect()
}

fn category_series(index: usize, ser: &RawNode) -> ChartSeries {
    let name = ser
        .path(&["tx", "strRef", "strCache", "pt", "v"])
        .and_then(RawNode::text)
        .map(str::to_string)
        .unwrap_or_else(|| index.to_string());

    // String categories win over numeric ones.
    let categories = ser
        .path(&["cat", "strRef", "strCache"])
        .filter(|c| c.child("pt").is_some())
        .or_else(|| ser.path(&["cat", "numRef", "numCache"]));
    let labels: BTreeMap<u32, String> = cache_points(categories)
        .map(|(idx, v)| (idx, v.to_string()))
        .collect();

    let values = cache_points(ser.path(&["val", "numRef", "numCache"]))
        .filter_map(|(idx, v)| match v.parse::<f64>() {
            Ok(value) => Some((idx, value)),
            Err(_) => {
                log::debug!("Skipping non-numeric chart value '{}'", v);
                None
            }
        })
        .collect();

    ChartSeries::Category {
        name,
        values,
        labels,
    }
}

/// `(idx, v)` of every `c:pt` in a string or number cache.
fn cache_points(cache: Option<&RawNode>) -> impl Iterator<Item = (u32, &str)> {
    cache
        .into_iter()
        .flat_map(|c| c.children_named("pt"))
        .filter_map(|pt| {
            let idx = pt.attr_i64("idx").and_then(|i| u32::try_from(i).ok())?;
            let value = pt.child("v").and_then(RawNode::text)?;
            Some((idx, value.trim()))
        })
}
