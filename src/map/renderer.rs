//! Interactive map rendering.
//!
//! This module generates the self-contained HTML map document: a Leaflet
//! map with one circle marker per record, two fixed-position summary
//! panels built from the aggregated buckets, and dashed divider lines at
//! the region boundary longitudes.
//!
//! Rendering is deterministic: identical inputs yield byte-identical
//! marker and panel sections (floats use fixed-precision formatting and
//! records are emitted in relation order).

use crate::config::MapConfig;
use crate::models::{
    RegionBreakdown, SiteRecord, TierBreakdown, ALL_REGIONS, ALL_TIERS, REGION_BOUNDARIES,
};
const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const TILE_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

/// Latitude span of the region divider lines.
const DIVIDER_LAT_SPAN: (f64, f64) = (25.0, 50.0);

/// Render the complete map document.
pub fn render_map(
    records: &[SiteRecord],
    tiers: &TierBreakdown,
    regions: &RegionBreakdown,
    config: &MapConfig,
) -> String {
    let mut output = String::new();

    output.push_str("<!DOCTYPE html>\n<html>\n");
    output.push_str(&generate_head());
    output.push_str("<body>\n<div id=\"map\"></div>\n");
    output.push_str(&generate_tier_legend(tiers, config));
    output.push_str(&generate_region_panel(regions, config));
    output.push_str("<script>\n");
    output.push_str(&generate_map_setup(config));
    output.push_str(&generate_markers_section(records));
    output.push_str(&generate_dividers_section());
    output.push_str("</script>\n");
    output.push_str("</body>\n</html>\n");

    output
}

/// Generate the document head: Leaflet assets and base style.
fn generate_head() -> String {
    let mut head = String::new();

    head.push_str("<head>\n");
    head.push_str("<meta charset=\"utf-8\">\n");
    head.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    head.push_str("<title>ARR Map</title>\n");
    head.push_str(&format!(
        "<link rel=\"stylesheet\" href=\"{}\">\n",
        LEAFLET_CSS
    ));
    head.push_str(&format!("<script src=\"{}\"></script>\n", LEAFLET_JS));
    head.push_str("<style>html, body { height: 100%; margin: 0; } #map { height: 100%; }</style>\n");
    head.push_str("</head>\n");

    head
}

/// Generate the Leaflet map initialization and tile layer.
fn generate_map_setup(config: &MapConfig) -> String {
    let mut setup = String::new();

    setup.push_str(&format!(
        "var map = L.map('map', {{ minZoom: {}, maxZoom: {} }}).setView([{:.4}, {:.4}], {});\n",
        config.min_zoom, config.max_zoom, config.center_lat, config.center_lon, config.zoom
    ));
    setup.push_str(&format!(
        "L.tileLayer('{}', {{ attribution: '{}' }}).addTo(map);\n",
        TILE_URL, TILE_ATTRIBUTION
    ));

    setup
}

/// Generate one circle marker per record, in relation order.
///
/// Records arrive sorted ascending by ARR, so higher-value markers are
/// added later and draw on top.
fn generate_markers_section(records: &[SiteRecord]) -> String {
    let mut section = String::new();

    for record in records {
        section.push_str(&generate_marker(record));
    }

    section
}

/// Generate a single circle marker definition.
fn generate_marker(record: &SiteRecord) -> String {
    let color = crate::models::Tier::of(record.arr_total).color();
    let radius = marker_radius(record.arr_total);
    let popup = escape_js(&format!(
        "<b>{}</b><br>{}<br>ARR: {}",
        escape_html(&record.name),
        escape_html(&record.address),
        format_currency(record.arr_total, 2)
    ));

    format!(
        "L.circleMarker([{:.6}, {:.6}], {{ radius: {:.2}, color: '{}', fill: true, fillColor: '{}', fillOpacity: 0.6 }}).bindPopup(\"{}\").addTo(map);\n",
        record.latitude, record.longitude, radius, color, color, popup
    )
}

/// Marker radius: grows with ARR but logarithmically compresses outliers.
pub fn marker_radius(arr: f64) -> f64 {
    3.0 + 0.6 * (1.0 + arr).ln()
}

/// Generate the dashed divider polylines at the region boundaries.
fn generate_dividers_section() -> String {
    let mut section = String::new();

    for boundary in REGION_BOUNDARIES {
        section.push_str(&format!(
            "L.polyline([[{:.1}, {:.1}], [{:.1}, {:.1}]], {{ color: 'black', weight: 2, opacity: 0.3, dashArray: '5,5' }}).addTo(map);\n",
            DIVIDER_LAT_SPAN.0, boundary, DIVIDER_LAT_SPAN.1, boundary
        ));
    }

    section
}

/// Generate the fixed-position tier legend panel (bottom-left).
fn generate_tier_legend(tiers: &TierBreakdown, config: &MapConfig) -> String {
    let mut panel = String::new();

    panel.push_str(
        "<div style=\"position: fixed; bottom: 10px; left: 10px; width: 300px; height: 240px; \
         background-color: white; border: 2px solid grey; z-index: 9999; font-size: 13px; \
         padding: 15px 10px 10px 10px; border-radius: 5px;\">\n",
    );
    panel.push_str(&format!(
        "<b style=\"text-align: center; display: block; margin-bottom: 8px;\">{}</b>\n",
        escape_html(&config.tier_legend_title)
    ));

    for tier in ALL_TIERS {
        let stats = tiers.get(tier);
        panel.push_str(&format!(
            "<i style=\"background: {}; width: 20px; height: 20px; display: inline-block;\"></i> {} \u{2014} {} clients, {}<br>\n",
            tier.color(),
            tier.label(),
            stats.count,
            format_currency(stats.total, 0)
        ));
    }

    panel.push_str("</div>\n");

    panel
}

/// Generate the fixed-position region panel (top-left).
fn generate_region_panel(regions: &RegionBreakdown, config: &MapConfig) -> String {
    let mut panel = String::new();

    panel.push_str(
        "<div style=\"position: fixed; top: 10px; left: 10px; width: 280px; height: 140px; \
         background-color: white; border: 2px solid grey; z-index: 9999; font-size: 13px; \
         padding: 15px 10px 10px 10px; border-radius: 5px;\">\n",
    );
    panel.push_str(&format!(
        "<b style=\"text-align: center; display: block; margin-bottom: 8px;\">{}</b>\n",
        escape_html(&config.region_panel_title)
    ));

    for region in ALL_REGIONS {
        let stats = regions.get(region);
        panel.push_str(&format!(
            "<b>{}</b>: {} clients, {}<br>\n",
            region.label(),
            stats.count,
            format_currency(stats.total, 0)
        ));
    }

    panel.push_str("</div>\n");

    panel
}

/// Format a dollar amount with thousands separators.
///
/// `format_currency(1234567.891, 2)` returns `$1,234,567.89`;
/// with 0 decimals the value is rounded to whole dollars.
pub fn format_currency(value: f64, decimals: usize) -> String {
    let negative = value < 0.0;
    let rounded = format!("{:.*}", decimals, value.abs());

    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rounded.as_str(), None),
    };

    let mut grouped = String::new();
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let mut result = String::new();
    if negative {
        result.push('-');
    }
    result.push('$');
    result.push_str(&grouped);
    if let Some(frac) = frac_part {
        result.push('.');
        result.push_str(frac);
    }

    result
}

/// Escape text for inclusion in HTML content.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Escape text for embedding in a double-quoted JavaScript string.
fn escape_js(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace("</", "<\\/")
}
