/// Data model for the widget file.
/// Attributes are kept as strings where the widget layer does its own parsing.
use serde::Deserialize;

/// Root element: one wallpaper with its widgets
#[derive(Debug, Clone, Deserialize)]
pub struct Wallpaper {
    #[serde(rename = "@width", default = "default_width")]
    pub width: u32,
    #[serde(rename = "@height", default = "default_height")]
    pub height: u32,
    #[serde(rename = "@background", default = "default_background")]
    pub background: String,
    /// Overrides LC_ALL / LC_TIME / LANG for month and weekday names
    #[serde(rename = "@locale")]
    pub locale: Option<String>,
    #[serde(rename = "@margin", default = "default_margin")]
    pub margin: f64,
    #[serde(default)]
    pub widgets: Widgets,
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_background() -> String {
    "#000000".to_string()
}

fn default_margin() -> f64 {
    16.0
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Widgets {
    #[serde(rename = "$value", default)]
    pub items: Vec<WidgetEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub enum WidgetEntry {
    #[serde(rename = "calendar")]
    Calendar(CalendarEntry),
    #[serde(rename = "clock")]
    Clock(ClockEntry),
    #[serde(rename = "info")]
    Info(InfoEntry),
}

fn default_position() -> String {
    "top".to_string()
}

fn default_color() -> String {
    "0.5,0.5,0.5".to_string()
}

fn default_font() -> String {
    "Sans 12".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarEntry {
    /// top, middle, bottom; empty or "none" hides the widget
    #[serde(rename = "@position", default = "default_position")]
    pub position: String,
    #[serde(rename = "@color", default = "default_color")]
    pub color: String,
    #[serde(rename = "@font", default = "default_font")]
    pub font: String,
    #[serde(rename = "@headerAlign", default = "default_align")]
    pub header_align: f64,
    #[serde(rename = "@dayAlign", default = "default_align")]
    pub day_align: f64,
}

fn default_align() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClockEntry {
    #[serde(rename = "@position", default = "default_position")]
    pub position: String,
    #[serde(rename = "@color", default = "default_color")]
    pub color: String,
    #[serde(rename = "@font", default = "default_font")]
    pub font: String,
    #[serde(rename = "@radius", default = "default_radius")]
    pub radius: f64,
    #[serde(rename = "@format", default = "default_format")]
    pub format: String,
    #[serde(rename = "@analog", default = "default_true")]
    pub analog: bool,
    #[serde(rename = "@digital", default)]
    pub digital: bool,
    #[serde(rename = "@hourRing", default)]
    pub hour_ring: bool,
    #[serde(rename = "@minuteRing", default)]
    pub minute_ring: bool,
    #[serde(rename = "@night")]
    pub night: Option<String>,
    #[serde(rename = "@noon")]
    pub noon: Option<String>,
}

fn default_radius() -> f64 {
    160.0
}

fn default_format() -> String {
    "%X".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct InfoEntry {
    #[serde(rename = "@position", default = "default_position")]
    pub position: String,
    #[serde(rename = "@color", default = "default_color")]
    pub color: String,
    #[serde(rename = "@font", default = "default_font")]
    pub font: String,
    #[serde(rename = "@network")]
    pub network: Option<String>,
    #[serde(rename = "@quoteCommand")]
    pub quote_command: Option<String>,
    #[serde(rename = "@cpuinfo")]
    pub cpuinfo: Option<String>,
    #[serde(rename = "@meminfo")]
    pub meminfo: Option<String>,
}
