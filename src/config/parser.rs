/// Widget file parser.
use anyhow::{Context, Result};
use quick_xml::de::from_str;
use std::path::Path;
use tracing::info;

use super::model::Wallpaper;

/// Parse a widget file from disk
pub fn parse_widget_file(path: &Path) -> Result<Wallpaper> {
    let xml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read widget file: {}", path.display()))?;
    parse_widget_xml(&xml)
}

pub fn parse_widget_xml(xml: &str) -> Result<Wallpaper> {
    let xml_trimmed = xml.trim();

    if xml_trimmed.starts_with("<wallpaper") {
        let wallpaper: Wallpaper =
            from_str(xml_trimmed).context("Failed to parse <wallpaper> XML")?;
        info!(
            "Parsed wallpaper {}x{} with {} widget(s)",
            wallpaper.width,
            wallpaper.height,
            wallpaper.widgets.items.len()
        );
        Ok(wallpaper)
    } else if xml_trimmed.starts_with("<?xml") {
        // strip the declaration and re-parse
        if let Some(pos) = xml_trimmed.find("?>") {
            parse_widget_xml(&xml_trimmed[pos + 2..])
        } else {
            anyhow::bail!("Malformed XML declaration");
        }
    } else {
        let head: String = xml_trimmed.chars().take(50).collect();
        anyhow::bail!("Unknown XML format, expected <wallpaper>, got: {}...", head);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::WidgetEntry;

    #[test]
    fn test_parse_full_wallpaper() {
        let xml = r##"<?xml version="1.0" encoding="utf-8"?>
        <wallpaper width="1920" height="1080" background="#101010" locale="de_DE" margin="24">
          <widgets>
            <calendar position="top" color="#c0c0c0" font="Sans 12" headerAlign="0.5"/>
            <clock position="bottom" color="#ffffff" font="Sans 18" radius="120"
                   format="%H:%M" analog="true" digital="true" hourRing="true"
                   night="0.1,0.3,0.8" noon="0.9,0.7,0.1"/>
            <info position="middle" font="Sans 10" network="eth0 192.168.1.2" quoteCommand="fortune -s"/>
          </widgets>
        </wallpaper>
        "##;

        let wallpaper = parse_widget_xml(xml).unwrap();
        assert_eq!(wallpaper.width, 1920);
        assert_eq!(wallpaper.height, 1080);
        assert_eq!(wallpaper.background, "#101010");
        assert_eq!(wallpaper.locale.as_deref(), Some("de_DE"));
        assert_eq!(wallpaper.margin, 24.0);
        assert_eq!(wallpaper.widgets.items.len(), 3);

        match &wallpaper.widgets.items[0] {
            WidgetEntry::Calendar(cal) => {
                assert_eq!(cal.position, "top");
                assert_eq!(cal.header_align, 0.5);
                assert_eq!(cal.day_align, 1.0);
            }
            other => panic!("expected calendar, got {other:?}"),
        }
        match &wallpaper.widgets.items[1] {
            WidgetEntry::Clock(clock) => {
                assert_eq!(clock.radius, 120.0);
                assert_eq!(clock.format, "%H:%M");
                assert!(clock.analog && clock.digital && clock.hour_ring);
                assert!(!clock.minute_ring);
                assert_eq!(clock.noon.as_deref(), Some("0.9,0.7,0.1"));
            }
            other => panic!("expected clock, got {other:?}"),
        }
        match &wallpaper.widgets.items[2] {
            WidgetEntry::Info(info) => {
                assert_eq!(info.color, "0.5,0.5,0.5");
                assert_eq!(info.quote_command.as_deref(), Some("fortune -s"));
                assert_eq!(info.cpuinfo, None);
            }
            other => panic!("expected info, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let xml = r#"<wallpaper><widgets><clock/></widgets></wallpaper>"#;
        let wallpaper = parse_widget_xml(xml).unwrap();
        assert_eq!((wallpaper.width, wallpaper.height), (1280, 720));
        assert_eq!(wallpaper.locale, None);
        match &wallpaper.widgets.items[0] {
            WidgetEntry::Clock(clock) => {
                assert_eq!(clock.radius, 160.0);
                assert_eq!(clock.format, "%X");
                assert_eq!(clock.font, "Sans 12");
                assert!(clock.analog);
                assert!(!clock.digital);
            }
            other => panic!("expected clock, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_wallpaper() {
        let wallpaper = parse_widget_xml(r#"<wallpaper width="640" height="480"/>"#).unwrap();
        assert!(wallpaper.widgets.items.is_empty());
    }

    #[test]
    fn test_rejects_other_documents() {
        assert!(parse_widget_xml("<screen/>").is_err());
        assert!(parse_widget_xml("<?xml version=\"1.0\"").is_err());
    }
}
