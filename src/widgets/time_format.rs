/// Locale resolution and strftime-style formatting.
use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Locale, NaiveDate};
use tracing::warn;

use crate::error::{Result, WidgetError};

/// Resolve a locale name such as `de_DE.UTF-8` or `fr_FR@euro`, falling back to POSIX.
pub fn resolve_locale(name: &str) -> Locale {
    let base = name
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return Locale::POSIX;
    }
    match Locale::try_from(base) {
        Ok(locale) => locale,
        Err(_) => {
            warn!("Unknown locale '{}', using POSIX names", name);
            Locale::POSIX
        }
    }
}

/// Locale from `LC_ALL`, `LC_TIME` or `LANG`, in that order.
pub fn locale_from_env() -> Locale {
    ["LC_ALL", "LC_TIME", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.is_empty())
        .map(|v| resolve_locale(&v))
        .unwrap_or(Locale::POSIX)
}

/// Reject patterns chrono cannot render.
pub fn validate_format(fmt: &str) -> Result<()> {
    if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
        return Err(WidgetError::InvalidFormat(fmt.to_string()));
    }
    Ok(())
}

pub fn format_datetime(now: &DateTime<FixedOffset>, fmt: &str, locale: Locale) -> Result<String> {
    validate_format(fmt)?;
    let mut out = String::new();
    write!(out, "{}", now.format_localized(fmt, locale))
        .map_err(|_| WidgetError::InvalidFormat(fmt.to_string()))?;
    Ok(out)
}

pub fn format_date(date: NaiveDate, fmt: &str, locale: Locale) -> Result<String> {
    validate_format(fmt)?;
    let mut out = String::new();
    write!(out, "{}", date.format_localized(fmt, locale))
        .map_err(|_| WidgetError::InvalidFormat(fmt.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_resolve_locale() {
        assert_eq!(resolve_locale("de_DE.UTF-8"), Locale::de_DE);
        assert_eq!(resolve_locale("fr_FR@euro"), Locale::fr_FR);
        assert_eq!(resolve_locale("C"), Locale::POSIX);
        assert_eq!(resolve_locale("xx_YY"), Locale::POSIX);
    }

    #[test]
    fn test_localized_names() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(format_date(date, "%a %B", Locale::POSIX).unwrap(), "Mon January");
        assert_eq!(format_date(date, "%B", Locale::de_DE).unwrap(), "Januar");
    }

    #[test]
    fn test_invalid_format_rejected() {
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 10, 7, 0)
            .unwrap();
        assert!(matches!(
            format_datetime(&now, "%Q", Locale::POSIX),
            Err(WidgetError::InvalidFormat(_))
        ));
        assert_eq!(format_datetime(&now, "%H:%M", Locale::POSIX).unwrap(), "10:07");
    }
}
