use {
    crate::{Level, LoggerError},
    chrono::{DateTime, FixedOffset, Local, Utc},
    std::fmt,
};

/// Placeholder replaced by the entry timestamp.
pub const TIMESTAMP_TOKEN: &str = "%timestamp%";
/// Placeholder replaced by the level label.
pub const LEVEL_TOKEN: &str = "%level%";
/// Placeholder replaced by the message text.
pub const MESSAGE_TOKEN: &str = "%message%";

/// Template used when none is configured.
pub const DEFAULT_FORMAT: &str = "[%timestamp%] [%level%] %message%";

/// chrono pattern for `DD-MM-YYYY HH:MM:SS`.
const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Specifies the time zone used to render `%timestamp%`.
///
/// # Examples
/// ```
/// use rotalog::TimeZone;
/// use chrono::FixedOffset;
///
/// let utc = TimeZone::UTC;
/// let local = TimeZone::Local;
/// // UTC+3
/// let moscow = TimeZone::Fix(FixedOffset::east_opt(3 * 3600).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeZone {
    /// Coordinated universal time.
    UTC,
    /// The system's local time zone, resolved at every timestamp.
    #[default]
    Local,
    /// A fixed offset from UTC.
    Fix(FixedOffset),
}

impl TimeZone {
    /// Current time in this time zone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        match self {
            TimeZone::UTC => Utc::now().fixed_offset(),
            TimeZone::Local => Local::now().fixed_offset(),
            TimeZone::Fix(offset) => Utc::now().with_timezone(offset),
        }
    }

    /// Current time rendered as `DD-MM-YYYY HH:MM:SS`.
    pub fn timestamp(&self) -> String {
        format_timestamp(&self.now())
    }
}

/// Render a point in time as `DD-MM-YYYY HH:MM:SS`.
pub fn format_timestamp(datetime: &DateTime<FixedOffset>) -> String {
    datetime.format(TIMESTAMP_FORMAT).to_string()
}

/// A validated output template.
///
/// A template must contain at least one of [`TIMESTAMP_TOKEN`],
/// [`LEVEL_TOKEN`] or [`MESSAGE_TOKEN`]. Any other text, including unknown
/// `%...%` sequences, is copied to the output as is.
///
/// # Examples
/// ```
/// use rotalog::{Level, Template};
///
/// let template = Template::new("<%level%> %message%").unwrap();
/// assert_eq!(template.render("01-02-2024 10:00:00", Level::Info, "ready"), "<INFO> ready");
///
/// assert!(Template::new("plain text, no tokens").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(String);

impl Template {
    pub fn new(format: impl Into<String>) -> Result<Self, LoggerError> {
        let format = format.into();
        if [TIMESTAMP_TOKEN, LEVEL_TOKEN, MESSAGE_TOKEN]
            .iter()
            .any(|token| format.contains(token))
        {
            Ok(Template(format))
        } else {
            Err(LoggerError::InvalidFormat(format))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute the three tokens.
    ///
    /// Tokens are replaced one after another over the whole string, the
    /// message last, so placeholders that appear inside `message` are
    /// written literally.
    pub fn render(&self, timestamp: &str, level: Level, message: &str) -> String {
        self.0
            .replace(TIMESTAMP_TOKEN, timestamp)
            .replace(LEVEL_TOKEN, level.as_str())
            .replace(MESSAGE_TOKEN, message)
    }
}

impl Default for Template {
    fn default() -> Self {
        Template(DEFAULT_FORMAT.to_string())
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone as _};

    #[test]
    fn test_default_template() {
        let template = Template::default();
        assert_eq!(
            template.render("05-03-2024 14:07:09", Level::Warning, "disk almost full"),
            "[05-03-2024 14:07:09] [WARNING] disk almost full"
        );
    }

    #[test]
    fn test_rejects_template_without_tokens() {
        let err = Template::new("plain text, no tokens").unwrap_err();
        assert!(matches!(err, LoggerError::InvalidFormat(ref f) if f == "plain text, no tokens"));
        assert!(Template::new("%message%").is_ok());
        assert!(Template::new("only %timestamp%").is_ok());
    }

    #[test]
    fn test_repeated_and_unknown_tokens() {
        let template = Template::new("%level%|%level%|%thread%|%message%").unwrap();
        assert_eq!(template.render("ts", Level::Debug, "m"), "DEBUG|DEBUG|%thread%|m");
    }

    #[test]
    fn test_tokens_in_message_are_not_substituted() {
        let template = Template::default();
        let line = template.render("ts", Level::Info, "literal %level% and %timestamp%");
        assert_eq!(line, "[ts] [INFO] literal %level% and %timestamp%");
    }

    #[test]
    fn test_rendering_is_stable() {
        let first = Template::new("%level%: %message%").unwrap();
        let second = Template::new("%level%: %message%").unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.render("ts", Level::Error, "boom"),
            second.render("ts", Level::Error, "boom")
        );
    }

    #[test]
    fn test_timestamp_layout() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let datetime = offset.with_ymd_and_hms(2024, 1, 9, 7, 5, 3).unwrap();
        assert_eq!(format_timestamp(&datetime), "09-01-2024 07:05:03");

        let stamp = TimeZone::UTC.timestamp();
        assert_eq!(stamp.len(), "09-01-2024 07:05:03".len());
        assert_eq!(&stamp[2..3], "-");
        assert_eq!(&stamp[10..11], " ");
    }
}
