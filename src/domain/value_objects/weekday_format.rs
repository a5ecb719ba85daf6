use chrono::Weekday;

/// Conversions between `chrono::Weekday` and the representations used by event forms.
/// Form ids count from Sunday: Sunday = 0 ... Saturday = 6.
pub trait WeekdayFormat: Sized {
    fn to_short_en(&self) -> &'static str;
    fn from_name(s: &str) -> Option<Self>;
    fn to_form_id(&self) -> u8;
    fn from_form_id(id: u8) -> Option<Self>;
}

impl WeekdayFormat for Weekday {
    /// Converts weekday to short english abbreviation
    fn to_short_en(&self) -> &'static str {
        match self {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
            Weekday::Sun => "Sun",
        }
    }

    /// Parses an english day name or abbreviation
    fn from_name(s: &str) -> Option<Weekday> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Some(Weekday::Mon),
            "tuesday" | "tue" => Some(Weekday::Tue),
            "wednesday" | "wed" => Some(Weekday::Wed),
            "thursday" | "thu" => Some(Weekday::Thu),
            "friday" | "fri" => Some(Weekday::Fri),
            "saturday" | "sat" => Some(Weekday::Sat),
            "sunday" | "sun" => Some(Weekday::Sun),
            _ => None,
        }
    }

    fn to_form_id(&self) -> u8 {
        // num_days_from_sunday is always in 0..=6
        self.num_days_from_sunday() as u8
    }

    fn from_form_id(id: u8) -> Option<Weekday> {
        match id {
            0 => Some(Weekday::Sun),
            1 => Some(Weekday::Mon),
            2 => Some(Weekday::Tue),
            3 => Some(Weekday::Wed),
            4 => Some(Weekday::Thu),
            5 => Some(Weekday::Fri),
            6 => Some(Weekday::Sat),
            _ => None,
        }
    }
}
