use chrono_tz::{TZ_VARIANTS, Tz};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use std::collections::HashMap;

const MAX_RESULTS: usize = 10;

/// Index of the IANA zones bundled with chrono-tz, searchable by city name.
pub struct TimezoneManager {
    city_to_timezone: HashMap<String, Vec<Tz>>, // city -> timezone list
    fuzzy_matcher: SkimMatcherV2,
}

impl Default for TimezoneManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TimezoneManager {
    pub fn new() -> Self {
        let mut city_to_timezone: HashMap<String, Vec<Tz>> = HashMap::new();

        for tz in TZ_VARIANTS {
            if let Some(city_name) = Self::extract_city_name(tz.name()) {
                city_to_timezone
                    .entry(city_name.to_lowercase())
                    .or_default()
                    .push(tz);
            }
        }

        Self {
            city_to_timezone,
            fuzzy_matcher: SkimMatcherV2::default(),
        }
    }

    /// Extracts the city name from a timezone string (ex: "America/New_York" => "New York")
    fn extract_city_name(tz_name: &str) -> Option<String> {
        let (_, city_part) = tz_name.rsplit_once('/')?;
        Some(city_part.replace('_', " "))
    }

    pub fn get_timezone(&self, name: &str) -> Option<Tz> {
        name.trim().parse().ok()
    }

    /// Search timezones by city or zone name, exact city matches first
    pub fn search_timezones(&self, query: &str) -> Vec<Tz> {
        let query_lower = query.trim().to_lowercase();
        if query_lower.is_empty() {
            return Vec::new();
        }

        if let Some(exact) = self.city_to_timezone.get(&query_lower) {
            return exact.iter().copied().take(MAX_RESULTS).collect();
        }

        let mut scored: Vec<(i64, Tz)> = TZ_VARIANTS
            .iter()
            .filter_map(|tz| {
                let name_score = self
                    .fuzzy_matcher
                    .fuzzy_match(&tz.name().to_lowercase(), &query_lower);
                let city_score = Self::extract_city_name(tz.name()).and_then(|city| {
                    self.fuzzy_matcher
                        .fuzzy_match(&city.to_lowercase(), &query_lower)
                });
                name_score.max(city_score).map(|score| (score, *tz))
            })
            .collect();

        // highest score first, then alphabetical for stable output
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.name().cmp(b.1.name())));
        scored
            .into_iter()
            .map(|(_, tz)| tz)
            .take(MAX_RESULTS)
            .collect()
    }
}
