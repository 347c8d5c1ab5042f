use chrono::{DateTime, Datelike, Local, Timelike};
use std::fmt;

use crate::core::EnvironmentalSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Northern-hemisphere meteorological season for a 1-based month.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Spring => write!(f, "Spring"),
            Season::Summer => write!(f, "Summer"),
            Season::Autumn => write!(f, "Autumn"),
            Season::Winter => write!(f, "Winter"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeOfDay::Morning => write!(f, "Morning"),
            TimeOfDay::Afternoon => write!(f, "Afternoon"),
            TimeOfDay::Evening => write!(f, "Evening"),
            TimeOfDay::Night => write!(f, "Night"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Low,
    Moderate,
    High,
    Critical,
}

impl Urgency {
    /// Breakpoints are exclusive: exactly 430 ppm is still `High`.
    pub fn from_co2(co2: f64) -> Self {
        if co2 > 430.0 {
            Urgency::Critical
        } else if co2 > 420.0 {
            Urgency::High
        } else if co2 > 410.0 {
            Urgency::Moderate
        } else {
            Urgency::Low
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Low => write!(f, "Low"),
            Urgency::Moderate => write!(f, "Moderate"),
            Urgency::High => write!(f, "High"),
            Urgency::Critical => write!(f, "Critical"),
        }
    }
}

/// Build the generation instruction for `count` tips.
pub fn build_prompt(snapshot: &EnvironmentalSnapshot, now: &DateTime<Local>, count: usize) -> String {
    let season = Season::from_month(now.month());
    let time_of_day = TimeOfDay::from_hour(now.hour());
    let urgency = Urgency::from_co2(snapshot.co2);

    let co2 = snapshot.co2;
    let temperature = snapshot.temperature;
    let arctic_ice = snapshot.arctic_ice;
    let renewables = snapshot.renewable_energy;

    format!(
        "Generate {count} environmental wisdom tips that are contextual to today's climate crisis.

🌍 CURRENT CLIMATE REALITY:
• CO₂: {co2} ppm (highest in human history - CRITICAL)
• Global Temperature: +{temperature}°C above pre-industrial baseline
• Arctic Ice: {arctic_ice}% coverage (record low)
• Renewables: {renewables}% (growing but needs acceleration)
• Season: {season} | Time: {time_of_day} | Crisis Level: {urgency}

📝 FORMAT REQUIREMENTS:
• Start each tip with ONE emoji
• Keep each tip 25-70 words
• Include specific numbers, percentages, or measurable actions
• Make tips immediate and actionable
• Reference the urgency of current climate data when relevant
• Mix energy, transport, food, water, waste, and nature categories

✅ EXAMPLES:
🌱 With CO₂ at {co2}ppm, switching to plant-based meals 3x weekly saves 1,200kg CO₂ annually
💧 Arctic ice at {arctic_ice}% - every 5-minute shower saves 25 gallons compared to 10-minute showers
🚲 Temperature rising +{temperature}°C - biking 10km prevents 2.6kg CO₂ that driving would emit
♻️ Renewables at {renewables}% - choose clean energy plans to accelerate the transition

Generate {count} contextual wisdom tips in the same format:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot(co2: f64) -> EnvironmentalSnapshot {
        EnvironmentalSnapshot {
            co2,
            ..EnvironmentalSnapshot::default()
        }
    }

    #[test]
    fn test_prompt_embeds_snapshot_numbers() {
        let now = Local.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let prompt = build_prompt(&snapshot(430.2), &now, 10);

        assert!(prompt.contains("430.2"));
        assert!(prompt.contains("+1.47°C"));
        assert!(prompt.contains("84.5%"));
        assert!(prompt.starts_with("Generate 10 environmental wisdom tips"));
    }

    #[test]
    fn test_prompt_embeds_context_tags() {
        let now = Local.with_ymd_and_hms(2026, 1, 5, 22, 0, 0).unwrap();
        let prompt = build_prompt(&snapshot(415.0), &now, 10);

        assert!(prompt.contains("Season: Winter | Time: Night | Crisis Level: Moderate"));
    }

    #[test]
    fn test_urgency_breakpoints() {
        assert_eq!(Urgency::from_co2(430.2), Urgency::Critical);
        assert_eq!(Urgency::from_co2(430.0), Urgency::High);
        assert_eq!(Urgency::from_co2(420.5), Urgency::High);
        assert_eq!(Urgency::from_co2(410.1), Urgency::Moderate);
        assert_eq!(Urgency::from_co2(400.0), Urgency::Low);
    }

    #[test]
    fn test_season_and_time_buckets() {
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(8), Season::Summer);
        assert_eq!(Season::from_month(11), Season::Autumn);
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(2), Season::Winter);

        assert_eq!(TimeOfDay::from_hour(6), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(21), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(3), TimeOfDay::Night);
    }
}
