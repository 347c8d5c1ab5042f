use serde::{Deserialize, Serialize};

/// Point-in-time environmental readings used to parameterize the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalSnapshot {
    /// Atmospheric CO₂ concentration (ppm)
    pub co2: f64,

    /// Global temperature anomaly above pre-industrial baseline (°C)
    pub temperature: f64,

    /// Arctic sea ice coverage (%)
    pub arctic_ice: f64,

    /// Share of global electricity from renewables (%)
    pub renewable_energy: f64,
}

impl Default for EnvironmentalSnapshot {
    /// Reference readings shown on the dashboard (NOAA, NASA GISS, NSIDC, IEA).
    fn default() -> Self {
        Self {
            co2: 430.2,
            temperature: 1.47,
            arctic_ice: 84.5,
            renewable_energy: 32.0,
        }
    }
}
