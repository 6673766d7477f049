//! Air quality indices.
//!
//! Raw pollutant readings are bucketed into an ordinal scale from 0 (good)
//! to 5 (worrying). The overall air quality of a device is the worst index
//! currently known for it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pollutant category with its own threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PollutantCategory {
    No2,
    Voc,
    Pm10,
    Pm25,
    /// Generic dust reading; bucketed with the PM10 table
    Dust,
}

/// Upper bounds (exclusive) of each ordinal; readings past the last bound
/// get the next ordinal.
const NO2_BOUNDS: &[f64] = &[4.0, 7.0, 9.0];
const VOC_BOUNDS: &[f64] = &[40.0, 70.0, 90.0];
const PM10_BOUNDS: &[f64] = &[51.0, 76.0, 101.0, 351.0, 421.0];
const PM25_BOUNDS: &[f64] = &[36.0, 54.0, 71.0, 151.0, 251.0];

impl PollutantCategory {
    pub const ALL: [PollutantCategory; 5] = [
        PollutantCategory::No2,
        PollutantCategory::Voc,
        PollutantCategory::Pm10,
        PollutantCategory::Pm25,
        PollutantCategory::Dust,
    ];

    /// Category fed by a raw wire field, if any.
    pub fn from_wire_code(code: &str) -> Option<Self> {
        match code {
            "noxl" => Some(Self::No2),
            "va10" => Some(Self::Voc),
            "pm10" => Some(Self::Pm10),
            "pm25" => Some(Self::Pm25),
            "pact" => Some(Self::Dust),
            _ => None,
        }
    }

    /// Semantic name of the derived index point.
    pub fn index_name(&self) -> &'static str {
        match self {
            Self::No2 => "NO2Index",
            Self::Voc => "VOCIndex",
            Self::Pm10 => "PM10Index",
            Self::Pm25 => "PM25Index",
            Self::Dust => "DustIndex",
        }
    }

    fn bounds(&self) -> &'static [f64] {
        match self {
            Self::No2 => NO2_BOUNDS,
            Self::Voc => VOC_BOUNDS,
            Self::Pm10 | Self::Dust => PM10_BOUNDS,
            Self::Pm25 => PM25_BOUNDS,
        }
    }

    fn slot(&self) -> usize {
        match self {
            Self::No2 => 0,
            Self::Voc => 1,
            Self::Pm10 => 2,
            Self::Pm25 => 3,
            Self::Dust => 4,
        }
    }
}

impl fmt::Display for PollutantCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::No2 => write!(f, "NO2"),
            Self::Voc => write!(f, "VOC"),
            Self::Pm10 => write!(f, "PM10"),
            Self::Pm25 => write!(f, "PM2.5"),
            Self::Dust => write!(f, "Dust"),
        }
    }
}

/// Quality index for a raw reading.
pub fn classify(category: PollutantCategory, reading: f64) -> u8 {
    category
        .bounds()
        .iter()
        .take_while(|bound| reading >= **bound)
        .count() as u8
}

/// Last known index per category for one device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityIndices {
    levels: [u8; 5],
}

impl QualityIndices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: PollutantCategory) -> u8 {
        self.levels[category.slot()]
    }

    /// Classify `reading`, store it as the category's last known index and
    /// return the index together with the new aggregate.
    pub fn record(&mut self, category: PollutantCategory, reading: f64) -> (u8, u8) {
        let index = classify(category, reading);
        self.levels[category.slot()] = index;
        (index, self.aggregate())
    }

    /// Worst of all last known indices.
    pub fn aggregate(&self) -> u8 {
        self.levels.iter().copied().max().unwrap_or(0)
    }
}
