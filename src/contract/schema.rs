//! The crop yield feature contract.
//!
//! Field names, order and domains are exactly those the yield regressor was
//! trained on. Derived columns (rainfall or fertilizer per area, production,
//! market price) were dropped before training and must not be added here.

use super::domain::{FieldSpec, Prefill};
use super::service::FeatureContract;

pub const YEAR: &str = "Year";
pub const SEASON: &str = "Season";
pub const PROVINCE: &str = "Province";
pub const DISTRICT: &str = "District";
pub const CROP: &str = "Crop";
pub const SOIL_TYPE: &str = "Soil_Type";
pub const IRRIGATION: &str = "Irrigation";
pub const AREA_SOWN: &str = "Area_Sown_ha";
pub const AREA_HARVESTED: &str = "Area_Harvested_ha";
pub const RAINFALL: &str = "Rainfall_mm";
pub const TEMPERATURE: &str = "Temperature_C";
pub const FERTILIZER: &str = "Fertilizer_kg_per_ha";

pub const SEASONS: &[&str] = &["Maha", "Yala"];
pub const PROVINCES: &[&str] = &[
    "Western",
    "Central",
    "Southern",
    "Northern",
    "Eastern",
    "North Western",
    "North Central",
    "Uva",
    "Sabaragamuwa",
];
pub const CROPS: &[&str] = &[
    "Paddy",
    "Maize",
    "Vegetables",
    "Onion",
    "Chili",
    "Coconut",
    "Rubber",
    "Tea",
];
pub const SOIL_TYPES: &[&str] = &["Clay", "Sandy", "Loamy", "Laterite", "Alluvial"];
pub const IRRIGATION_TYPES: &[&str] = &["Irrigated", "Rainfed"];

pub const YEAR_MIN: i64 = 2010;
pub const YEAR_MAX: i64 = 2030;

const CROP_YIELD_FIELDS: &[FieldSpec] = &[
    FieldSpec::integer(YEAR, YEAR_MIN, YEAR_MAX).with_prefill(Prefill::Integer(2024)),
    FieldSpec::categorical(SEASON, SEASONS).with_prefill(Prefill::Text("Maha")),
    FieldSpec::categorical(PROVINCE, PROVINCES).with_prefill(Prefill::Text("Western")),
    FieldSpec::text(DISTRICT),
    FieldSpec::categorical(CROP, CROPS).with_prefill(Prefill::Text("Paddy")),
    FieldSpec::categorical(SOIL_TYPE, SOIL_TYPES).with_prefill(Prefill::Text("Clay")),
    FieldSpec::categorical(IRRIGATION, IRRIGATION_TYPES).with_prefill(Prefill::Text("Irrigated")),
    FieldSpec::non_negative(AREA_SOWN).with_prefill(Prefill::Number(100.0)),
    FieldSpec::non_negative(AREA_HARVESTED).with_prefill(Prefill::Number(95.0)),
    FieldSpec::non_negative(RAINFALL).with_prefill(Prefill::Number(1500.0)),
    FieldSpec::non_negative(TEMPERATURE).with_prefill(Prefill::Number(28.0)),
    FieldSpec::non_negative(FERTILIZER).with_prefill(Prefill::Number(220.0)),
];

/// Process-wide crop yield contract with strict unknown-field rejection.
pub static CROP_YIELD: FeatureContract = FeatureContract::new(CROP_YIELD_FIELDS);
