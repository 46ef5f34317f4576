//! Static species and topic listings served by the catalog endpoints.

use crate::models::{SeverityLevel, VenomType};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct SpeciesSummary {
    pub scientific_name: &'static str,
    pub common_name: &'static str,
    pub family: &'static str,
    pub venom_type: VenomType,
    pub severity: SeverityLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeciesListing {
    pub species: Vec<SpeciesSummary>,
    pub total_count: usize,
    pub supported_regions: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicListing {
    pub topics: BTreeMap<&'static str, Vec<&'static str>>,
    pub total_categories: usize,
    pub supported_languages: Vec<&'static str>,
}

const SPECIES: [SpeciesSummary; 3] = [
    SpeciesSummary {
        scientific_name: "Dendroaspis polylepis",
        common_name: "Black Mamba",
        family: "Elapidae",
        venom_type: VenomType::Neurotoxic,
        severity: SeverityLevel::Critical,
    },
    SpeciesSummary {
        scientific_name: "Bitis arietans",
        common_name: "Puff Adder",
        family: "Viperidae",
        venom_type: VenomType::Cytotoxic,
        severity: SeverityLevel::Severe,
    },
    SpeciesSummary {
        scientific_name: "Naja haje",
        common_name: "Egyptian Cobra",
        family: "Elapidae",
        venom_type: VenomType::Neurotoxic,
        severity: SeverityLevel::Severe,
    },
];

const REGIONS: [&str; 3] = ["East Africa", "Southern Africa", "West Africa"];

const TOPICS: [(&str, [&str; 4]); 4] = [
    (
        "emergency_response",
        [
            "First aid for snakebites",
            "Emergency contact information",
            "What to do immediately after a bite",
            "Signs of serious envenomation",
        ],
    ),
    (
        "prevention",
        [
            "How to avoid snake encounters",
            "Protective clothing and gear",
            "Snake-proofing your home",
            "Safe hiking and camping practices",
        ],
    ),
    (
        "species_information",
        [
            "Common snakes in Kenya",
            "Venomous vs non-venomous snakes",
            "Snake identification tips",
            "Geographic distribution",
        ],
    ),
    (
        "general",
        [
            "Snake behavior and habits",
            "Myths and misconceptions",
            "Research and statistics",
            "Educational resources",
        ],
    ),
];

/// English, Swahili, French.
const LANGUAGES: [&str; 3] = ["en", "sw", "fr"];

pub fn species_listing() -> SpeciesListing {
    let species = SPECIES.to_vec();
    SpeciesListing {
        total_count: species.len(),
        species,
        supported_regions: REGIONS.to_vec(),
    }
}

pub fn topic_listing() -> TopicListing {
    let topics: BTreeMap<_, _> = TOPICS
        .iter()
        .map(|(category, topics)| (*category, topics.to_vec()))
        .collect();

    TopicListing {
        total_categories: topics.len(),
        topics,
        supported_languages: LANGUAGES.to_vec(),
    }
}
