//! Destination insights model

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attraction {
    pub name: String,
    pub category: String,
    /// 0.0 - 5.0
    pub rating: f32,
}

/// Restaurant price level, written as dollar signs on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriceTier {
    #[serde(rename = "$")]
    Budget,
    #[serde(rename = "$$")]
    Moderate,
    #[serde(rename = "$$$")]
    Upscale,
    #[serde(rename = "$$$$")]
    Luxury,
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            PriceTier::Budget => "$",
            PriceTier::Moderate => "$$",
            PriceTier::Upscale => "$$$",
            PriceTier::Luxury => "$$$$",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub name: String,
    pub cuisine: String,
    pub price_tier: PriceTier,
}

/// Practical facts about a destination. Backends may leave any of them out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationFacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_time_to_visit: Option<String>,
    /// 0.0 - 10.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_rating: Option<f32>,
    /// Free text such as "High" or "Medium"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_level: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub local_transport: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cultural_tips: Vec<String>,
}

impl DestinationFacts {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsResult {
    pub summary: String,
    pub attractions: Vec<Attraction>,
    pub restaurants: Vec<Restaurant>,
    #[serde(default, skip_serializing_if = "DestinationFacts::is_empty")]
    pub facts: DestinationFacts,
}

impl InsightsResult {
    pub fn validate(&self) -> Result<(), String> {
        if self.summary.trim().is_empty() {
            return Err("destination summary is blank".to_string());
        }
        for attraction in &self.attractions {
            if attraction.name.trim().is_empty() {
                return Err("attraction without a name".to_string());
            }
            if !(0.0..=5.0).contains(&attraction.rating) {
                return Err(format!(
                    "attraction '{}' has rating {} outside 0-5",
                    attraction.name, attraction.rating
                ));
            }
        }
        if let Some(r) = self.restaurants.iter().find(|r| r.name.trim().is_empty()) {
            return Err(format!("restaurant without a name (cuisine '{}')", r.cuisine));
        }
        if let Some(rating) = self.facts.safety_rating.filter(|r| !(0.0..=10.0).contains(r)) {
            return Err(format!("safety rating {rating} outside 0-10"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn louvre(rating: f32) -> Attraction {
        Attraction {
            name: "Louvre".to_string(),
            category: "museum".to_string(),
            rating,
        }
    }

    #[test]
    fn test_price_tier_wire_format() {
        let restaurant: Restaurant =
            serde_json::from_str(r#"{"name":"Chez Marie","cuisine":"French","price_tier":"$$$"}"#)
                .unwrap();
        assert_eq!(restaurant.price_tier, PriceTier::Upscale);
        assert_eq!(restaurant.price_tier.to_string(), "$$$");
        assert!(serde_json::from_str::<PriceTier>(r#""$$$$$""#).is_err());
    }

    #[test]
    fn test_validate_ratings() {
        let mut insights = InsightsResult {
            summary: "City of light".to_string(),
            attractions: vec![louvre(4.8)],
            restaurants: vec![],
            facts: DestinationFacts::default(),
        };
        assert!(insights.validate().is_ok());

        insights.attractions.push(louvre(7.0));
        assert!(insights.validate().unwrap_err().contains("outside 0-5"));
    }

    #[test]
    fn test_validate_rejects_blank_summary() {
        let insights = InsightsResult {
            summary: " ".to_string(),
            attractions: vec![],
            restaurants: vec![],
            facts: DestinationFacts::default(),
        };
        assert!(insights.validate().is_err());
    }

    #[test]
    fn test_validate_safety_rating() {
        let mut insights = InsightsResult {
            summary: "City of light".to_string(),
            attractions: vec![],
            restaurants: vec![],
            facts: DestinationFacts {
                safety_rating: Some(8.5),
                ..DestinationFacts::default()
            },
        };
        assert!(insights.validate().is_ok());

        insights.facts.safety_rating = Some(11.0);
        assert!(insights.validate().unwrap_err().contains("outside 0-10"));
    }

    #[test]
    fn test_facts_are_omitted_when_unknown() {
        let insights = InsightsResult {
            summary: "City of light".to_string(),
            attractions: vec![],
            restaurants: vec![],
            facts: DestinationFacts::default(),
        };
        let json = serde_json::to_value(&insights).unwrap();
        assert!(json.get("facts").is_none());

        let decoded: InsightsResult = serde_json::from_value(json).unwrap();
        assert!(decoded.facts.is_empty());
    }
}
