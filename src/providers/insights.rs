use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{InsightsProvider, ProviderError, ProviderResult, ToolClient};
use crate::config::ProviderEndpoint;
use crate::models::{
    Attraction, DestinationFacts, InsightsQuery, InsightsResult, PriceTier, Restaurant,
};

const INSIGHTS_TOOL: &str = "get_destination_insights";

/// Destination insights backend reached over the tool-call protocol
pub struct HttpInsightsProvider {
    tool: ToolClient,
}

#[derive(Debug, Deserialize)]
struct InsightsResponse {
    summary: String,
    #[serde(default)]
    attractions: Vec<Attraction>,
    #[serde(default)]
    restaurants: Vec<RestaurantEntry>,
    #[serde(flatten)]
    facts: DestinationFacts,
}

#[derive(Debug, Deserialize)]
struct RestaurantEntry {
    name: String,
    cuisine: String,
    #[serde(alias = "price_tier")]
    price_range: PriceTier,
}

impl From<RestaurantEntry> for Restaurant {
    fn from(entry: RestaurantEntry) -> Self {
        Self {
            name: entry.name,
            cuisine: entry.cuisine,
            price_tier: entry.price_range,
        }
    }
}

impl HttpInsightsProvider {
    pub fn new(endpoint: &ProviderEndpoint) -> anyhow::Result<Self> {
        Ok(Self {
            tool: ToolClient::new("insights", endpoint)?,
        })
    }
}

#[async_trait]
impl InsightsProvider for HttpInsightsProvider {
    async fn fetch(&self, query: &InsightsQuery) -> ProviderResult<InsightsResult> {
        let response: InsightsResponse = self
            .tool
            .call(
                INSIGHTS_TOOL,
                json!({
                    "destination": query.destination,
                    "travel_type": query.travel_type,
                    "party_size": query.party_size,
                }),
            )
            .await?;

        let result = InsightsResult {
            summary: response.summary,
            attractions: response.attractions,
            restaurants: response.restaurants.into_iter().map(Restaurant::from).collect(),
            facts: response.facts,
        };
        result.validate().map_err(ProviderError::InvalidResponse)?;
        Ok(result)
    }

    async fn health_check(&self) -> bool {
        self.tool.health().await
    }
}
