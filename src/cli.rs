//! CLI command definitions and subcommands

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::models::{Source, TravelType, TripRequest};
use crate::orchestrator::PlanOptions;

/// Tripsmith - trip planning orchestrator
#[derive(Parser, Debug)]
#[command(
    name = "tripsmith",
    version,
    about = "Plan a trip from weather, destination insights and booking providers"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "TRIPSMITH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging for tripsmith
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Plan a single trip and print it
    Plan(PlanArgs),

    /// Serve the HTTP API
    Serve {
        /// Port to listen on, overrides the config
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check every provider's health endpoint
    Health,
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[arg(long)]
    pub destination: String,

    #[arg(long)]
    pub departure: String,

    /// First day of the trip (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: NaiveDate,

    /// Last day of the trip (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: NaiveDate,

    #[arg(long)]
    pub budget: f64,

    /// leisure, business, adventure, family or other
    #[arg(long, default_value = "leisure")]
    pub travel_type: TravelType,

    #[arg(long, default_value_t = 1)]
    pub party_size: u32,

    #[arg(long)]
    pub special_requirements: Option<String>,

    /// Ask the language model for a narrative itinerary
    #[arg(long)]
    pub narrative: bool,

    /// Bypass the plan cache
    #[arg(long)]
    pub no_cache: bool,

    /// Do not query this source (repeatable)
    #[arg(long = "skip", value_name = "SOURCE")]
    pub skip: Vec<Source>,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

impl PlanArgs {
    #[must_use]
    pub fn request(&self) -> TripRequest {
        TripRequest {
            destination: self.destination.clone(),
            departure: self.departure.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            budget: self.budget,
            travel_type: self.travel_type,
            party_size: self.party_size,
            special_requirements: self.special_requirements.clone(),
        }
    }

    #[must_use]
    pub fn options(&self) -> PlanOptions {
        PlanOptions {
            synthesize: self.narrative,
            use_cache: !self.no_cache,
            skip: self.skip.iter().copied().collect::<BTreeSet<_>>(),
        }
    }
}
