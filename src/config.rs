use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::core::{ContributionLimits, DEFAULT_PLAN_YEAR};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "leapwise",
    about = "Rent affordability, 401(k) trajectory and Leap planning engine"
)]
pub struct AppConfig {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, env = "TAX_API_URL", help = "Third-party tax API endpoint")]
    pub tax_api_url: Option<String>,
    #[arg(long, global = true, env = "TAX_API_KEY", hide_env_values = true)]
    pub tax_api_key: Option<String>,
    #[arg(
        long,
        global = true,
        default_value_t = 10,
        help = "Seconds before a tax API call falls back to bracket estimates"
    )]
    pub tax_timeout_secs: u64,
    #[arg(
        long,
        global = true,
        env = "RENT_INDEX_PATH",
        help = "JSON file mapping metro name to median monthly rent"
    )]
    pub rent_index: Option<PathBuf>,
    #[arg(long, global = true, env = "EMAIL_FROM", default_value = "plans@leapwise.app")]
    pub email_from: String,
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_PLAN_YEAR,
        help = "Plan year for 401(k)/HSA contribution limits"
    )]
    pub plan_year: u16,
    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Print a one-off plan as JSON.
    Plan(PlanArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[arg(long, help = "Gross annual salary")]
    pub salary: f64,
    #[arg(long, help = "Two-letter state code")]
    pub state: String,
    #[arg(long, default_value_t = 0.0, help = "Current 401(k) contribution in percent")]
    pub current_pct: f64,
    #[arg(long, help = "Employer match cap in percent; omit when there is no match")]
    pub match_pct: Option<f64>,
    #[arg(long, help = "Minimum monthly debt payments")]
    pub debt_monthly: Option<f64>,
    #[arg(long, help = "Monthly essential spending")]
    pub essential_monthly: Option<f64>,
    #[arg(long, help = "Monthly post-tax savings to route")]
    pub savings_monthly: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct TaxApiConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct MarketRentsConfig {
    pub index_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub from: String,
}

impl AppConfig {
    pub fn tax_api(&self) -> TaxApiConfig {
        TaxApiConfig {
            url: self.tax_api_url.clone().filter(|u| !u.trim().is_empty()),
            api_key: self.tax_api_key.clone().filter(|k| !k.trim().is_empty()),
            timeout: Duration::from_secs(self.tax_timeout_secs.max(1)),
        }
    }

    pub fn market_rents(&self) -> MarketRentsConfig {
        MarketRentsConfig {
            index_path: self.rent_index.clone(),
        }
    }

    pub fn email(&self) -> EmailConfig {
        EmailConfig {
            from: self.email_from.clone(),
        }
    }

    pub fn limits(&self) -> ContributionLimits {
        ContributionLimits::for_year(self.plan_year)
    }
}
