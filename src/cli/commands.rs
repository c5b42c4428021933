//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::onething::{BillType, BusinessType, MAX_PAGE_SIZE};

/// OneThing pilot - manage OneThingAI GPU instances.
#[derive(Parser, Debug)]
#[command(name = "onething")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true, env = "ONETHING_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the configuration.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Browse images.
    Images {
        /// Image subcommand.
        #[command(subcommand)]
        command: ImageCommands,
    },

    /// List GPU resources available for an image.
    Resources {
        /// Image identifier.
        image_id: String,

        /// Only show this GPU type.
        #[arg(long)]
        gpu_type: Option<String>,

        /// Only show this region.
        #[arg(long)]
        region: Option<u32>,
    },

    /// Manage instances.
    Instances {
        /// Instance subcommand.
        #[command(subcommand)]
        command: InstanceCommands,
    },

    /// Show the wallet balance.
    Wallet,

    /// Show consumption records.
    Orders {
        /// Page number, starting at 1.
        #[arg(long, default_value = "1")]
        page: u32,

        /// Records per page.
        #[arg(long, default_value = "20", value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PAGE_SIZE)))]
        page_size: u32,

        /// Only show records of this instance.
        #[arg(long)]
        app_id: Option<String>,

        /// Only show this category.
        #[arg(long)]
        business_type: Option<BusinessTypeArg>,
    },

    /// Evaluate the autoscaling policy.
    Scale {
        /// Scale subcommand.
        #[command(subcommand)]
        command: ScaleCommands,
    },
}

/// Image subcommands.
#[derive(Subcommand, Debug)]
pub enum ImageCommands {
    /// List private images.
    Private {
        /// Only show images in this region.
        #[arg(long)]
        region: Option<u32>,

        /// Filter by image name.
        #[arg(long)]
        name: Option<String>,
    },

    /// List published images.
    Public {
        /// Filter by image name.
        #[arg(long)]
        name: Option<String>,

        /// Filter by image author.
        #[arg(long)]
        author: Option<String>,
    },
}

/// Instance subcommands.
#[derive(Subcommand, Debug)]
pub enum InstanceCommands {
    /// List instances.
    List {
        /// Page number, starting at 1.
        #[arg(long, default_value = "1")]
        page: u32,

        /// Instances per page.
        #[arg(long, default_value = "20", value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PAGE_SIZE)))]
        page_size: u32,

        /// Only show this instance.
        #[arg(long)]
        app_id: Option<String>,

        /// Only show instances of this group.
        #[arg(long)]
        group_id: Option<String>,
    },

    /// Create an instance.
    Create {
        /// Image identifier.
        #[arg(long)]
        image: String,

        /// GPU type.
        #[arg(long)]
        gpu_type: String,

        /// Number of GPUs.
        #[arg(long, default_value = "1")]
        gpu_num: u32,

        /// Region identifier.
        #[arg(long)]
        region: u32,

        /// Billing mode.
        #[arg(long, value_enum, default_value_t = BillTypeArg::PayAsYouGo)]
        bill_type: BillTypeArg,

        /// Subscription duration for monthly and daily billing.
        #[arg(long)]
        duration: Option<u32>,

        /// Group to place the instance in.
        #[arg(long)]
        group_id: Option<String>,

        /// Port to expose, e.g. `8000/http` or `22/tcp`. Repeatable.
        #[arg(long = "port")]
        ports: Vec<String>,
    },

    /// Boot a stopped instance.
    Start {
        /// Instance identifier.
        app_id: String,
    },

    /// Shut an instance down.
    Stop {
        /// Instance identifier.
        app_id: String,
    },

    /// Release an instance.
    Delete {
        /// Instance identifier.
        app_id: String,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Scale subcommands.
#[derive(Subcommand, Debug)]
pub enum ScaleCommands {
    /// Evaluate one metrics snapshot against the configured policy.
    Check {
        /// CPU usage (percent).
        #[arg(long)]
        cpu: f64,

        /// Memory usage (percent).
        #[arg(long)]
        memory: f64,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// Billing mode argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BillTypeArg {
    /// Monthly subscription.
    Monthly,
    /// Daily subscription.
    Daily,
    /// Pay as you go.
    PayAsYouGo,
}

impl From<BillTypeArg> for BillType {
    fn from(arg: BillTypeArg) -> Self {
        match arg {
            BillTypeArg::Monthly => Self::MonthlySubscription,
            BillTypeArg::Daily => Self::DailySubscription,
            BillTypeArg::PayAsYouGo => Self::PayAsYouGo,
        }
    }
}

/// Consumption category argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BusinessTypeArg {
    /// Instance usage.
    InstanceUsage,
    /// Image storage.
    ImageStorage,
    /// File storage.
    FileStorage,
    /// Instance expansion.
    InstanceExpansion,
}

impl From<BusinessTypeArg> for BusinessType {
    fn from(arg: BusinessTypeArg) -> Self {
        match arg {
            BusinessTypeArg::InstanceUsage => Self::InstanceUsage,
            BusinessTypeArg::ImageStorage => Self::ImageStorage,
            BusinessTypeArg::FileStorage => Self::FileStorage,
            BusinessTypeArg::InstanceExpansion => Self::InstanceExpansion,
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
