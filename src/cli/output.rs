//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! API results to the user as tables or JSON.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::onething::{
    epoch_to_utc, InstanceCreateResponse, InstanceList, InstanceStatus, OrderList, Pagination,
    PrivateImageList, PrivateImageStatus, PublishImageList, ResourceList, WalletDetail,
};
use crate::scaling::{Metrics, ScaleDecision};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Instance row for table display.
#[derive(Tabled)]
struct InstanceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "GPU")]
    gpu: String,
    #[tabled(rename = "Image")]
    image: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Created")]
    created: String,
}

/// Image row for table display.
#[derive(Tabled)]
struct ImageRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Detail")]
    detail: String,
    #[tabled(rename = "Created")]
    created: String,
}

/// Resource row for table display.
#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "GPU")]
    gpu: String,
    #[tabled(rename = "Region")]
    region: u32,
    #[tabled(rename = "Max GPUs")]
    max_gpu_num: u32,
}

/// Consumption row for table display.
#[derive(Tabled)]
struct OrderRow {
    #[tabled(rename = "Order")]
    order_id: String,
    #[tabled(rename = "Instance")]
    app_id: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Consumed")]
    consumed: String,
    #[tabled(rename = "Paid")]
    paid: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats private images for display.
    #[must_use]
    pub fn format_private_images(&self, list: &PrivateImageList) -> String {
        if let OutputFormat::Json = self.format {
            return to_json(list);
        }

        let rows: Vec<ImageRow> = list
            .private_image_list
            .iter()
            .map(|i| ImageRow {
                id: i.app_image_id.clone(),
                name: i.app_image_name.clone(),
                detail: Self::format_image_status(i.app_image_status),
                created: format_time(epoch_to_utc(i.created_at)),
            })
            .collect();

        Self::table_or_empty(rows, "No private images.")
    }

    /// Formats published images for display.
    #[must_use]
    pub fn format_published_images(&self, list: &PublishImageList) -> String {
        if let OutputFormat::Json = self.format {
            return to_json(list);
        }

        let rows: Vec<ImageRow> = list
            .publish_image_list
            .iter()
            .map(|i| ImageRow {
                id: i.app_image_id.clone(),
                name: format!("{} {}", i.app_image_name, i.app_image_version),
                detail: i.app_image_author.clone(),
                created: format_time(epoch_to_utc(i.created_at)),
            })
            .collect();

        Self::table_or_empty(rows, "No published images.")
    }

    /// Formats available resources for display.
    #[must_use]
    pub fn format_resources(&self, list: &ResourceList) -> String {
        if let OutputFormat::Json = self.format {
            return to_json(list);
        }

        let rows: Vec<ResourceRow> = list
            .resource_list
            .iter()
            .map(|r| ResourceRow {
                gpu: r.gpu_type.clone(),
                region: r.region_id,
                max_gpu_num: r.max_gpu_num,
            })
            .collect();

        Self::table_or_empty(rows, "No resources available.")
    }

    /// Formats an instance listing for display.
    #[must_use]
    pub fn format_instances(&self, list: &InstanceList) -> String {
        if let OutputFormat::Json = self.format {
            return to_json(list);
        }

        let rows: Vec<InstanceRow> = list
            .app_list
            .iter()
            .map(|i| InstanceRow {
                id: i.app_id.clone(),
                name: if i.custom_name.is_empty() {
                    String::from("-")
                } else {
                    i.custom_name.clone()
                },
                status: Self::format_instance_status(i.status),
                gpu: i.gpu_type.clone(),
                image: Self::truncate(&i.app_image_name, 30),
                price: format!("{:.2}", i.price),
                created: format_time(i.created_at_utc()),
            })
            .collect();

        let mut output = Self::table_or_empty(rows, "No instances.");
        output.push_str(&Self::format_pagination(&list.pagination));
        output
    }

    /// Formats a create response for display.
    #[must_use]
    pub fn format_created(&self, response: &InstanceCreateResponse) -> String {
        match self.format {
            OutputFormat::Json => to_json(response),
            OutputFormat::Text => format!(
                "{} Created instance {} in group {}\n",
                "✓".green(),
                response.app_id.bold(),
                response.group_id
            ),
        }
    }

    /// Formats the wallet summary for display.
    #[must_use]
    pub fn format_wallet(&self, wallet: &WalletDetail) -> String {
        match self.format {
            OutputFormat::Json => to_json(wallet),
            OutputFormat::Text => {
                let mut output = String::from("\nWallet\n");
                let _ = writeln!(
                    output,
                    "   Available balance: {}",
                    format!("{:.2}", wallet.available_balance).green()
                );
                let _ = writeln!(output, "   Vouchers:          {:.2}", wallet.available_voucher_cash);
                let _ = writeln!(output, "   Total consumed:    {:.2}", wallet.consume_cash_total);
                output
            }
        }
    }

    /// Formats consumption records for display.
    #[must_use]
    pub fn format_orders(&self, list: &OrderList) -> String {
        if let OutputFormat::Json = self.format {
            return to_json(list);
        }

        let rows: Vec<OrderRow> = list
            .order_list
            .iter()
            .map(|o| OrderRow {
                order_id: o.order_id.clone(),
                app_id: if o.app_id.is_empty() {
                    String::from("-")
                } else {
                    o.app_id.clone()
                },
                category: o.business_type.label().to_string(),
                consumed: format!("{:.2}", o.consume_cash),
                paid: format!("{:.2}", o.actual_pay_cash),
                created: format_time(o.created_at_utc()),
            })
            .collect();

        let mut output = Self::table_or_empty(rows, "No consumption records.");
        let _ = write!(
            output,
            "\nPaid on this page: {}\n",
            format!("{:.2}", list.total_paid()).yellow()
        );
        output.push_str(&Self::format_pagination(&list.pagination));
        output
    }

    /// Formats an autoscaling decision for display.
    #[must_use]
    pub fn format_decision(&self, metrics: &Metrics, decision: ScaleDecision) -> String {
        let label = match decision {
            ScaleDecision::Up => "scale-up",
            ScaleDecision::Down => "scale-down",
            ScaleDecision::Hold => "hold",
        };

        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "metrics": metrics,
                "decision": label,
            })),
            OutputFormat::Text => {
                let colored_label = match decision {
                    ScaleDecision::Up => label.yellow(),
                    ScaleDecision::Down => label.cyan(),
                    ScaleDecision::Hold => label.dimmed(),
                };
                format!(
                    "cpu {:.1}%, memory {:.1}% -> {colored_label}\n",
                    metrics.cpu_usage, metrics.memory_usage
                )
            }
        }
    }

    /// Formats an instance status with color.
    fn format_instance_status(status: InstanceStatus) -> String {
        match status {
            InstanceStatus::Running => status.label().green().to_string(),
            InstanceStatus::Stopped => status.label().red().to_string(),
            _ if status.is_transitioning() => status.label().yellow().to_string(),
            _ => status.label().dimmed().to_string(),
        }
    }

    /// Formats a private image status with color.
    fn format_image_status(status: PrivateImageStatus) -> String {
        match status {
            PrivateImageStatus::Success => status.label().green().to_string(),
            PrivateImageStatus::Saving => status.label().yellow().to_string(),
            PrivateImageStatus::Failed => status.label().red().to_string(),
        }
    }

    fn format_pagination(pagination: &Pagination) -> String {
        format!(
            "Page {} ({} per page), {} total\n",
            pagination.page, pagination.page_size, pagination.total
        )
    }

    fn table_or_empty<R: Tabled>(rows: Vec<R>, empty: &str) -> String {
        if rows.is_empty() {
            return format!("{}\n", empty.dimmed());
        }
        let mut output = Table::new(rows).to_string();
        output.push('\n');
        output
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_chars: usize) -> String {
        if s.chars().count() <= max_chars {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }

    /// Formats a success message.
    #[must_use]
    pub fn success(&self, message: &str) -> String {
        self.message("success", &format!("{} {message}", "✓".green()), message)
    }

    /// Formats an error message.
    #[must_use]
    pub fn error(&self, message: &str) -> String {
        self.message("error", &format!("{} {message}", "✗".red()), message)
    }

    /// Formats a warning message.
    #[must_use]
    pub fn warning(&self, message: &str) -> String {
        self.message("warning", &format!("{} {message}", "⚠".yellow()), message)
    }

    fn message(&self, status: &str, text: &str, message: &str) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({ "status": status, "message": message })),
            OutputFormat::Text => text.to_string(),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(|| String::from("-"), |t| t.format("%Y-%m-%d %H:%M").to_string())
}
