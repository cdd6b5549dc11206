use crate::models::pagination::PaginatedView;
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;

/// Per-user task counters as returned upstream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct TaskStats {
    pub id: i64,
    pub name: String,
    pub total: u32,
    pub completed: u32,
    #[serde(alias = "inProgress")]
    pub in_progress: u32,
    pub pending: u32,
}

/// Statistics table row with its serial number.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct StatisticsRow {
    /// 1-based position across all pages, zero padded to two digits ("01").
    pub serial: String,
    #[serde(flatten)]
    pub stats: TaskStats,
}

/// Numbers every row of a page with its position across the whole listing.
pub fn number_rows(view: PaginatedView<TaskStats>) -> PaginatedView<StatisticsRow> {
    let mut position = u64::from(view.pagination.current_page - 1) * u64::from(view.pagination.page_size);
    view.map(|stats| {
        position += 1;
        StatisticsRow {
            serial: format!("{:02}", position),
            stats,
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct TaskTotals {
    pub total: u64,
    pub completed: u64,
    pub in_progress: u64,
    pub pending: u64,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct SummaryCard {
    pub title: &'static str,
    pub value: u64,
}

/// The four cards on top of the dashboard.
pub fn summary_cards(totals: &TaskTotals) -> Vec<SummaryCard> {
    vec![
        SummaryCard {
            title: "Total Tasks",
            value: totals.total,
        },
        SummaryCard {
            title: "Completed Tasks",
            value: totals.completed,
        },
        SummaryCard {
            title: "In Progress Tasks",
            value: totals.in_progress,
        },
        SummaryCard {
            title: "Pending Tasks",
            value: totals.pending,
        },
    ]
}
