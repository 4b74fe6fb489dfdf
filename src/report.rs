// Reporting service - read-only aggregation over the catalog counters
//
// Note the deliberate scope asymmetry, kept from the shop's original
// bookkeeping: the sales report totals revenue over ALL books while
// listing only the top N, but the rental report totals rented-days
// over the top-N rows only.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::error::ShopResult;

// ============================================================================
// SALES REPORT
// ============================================================================

/// One row of the sales report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesLine {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub price: f64,
    pub quantity_sold: i64,
    /// price * quantity_sold
    pub revenue: f64,
}

/// Top-N best sellers plus two revenue totals with different scopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesReport {
    pub top: Vec<SalesLine>,
    /// Revenue summed over the listed rows only.
    pub top_revenue: f64,
    /// Revenue summed over every book in the catalog.
    pub total_revenue: f64,
}

fn sales_line_from_row(row: &Row<'_>) -> rusqlite::Result<SalesLine> {
    let price: f64 = row.get(3)?;
    let quantity_sold: i64 = row.get(4)?;
    Ok(SalesLine {
        title: row.get(0)?,
        author: row.get(1)?,
        genre: row.get(2)?,
        price,
        quantity_sold,
        revenue: price * quantity_sold as f64,
    })
}

/// Best sellers by units sold, with per-book revenue and both totals.
pub fn sales_report(conn: &Connection, top_n: u32) -> ShopResult<SalesReport> {
    let mut stmt = conn.prepare(
        "SELECT title, author, genre, price, quantity_sold FROM books
         ORDER BY quantity_sold DESC LIMIT ?1",
    )?;
    let top = stmt
        .query_map([top_n], sales_line_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let top_revenue = top.iter().map(|line| line.revenue).sum();

    let total_revenue: f64 = conn.query_row(
        "SELECT COALESCE(SUM(price * quantity_sold), 0) FROM books",
        [],
        |row| row.get(0),
    )?;

    Ok(SalesReport {
        top,
        top_revenue,
        total_revenue,
    })
}

// ============================================================================
// RENTAL REPORT
// ============================================================================

/// One row of the rental report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalLine {
    pub title: String,
    pub author: String,
    pub genre: String,
    /// Cumulative rental transactions, ever.
    pub quantity_rented_all: i64,
    /// Cumulative rented-days, ever.
    pub quantity_rented_days: i64,
}

/// Most-rented books and total rented-days over the top-N set only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalReport {
    pub top: Vec<RentalLine>,
    pub total_rented_days: i64,
}

/// Most-rented books by cumulative rental count.
pub fn rental_report(conn: &Connection, top_n: u32) -> ShopResult<RentalReport> {
    let mut stmt = conn.prepare(
        "SELECT title, author, genre, quantity_rented_all, quantity_rented_days FROM books
         ORDER BY quantity_rented_all DESC LIMIT ?1",
    )?;
    let top = stmt
        .query_map([top_n], |row| {
            Ok(RentalLine {
                title: row.get(0)?,
                author: row.get(1)?,
                genre: row.get(2)?,
                quantity_rented_all: row.get(3)?,
                quantity_rented_days: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let total_rented_days = top.iter().map(|line| line.quantity_rented_days).sum();

    Ok(RentalReport {
        top,
        total_rented_days,
    })
}

// ============================================================================
// TESTS
// ============================================================================
