// Rental service - rent, recall, list, search, late returns
// Renting and recalling each touch two tables (book counters + the
// rents row), always inside one transaction so a mid-operation failure
// cannot leave them disagreeing.

use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ShopError, ShopResult};
use crate::validate;

/// Storage format for rent and return dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// RENT ENTITY
// ============================================================================

/// One loan transaction: exactly one copy, one customer, a fixed day
/// count. Recalling a rent deletes the row; only the cumulative book
/// counters remember it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rent {
    pub id: i64,
    pub title: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub quantity_rented: i64,
    pub rented_for_days: i64,
    pub rent_date: NaiveDate,
    pub return_date: NaiveDate,
}

impl Rent {
    /// A rent is late when its return date has passed with no recall.
    pub fn is_late(&self, today: NaiveDate) -> bool {
        self.return_date < today
    }
}

const RENT_COLUMNS: &str =
    "id, title, Name, Phone, quantity_rented, rented_for_days, rent_date, return_date";

fn parse_date(text: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn rent_from_row(row: &Row<'_>) -> rusqlite::Result<Rent> {
    let rent_date: String = row.get(6)?;
    let return_date: String = row.get(7)?;
    Ok(Rent {
        id: row.get(0)?,
        title: row.get(1)?,
        customer_name: row.get(2)?,
        customer_phone: row.get(3)?,
        quantity_rented: row.get(4)?,
        rented_for_days: row.get(5)?,
        rent_date: parse_date(&rent_date)?,
        return_date: parse_date(&return_date)?,
    })
}

/// Which field a rent search hit matched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentMatchField {
    Title,
    Name,
    Phone,
}

#[derive(Debug, Clone)]
pub struct RentMatch {
    pub rent: Rent,
    pub matched: RentMatchField,
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Rents one copy of `title` to a customer for `days` days, dated
/// `today`. Book counter updates and the rents insert commit together.
pub fn rent_book(
    conn: &mut Connection,
    title: &str,
    customer_name: &str,
    customer_phone: &str,
    days: i64,
    today: NaiveDate,
) -> ShopResult<Rent> {
    validate::validate_title(title)?;
    validate::validate_customer_name(customer_name)?;
    validate::validate_phone(customer_phone)?;
    validate::validate_days(days)?;

    let tx = conn.transaction()?;

    let available: Option<i64> = tx
        .query_row(
            "SELECT quantity_available FROM books WHERE title = ?1 ORDER BY id LIMIT 1",
            [title],
            |row| row.get(0),
        )
        .optional()?;
    let available = available.ok_or_else(|| ShopError::not_found("book", title))?;

    if available < 1 {
        return Err(ShopError::InsufficientStock {
            title: title.to_string(),
            available,
            requested: 1,
        });
    }

    let rent_date = today;
    let return_date = today + Duration::days(days);

    tx.execute(
        "UPDATE books SET quantity_available = quantity_available - 1,
                          quantity_rented = quantity_rented + 1,
                          quantity_rented_all = quantity_rented_all + 1,
                          quantity_rented_days = quantity_rented_days + ?1
         WHERE title = ?2",
        params![days, title],
    )?;

    tx.execute(
        "INSERT INTO rents (title, Name, Phone, quantity_rented, rented_for_days,
                            rent_date, return_date)
         VALUES (?1, ?2, ?3, 1, ?4, ?5, ?6)",
        params![
            title,
            customer_name,
            customer_phone,
            days,
            rent_date.format(DATE_FORMAT).to_string(),
            return_date.format(DATE_FORMAT).to_string(),
        ],
    )?;
    let rent_id = tx.last_insert_rowid();

    tx.commit()?;
    debug!(title, rent_id, days, "rent recorded");

    Ok(Rent {
        id: rent_id,
        title: title.to_string(),
        customer_name: customer_name.to_string(),
        customer_phone: customer_phone.to_string(),
        quantity_rented: 1,
        rented_for_days: days,
        rent_date,
        return_date,
    })
}

/// Closes out a rent: the copy returns to available stock and the rent
/// row is deleted, as one transaction. Matching back to the book is by
/// title string; two books could collide only if their titles do.
pub fn recall_rent(conn: &mut Connection, rent_id: i64) -> ShopResult<()> {
    validate::validate_id(rent_id)?;

    let tx = conn.transaction()?;

    let title: Option<String> = tx
        .query_row("SELECT title FROM rents WHERE id = ?1", [rent_id], |row| {
            row.get(0)
        })
        .optional()?;
    let title = title.ok_or_else(|| ShopError::not_found("rent", rent_id.to_string()))?;

    tx.execute(
        "UPDATE books SET quantity_available = quantity_available + 1,
                          quantity_rented = quantity_rented - 1
         WHERE title = ?1",
        [&title],
    )?;
    tx.execute("DELETE FROM rents WHERE id = ?1", [rent_id])?;

    tx.commit()?;
    debug!(rent_id, title, "rent recalled");
    Ok(())
}

/// Returns every active rent in insertion order.
pub fn list_rents(conn: &Connection) -> ShopResult<Vec<Rent>> {
    let mut stmt = conn.prepare(&format!("SELECT {RENT_COLUMNS} FROM rents ORDER BY id"))?;
    let rents = stmt
        .query_map([], rent_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rents)
}

/// Case-insensitive substring search over title, customer name and
/// phone, tagged with the first field that matched.
pub fn search_rents(conn: &Connection, term: &str) -> ShopResult<Vec<RentMatch>> {
    let pattern = format!("%{}%", term);

    let mut stmt = conn.prepare(&format!(
        "SELECT {RENT_COLUMNS} FROM rents
         WHERE title LIKE ?1 OR Name LIKE ?1 OR Phone LIKE ?1
         ORDER BY id"
    ))?;
    let rents = stmt
        .query_map([&pattern], rent_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let needle = term.to_lowercase();
    let matches = rents
        .into_iter()
        .map(|rent| {
            let matched = if rent.title.to_lowercase().contains(&needle) {
                RentMatchField::Title
            } else if rent.customer_name.to_lowercase().contains(&needle) {
                RentMatchField::Name
            } else {
                RentMatchField::Phone
            };
            RentMatch { rent, matched }
        })
        .collect();

    Ok(matches)
}

/// Rents whose return date has passed as of `today`. Pure calendar
/// comparison; `today` is injected so tests control the clock.
pub fn list_late_rents(conn: &Connection, today: NaiveDate) -> ShopResult<Vec<Rent>> {
    let rents = list_rents(conn)?;
    Ok(rents.into_iter().filter(|r| r.is_late(today)).collect())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{add_book, find_book};
    use crate::db::open_in_memory;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn seeded() -> Connection {
        let conn = open_in_memory().unwrap();
        add_book(&conn, "The Hobbit", "J.R.R. Tolkien", "Fantasy", 15.0, 2).unwrap();
        conn
    }

    #[test]
    fn test_rent_book_moves_one_copy() {
        let mut conn = seeded();
        let today = day("2024-03-01");

        let rent = rent_book(&mut conn, "The Hobbit", "Alice", "5551234567", 7, today).unwrap();
        assert_eq!(rent.quantity_rented, 1);
        assert_eq!(rent.return_date, day("2024-03-08"));

        let book = find_book(&conn, "The Hobbit").unwrap().unwrap();
        assert_eq!(book.quantity_available, 1);
        assert_eq!(book.quantity_rented, 1);
        assert_eq!(book.quantity_rented_all, 1);
        assert_eq!(book.quantity_rented_days, 7);
    }

    #[test]
    fn test_rent_book_out_of_stock() {
        let mut conn = seeded();
        let today = day("2024-03-01");

        rent_book(&mut conn, "The Hobbit", "Alice", "5551234567", 7, today).unwrap();
        rent_book(&mut conn, "The Hobbit", "Bob", "5559876543", 3, today).unwrap();

        let err = rent_book(&mut conn, "The Hobbit", "Eve", "5550001111", 2, today).unwrap_err();
        assert!(matches!(err, ShopError::InsufficientStock { available: 0, .. }));

        // Counters stayed non-negative and unchanged by the failure.
        let book = find_book(&conn, "The Hobbit").unwrap().unwrap();
        assert_eq!(book.quantity_available, 0);
        assert_eq!(book.quantity_rented, 2);
    }

    #[test]
    fn test_rent_unknown_title() {
        let mut conn = seeded();
        let err = rent_book(
            &mut conn,
            "Missing",
            "Alice",
            "5551234567",
            7,
            day("2024-03-01"),
        )
        .unwrap_err();
        assert!(matches!(err, ShopError::NotFound { .. }));
        assert!(list_rents(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_rent_recall_round_trip() {
        let mut conn = seeded();
        let today = day("2024-03-01");
        let before = find_book(&conn, "The Hobbit").unwrap().unwrap();

        let rent = rent_book(&mut conn, "The Hobbit", "Alice", "5551234567", 7, today).unwrap();
        recall_rent(&mut conn, rent.id).unwrap();

        let after = find_book(&conn, "The Hobbit").unwrap().unwrap();
        assert_eq!(after.quantity_available, before.quantity_available);
        assert_eq!(after.quantity_rented, before.quantity_rented);

        // The rent row is gone; only cumulative counters remember it.
        assert!(list_rents(&conn).unwrap().is_empty());
        assert_eq!(after.quantity_rented_all, 1);
        assert_eq!(after.quantity_rented_days, 7);
    }

    #[test]
    fn test_recall_unknown_rent() {
        let mut conn = seeded();
        let err = recall_rent(&mut conn, 42).unwrap_err();
        assert!(matches!(err, ShopError::NotFound { .. }));
    }

    #[test]
    fn test_late_detection() {
        let mut conn = seeded();
        let today = day("2024-03-10");

        // Rented 2024-03-01 for 7 days: return 2024-03-08, late by the 10th.
        rent_book(
            &mut conn,
            "The Hobbit",
            "Alice",
            "5551234567",
            7,
            day("2024-03-01"),
        )
        .unwrap();
        // Rented today for 3 days: return 2024-03-13, not late.
        rent_book(&mut conn, "The Hobbit", "Bob", "5559876543", 3, today).unwrap();

        let late = list_late_rents(&conn, today).unwrap();
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].customer_name, "Alice");

        // Due exactly today is not late yet.
        let late = list_late_rents(&conn, day("2024-03-08")).unwrap();
        assert!(late.is_empty());
    }

    #[test]
    fn test_search_rents_tagged() {
        let mut conn = seeded();
        let today = day("2024-03-01");
        rent_book(&mut conn, "The Hobbit", "Alice", "5551234567", 7, today).unwrap();

        let hits = search_rents(&conn, "hobbit").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].matched, RentMatchField::Title);

        let hits = search_rents(&conn, "alice").unwrap();
        assert_eq!(hits[0].matched, RentMatchField::Name);

        let hits = search_rents(&conn, "555123").unwrap();
        assert_eq!(hits[0].matched, RentMatchField::Phone);

        assert!(search_rents(&conn, "nobody").unwrap().is_empty());
    }

    #[test]
    fn test_rent_validates_input() {
        let mut conn = seeded();
        let today = day("2024-03-01");

        assert!(rent_book(&mut conn, "", "Alice", "5551234567", 7, today).is_err());
        assert!(rent_book(&mut conn, "The Hobbit", "", "5551234567", 7, today).is_err());
        assert!(rent_book(&mut conn, "The Hobbit", "Alice", "not-a-phone", 7, today).is_err());
        assert!(rent_book(&mut conn, "The Hobbit", "Alice", "5551234567", 0, today).is_err());
        assert!(list_rents(&conn).unwrap().is_empty());
    }
}
