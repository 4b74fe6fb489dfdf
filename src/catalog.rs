// Book catalog service - add, list, search, update, sell, delete
// Books are looked up by title (the original's natural key). All title
// matching funnels through find_book / the WHERE title=? statements
// here, so swapping to id-based linkage later touches only this file.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ShopError, ShopResult, ValidationError};
use crate::session::Session;
use crate::validate;

// ============================================================================
// BOOK ENTITY
// ============================================================================

/// One title in the catalog, with live and cumulative counters.
///
/// `quantity_available` and `quantity_rented` describe current copies;
/// `quantity_sold`, `quantity_rented_all` and `quantity_rented_days`
/// only ever grow and feed the reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub price: f64,
    pub quantity_available: i64,
    pub quantity_rented: i64,
    pub quantity_sold: i64,
    pub quantity_rented_all: i64,
    pub quantity_rented_days: i64,
}

const BOOK_COLUMNS: &str = "id, title, author, genre, price, quantity_available, \
     quantity_rented, quantity_sold, quantity_rented_all, quantity_rented_days";

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        genre: row.get(3)?,
        price: row.get(4)?,
        quantity_available: row.get(5)?,
        quantity_rented: row.get(6)?,
        quantity_sold: row.get(7)?,
        quantity_rented_all: row.get(8)?,
        quantity_rented_days: row.get(9)?,
    })
}

/// Which field a search hit matched on; the shell uses this for
/// highlighting. The core never emits color codes itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchField {
    Title,
    Author,
    Genre,
}

#[derive(Debug, Clone)]
pub struct BookMatch {
    pub book: Book,
    pub matched: MatchField,
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Adds a new title. All cumulative counters start at zero.
pub fn add_book(
    conn: &Connection,
    title: &str,
    author: &str,
    genre: &str,
    price: f64,
    quantity_available: i64,
) -> ShopResult<()> {
    validate::validate_title(title)?;
    validate::validate_author(author)?;
    validate::validate_genre(genre)?;
    validate::validate_price(price)?;
    validate::validate_quantity(quantity_available)?;

    conn.execute(
        "INSERT INTO books (title, author, genre, price, quantity_available,
                            quantity_rented, quantity_sold, quantity_rented_all,
                            quantity_rented_days)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, 0, 0)",
        params![title, author, genre, price, quantity_available],
    )?;

    debug!(title, "book added");
    Ok(())
}

/// Returns every book in insertion order.
pub fn list_books(conn: &Connection) -> ShopResult<Vec<Book>> {
    let mut stmt = conn.prepare(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id"))?;
    let books = stmt
        .query_map([], book_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(books)
}

/// Case-insensitive substring search over title, author and genre.
/// Each hit is tagged with the first field that matched
/// (title > author > genre).
pub fn search_books(conn: &Connection, term: &str) -> ShopResult<Vec<BookMatch>> {
    let pattern = format!("%{}%", term);

    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOK_COLUMNS} FROM books
         WHERE title LIKE ?1 OR author LIKE ?1 OR genre LIKE ?1
         ORDER BY id"
    ))?;
    let books = stmt
        .query_map([&pattern], book_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let needle = term.to_lowercase();
    let matches = books
        .into_iter()
        .map(|book| {
            let matched = if book.title.to_lowercase().contains(&needle) {
                MatchField::Title
            } else if book.author.to_lowercase().contains(&needle) {
                MatchField::Author
            } else {
                MatchField::Genre
            };
            BookMatch { book, matched }
        })
        .collect();

    Ok(matches)
}

/// Looks a book up by exact title. With duplicate titles this returns
/// the oldest row; duplicates are not prevented by the schema.
pub fn find_book(conn: &Connection, title: &str) -> ShopResult<Option<Book>> {
    let book = conn
        .query_row(
            &format!("SELECT {BOOK_COLUMNS} FROM books WHERE title = ?1 ORDER BY id LIMIT 1"),
            [title],
            book_from_row,
        )
        .optional()?;
    Ok(book)
}

/// Replaces the five mutable fields of the book named `old_title`.
/// Counters are untouched.
pub fn update_book(
    conn: &Connection,
    old_title: &str,
    new_title: &str,
    new_author: &str,
    new_genre: &str,
    new_price: f64,
    new_quantity_available: i64,
) -> ShopResult<()> {
    validate::validate_title(old_title)?;
    validate::validate_title(new_title)?;
    validate::validate_author(new_author)?;
    validate::validate_genre(new_genre)?;
    validate::validate_price(new_price)?;
    validate::validate_quantity(new_quantity_available)?;

    let changed = conn.execute(
        "UPDATE books SET title = ?1, author = ?2, genre = ?3, price = ?4,
                          quantity_available = ?5
         WHERE title = ?6",
        params![
            new_title,
            new_author,
            new_genre,
            new_price,
            new_quantity_available,
            old_title
        ],
    )?;

    if changed == 0 {
        return Err(ShopError::not_found("book", old_title));
    }

    debug!(old_title, new_title, "book updated");
    Ok(())
}

/// Sells `quantity` copies: stock check, `quantity_sold` increment and
/// `quantity_available` decrement are one transaction, so a failure
/// partway cannot leave the counters inconsistent.
pub fn sell_book(conn: &mut Connection, title: &str, quantity: i64) -> ShopResult<()> {
    validate::validate_title(title)?;
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive { field: "quantity" }.into());
    }

    let tx = conn.transaction()?;

    let available: Option<i64> = tx
        .query_row(
            "SELECT quantity_available FROM books WHERE title = ?1 ORDER BY id LIMIT 1",
            [title],
            |row| row.get(0),
        )
        .optional()?;
    let available = available.ok_or_else(|| ShopError::not_found("book", title))?;

    if quantity > available {
        return Err(ShopError::InsufficientStock {
            title: title.to_string(),
            available,
            requested: quantity,
        });
    }

    tx.execute(
        "UPDATE books SET quantity_sold = quantity_sold + ?1,
                          quantity_available = quantity_available - ?1
         WHERE title = ?2",
        params![quantity, title],
    )?;
    tx.commit()?;

    debug!(title, quantity, "sale recorded");
    Ok(())
}

/// Deletes one title. Admin only.
pub fn delete_book(conn: &Connection, session: &Session, title: &str) -> ShopResult<()> {
    session.require_admin()?;
    validate::validate_title(title)?;

    let deleted = conn.execute("DELETE FROM books WHERE title = ?1", [title])?;
    if deleted == 0 {
        return Err(ShopError::not_found("book", title));
    }

    debug!(title, "book deleted");
    Ok(())
}

/// Wipes the whole catalog. Admin only; the caller must pass an
/// explicit affirmative. No undo.
pub fn delete_all_books(
    conn: &Connection,
    session: &Session,
    confirmed: bool,
) -> ShopResult<usize> {
    session.require_admin()?;
    if !confirmed {
        return Err(ShopError::NotConfirmed);
    }

    let deleted = conn.execute("DELETE FROM books", [])?;
    debug!(deleted, "all books deleted");
    Ok(deleted)
}

// ============================================================================
// TESTS
// ============================================================================
