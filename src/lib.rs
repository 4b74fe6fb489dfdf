// Bookery - bookshop management core
// Exposes the data access and reporting layer for the CLI shell and tests.

pub mod account; // User accounts, hashing, authentication
pub mod catalog; // Book inventory CRUD + sales
pub mod db; // Persistence gateway (SQLite)
pub mod error; // Typed error taxonomy
pub mod rental; // Rent / recall / late returns
pub mod report; // Sales and rental aggregates
pub mod session; // Explicit session context + roles
pub mod validate; // Pure field validators

// Re-export commonly used types
pub use account::{add_user, authenticate, delete_user, hash_password, list_users, update_user, UserInfo};
pub use catalog::{
    add_book, delete_all_books, delete_book, find_book, list_books, search_books, sell_book,
    update_book, Book, BookMatch, MatchField,
};
pub use db::{open_database, open_in_memory, setup_database, DATABASE_FILE};
pub use error::{ShopError, ShopResult, ValidationError};
pub use rental::{
    list_late_rents, list_rents, recall_rent, rent_book, search_rents, Rent, RentMatch,
    RentMatchField,
};
pub use report::{rental_report, sales_report, RentalReport, SalesReport};
pub use session::{Role, Session};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
