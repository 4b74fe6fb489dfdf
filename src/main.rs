// Bookery CLI shell - menus, prompts and table rendering
// All durable logic lives in the library; this binary only collects
// input, calls one service operation at a time and prints the result.

use std::io::{self, Write};
use std::process;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use bookery::{account, catalog, db, rental, report, Session, ShopError, VERSION};

const RED: &str = "\x1b[1;31m";
const GREEN: &str = "\x1b[1;32m";
const YELLOW: &str = "\x1b[1;33m";
const BLUE: &str = "\x1b[1;34m";
const PINK: &str = "\x1b[1;35m";
const RESET: &str = "\x1b[0m";

/// How many rows the reports list.
const REPORT_TOP_N: u32 = 5;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| db::DATABASE_FILE.to_string());

    let mut conn = db::open_database(&db_path)
        .with_context(|| format!("failed to open database at {db_path}"))?;

    banner();

    // Failed initial login terminates the process immediately.
    let mut session = login(&conn);

    loop {
        print_menu();
        let choice = prompt("Enter your choice: ");
        match choice.as_str() {
            "1" => add_book_menu(&conn),
            "2" => show_books(&conn),
            "3" => search_book_menu(&conn),
            "4" => update_book_menu(&conn),
            "5" => sell_book_menu(&mut conn),
            "6" => sales_report_menu(&conn),
            "7" => rent_book_menu(&mut conn),
            "8" => recall_rent_menu(&mut conn),
            "9" => show_rents(&conn),
            "10" => show_late_rents(&conn),
            "11" => search_rent_menu(&conn),
            "12" => rental_report_menu(&conn),
            "13" => advanced_cli(&mut conn, &mut session),
            "0" => break,
            other => println!("{RED}Invalid choice: {other}{RESET}"),
        }
    }

    Ok(())
}

// ============================================================================
// LOGIN
// ============================================================================

fn banner() {
    println!("\n{BLUE}*********** Bookery ***********{RESET}");
    println!("{PINK}Version: {VERSION}{RESET}\n");
}

fn login(conn: &Connection) -> Session {
    let username = prompt("Enter username: ");
    let password = prompt("Enter password: ");

    match account::authenticate(conn, &username, &password) {
        Ok(session) => {
            println!("{GREEN}Authentication successful!{RESET}");
            session
        }
        Err(e) => {
            println!("{RED}{e}{RESET}");
            process::exit(0);
        }
    }
}

// ============================================================================
// PROMPT HELPERS
// ============================================================================

fn prompt(message: &str) -> String {
    print!("{message}");
    let _ = io::stdout().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return String::new();
    }
    line.trim().to_string()
}

/// Re-prompts until the validator accepts the value.
fn prompt_valid(
    message: &str,
    validator: impl Fn(&str) -> Result<(), bookery::ValidationError>,
) -> String {
    loop {
        let value = prompt(message);
        match validator(&value) {
            Ok(()) => return value,
            Err(e) => println!("{RED}{e}. Please try again.{RESET}"),
        }
    }
}

/// Re-prompts until the input parses and the validator accepts it.
fn prompt_number<T: std::str::FromStr + Copy>(
    message: &str,
    validator: impl Fn(T) -> Result<(), bookery::ValidationError>,
) -> T {
    loop {
        let raw = prompt(message);
        match raw.parse::<T>() {
            Ok(value) => match validator(value) {
                Ok(()) => return value,
                Err(e) => println!("{RED}{e}. Please try again.{RESET}"),
            },
            Err(_) => println!("{RED}Not a valid number. Please try again.{RESET}"),
        }
    }
}

fn report_error(e: &ShopError) {
    println!("{RED}{e}{RESET}");
}

// ============================================================================
// TABLE RENDERING
// ============================================================================

/// Prints rows with per-column widths sized to the widest cell,
/// the way the shop's listings have always looked.
fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }
    let total: usize = widths.iter().sum::<usize>() + widths.len() * 3;

    println!("{BLUE}{}{RESET}", "-".repeat(total));
    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| format!("{h:<w$}"))
        .collect();
    println!("{BLUE}{} |{RESET}", header_line.join(" | "));
    println!("{BLUE}{}{RESET}", "-".repeat(total));

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect();
        println!("{} |", line.join(" | "));
    }
    println!("{BLUE}{}{RESET}", "-".repeat(total));
}

fn book_rows(books: &[catalog::Book]) -> Vec<Vec<String>> {
    books
        .iter()
        .map(|b| {
            vec![
                b.title.clone(),
                b.author.clone(),
                b.genre.clone(),
                format!("${:.2}", b.price),
                b.quantity_available.to_string(),
                b.quantity_rented.to_string(),
                b.quantity_sold.to_string(),
            ]
        })
        .collect()
}

fn rent_rows(rents: &[rental::Rent]) -> Vec<Vec<String>> {
    rents
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.title.clone(),
                r.customer_name.clone(),
                r.customer_phone.clone(),
                r.rented_for_days.to_string(),
                r.rent_date.to_string(),
                r.return_date.to_string(),
            ]
        })
        .collect()
}

const BOOK_HEADERS: [&str; 7] = [
    "Title",
    "Author",
    "Genre",
    "Price",
    "Quantity Available",
    "Quantity Rented",
    "Quantity Sold",
];

const RENT_HEADERS: [&str; 7] = [
    "Id",
    "Title",
    "Name",
    "Phone",
    "Days",
    "Rent Date",
    "Return Date",
];

// ============================================================================
// BOOK ACTIONS
// ============================================================================

fn add_book_menu(conn: &Connection) {
    let title = prompt_valid("Enter title: ", bookery::validate::validate_title);
    let author = prompt_valid("Enter author: ", bookery::validate::validate_author);
    let genre = prompt_valid("Enter genre: ", bookery::validate::validate_genre);
    let price = prompt_number("Enter price: ", bookery::validate::validate_price);
    let quantity = prompt_number(
        "Enter quantity available: ",
        bookery::validate::validate_quantity,
    );

    match catalog::add_book(conn, &title, &author, &genre, price, quantity) {
        Ok(()) => println!("{GREEN}Book added successfully.{RESET}"),
        Err(e) => report_error(&e),
    }
}

fn show_books(conn: &Connection) {
    match catalog::list_books(conn) {
        Ok(books) => {
            println!("\n********** List of Books **************");
            print_table(&BOOK_HEADERS, &book_rows(&books));
        }
        Err(e) => report_error(&e),
    }
}

fn search_book_menu(conn: &Connection) {
    let term = prompt("Enter search term (title, author, or genre): ");
    match catalog::search_books(conn, &term) {
        Ok(matches) => {
            println!("\n***** Search Results ******");
            let rows: Vec<Vec<String>> = matches
                .iter()
                .map(|m| {
                    let mut row = book_rows(std::slice::from_ref(&m.book)).remove(0);
                    // Highlight the matched field.
                    let idx = match m.matched {
                        catalog::MatchField::Title => 0,
                        catalog::MatchField::Author => 1,
                        catalog::MatchField::Genre => 2,
                    };
                    row[idx] = format!("{GREEN}{}{RESET}", row[idx]);
                    row
                })
                .collect();
            print_table(&BOOK_HEADERS, &rows);
        }
        Err(e) => report_error(&e),
    }
}

fn update_book_menu(conn: &Connection) {
    let old_title = prompt_valid(
        "Enter the title of the book to update: ",
        bookery::validate::validate_title,
    );
    let title = prompt_valid("Enter new title: ", bookery::validate::validate_title);
    let author = prompt_valid("Enter new author: ", bookery::validate::validate_author);
    let genre = prompt_valid("Enter new genre: ", bookery::validate::validate_genre);
    let price = prompt_number("Enter new price: ", bookery::validate::validate_price);
    let quantity = prompt_number(
        "Enter new quantity available: ",
        bookery::validate::validate_quantity,
    );

    match catalog::update_book(conn, &old_title, &title, &author, &genre, price, quantity) {
        Ok(()) => println!("{GREEN}Book details updated successfully.{RESET}"),
        Err(e) => report_error(&e),
    }
}

fn sell_book_menu(conn: &mut Connection) {
    let title = prompt_valid(
        "Enter the title of the book to sell: ",
        bookery::validate::validate_title,
    );
    let quantity = prompt_number("Enter quantity to sell: ", |q: i64| {
        if q > 0 {
            Ok(())
        } else {
            Err(bookery::ValidationError::MustBePositive { field: "quantity" })
        }
    });

    match catalog::sell_book(conn, &title, quantity) {
        Ok(()) => println!("{GREEN}Sale successful.{RESET}"),
        Err(e) => report_error(&e),
    }
}

fn delete_book_menu(conn: &Connection, session: &Session) {
    let title = prompt_valid(
        "Enter the book to delete: ",
        bookery::validate::validate_title,
    );
    match catalog::delete_book(conn, session, &title) {
        Ok(()) => println!("{GREEN}Book deleted successfully.{RESET}"),
        Err(e) => report_error(&e),
    }
}

fn delete_all_books_menu(conn: &Connection, session: &Session) {
    let choice = prompt(&format!("{YELLOW}Delete all books (yes/no): {RESET}"));
    let confirmed = choice == "yes";
    match catalog::delete_all_books(conn, session, confirmed) {
        Ok(count) => println!("{GREEN}All books deleted successfully ({count}).{RESET}"),
        Err(ShopError::NotConfirmed) => println!("{RED}Deletion aborted.{RESET}"),
        Err(e) => report_error(&e),
    }
}

// ============================================================================
// RENT ACTIONS
// ============================================================================

fn rent_book_menu(conn: &mut Connection) {
    let title = prompt_valid(
        "Enter the title of the book to rent: ",
        bookery::validate::validate_title,
    );
    let name = prompt_valid(
        "Enter name of the customer: ",
        bookery::validate::validate_customer_name,
    );
    let phone = prompt_valid(
        "Enter phone of the customer: ",
        bookery::validate::validate_phone,
    );
    let days = prompt_number("Enter number of days to rent: ", bookery::validate::validate_days);

    let today = Local::now().date_naive();
    match rental::rent_book(conn, &title, &name, &phone, days, today) {
        Ok(rent) => println!(
            "{GREEN}Book rented successfully for {days} days (rent id {}).{RESET}",
            rent.id
        ),
        Err(e) => report_error(&e),
    }
}

fn recall_rent_menu(conn: &mut Connection) {
    let rent_id = prompt_number("Enter the rent id to recall: ", bookery::validate::validate_id);
    match rental::recall_rent(conn, rent_id) {
        Ok(()) => println!("{GREEN}Rent recalled successfully.{RESET}"),
        Err(e) => report_error(&e),
    }
}

fn show_rents(conn: &Connection) {
    match rental::list_rents(conn) {
        Ok(rents) => {
            println!("\n********** List of Rents **************");
            print_table(&RENT_HEADERS, &rent_rows(&rents));
        }
        Err(e) => report_error(&e),
    }
}

fn show_late_rents(conn: &Connection) {
    let today = Local::now().date_naive();
    match rental::list_late_rents(conn, today) {
        Ok(rents) => {
            println!("\n********** Late Rent Returns **************");
            print_table(&RENT_HEADERS, &rent_rows(&rents));
        }
        Err(e) => report_error(&e),
    }
}

fn search_rent_menu(conn: &Connection) {
    let term = prompt("Enter search term (title, name, or phone): ");
    match rental::search_rents(conn, &term) {
        Ok(matches) => {
            println!("\n***** Search Results ******");
            let rents: Vec<rental::Rent> = matches.into_iter().map(|m| m.rent).collect();
            print_table(&RENT_HEADERS, &rent_rows(&rents));
        }
        Err(e) => report_error(&e),
    }
}

// ============================================================================
// REPORT ACTIONS
// ============================================================================

fn sales_report_menu(conn: &Connection) {
    match report::sales_report(conn, REPORT_TOP_N) {
        Ok(report) => {
            println!("\n{PINK}************ Sales Report ************{RESET}");
            println!("{YELLOW}********* Top {REPORT_TOP_N} Books *********{RESET}");
            let rows: Vec<Vec<String>> = report
                .top
                .iter()
                .map(|line| {
                    vec![
                        line.title.clone(),
                        line.author.clone(),
                        line.genre.clone(),
                        format!("${:.2}", line.price),
                        line.quantity_sold.to_string(),
                        format!("${:.2}", line.revenue),
                    ]
                })
                .collect();
            print_table(
                &["Title", "Author", "Genre", "Price", "Quantity Sold", "Revenue"],
                &rows,
            );
            println!("\n{YELLOW}*********** Revenue ***********{RESET}");
            println!(
                "Total Revenue of Top {REPORT_TOP_N}: {GREEN}${:.2}{RESET}",
                report.top_revenue
            );
            println!(
                "Total Revenue of All:   {GREEN}${:.2}{RESET}",
                report.total_revenue
            );
        }
        Err(e) => report_error(&e),
    }
}

fn rental_report_menu(conn: &Connection) {
    match report::rental_report(conn, REPORT_TOP_N) {
        Ok(report) => {
            println!("\n{PINK}*********** Rental Report ************{RESET}");
            println!("{YELLOW}******* Top {REPORT_TOP_N} Rented Books *********{RESET}");
            let rows: Vec<Vec<String>> = report
                .top
                .iter()
                .map(|line| {
                    vec![
                        line.title.clone(),
                        line.author.clone(),
                        line.genre.clone(),
                        line.quantity_rented_all.to_string(),
                        line.quantity_rented_days.to_string(),
                    ]
                })
                .collect();
            print_table(
                &[
                    "Title",
                    "Author",
                    "Genre",
                    "Quantity Rented All",
                    "Quantity Rented Days",
                ],
                &rows,
            );
            println!(
                "\nTotal rented days (top {REPORT_TOP_N}): {GREEN}{}{RESET}",
                report.total_rented_days
            );
        }
        Err(e) => report_error(&e),
    }
}

// ============================================================================
// USER ACTIONS (advanced CLI only, like the menus of old)
// ============================================================================

fn add_user_menu(conn: &Connection, session: &Session) {
    let username = prompt_valid("Enter username: ", bookery::validate::validate_username);
    let password = prompt_valid("Enter password: ", bookery::validate::validate_password);
    let confirm = prompt("Enter password again: ");
    let email = prompt_valid("Enter email: ", bookery::validate::validate_email);
    let role = prompt_number(
        "Enter role (0 for admin, 1 for regular user): ",
        bookery::validate::validate_role,
    );

    match account::add_user(conn, session, &username, &password, &confirm, &email, role) {
        Ok(()) => println!("{GREEN}User added successfully.{RESET}"),
        Err(e) => report_error(&e),
    }
}

fn update_user_menu(conn: &Connection, session: &Session) {
    let old_username = prompt_valid(
        "Enter the user to update: ",
        bookery::validate::validate_username,
    );
    let username = prompt_valid("Enter new username: ", bookery::validate::validate_username);
    let email = prompt_valid("Enter new email: ", bookery::validate::validate_email);
    let role = prompt_number("Enter new role: ", bookery::validate::validate_role);

    match account::update_user(conn, session, &old_username, &username, &email, role) {
        Ok(()) => println!("{GREEN}User details updated successfully.{RESET}"),
        Err(e) => report_error(&e),
    }
}

fn delete_user_menu(conn: &Connection, session: &Session) {
    let username = prompt_valid(
        "Enter the user to delete: ",
        bookery::validate::validate_username,
    );
    match account::delete_user(conn, session, &username) {
        Ok(()) => println!("{GREEN}User deleted successfully.{RESET}"),
        Err(e) => report_error(&e),
    }
}

fn show_users(conn: &Connection, session: &Session) {
    match account::list_users(conn, session) {
        Ok(users) => {
            println!("\n********** List of Users **************");
            let rows: Vec<Vec<String>> = users
                .iter()
                .map(|u| {
                    vec![
                        u.username.clone(),
                        u.email.clone(),
                        u.role.label().to_string(),
                    ]
                })
                .collect();
            print_table(&["User", "Email", "Role"], &rows);
        }
        Err(e) => report_error(&e),
    }
}

// ============================================================================
// MENU AND ADVANCED CLI
// ============================================================================

fn print_menu() {
    println!("\n*********** Bookshop Management System ***********");
    println!("1.  Add a Book");
    println!("2.  Display All Books");
    println!("3.  Search for a Book");
    println!("4.  Update Book Details");
    println!("5.  Sell a Book");
    println!("6.  Generate Sales Report");
    println!("7.  Rent a Book");
    println!("8.  Recall a Rent");
    println!("9.  Display all Rents");
    println!("10. Display late rent returns");
    println!("11. Search for a rent");
    println!("12. Generate Rental Report");
    println!("13. Advanced CLI");
    println!("0.  Exit");
    println!("******************************************************");
}

fn advanced_cli(conn: &mut Connection, session: &mut Session) {
    print!("\x1bc"); // clear screen
    println!("Advanced CLI. Type 'help all' for commands, 'back' for the menu.");

    loop {
        let line = prompt(&format!("{BLUE}bookery>{RESET} "));
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or("");
        let noun = words.next().unwrap_or("");

        match (verb, noun) {
            ("", _) => continue,
            ("back", _) => return,
            ("exit", _) => process::exit(0),
            ("clear", _) => print!("\x1bc"),
            ("whoami", _) => println!("{}", session.whoami()),
            ("login", _) => *session = login(conn),

            ("add", "book") => add_book_menu(conn),
            ("add", "user") => add_user_menu(conn, session),
            ("del", "book") => delete_book_menu(conn, session),
            ("del", "user") => delete_user_menu(conn, session),
            ("del", "allbooks") => delete_all_books_menu(conn, session),
            ("show", "books") => show_books(conn),
            ("show", "users") => show_users(conn, session),
            ("show", "rents") => show_rents(conn),
            ("search", "book") => search_book_menu(conn),
            ("search", "rent") => search_rent_menu(conn),
            ("update", "book") => update_book_menu(conn),
            ("update", "user") => update_user_menu(conn, session),
            ("sell", "book") => sell_book_menu(conn),
            ("rent", "book") => rent_book_menu(conn),
            ("rent", "recall") => recall_rent_menu(conn),
            ("rent", "late") => show_late_rents(conn),
            ("report", "sales") => sales_report_menu(conn),
            ("report", "rents") => rental_report_menu(conn),
            ("help", topic) => help(topic),

            (verb, _) => println!("{RED}Invalid command:{RESET} {verb}"),
        }
    }
}

fn help(topic: &str) {
    match topic {
        "add" => println!("Usage: add [user/book]\nDescription: Add a new user or a new book."),
        "del" => println!(
            "Usage: del [user/book/allbooks]\nDescription: Delete a user, a book or all the books."
        ),
        "show" => println!(
            "Usage: show [users/books/rents]\nDescription: Display all books, users or rent records."
        ),
        "search" => println!(
            "Usage: search [book/rent]\nDescription: Search for a book or a rent record."
        ),
        "update" => println!(
            "Usage: update [book/user]\nDescription: Update the details of a book or a user."
        ),
        "sell" => println!("Usage: sell [book]\nDescription: Sell a book."),
        "rent" => println!("Usage: rent [book/recall/late]\nDescription: Rent or recall a book."),
        "report" => println!(
            "Usage: report [sales/rents]\nDescription: Generate a sales or rental report."
        ),
        "login" => println!("Usage: login\nDescription: Login to another account."),
        "" | "all" => {
            println!("{BLUE}***** Available commands *****{RESET}\n");
            println!("add user        -   Add a new user");
            println!("add book        -   Add a new book");
            println!("del user        -   Delete a user");
            println!("del book        -   Delete a book");
            println!("del allbooks    -   Delete all the books ({RED}no return{RESET})");
            println!("show books      -   Display all books");
            println!("show users      -   Display all users");
            println!("show rents      -   Display all rents");
            println!("search book     -   Search for a book");
            println!("search rent     -   Search for a rent record");
            println!("update book     -   Update the details of a book");
            println!("update user     -   Update the details of a user");
            println!("sell book       -   Sell a book");
            println!("rent book       -   Rent a book");
            println!("rent recall     -   Recall a rented book");
            println!("rent late       -   Display late rent returns");
            println!("report sales    -   Generate sales report");
            println!("report rents    -   Generate rental report");
            println!("whoami          -   Show the current user");
            println!("login           -   Login to another account");
            println!("back            -   Go back to the menu");
            println!("clear           -   Clear the screen");
            println!("help [topic]    -   Show this help message");
            println!("exit            -   Exit the program");
        }
        other => println!("{RED}No help for:{RESET} {other}"),
    }
}
