//! Unified error types for the POS ledger.
//!
//! Every fallible operation in the crate returns [`Result`]. Database errors coming out of
//! `SeaORM` are classified on the way in so that constraint violations (a restricted delete,
//! a duplicate SKU) stay distinguishable from connectivity or query failures.

use rust_decimal::Decimal;
use sea_orm::{DbErr, RuntimeErr, SqlErr, sqlx};
use thiserror::Error;

/// Errors produced by the ledger and catalog operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Any database failure that is not a constraint violation
    #[error("Database error: {message}")]
    Database {
        /// Error text reported by the driver
        message: String,
    },

    /// A foreign key or unique constraint rejected the write
    #[error("Constraint violation: {message}")]
    ConstraintViolation {
        /// Error text reported by the driver
        message: String,
    },

    /// A schema migration failed or was refused
    #[error("Migration error: {message}")]
    Migration {
        /// Description of the failed step
        message: String,
    },

    /// Line quantities must be strictly positive
    #[error("Invalid quantity: {quantity} (must be greater than zero)")]
    InvalidQuantity {
        /// The rejected quantity
        quantity: i32,
    },

    /// Prices must fit the stored `DECIMAL(10,2)`: non-negative, at most two decimal
    /// places, no more than 99,999,999.99
    #[error("Invalid price: {price} (must be 0 to 99999999.99 with at most two decimals)")]
    InvalidPrice {
        /// The rejected price
        price: Decimal,
    },

    /// A line subtotal or ledger total does not fit the stored `DECIMAL(10,2)`
    #[error("Amount overflow computing the {kind} total")]
    AmountOverflow {
        /// `"line"`, `"order"` or `"sale"`
        kind: &'static str,
    },

    /// A product name or SKU was empty or whitespace-only
    #[error("{what} cannot be empty")]
    InvalidName {
        /// Which field was rejected, e.g. `"SKU"`
        what: &'static str,
    },

    /// An order or sale was submitted without any line items
    #[error("A {kind} must contain at least one line item")]
    EmptyTransaction {
        /// `"order"` or `"sale"`
        kind: &'static str,
    },

    /// Product lookup failed
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// Requested product id
        id: i64,
    },

    /// Variant lookup failed
    #[error("Variant not found: {id}")]
    VariantNotFound {
        /// Requested variant id
        id: i64,
    },

    /// Order lookup failed
    #[error("Order not found: {id}")]
    OrderNotFound {
        /// Requested order id
        id: i64,
    },

    /// Sale lookup failed
    #[error("Sale not found: {id}")]
    SaleNotFound {
        /// Requested sale id
        id: i64,
    },

    /// The variant does not hold enough stock for the requested quantity
    #[error("Insufficient stock for variant {variant_id}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Variant being reserved
        variant_id: i64,
        /// Quantity asked for
        requested: i32,
        /// Stock on hand at the time of the attempt
        available: i32,
    },

    /// The variant is still referenced by order items and cannot be deleted
    #[error("Variant {variant_id} is referenced by {references} order item(s)")]
    VariantInUse {
        /// Variant that was targeted for deletion
        variant_id: i64,
        /// Number of referencing order items
        references: u64,
    },

    /// The product is still referenced by variants or sale items and cannot be deleted
    #[error("Product {product_id} is referenced by {references} variant(s) or sale item(s)")]
    ProductInUse {
        /// Product that was targeted for deletion
        product_id: i64,
        /// Number of referencing rows
        references: u64,
    },

    /// The requested order status change is not allowed
    #[error("Cannot move order {order_id} from '{from}' to '{to}'")]
    InvalidStatusTransition {
        /// Order being updated
        order_id: i64,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Lines can only be added while an order is pending
    #[error("Order {order_id} is {status}; only pending orders accept new items")]
    OrderNotPending {
        /// Order being modified
        order_id: i64,
        /// Its current status
        status: String,
    },

    /// I/O failure (config files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable could not be read
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

/// `SQLite` foreign key failures. 787 is `SQLITE_CONSTRAINT_FOREIGNKEY`; a `RESTRICT`
/// action fails with 1811 (`SQLITE_CONSTRAINT_TRIGGER`), which `DbErr::sql_err` leaves
/// unclassified.
const SQLITE_FOREIGN_KEY_CODES: [&str; 2] = ["787", "1811"];

fn sqlite_foreign_key_failure(err: &DbErr) -> Option<String> {
    let (DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db)))
    | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db)))
    | DbErr::Conn(RuntimeErr::SqlxError(sqlx::Error::Database(db)))) = err
    else {
        return None;
    };
    let by_code = db
        .code()
        .is_some_and(|code| SQLITE_FOREIGN_KEY_CODES.contains(&&*code));
    let by_message = db.message().contains("FOREIGN KEY constraint failed");
    (by_code || by_message).then(|| db.message().to_string())
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        if let Some(
            SqlErr::ForeignKeyConstraintViolation(message)
            | SqlErr::UniqueConstraintViolation(message),
        ) = err.sql_err()
        {
            return Self::ConstraintViolation { message };
        }
        if let Some(message) = sqlite_foreign_key_failure(&err) {
            return Self::ConstraintViolation { message };
        }
        match err {
            DbErr::Migration(message) => Self::Migration { message },
            other => Self::Database {
                message: other.to_string(),
            },
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_errors_keep_their_kind() {
        let err: Error = DbErr::Migration("column already exists".to_string()).into();
        assert!(matches!(err, Error::Migration { message } if message == "column already exists"));
    }

    #[test]
    fn test_other_db_errors_become_database_errors() {
        let err: Error = DbErr::RecordNotFound("orders".to_string()).into();
        assert!(matches!(err, Error::Database { .. }));
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            Error::InvalidName { what: "SKU" }.to_string(),
            "SKU cannot be empty"
        );
        assert_eq!(
            Error::AmountOverflow { kind: "order" }.to_string(),
            "Amount overflow computing the order total"
        );
    }

    #[test]
    fn test_insufficient_stock_message() {
        let err = Error::InsufficientStock {
            variant_id: 7,
            requested: 2,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for variant 7: requested 2, available 1"
        );
    }
}
