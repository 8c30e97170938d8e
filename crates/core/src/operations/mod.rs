//! Operations module - raw ledger records and the normalizer.

mod normalizer;
mod operations_constants;
mod operations_model;


pub use normalizer::{
    is_expense_tagged, normalize_record, normalize_records, parse_decimal_value,
    parse_operation_kind, parse_tags,
};
pub use operations_constants::*;
pub use operations_model::{LedgerFields, LedgerRecord, Operation, OperationKind};
