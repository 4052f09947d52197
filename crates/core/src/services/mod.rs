pub mod aggregation_service;
pub mod csv_service;
pub mod import_service;
pub mod transaction_service;
pub mod undo_service;
