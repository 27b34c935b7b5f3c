pub mod transaction_writer;
