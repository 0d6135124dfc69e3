pub mod input_selector;
pub mod transaction_builder;
