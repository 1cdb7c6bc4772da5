pub mod csv;
pub mod excel_write;
pub mod json;
